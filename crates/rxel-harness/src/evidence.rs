#![forbid(unsafe_code)]

//! JSONL evidence for failed-run forensics.
//!
//! Tests append one entry per interesting step (attach, write, frame, render)
//! and dump the log on failure. Each line is a standalone JSON object:
//!
//! ```text
//! {"seq":0,"case":"throttle","step":"attach","detail":{"renders":1}}
//! ```

use serde::Serialize;
use serde_json::Value as Json;

/// One evidence line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvidenceEntry {
    pub seq: u64,
    pub case: String,
    pub step: String,
    pub detail: Json,
}

/// Ordered evidence log for one test case.
#[derive(Debug, Clone, Default)]
pub struct EvidenceLog {
    case: String,
    entries: Vec<EvidenceEntry>,
}

impl EvidenceLog {
    #[must_use]
    pub fn new(case: impl Into<String>) -> Self {
        Self {
            case: case.into(),
            entries: Vec::new(),
        }
    }

    /// Append a step with a structured detail payload.
    pub fn record(&mut self, step: impl Into<String>, detail: impl Serialize) {
        let detail = serde_json::to_value(detail).unwrap_or(Json::Null);
        let seq = self.entries.len() as u64;
        self.entries.push(EvidenceEntry {
            seq,
            case: self.case.clone(),
            step: step.into(),
            detail,
        });
    }

    #[must_use]
    pub fn entries(&self) -> &[EvidenceEntry] {
        &self.entries
    }

    /// Steps in order.
    #[must_use]
    pub fn steps(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.step.as_str()).collect()
    }

    /// One JSON object per line.
    #[must_use]
    pub fn to_jsonl(&self) -> String {
        self.entries
            .iter()
            .filter_map(|entry| serde_json::to_string(entry).ok())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Emit the log through `tracing` at debug level, one event per entry.
    pub fn emit(&self) {
        for line in self.to_jsonl().lines() {
            tracing::debug!(target: "rxel_harness::evidence", "{line}");
        }
    }
}
