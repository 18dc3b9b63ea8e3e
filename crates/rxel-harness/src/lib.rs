#![forbid(unsafe_code)]

//! Test harness for rxel elements.
//!
//! - [`RecordingHost`]: host double recording events and attribute writes.
//! - [`RenderLog`]: render callback recorder.
//! - [`EvidenceLog`]: JSONL evidence lines for failed-run forensics.
//! - [`ElementFixture`]: an element on a lab-clock timer scheduler with all
//!   of the above attached.

pub mod evidence;
pub mod fixture;
pub mod host;
pub mod render_log;

pub use evidence::{EvidenceEntry, EvidenceLog};
pub use fixture::{ElementFixture, Snapshot};
pub use host::{HostRecord, RecordingHost, SurfaceId};
pub use render_log::{RenderLog, RenderRecord};
