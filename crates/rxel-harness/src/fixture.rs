#![forbid(unsafe_code)]

//! End-to-end element fixture on a lab clock.
//!
//! [`ElementFixture`] wires a [`RecordingHost`], a [`TimerScheduler`] driven
//! by a [`LabClock`], and a [`RenderLog`] whose template output is the
//! property snapshot at render time.

use std::rc::Rc;
use std::time::Duration;

use rxel_core::{ComponentClass, EffectRegistry, Value};
use rxel_runtime::{Element, ElementClass, LabClock, Props, Result, TimerScheduler};

use crate::evidence::EvidenceLog;
use crate::host::RecordingHost;
use crate::render_log::RenderLog;

/// Template output of fixture elements: `(field, value)` in declaration order.
pub type Snapshot = Vec<(String, Value)>;

/// Element under test plus everything needed to drive and observe it.
pub struct ElementFixture {
    pub clock: LabClock,
    pub scheduler: Rc<TimerScheduler>,
    pub host: Rc<RecordingHost>,
    pub renders: RenderLog<Snapshot>,
    pub class: Rc<ElementClass<RecordingHost, Snapshot>>,
    pub element: Element<RecordingHost, Snapshot>,
    pub evidence: EvidenceLog,
}

impl ElementFixture {
    /// Throttle interval used by [`new`](Self::new).
    pub const INTERVAL: Duration = Duration::from_millis(16);

    #[must_use]
    pub fn new(case: &str, properties: Rc<ComponentClass>) -> Self {
        Self::with_effects(case, properties, EffectRegistry::standard())
    }

    #[must_use]
    pub fn with_effects(case: &str, properties: Rc<ComponentClass>, effects: EffectRegistry) -> Self {
        let clock = LabClock::new();
        let scheduler = Rc::new(TimerScheduler::new(Self::INTERVAL).with_clock(&clock));
        let host = Rc::new(RecordingHost::new());
        let renders = RenderLog::new();
        let class = Rc::new(
            ElementClass::builder(properties)
                .scheduler(scheduler.clone())
                .effects(effects)
                .build(Props::snapshot, renders.sink()),
        );
        let element = Element::new(&class, Rc::clone(&host));
        Self {
            clock,
            scheduler,
            host,
            renders,
            class,
            element,
            evidence: EvidenceLog::new(case),
        }
    }

    pub fn attach(&mut self) -> Result<()> {
        let result = self.element.on_attach();
        self.note("attach");
        result
    }

    pub fn detach(&mut self) {
        self.element.on_detach();
        self.note("detach");
    }

    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let shown = value.to_string();
        let result = self.element.set(field, value);
        self.evidence.record("set", (field, shown, self.renders.len()));
        result
    }

    /// Advance the lab clock and run due timers. Returns timers run.
    pub fn advance(&mut self, delta: Duration) -> usize {
        self.clock.advance(delta);
        let ran = self.scheduler.run_due();
        self.evidence
            .record("advance", (delta.as_millis() as u64, ran, self.renders.len()));
        ran
    }

    /// Advance one interval at a time until no timer is pending.
    pub fn settle(&mut self) {
        while self.scheduler.next_due().is_some() {
            self.advance(Self::INTERVAL);
        }
    }

    /// Latest rendered value of `field`.
    #[must_use]
    pub fn last_rendered(&self, field: &str) -> Option<Value> {
        self.renders
            .last()?
            .into_iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    fn note(&mut self, step: &str) {
        let attached = self.element.is_attached();
        let renders = self.renders.len();
        self.evidence.record(step, (attached, renders));
    }
}
