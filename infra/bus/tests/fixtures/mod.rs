use parking_lot::Mutex;
use std::sync::Arc;
use typebus::{Bus, HandlerError, SubscriptionToken};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestEvent(pub usize);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OtherEvent(pub usize);

/// Shared call log; handlers append `(label, payload)` pairs.
#[derive(Clone, Debug, Default)]
pub struct Recorder {
    calls: Arc<Mutex<Vec<(&'static str, usize)>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, label: &'static str, value: usize) {
        self.calls.lock().push((label, value));
    }

    pub fn calls(&self) -> Vec<(&'static str, usize)> {
        self.calls.lock().clone()
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.calls.lock().iter().map(|(label, _)| *label).collect()
    }

    /// Subscribes a handler that records `label` for every [`TestEvent`].
    pub fn subscribe(&self, bus: &Bus, label: &'static str) -> SubscriptionToken {
        let recorder = self.clone();
        bus.subscribe(move |event: &TestEvent| recorder.record(label, event.0))
    }

    /// Subscribes a fallible handler that records `label` and then fails.
    pub fn subscribe_failing(&self, bus: &Bus, label: &'static str) -> SubscriptionToken {
        let recorder = self.clone();
        bus.try_subscribe(move |event: &TestEvent| -> Result<(), HandlerError> {
            recorder.record(label, event.0);
            Err(format!("{label} rejected {}", event.0).into())
        })
    }
}
