use std::cell::Cell;
use std::rc::Rc;

use tracing::debug;

/// Page-level progress widget. `start` fires when the first request goes
/// out, `done` when the last in-flight request settles.
pub trait ProgressIndicator {
    fn start(&self);
    fn done(&self);
}

/// Default indicator: reports transitions through `tracing`.
#[derive(Debug, Default)]
pub struct TracingProgress;

impl ProgressIndicator for TracingProgress {
    fn start(&self) {
        debug!(target = "navigate", "requests started");
    }

    fn done(&self) {
        debug!(target = "navigate", "requests settled");
    }
}

pub struct ProgressTracker {
    active: Cell<usize>,
    indicator: Rc<dyn ProgressIndicator>,
}

impl ProgressTracker {
    pub fn new(indicator: Rc<dyn ProgressIndicator>) -> Rc<Self> {
        Rc::new(Self {
            active: Cell::new(0),
            indicator,
        })
    }

    pub fn active(&self) -> usize {
        self.active.get()
    }

    /// Count one request as in flight until the returned guard drops.
    pub fn begin(self: &Rc<Self>) -> InFlight {
        let active = self.active.get();
        self.active.set(active + 1);
        if active == 0 {
            self.indicator.start();
        }
        InFlight {
            tracker: Rc::clone(self),
        }
    }

    fn finish(&self) {
        let active = self.active.get().saturating_sub(1);
        self.active.set(active);
        if active == 0 {
            self.indicator.done();
        }
    }
}

pub struct InFlight {
    tracker: Rc<ProgressTracker>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.tracker.finish();
    }
}
