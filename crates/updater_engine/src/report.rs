use updater_core::{ErrorKind, Outcome};

/// Completion callback: `(error kind | none, latest version | none)`.
/// Success passes no error kind; every failure passes exactly one.
pub type UpdateCallback = Box<dyn FnMut(Option<ErrorKind>, Option<&str>) + Send>;

/// Translates a run's terminal outcome into at most one callback
/// invocation. No registered callback makes reporting a no-op.
pub struct OutcomeReporter {
    callback: Option<UpdateCallback>,
    fired: bool,
}

impl OutcomeReporter {
    pub fn new(callback: Option<UpdateCallback>) -> Self {
        Self {
            callback,
            fired: false,
        }
    }

    /// Delivers the outcome. The pipeline is strictly linear, so a
    /// second call within one run is a programming error.
    pub fn report(&mut self, outcome: &Outcome) {
        debug_assert!(!self.fired, "outcome already reported for this run");
        self.fired = true;
        if let Some(callback) = self.callback.as_mut() {
            callback(outcome.error, outcome.latest_version.as_deref());
        }
    }

    /// Hands the callback back for reuse by the next run.
    pub fn into_callback(self) -> Option<UpdateCallback> {
        self.callback
    }
}
