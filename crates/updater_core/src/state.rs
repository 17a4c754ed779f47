use std::path::PathBuf;

/// Current stage of a run. Linear pipeline, no branching back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    Idle,
    Checking,
    Downloading,
    Applying,
    Terminal,
}

/// Record of the update currently being processed. Fields are populated
/// incrementally and never cleared; a later failed stage does not undo
/// an earlier field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpdateDescriptor {
    pub latest_version: Option<String>,
    pub source_url: Option<String>,
    pub local_file: Option<PathBuf>,
}

/// State of one run of the check → download → apply pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionState {
    stage: Stage,
    descriptor: UpdateDescriptor,
    reported: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn descriptor(&self) -> &UpdateDescriptor {
        &self.descriptor
    }

    pub fn into_descriptor(self) -> UpdateDescriptor {
        self.descriptor
    }

    pub(crate) fn set_stage(&mut self, stage: Stage) {
        self.stage = stage;
    }

    pub(crate) fn descriptor_mut(&mut self) -> &mut UpdateDescriptor {
        &mut self.descriptor
    }

    /// Marks the run terminal. A run must report exactly once; a second
    /// terminal transition is a programming error in the driver.
    pub(crate) fn mark_reported(&mut self) {
        debug_assert!(!self.reported, "run already reported a terminal outcome");
        self.reported = true;
        self.stage = Stage::Terminal;
    }
}
