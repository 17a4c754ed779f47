//! Updater core: pure update-pipeline state machine.
mod effect;
mod msg;
mod outcome;
mod state;
mod step;

pub use effect::Effect;
pub use msg::{ApplyFailure, CheckFailure, DownloadFailure, MetadataReply, Msg};
pub use outcome::{ErrorKind, Outcome};
pub use state::{SessionState, Stage, UpdateDescriptor};
pub use step::step;
