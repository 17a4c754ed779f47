use std::sync::mpsc;
use std::thread;

use crate::config::SessionConfig;
use crate::report::UpdateCallback;
use crate::session::UpdateSession;

enum SessionCommand {
    Check,
}

/// Fire-and-forget front end for hosts that do not drive an async
/// runtime themselves: owns the session on a worker thread and runs
/// queued checks one at a time, delivering each outcome through the
/// session callback.
pub struct UpdateHandle {
    cmd_tx: mpsc::Sender<SessionCommand>,
}

impl UpdateHandle {
    pub fn spawn(config: SessionConfig, callback: UpdateCallback) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();

        thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
            let mut session = UpdateSession::new(config);
            session.set_callback(callback);
            while let Ok(command) = cmd_rx.recv() {
                match command {
                    SessionCommand::Check => {
                        let _ = runtime.block_on(session.check(None));
                    }
                }
            }
        });

        Self { cmd_tx }
    }

    /// Requests one update run and returns immediately. The request is
    /// dropped silently if the worker has gone away.
    pub fn check(&self) {
        let _ = self.cmd_tx.send(SessionCommand::Check);
    }
}
