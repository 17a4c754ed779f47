use crate::{
    CheckFailure, DownloadFailure, Effect, ErrorKind, Msg, Outcome, SessionState, Stage,
};

/// Pure transition function: applies a message to the run state and
/// returns any effects. Messages that do not match the current stage
/// (stale completions, input after a terminal report) are ignored.
pub fn step(mut state: SessionState, msg: Msg) -> (SessionState, Vec<Effect>) {
    let effects = match msg {
        Msg::LocalVersion { version } => {
            if state.stage() != Stage::Idle {
                Vec::new()
            } else {
                match normalize(version) {
                    Some(current) => {
                        state.set_stage(Stage::Checking);
                        vec![Effect::FetchMetadata { current }]
                    }
                    None => finish(
                        &mut state,
                        Outcome::failure(ErrorKind::VersionNotSpecified, None),
                    ),
                }
            }
        }
        Msg::MetadataResult(result) => {
            if state.stage() != Stage::Checking {
                Vec::new()
            } else {
                match result {
                    Err(CheckFailure::Transport) => finish(
                        &mut state,
                        Outcome::failure(ErrorKind::CannotConnectToApi, None),
                    ),
                    Err(CheckFailure::InvalidResponse) => finish(
                        &mut state,
                        Outcome::failure(ErrorKind::ApiResponseNotValid, None),
                    ),
                    Ok(reply) => match normalize(reply.last) {
                        // A response without a usable `last` is treated the
                        // same as one that failed to parse.
                        None => finish(
                            &mut state,
                            Outcome::failure(ErrorKind::ApiResponseNotValid, None),
                        ),
                        Some(last) => {
                            state.descriptor_mut().latest_version = Some(last.clone());
                            match normalize(reply.source) {
                                // Version known, nothing to fetch: a normal
                                // terminal outcome.
                                None => finish(
                                    &mut state,
                                    Outcome::failure(ErrorKind::NoUpdateAvailable, Some(last)),
                                ),
                                Some(source) => {
                                    state.descriptor_mut().source_url = Some(source.clone());
                                    state.set_stage(Stage::Downloading);
                                    vec![Effect::DownloadPackage { url: source }]
                                }
                            }
                        }
                    },
                }
            }
        }
        Msg::DownloadResult(result) => {
            if state.stage() != Stage::Downloading {
                Vec::new()
            } else {
                let latest = state.descriptor().latest_version.clone();
                match result {
                    Err(DownloadFailure::Fetch) => finish(
                        &mut state,
                        Outcome::failure(ErrorKind::UpdateFileNotFound, latest),
                    ),
                    Err(DownloadFailure::Store) => finish(
                        &mut state,
                        Outcome::failure(ErrorKind::FailedToDownloadUpdate, latest),
                    ),
                    Ok(path) => {
                        state.descriptor_mut().local_file = Some(path.clone());
                        state.set_stage(Stage::Applying);
                        vec![Effect::ExtractArchive { archive: path }]
                    }
                }
            }
        }
        Msg::ExtractResult(result) => {
            if state.stage() != Stage::Applying {
                Vec::new()
            } else {
                let latest = state.descriptor().latest_version.clone();
                match result {
                    Err(_) => finish(
                        &mut state,
                        Outcome::failure(ErrorKind::FailedToApplyUpdate, latest),
                    ),
                    Ok(()) => {
                        let outcome = match latest {
                            Some(version) => Outcome::success(version),
                            None => Outcome {
                                error: None,
                                latest_version: None,
                            },
                        };
                        finish(&mut state, outcome)
                    }
                }
            }
        }
    };

    (state, effects)
}

fn finish(state: &mut SessionState, outcome: Outcome) -> Vec<Effect> {
    state.mark_reported();
    vec![Effect::Report { outcome }]
}

fn normalize(value: Option<String>) -> Option<String> {
    let value = value?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}
