//! Batch trainer over local message files.

use crate::rspamd::client::RspamdClient;
use crate::rspamd::error::RspamdResult;
use crate::rspamd::state::{message_digest, TrainState};
use crate::rspamd::types::{LearnClass, LearnOutcome, LearnReport, BAYES_MIN_MESSAGES};
use mailadm_core::{files, looks_like_message, split_mbox};
use std::path::PathBuf;

/// Trains messages against one controller, consulting and updating the
/// shared training state.
pub struct Trainer<'a> {
    pub client: &'a RspamdClient,
    /// Cap on newly-trained messages per run (0 = unlimited).
    pub max_messages: usize,
}

impl<'a> Trainer<'a> {
    pub fn new(client: &'a RspamdClient, max_messages: usize) -> Self {
        Self {
            client,
            max_messages,
        }
    }

    /// Train every new message found under `paths` as `class`.
    pub async fn run(
        &self,
        state: &mut TrainState,
        paths: &[PathBuf],
        class: LearnClass,
    ) -> RspamdResult<LearnReport> {
        let mut report = LearnReport::default();

        'outer: for path in paths {
            let raw = std::fs::read(path)?;
            let messages: Vec<Vec<u8>> = if files::is_mbox(path) {
                split_mbox(&raw)
            } else {
                vec![raw]
            };

            for (idx, message) in messages.iter().enumerate() {
                if self.max_messages > 0 && report.trained >= self.max_messages {
                    log::info!(
                        "[rspamd] reached per-run limit of {} messages",
                        self.max_messages
                    );
                    break 'outer;
                }
                report.total += 1;
                let source = if messages.len() > 1 {
                    format!("{}:msg#{}", path.display(), idx + 1)
                } else {
                    path.display().to_string()
                };

                if !looks_like_message(message) {
                    report.failed += 1;
                    report
                        .errors
                        .push(format!("{}: invalid email format", source));
                    continue;
                }

                let digest = message_digest(message);
                if state.contains(class, &digest) {
                    report.skipped += 1;
                    continue;
                }

                match self.client.learn(message.clone(), class).await {
                    Ok(LearnOutcome::Trained) => {
                        report.trained += 1;
                        state.record(class, digest);
                    }
                    Ok(LearnOutcome::AlreadyKnown) => {
                        // The controller knew it even though we did not;
                        // record it so the next run skips it locally.
                        report.skipped += 1;
                        state.record(class, digest);
                    }
                    Err(e) => {
                        report.failed += 1;
                        log::warn!("[rspamd] learning {} failed: {}", source, e);
                        report.errors.push(format!("{}: {}", source, e.message));
                    }
                }
            }
        }
        Ok(report)
    }
}

/// Collect message files for one class directory.
pub fn collect_messages(path: &PathBuf, recursive: bool) -> RspamdResult<Vec<PathBuf>> {
    Ok(files::find_email_files(path, recursive, None)?)
}

/// Human-readable readiness lines for the Bayes activation threshold.
pub fn readiness_lines(state: &TrainState) -> Vec<String> {
    let spam = state.trained_count(LearnClass::Spam);
    let ham = state.trained_count(LearnClass::Ham);
    if spam >= BAYES_MIN_MESSAGES && ham >= BAYES_MIN_MESSAGES {
        vec!["Bayes classifier has sufficient training data".to_string()]
    } else {
        vec![
            format!(
                "Need {} more spam messages",
                BAYES_MIN_MESSAGES.saturating_sub(spam)
            ),
            format!(
                "Need {} more ham messages",
                BAYES_MIN_MESSAGES.saturating_sub(ham)
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readiness_below_threshold() {
        let mut state = TrainState::default();
        state.record(LearnClass::Spam, "a".to_string());
        let lines = readiness_lines(&state);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("199 more spam"));
        assert!(lines[1].contains("200 more ham"));
    }

    #[test]
    fn test_readiness_met() {
        let mut state = TrainState::default();
        for i in 0..BAYES_MIN_MESSAGES {
            state.record(LearnClass::Spam, format!("s{}", i));
            state.record(LearnClass::Ham, format!("h{}", i));
        }
        let lines = readiness_lines(&state);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("sufficient"));
    }
}
