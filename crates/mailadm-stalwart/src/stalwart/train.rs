//! Bayes training batch runner.

use crate::stalwart::client::ApiClient;
use crate::stalwart::error::{StalwartError, StalwartResult};
use crate::stalwart::types::{TrainClass, TrainFailure, TrainReport};
use mailadm_core::{files, looks_like_message, split_mbox};
use std::path::{Path, PathBuf};

/// Drives training of many messages against one server.
pub struct TrainRunner<'a> {
    pub client: &'a ApiClient,
    pub class: TrainClass,
    pub account: Option<String>,
    /// Stop at the first failure instead of continuing and reporting.
    pub fail_fast: bool,
}

impl<'a> TrainRunner<'a> {
    pub fn new(client: &'a ApiClient, class: TrainClass) -> Self {
        Self {
            client,
            class,
            account: None,
            fail_fast: false,
        }
    }

    pub fn account(mut self, account: Option<String>) -> Self {
        self.account = account;
        self
    }

    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Train one in-memory message.
    pub async fn train_bytes(&self, message: &[u8]) -> StalwartResult<()> {
        if !looks_like_message(message) {
            return Err(StalwartError::invalid_message(
                "Invalid email format (missing headers)",
            ));
        }
        self.client
            .train(message.to_vec(), self.class, self.account.as_deref())
            .await
    }

    /// Train every message found under the given paths. Mbox files are
    /// expanded into their individual messages; everything else is
    /// treated as one message per file.
    pub async fn run(&self, paths: &[PathBuf]) -> StalwartResult<TrainReport> {
        let mut report = TrainReport::default();

        for path in paths {
            if files::is_mbox(path) {
                let raw = std::fs::read(path)?;
                for (idx, message) in split_mbox(&raw).iter().enumerate() {
                    let source = format!("{}:msg#{}", path.display(), idx + 1);
                    if !self
                        .train_one(message, &source, &mut report)
                        .await?
                    {
                        return Ok(report);
                    }
                }
            } else {
                let message = std::fs::read(path)?;
                let source = path.display().to_string();
                if !self.train_one(&message, &source, &mut report).await? {
                    return Ok(report);
                }
            }
        }
        Ok(report)
    }

    /// Returns `false` when a failure should end the run.
    async fn train_one(
        &self,
        message: &[u8],
        source: &str,
        report: &mut TrainReport,
    ) -> StalwartResult<bool> {
        report.total += 1;
        match self.train_bytes(message).await {
            Ok(()) => {
                report.succeeded += 1;
                log::debug!("[stalwart] trained {} as {}", source, self.class.as_str());
                Ok(true)
            }
            Err(e) => {
                report.failed += 1;
                log::warn!("[stalwart] training {} failed: {}", source, e);
                report.failures.push(TrainFailure {
                    source: source.to_string(),
                    reason: e.message,
                });
                Ok(!self.fail_fast)
            }
        }
    }
}

/// Collect trainable message files under `path` (see
/// [`mailadm_core::find_email_files`]).
pub fn collect_messages(
    path: &Path,
    recursive: bool,
    pattern: Option<&str>,
) -> StalwartResult<Vec<PathBuf>> {
    let found = files::find_email_files(path, recursive, pattern)?;
    if found.is_empty() {
        return Err(StalwartError::invalid_config(format!(
            "No email files found in {}",
            path.display()
        )));
    }
    Ok(found)
}
