//! Completion signal

use async_trait::async_trait;
use cmop_common::Envelope;
use serde::Deserialize;
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::warn;

use super::{parse_args, ParamSpec, ParamType, ToolError, ToolTrait};

/// Final summary slot shared by the `done` tool and the session.
///
/// Reset at the start of every run and set at most once per run.
#[derive(Debug, Clone, Default)]
pub struct TerminationSignal {
    slot: Arc<Mutex<Option<String>>>,
}

impl TerminationSignal {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<String>> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn reset(&self) {
        *self.lock() = None;
    }

    /// Store the summary; returns false if one was already set this run
    pub fn set(&self, summary: impl Into<String>) -> bool {
        let mut slot = self.lock();
        if slot.is_some() {
            warn!("done already signalled this run, ignoring repeated summary");
            return false;
        }
        *slot = Some(summary.into());
        true
    }

    pub fn get(&self) -> Option<String> {
        self.lock().clone()
    }

    pub fn is_set(&self) -> bool {
        self.lock().is_some()
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DoneArgs {
    summary: String,
}

/// `done(summary)`: ends the current run with the given summary
pub struct DoneTool {
    signal: TerminationSignal,
}

impl DoneTool {
    pub fn new(signal: TerminationSignal) -> Self {
        Self { signal }
    }
}

#[async_trait]
impl ToolTrait for DoneTool {
    fn name(&self) -> &str {
        "done"
    }

    fn doc(&self) -> &str {
        "Signal that analysis is complete and provide the final summary.

Args:
    summary: The final analysis summary to present to the user."
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::required("summary", ParamType::String)]
    }

    async fn execute(&self, args: Value) -> Result<Envelope, ToolError> {
        let args: DoneArgs = parse_args(args)?;
        self.signal.set(args.summary);
        Ok(Envelope::message("Analysis complete."))
    }
}
