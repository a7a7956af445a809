use std::sync::Arc;

use tracing::{debug, info_span, warn};

use crate::broadcast::LogLevel;
use crate::completion::{Completer, CompletionResult};
use crate::error::CompletionError;
use crate::response;
use crate::worker::Aggregator;

use super::config::RunConfig;
use super::context::RowContext;
use super::error::RowError;
use super::outcome::RowOutcome;
use super::progress::{ProgressEvent, ProgressReporter};
use super::state::RunState;

pub struct RowPipeline {
    config: Arc<RunConfig>,
    completer: Arc<dyn Completer>,
    aggregator: Arc<Aggregator>,
    state: RunState,
}

impl RowPipeline {
    pub fn new(
        config: Arc<RunConfig>,
        completer: Arc<dyn Completer>,
        aggregator: Arc<Aggregator>,
        state: RunState,
    ) -> Self {
        Self {
            config,
            completer,
            aggregator,
            state,
        }
    }

    /// Run one row through render, delay, call and parse.
    ///
    /// Returns None when the run was cancelled before the row reached a
    /// terminal state; such rows are dropped, not reported as failures.
    pub fn run(&self, mut ctx: RowContext, progress: &dyn ProgressReporter) -> Option<RowOutcome> {
        let _row_span = info_span!("row",
            row = ctx.row_index + 1,
            title = %ctx.title,
        )
        .entered();

        if !self.state.is_running() {
            return None;
        }

        // Step 1: Render prompt
        {
            let _step = info_span!("render_prompt").entered();
            self.step_render_prompt(&mut ctx);
        }

        // Step 2: Pace requests
        {
            let _step = info_span!("api_delay").entered();
            if !self.step_delay() {
                debug!("{} dropped during delay", ctx.label());
                return None;
            }
        }

        // Step 3: Call the backend
        let call = {
            let _step = info_span!("complete").entered();
            self.step_complete(&mut ctx)
        };
        if !self.state.is_running() {
            debug!("{} dropped, run cancelled during the call", ctx.label());
            return None;
        }
        match call {
            Ok(result) => {
                self.aggregator.record_usage(result.tokens);
                ctx.completion = Some(result);
            }
            Err(e) => {
                let message = format!("{}: request failed: {}", ctx.label(), e);
                warn!("{}", message);
                progress.report(ProgressEvent::log(LogLevel::Error, message));
                return Some(RowOutcome::Failed {
                    row_index: ctx.row_index,
                    error: RowError::from(e),
                    record: ctx.record,
                });
            }
        }

        // Step 4: Parse the answer
        let _step = info_span!("parse_response").entered();
        Some(self.step_parse(ctx, progress))
    }

    fn step_render_prompt(&self, ctx: &mut RowContext) {
        ctx.prompt = Some(self.config.prompt.render(&ctx.record));
    }

    fn step_delay(&self) -> bool {
        if !self.config.api_delay.is_zero() && !self.state.sleep_interruptible(self.config.api_delay)
        {
            return false;
        }
        self.state.is_running()
    }

    /// Usage is recorded by the caller once the result is known to be kept.
    fn step_complete(&self, ctx: &mut RowContext) -> Result<CompletionResult, CompletionError> {
        let prompt = ctx.prompt.take().unwrap_or_default();
        let request = self.config.completion.request(prompt);
        let result = self.completer.complete(&request)?;
        debug!("Call returned {} tokens", result.tokens);
        Ok(result)
    }

    fn step_parse(&self, ctx: RowContext, progress: &dyn ProgressReporter) -> RowOutcome {
        let text = ctx
            .completion
            .as_ref()
            .map(|c| c.text.as_str())
            .unwrap_or_default();

        match response::parse_response(text) {
            Ok(Some(parsed)) => {
                progress.report(ProgressEvent::log(
                    LogLevel::Success,
                    format!("{}: done", ctx.label()),
                ));
                RowOutcome::Success {
                    row_index: ctx.row_index,
                    record: ctx.record,
                    parsed,
                }
            }
            Ok(None) => {
                progress.report(ProgressEvent::log(
                    LogLevel::Info,
                    format!("{}: empty response, skipped", ctx.label()),
                ));
                RowOutcome::Skipped {
                    row_index: ctx.row_index,
                }
            }
            Err(failure) => {
                let message = format!("{}: {}", ctx.label(), failure.message);
                warn!("{}", message);
                debug!("Unparseable response: {}", failure.raw);
                progress.report(ProgressEvent::log(LogLevel::Error, message));
                RowOutcome::Failed {
                    row_index: ctx.row_index,
                    record: ctx.record,
                    error: RowError::from(failure),
                }
            }
        }
    }
}
