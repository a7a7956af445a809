use std::sync::Arc;

use log::{info, warn};
use paperlens::error::WorkerError;
use paperlens::pipeline::BroadcastProgress;
use paperlens::{
    Config, LogBroadcaster, ProgressReporter, RunProgressBroadcaster, RunState, TableSession,
};

use super::Outcome;
use crate::cli::RunArgs;
use crate::events::EventBridge;

/// Applies command-line overrides on top of the loaded config.
pub fn apply_overrides(config: &mut Config, args: &RunArgs) {
    if let Some(input) = &args.input {
        config.table.input_file = input.display().to_string();
    }
    if let Some(output) = &args.output {
        config.table.output_file = output.display().to_string();
    }
    if let Some(workers) = args.workers {
        config.table.max_workers = workers;
    }
    if let Some(delay) = args.delay {
        config.table.api_delay = delay;
    }
}

pub async fn run(args: RunArgs) -> paperlens::Result<Outcome> {
    let mut config = super::load(&args.config)?;
    apply_overrides(&mut config, &args);

    let state = RunState::new();
    let handler_state = state.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Interrupt received, stopping after in-flight rows");
        handler_state.cancel();
    }) {
        warn!("Could not install Ctrl-C handler: {}", e);
    }

    let logs = LogBroadcaster::default();
    let runs = RunProgressBroadcaster::default();
    let bridge = EventBridge::start(&logs, &runs);

    let run_id = paperlens::new_run_id();
    info!("Starting run {}", run_id);
    let progress: Arc<dyn ProgressReporter> = Arc::new(BroadcastProgress::new(&run_id, logs, runs));

    let run_state = state.clone();
    // The backend uses a blocking HTTP client, so it is built and used off
    // the async runtime.
    let joined = tokio::task::spawn_blocking(move || -> paperlens::Result<_> {
        let session = TableSession::prepare(&config)?;
        session.run(run_state, progress)
    })
    .await;
    bridge.finish().await;

    let report = joined.map_err(|e| WorkerError::SpawnFailed(e.to_string()))??;
    if report.cancelled || !state.is_running() {
        Ok(Outcome::Interrupted)
    } else {
        Ok(Outcome::Done)
    }
}
