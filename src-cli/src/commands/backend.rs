use log::warn;
use paperlens::broadcast::LogLevel;
use paperlens::completion::{
    list_hosted_models, list_ollama_models, probe_ollama, BackendKind, ProbeOptions,
};
use paperlens::config::ApiMode;
use paperlens::error::{PaperlensError, WorkerError};
use paperlens::pipeline::config::completion_settings;
use paperlens::pipeline::CallbackProgress;
use paperlens::remote::{OllamaInventory, ShellExecutor};
use paperlens::session::api_key_for;
use paperlens::{build_completer, Completer, ConfigError, RunState};

use super::Outcome;
use crate::cli::{ConfigArgs, ModelsArgs};

fn print_log(message: &str, level: LogLevel) {
    match level {
        LogLevel::Warn | LogLevel::Error => eprintln!("[{}] {}", level, message),
        _ => println!("[{}] {}", level, message),
    }
}

/// Runs a blocking backend call off the async runtime.
async fn blocking<T, F>(f: F) -> paperlens::Result<T>
where
    F: FnOnce() -> paperlens::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| PaperlensError::from(WorkerError::SpawnFailed(e.to_string())))?
}

/// Ollama: server reachability then a test generation.
/// Hosted: a single test generation with the configured key.
pub async fn probe(args: ConfigArgs) -> paperlens::Result<Outcome> {
    let config = super::load(&args)?;
    let settings = completion_settings(&config)?;
    let api_key = api_key_for(&config)?;

    blocking(move || {
        match settings.backend {
            BackendKind::Ollama => {
                let state = RunState::new();
                let progress = CallbackProgress::new(print_log, |text| println!("{}", text));
                let report = probe_ollama(&settings, &ProbeOptions::default(), &state, &progress)?;
                println!(
                    "Answered on attempt {} ({} tokens): {}",
                    report.attempts, report.tokens, report.reply
                );
            }
            BackendKind::Hosted(_) => {
                let completer = build_completer(&settings, api_key)?;
                let result = completer.complete(&settings.request("Hello"))?;
                print_log(
                    &format!("Model {} is ready", settings.model),
                    LogLevel::Success,
                );
                println!("{} tokens: {}", result.tokens, result.text);
            }
        }
        Ok(Outcome::Done)
    })
    .await
}

pub async fn models(args: ModelsArgs) -> paperlens::Result<Outcome> {
    let config = super::load(&args.config)?;
    let local = args.local;

    let names = blocking(move || match config.api_mode {
        ApiMode::Ollama if local => {
            Ok(OllamaInventory::new(ShellExecutor).list_models())
        }
        ApiMode::Ollama => {
            Ok(list_ollama_models(&config.ollama.base_url())?)
        }
        ApiMode::Online => {
            let api_key = api_key_for(&config)?.ok_or(ConfigError::MissingField {
                field: "online_api.api_key",
            })?;
            Ok(list_hosted_models(config.online_api.provider, &api_key)?)
        }
    })
    .await?;

    if names.is_empty() {
        warn!("No models found");
    }
    for name in names {
        println!("{}", name);
    }
    Ok(Outcome::Done)
}
