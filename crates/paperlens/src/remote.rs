//! Remote command execution and Ollama model inventory.
//!
//! Tunnels and remote shells are managed outside this crate. Anything that can
//! run a shell command and report its output implements [`CommandExecutor`];
//! [`ShellExecutor`] runs commands on the local machine.

use std::process::Command;

use log::{debug, warn};

/// Result of running one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub output: String,
    pub exit_code: Option<i32>,
}

pub trait CommandExecutor: Send + Sync {
    fn execute(&self, command: &str) -> CommandOutput;
}

/// Runs commands through the local `sh -c` (or `cmd /C` on Windows).
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellExecutor;

impl CommandExecutor for ShellExecutor {
    fn execute(&self, command: &str) -> CommandOutput {
        let result = if cfg!(windows) {
            Command::new("cmd").args(["/C", command]).output()
        } else {
            Command::new("sh").args(["-c", command]).output()
        };

        match result {
            Ok(out) => {
                let mut output = String::from_utf8_lossy(&out.stdout).into_owned();
                if !out.status.success() {
                    output.push_str(&String::from_utf8_lossy(&out.stderr));
                }
                CommandOutput {
                    success: out.status.success(),
                    output,
                    exit_code: out.status.code(),
                }
            }
            Err(e) => CommandOutput {
                success: false,
                output: e.to_string(),
                exit_code: None,
            },
        }
    }
}

/// Model name with an optional size tag: `qwen2.5` + `7b` → `qwen2.5:7b`.
///
/// A name that already carries a tag is returned unchanged.
pub fn full_model_name(model: &str, size: &str) -> String {
    let model = model.trim();
    let size = size.trim();
    if size.is_empty() || model.contains(':') {
        model.to_string()
    } else {
        format!("{}:{}", model, size)
    }
}

/// Reads the models installed on an Ollama host via `ollama list`.
pub struct OllamaInventory<E> {
    executor: E,
}

impl<E: CommandExecutor> OllamaInventory<E> {
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    /// Installed model names (with tags). Empty if the command fails.
    pub fn list_models(&self) -> Vec<String> {
        let result = self.executor.execute("ollama list");
        if !result.success {
            warn!(
                "ollama list failed (exit code {:?}): {}",
                result.exit_code,
                result.output.trim()
            );
            return Vec::new();
        }

        let models = parse_ollama_list(&result.output);
        debug!("Found {} installed Ollama models", models.len());
        models
    }

    /// True if `model` is installed, either exactly or as any tag of it.
    pub fn model_exists(&self, model: &str) -> bool {
        let model = model.trim();
        let prefix = format!("{}:", model);
        self.list_models()
            .iter()
            .any(|installed| installed == model || installed.starts_with(&prefix))
    }
}

/// First column of each `ollama list` line after the header.
pub fn parse_ollama_list(output: &str) -> Vec<String> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| line.split_whitespace().next())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ScriptedExecutor {
        output: CommandOutput,
    }

    impl CommandExecutor for ScriptedExecutor {
        fn execute(&self, command: &str) -> CommandOutput {
            assert_eq!(command, "ollama list");
            self.output.clone()
        }
    }

    const LIST_OUTPUT: &str = "NAME                ID              SIZE      MODIFIED\n\
qwen2.5:7b          845dbda0ea48    4.7 GB    2 days ago\n\
deepseek-r1:14b     ea35dfe18182    9.0 GB    3 weeks ago\n\
\n";

    fn inventory(success: bool, output: &str) -> OllamaInventory<ScriptedExecutor> {
        OllamaInventory::new(ScriptedExecutor {
            output: CommandOutput {
                success,
                output: output.to_string(),
                exit_code: Some(if success { 0 } else { 1 }),
            },
        })
    }

    #[test]
    fn test_full_model_name() {
        assert_eq!(full_model_name("qwen2.5", "7b"), "qwen2.5:7b");
        assert_eq!(full_model_name("qwen2.5", ""), "qwen2.5");
        assert_eq!(full_model_name("qwen2.5:7b", "14b"), "qwen2.5:7b");
    }

    #[test]
    fn test_parse_ollama_list() {
        assert_eq!(
            parse_ollama_list(LIST_OUTPUT),
            vec!["qwen2.5:7b", "deepseek-r1:14b"]
        );
        assert!(parse_ollama_list("NAME ID SIZE MODIFIED\n").is_empty());
    }

    #[test]
    fn test_model_exists_by_exact_name_or_base() {
        let inv = inventory(true, LIST_OUTPUT);
        assert!(inv.model_exists("qwen2.5:7b"));
        assert!(inv.model_exists("deepseek-r1"));
        assert!(!inv.model_exists("deepseek"));
        assert!(!inv.model_exists("llama3"));
    }

    #[test]
    fn test_failed_command_lists_nothing() {
        let inv = inventory(false, "ollama: command not found");
        assert!(inv.list_models().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_shell_executor() {
        let out = ShellExecutor.execute("echo paperlens");
        assert!(out.success);
        assert_eq!(out.output.trim(), "paperlens");
        assert_eq!(out.exit_code, Some(0));

        let out = ShellExecutor.execute("exit 3");
        assert!(!out.success);
        assert_eq!(out.exit_code, Some(3));
    }
}
