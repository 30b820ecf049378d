//! LLM process client
//!
//! The model runs as an external process (by default `ollama run <model>`)
//! that reads the prompt on stdin and writes its answer on stdout. Every
//! call is bounded by a timeout and may be cancelled; in both cases the
//! child process is killed.
//!
//! The blocking calls drive a private current-thread runtime per call. When
//! the caller is itself inside a tokio runtime, that runtime is left alone and
//! the call runs on a scoped helper thread instead.

use crate::core::config::LlmConfig;
use crate::core::error::{NeoError, Result};
use std::future::Future;
use std::process::Stdio;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("LLM did not answer within {secs}s")]
    Timeout { secs: u64 },

    #[error("LLM call cancelled")]
    Cancelled,

    #[error("Failed to start LLM process: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("LLM process IO error: {0}")]
    Io(#[source] std::io::Error),

    #[error("LLM process exited with {code:?}: {stderr}")]
    NonZeroExit { code: Option<i32>, stderr: String },

    #[error("LLM output is not valid UTF-8")]
    InvalidUtf8,

    #[error("LLM returned an empty response")]
    EmptyResponse,
}

/// Anything that turns a prompt into raw model text
pub trait LlmBackend {
    fn complete(&self, prompt: &str) -> std::result::Result<String, GenerationError>;
}

/// Subprocess backend
#[derive(Debug, Clone)]
pub struct OllamaProcess {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl OllamaProcess {
    /// Build from configuration; the model name follows the configured args
    pub fn new(config: &LlmConfig) -> Result<Self> {
        if config.program.trim().is_empty() {
            return Err(NeoError::Config("llm.program must not be empty".into()));
        }

        let mut args = config.args.clone();
        args.push(config.model.clone());

        Ok(Self {
            program: config.program.clone(),
            args,
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run one completion, giving up when `cancel` resolves first
    ///
    /// Blocks the calling thread. Cancellation drops the in-flight call,
    /// which kills the child process.
    pub fn complete_cancellable(
        &self,
        prompt: &str,
        cancel: impl Future<Output = ()> + Send,
    ) -> std::result::Result<String, GenerationError> {
        block_on(async {
            tokio::select! {
                result = self.complete_async(prompt) => result,
                _ = cancel => {
                    tracing::warn!("LLM call cancelled");
                    Err(GenerationError::Cancelled)
                }
            }
        })
    }

    /// Spawn the process, feed the prompt, collect stdout under the timeout
    pub async fn complete_async(&self, prompt: &str) -> std::result::Result<String, GenerationError> {
        let start = Instant::now();
        tracing::info!("Invoking {} {}", self.program, self.args.join(" "));

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(GenerationError::Spawn)?;

        let mut stdin = child.stdin.take().ok_or_else(|| {
            GenerationError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "stdin was not captured",
            ))
        })?;
        let input = prompt.as_bytes().to_vec();
        let write = async move {
            let result = stdin.write_all(&input).await;
            // The model reads until end of input
            drop(stdin);
            result
        };

        let run = async { tokio::join!(write, child.wait_with_output()) };

        let (written, output) = tokio::time::timeout(self.timeout, run)
            .await
            .map_err(|_| {
                tracing::warn!("LLM timed out after {:?}", self.timeout);
                GenerationError::Timeout {
                    secs: self.timeout.as_secs(),
                }
            })?;

        let output = output.map_err(GenerationError::Io)?;
        if !output.status.success() {
            return Err(GenerationError::NonZeroExit {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        if let Err(e) = written {
            return Err(GenerationError::Io(e));
        }

        let text = String::from_utf8(output.stdout).map_err(|_| GenerationError::InvalidUtf8)?;
        if text.trim().is_empty() {
            return Err(GenerationError::EmptyResponse);
        }

        tracing::info!(
            "LLM answered in {:.1}s ({} bytes)",
            start.elapsed().as_secs_f64(),
            text.len()
        );
        Ok(text)
    }
}

impl LlmBackend for OllamaProcess {
    fn complete(&self, prompt: &str) -> std::result::Result<String, GenerationError> {
        block_on(self.complete_async(prompt))
    }
}

/// Run `future` to completion on a fresh current-thread runtime
///
/// Nested `block_on` inside a runtime panics, so from async context the
/// future runs on a scoped thread that has no runtime of its own.
fn block_on<F>(future: F) -> std::result::Result<String, GenerationError>
where
    F: Future<Output = std::result::Result<String, GenerationError>> + Send,
{
    let run = move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(GenerationError::Io)?;
        runtime.block_on(future)
    };

    if tokio::runtime::Handle::try_current().is_err() {
        return run();
    }
    tracing::debug!("Called from async context; generating on a helper thread");
    std::thread::scope(|scope| scope.spawn(run).join()).unwrap_or_else(|_| {
        Err(GenerationError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "generation thread panicked",
        )))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell(script: &str, timeout_secs: u64) -> OllamaProcess {
        let config = LlmConfig {
            program: "sh".into(),
            args: vec!["-c".into(), script.into()],
            model: "neo".into(),
            timeout_secs,
        };
        OllamaProcess::new(&config).unwrap()
    }

    #[test]
    fn test_model_name_follows_args() {
        let process = OllamaProcess::new(&LlmConfig::default()).unwrap();
        assert_eq!(process.program, "ollama");
        assert_eq!(process.args, vec!["run".to_string(), "llama3.2:3b".to_string()]);
        assert_eq!(process.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_prompt_goes_through_stdin() {
        let answer = shell("cat", 5).complete("hola").unwrap();
        assert_eq!(answer, "hola");
    }

    #[test]
    fn test_timeout_kills_slow_process() {
        let process = shell("sleep 5", 5).with_timeout(Duration::from_millis(200));
        let start = Instant::now();
        let err = process.complete("x").unwrap_err();
        assert!(matches!(err, GenerationError::Timeout { .. }));
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_cancellation() {
        let process = shell("sleep 5", 10);
        let err = process
            .complete_cancellable("x", async {
                tokio::time::sleep(Duration::from_millis(100)).await
            })
            .unwrap_err();
        assert!(matches!(err, GenerationError::Cancelled));
    }

    #[test]
    fn test_non_zero_exit_carries_stderr() {
        let err = shell("cat >/dev/null; echo boom >&2; exit 3", 5)
            .complete("x")
            .unwrap_err();
        match err {
            GenerationError::NonZeroExit { code, stderr } => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_empty_output_is_error() {
        let err = shell("cat >/dev/null", 5).complete("x").unwrap_err();
        assert!(matches!(err, GenerationError::EmptyResponse));
    }

    #[test]
    fn test_invalid_utf8_is_error() {
        let err = shell("cat >/dev/null; printf '\\377\\376'", 5)
            .complete("x")
            .unwrap_err();
        assert!(matches!(err, GenerationError::InvalidUtf8));
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let config = LlmConfig {
            program: "neo-no-such-llm".into(),
            ..LlmConfig::default()
        };
        let err = OllamaProcess::new(&config).unwrap().complete("x").unwrap_err();
        assert!(matches!(err, GenerationError::Spawn(_)));
    }

    #[test]
    fn test_empty_program_rejected() {
        let config = LlmConfig {
            program: " ".into(),
            ..LlmConfig::default()
        };
        assert!(matches!(OllamaProcess::new(&config), Err(NeoError::Config(_))));
    }

    #[tokio::test]
    async fn test_blocking_call_from_async_host() {
        let process = shell("cat", 5);
        assert_eq!(process.complete("hola").unwrap(), "hola");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cancellable_call_from_multi_thread_host() {
        let process = shell("sleep 5", 10);
        let err = process
            .complete_cancellable("x", async {
                tokio::time::sleep(Duration::from_millis(100)).await
            })
            .unwrap_err();
        assert!(matches!(err, GenerationError::Cancelled));
    }
}
