//! Operator prompts.
//!
//! The only interactive input the flow needs is the one-time verification
//! code. [`TerminalConsole`] reads it from the terminal and gives up when the
//! operator presses Ctrl+C; [`ScriptedConsole`] feeds canned lines in tests.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Mutex;

use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConsoleError {
    /// The operator interrupted the prompt (Ctrl+C).
    #[error("prompt interrupted")]
    Interrupted,

    /// No more input can be read (closed stdin, terminal error).
    #[error("console unavailable: {0}")]
    Unavailable(String),
}

/// Source of operator-typed lines.
#[async_trait]
pub trait Console: Send + Sync {
    /// Show `prompt` and wait for one line of input.
    async fn read_line(&self, prompt: &str) -> Result<String, ConsoleError>;
}

/// Console that replays a fixed list of lines, then reports itself closed.
#[derive(Debug, Default)]
pub struct ScriptedConsole {
    lines: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedConsole {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: Mutex::new(lines.into_iter().map(Into::into).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Prompts shown so far, one per read.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .expect("scripted console lock poisoned")
            .clone()
    }

    pub fn reads(&self) -> usize {
        self.prompts().len()
    }
}

#[async_trait]
impl Console for ScriptedConsole {
    async fn read_line(&self, prompt: &str) -> Result<String, ConsoleError> {
        self.prompts
            .lock()
            .expect("scripted console lock poisoned")
            .push(prompt.to_string());

        self.lines
            .lock()
            .expect("scripted console lock poisoned")
            .pop_front()
            .ok_or_else(|| ConsoleError::Unavailable("scripted input exhausted".to_string()))
    }
}

/// Run `work` until it finishes or `interrupt` fires, whichever comes first.
///
/// Once [`TerminalConsole`] has listened for Ctrl+C, the process no longer
/// dies on SIGINT; callers race the rest of the run against the signal here.
pub async fn until_interrupted<W, I>(work: W, interrupt: I) -> Result<W::Output, ConsoleError>
where
    W: Future,
    I: Future,
{
    tokio::select! {
        biased;
        _ = interrupt => Err(ConsoleError::Interrupted),
        output = work => Ok(output),
    }
}

#[cfg(feature = "cli")]
pub use terminal::TerminalConsole;

#[cfg(feature = "cli")]
mod terminal {
    use async_trait::async_trait;
    use dialoguer::console::Term;
    use dialoguer::{theme::ColorfulTheme, Input};

    use super::{Console, ConsoleError};

    /// Reads from the controlling terminal via dialoguer, on stderr.
    #[derive(Debug, Clone, Default)]
    pub struct TerminalConsole;

    impl TerminalConsole {
        pub fn new() -> Self {
            Self
        }
    }

    #[async_trait]
    impl Console for TerminalConsole {
        async fn read_line(&self, prompt: &str) -> Result<String, ConsoleError> {
            let prompt = prompt.to_string();
            let read = tokio::task::spawn_blocking(move || {
                Input::<String>::with_theme(&ColorfulTheme::default())
                    .with_prompt(prompt)
                    .allow_empty(true)
                    .interact_text_on(&Term::stderr())
            });

            // The blocking read cannot be cancelled; on Ctrl+C it is abandoned
            // and the caller is expected to exit.
            tokio::select! {
                joined = read => match joined {
                    Ok(Ok(line)) => Ok(line),
                    Ok(Err(err)) => Err(ConsoleError::Unavailable(err.to_string())),
                    Err(err) => Err(ConsoleError::Unavailable(err.to_string())),
                },
                _ = tokio::signal::ctrl_c() => Err(ConsoleError::Interrupted),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_console_replays_then_closes() {
        let console = ScriptedConsole::new(["123456"]);

        assert_eq!(console.read_line("code").await.unwrap(), "123456");
        assert!(matches!(
            console.read_line("code").await,
            Err(ConsoleError::Unavailable(_))
        ));
        assert_eq!(console.reads(), 2);
        assert_eq!(console.prompts(), vec!["code", "code"]);
    }

    #[tokio::test]
    async fn test_until_interrupted_returns_finished_work() {
        let output = until_interrupted(async { 7 }, std::future::pending::<()>()).await;
        assert_eq!(output, Ok(7));
    }

    #[tokio::test]
    async fn test_until_interrupted_stops_pending_work() {
        let output = until_interrupted(std::future::pending::<u32>(), async {}).await;
        assert_eq!(output, Err(ConsoleError::Interrupted));
    }
}
