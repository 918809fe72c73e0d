// Terminal plumbing: line prompts, the browser, the wait spinner and the
// width used for truncating output.

use std::io::{self, BufRead, IsTerminal, StdinLock, Stdout, Write};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use crate::error::{Error, Result};

/// Interval between two spinner frames.
pub const SPINNER_TICK: Duration = Duration::from_millis(250);

/// Where prompts are answered and messages printed.
pub trait Console {
    /// Show `prompt` and read one line of input, without the line ending.
    fn read_line(&mut self, prompt: &str) -> Result<String>;

    fn println(&mut self, line: &str) -> Result<()>;
}

/// Console over any reader/writer pair. Used for piped stdin and in tests.
pub struct LineConsole<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LineConsole<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn output(&self) -> &W {
        &self.output
    }
}

impl<R: BufRead, W: Write> Console for LineConsole<R, W> {
    fn read_line(&mut self, prompt: &str) -> Result<String> {
        write!(self.output, "{prompt}: ")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(Error::InputClosed);
        }
        Ok(line.trim_end_matches(['\n', '\r']).to_string())
    }

    fn println(&mut self, line: &str) -> Result<()> {
        writeln!(self.output, "{line}")?;
        Ok(())
    }
}

/// The process's own terminal. Prompts go through `dialoguer` when stdin is
/// a TTY and fall back to plain line reading when it is piped.
pub enum TerminalConsole {
    Interactive,
    Piped(LineConsole<StdinLock<'static>, Stdout>),
}

impl TerminalConsole {
    pub fn new() -> Self {
        if io::stdin().is_terminal() {
            TerminalConsole::Interactive
        } else {
            TerminalConsole::Piped(LineConsole::new(io::stdin().lock(), io::stdout()))
        }
    }
}

impl Default for TerminalConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl Console for TerminalConsole {
    fn read_line(&mut self, prompt: &str) -> Result<String> {
        match self {
            TerminalConsole::Interactive => Ok(Input::<String>::new()
                .with_prompt(prompt)
                .allow_empty(true)
                .interact_text()?),
            TerminalConsole::Piped(console) => console.read_line(prompt),
        }
    }

    fn println(&mut self, line: &str) -> Result<()> {
        match self {
            TerminalConsole::Interactive => {
                writeln!(io::stdout(), "{line}")?;
                Ok(())
            }
            TerminalConsole::Piped(console) => console.println(line),
        }
    }
}

/// Opens URLs for the operator.
pub trait Browser {
    fn open(&mut self, url: &str);
}

/// The desktop's default browser. Failing to launch it is not fatal: the
/// URL is always printed as well.
#[derive(Debug, Default)]
pub struct SystemBrowser;

impl Browser for SystemBrowser {
    fn open(&mut self, url: &str) {
        if let Err(e) = open::that(url) {
            warn!(url, error = %e, "could not open browser");
        }
    }
}

/// Current terminal width in columns, or `fallback` when it is unknown.
pub fn terminal_width(fallback: usize) -> usize {
    match crossterm::terminal::size() {
        Ok((cols, _)) if cols > 0 => usize::from(cols),
        _ => fallback,
    }
}

/// Colors are only written when stdout is a terminal.
pub fn color_enabled() -> bool {
    io::stdout().is_terminal()
}

/// Run `task` on a helper thread and animate a spinner on this one until
/// it returns. The task cannot be cancelled and has no timeout.
pub fn with_spinner<T, F>(message: &str, task: F) -> T
where
    F: FnOnce() -> T + Send,
    T: Send,
{
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{msg} {spinner}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("|/-\\ "),
    );
    spinner.set_message(message.to_string());

    thread::scope(|scope| {
        let (tx, rx) = mpsc::channel();
        let worker = scope.spawn(move || {
            // The receiver outlives the worker, so this cannot fail.
            let _ = tx.send(task());
        });

        loop {
            match rx.recv_timeout(SPINNER_TICK) {
                Ok(value) => {
                    spinner.finish_with_message(format!("{message} done!"));
                    return value;
                }
                Err(RecvTimeoutError::Timeout) => spinner.tick(),
                Err(RecvTimeoutError::Disconnected) => {
                    spinner.abandon();
                    // The worker panicked before sending; re-raise it here.
                    match worker.join() {
                        Err(panic) => std::panic::resume_unwind(panic),
                        Ok(()) => unreachable!("worker exited without sending a result"),
                    }
                }
            }
        }
    })
}
