//! Interactive input: the virtual host domain and basic auth credentials.
//!
//! The pipeline only sees [`InputSource`]; the terminal implementation lives
//! here and tests substitute canned answers.

use anyhow::{Context, Result};
use nix::sys::signal::{self, sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use nix::sys::termios::{self, LocalFlags, SetArg, Termios};
use std::io::{self, BufRead, Write};
use std::os::fd::{AsFd, BorrowedFd};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};
use zeroize::{Zeroize, ZeroizeOnDrop};

#[cfg(test)]
use mockall::automock;

use crate::error::SetupError;

/// Secure string type that zeroizes memory on drop.
/// Used for the basic auth password.
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct SecureString(String);

impl SecureString {
    pub fn new(s: String) -> Self {
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for SecureString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for SecureString {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SecureString {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Source of operator answers.
#[cfg_attr(test, automock)]
pub trait InputSource {
    /// Show `prompt` and read one line, without its line terminator.
    fn read_line(&self, prompt: &str) -> Result<String>;

    /// Like [`read_line`](Self::read_line) but without echoing the input.
    fn read_secret(&self, prompt: &str) -> Result<SecureString>;
}

/// Reads answers from the controlling terminal (stdin/stdout).
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalInput;

impl TerminalInput {
    fn ask(&self, prompt: &str) -> Result<String> {
        let mut stdout = io::stdout();
        write!(stdout, "{}", prompt)?;
        stdout.flush()?;

        let mut line = String::new();
        let read = io::stdin()
            .lock()
            .read_line(&mut line)
            .context("Failed to read from stdin")?;

        if read == 0 {
            return Err(SetupError::InputClosed(prompt.trim_end().to_string()).into());
        }

        strip_line_ending(&mut line);
        Ok(line)
    }
}

impl InputSource for TerminalInput {
    fn read_line(&self, prompt: &str) -> Result<String> {
        self.ask(prompt)
    }

    fn read_secret(&self, prompt: &str) -> Result<SecureString> {
        let guard = EchoGuard::disable();
        if guard.is_none() {
            debug!("stdin is not a terminal, reading secret without disabling echo");
        }

        let answer = self.ask(prompt).map(SecureString::new);
        drop(guard);
        answer
    }
}

/// Truncate a trailing `\n` or `\r\n` in place, so no copy of a secret is made.
fn strip_line_ending(line: &mut String) {
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
}

/// Signals that end a run while a secret is being typed.
const INTERRUPTS: [Signal; 2] = [Signal::SIGINT, Signal::SIGTERM];

/// Whether ECHONL was on before [`EchoGuard`] forced it on.
static ECHONL_WAS_SET: AtomicBool = AtomicBool::new(false);

/// Turns terminal echo off for its lifetime and restores the previous
/// settings on drop, or from a signal handler if the run is interrupted.
struct EchoGuard {
    original: Termios,
    _interrupts: InterruptHook,
}

impl EchoGuard {
    /// `None` when stdin is not a terminal.
    fn disable() -> Option<Self> {
        let stdin = io::stdin();
        let original = termios::tcgetattr(stdin.as_fd()).ok()?;
        ECHONL_WAS_SET.store(
            original.local_flags.contains(LocalFlags::ECHONL),
            Ordering::SeqCst,
        );

        // Installed before echo goes off so an interrupt cannot slip between
        let interrupts = InterruptHook::install();

        let mut silent = original.clone();
        silent.local_flags.remove(LocalFlags::ECHO);
        // Still move to a new line when Enter is pressed
        silent.local_flags.insert(LocalFlags::ECHONL);
        termios::tcsetattr(stdin.as_fd(), SetArg::TCSANOW, &silent).ok()?;

        Some(Self {
            original,
            _interrupts: interrupts,
        })
    }
}

impl Drop for EchoGuard {
    fn drop(&mut self) {
        let _ = termios::tcsetattr(io::stdin().as_fd(), SetArg::TCSANOW, &self.original);
    }
}

/// Handlers for [`INTERRUPTS`] that turn echo back on and then let the
/// signal take its default course. The previous handlers come back on drop.
struct InterruptHook {
    previous: Vec<(Signal, SigAction)>,
}

impl InterruptHook {
    fn install() -> Self {
        let action = SigAction::new(
            SigHandler::Handler(restore_echo_and_reraise),
            SaFlags::SA_RESETHAND,
            SigSet::empty(),
        );

        let mut previous = Vec::with_capacity(INTERRUPTS.len());
        for signal in INTERRUPTS {
            // SAFETY: the handler only makes async-signal-safe calls
            // (tcgetattr, tcsetattr, raise) and reads an atomic.
            match unsafe { sigaction(signal, &action) } {
                Ok(old) if old.handler() == SigHandler::SigIgn => {
                    // SAFETY: puts back the disposition the OS just returned
                    let _ = unsafe { sigaction(signal, &old) };
                }
                Ok(old) => previous.push((signal, old)),
                Err(e) => warn!("Failed to install {} handler: {}", signal, e),
            }
        }

        Self { previous }
    }
}

impl Drop for InterruptHook {
    fn drop(&mut self) {
        for (signal, old) in &self.previous {
            // SAFETY: restores the `sigaction` the OS gave us at install time
            let _ = unsafe { sigaction(*signal, old) };
        }
    }
}

extern "C" fn restore_echo_and_reraise(signum: libc::c_int) {
    // SAFETY: fd 0 stays open for the life of the process
    let stdin = unsafe { BorrowedFd::borrow_raw(libc::STDIN_FILENO) };
    if let Ok(mut attrs) = termios::tcgetattr(stdin) {
        attrs.local_flags.insert(LocalFlags::ECHO);
        if !ECHONL_WAS_SET.load(Ordering::SeqCst) {
            attrs.local_flags.remove(LocalFlags::ECHONL);
        }
        let _ = termios::tcsetattr(stdin, SetArg::TCSANOW, &attrs);
    }

    // SA_RESETHAND already put the default action back
    if let Ok(sig) = Signal::try_from(signum) {
        let _ = signal::raise(sig);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secure_string_debug_redacted() {
        let secret = SecureString::new("correct horse".to_string());
        let debug_str = format!("{:?}", secret);
        assert_eq!(debug_str, "[REDACTED]");
        assert!(!debug_str.contains("horse"));
    }

    #[test]
    fn test_secure_string_as_str() {
        let secret = SecureString::from("s3cret");
        assert_eq!(secret.as_str(), "s3cret");
        assert!(!secret.is_empty());
        assert!(SecureString::default().is_empty());
    }

    #[test]
    fn test_secure_string_zeroize() {
        let mut secret = SecureString::from("s3cret");
        secret.zeroize();
        assert!(secret.is_empty());
    }

    #[test]
    fn test_strip_line_ending() {
        for (input, expected) in [
            ("example.com\n", "example.com"),
            ("example.com\r\n", "example.com"),
            ("example.com", "example.com"),
            ("\n", ""),
            ("trailing space \n", "trailing space "),
        ] {
            let mut line = input.to_string();
            strip_line_ending(&mut line);
            assert_eq!(line, expected, "input {:?}", input);
        }
    }

    /// Current disposition of `signal`, read by swapping in a throwaway one.
    fn current_handler(signal: Signal) -> SigHandler {
        let throwaway = SigAction::new(SigHandler::SigDfl, SaFlags::empty(), SigSet::empty());
        let current = unsafe { sigaction(signal, &throwaway) }.unwrap();
        unsafe { sigaction(signal, &current) }.unwrap();
        current.handler()
    }

    #[test]
    fn test_interrupt_hook_installs_and_restores_handlers() {
        let before: Vec<_> = INTERRUPTS.iter().map(|s| current_handler(*s)).collect();

        let hook = InterruptHook::install();
        for signal in INTERRUPTS {
            assert_eq!(
                current_handler(signal),
                SigHandler::Handler(restore_echo_and_reraise),
                "{}",
                signal
            );
        }

        drop(hook);
        let after: Vec<_> = INTERRUPTS.iter().map(|s| current_handler(*s)).collect();
        assert_eq!(after, before);
    }

    #[test]
    fn test_mock_input_source() {
        let mut input = MockInputSource::new();
        input
            .expect_read_line()
            .withf(|prompt| prompt.contains("domain"))
            .returning(|_| Ok("example.com".to_string()));
        input
            .expect_read_secret()
            .returning(|_| Ok(SecureString::from("pw")));

        assert_eq!(input.read_line("Enter domain name: ").unwrap(), "example.com");
        assert_eq!(input.read_secret("Password: ").unwrap().as_str(), "pw");
    }
}
