//! Operator command reader.
//!
//! Reads lines from stdin on a dedicated OS thread; a blocking read there
//! cannot hold up the async runtime.

use std::io::{BufRead, Write};
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

use crate::scheduler::ShutdownSignal;

/// Prompt printed before each read.
pub const PROMPT: &str = "action: -> ";

/// Whether a line is a shutdown command (`exit` or `quit`, any case).
pub fn is_exit_command(line: &str) -> bool {
    let command = line.trim();
    command.eq_ignore_ascii_case("exit") || command.eq_ignore_ascii_case("quit")
}

/// Read commands until a shutdown command or end of input.
///
/// Returns `true` if shutdown was triggered. End of input or a read error
/// ends the reader without triggering shutdown.
pub fn watch_commands<R: BufRead, W: Write>(
    mut input: R,
    mut prompt: W,
    shutdown: &ShutdownSignal,
) -> bool {
    let mut line = String::new();
    loop {
        if write!(prompt, "{PROMPT}").and_then(|_| prompt.flush()).is_err() {
            debug!("Operator prompt could not be written");
        }

        line.clear();
        match input.read_line(&mut line) {
            Ok(0) => {
                debug!("Operator input closed");
                return false;
            }
            Ok(_) if is_exit_command(&line) => {
                info!("Operator requested shutdown");
                shutdown.trigger();
                return true;
            }
            Ok(_) => debug!("Ignoring operator input: {:?}", line.trim()),
            Err(e) => {
                warn!("Operator input failed: {}", e);
                return false;
            }
        }
    }
}

/// Spawn the reader on stdin/stdout.
pub fn spawn(shutdown: ShutdownSignal) -> std::io::Result<JoinHandle<bool>> {
    thread::Builder::new()
        .name("operator".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            watch_commands(stdin.lock(), std::io::stdout(), &shutdown)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn run(input: &str) -> (bool, ShutdownSignal, String) {
        let signal = ShutdownSignal::new();
        let mut prompt = Vec::new();
        let triggered = watch_commands(Cursor::new(input.to_string()), &mut prompt, &signal);
        (triggered, signal, String::from_utf8(prompt).unwrap())
    }

    #[test]
    fn test_exit_commands() {
        assert!(is_exit_command("exit"));
        assert!(is_exit_command("quit\n"));
        assert!(is_exit_command("  EXIT \r\n"));
        assert!(is_exit_command("Quit"));
        assert!(!is_exit_command("exit now"));
        assert!(!is_exit_command("stop"));
        assert!(!is_exit_command(""));
    }

    #[test]
    fn test_exit_triggers_shutdown() {
        let (triggered, signal, prompt) = run("hello\nexit\nnever read\n");
        assert!(triggered);
        assert!(signal.is_triggered());
        assert_eq!(prompt, PROMPT.repeat(2));
    }

    #[test]
    fn test_quit_triggers_shutdown() {
        let (triggered, signal, _) = run("QUIT\n");
        assert!(triggered);
        assert!(signal.is_triggered());
    }

    #[test]
    fn test_eof_does_not_trigger() {
        let (triggered, signal, prompt) = run("status\nhelp\n");
        assert!(!triggered);
        assert!(!signal.is_triggered());
        assert_eq!(prompt, PROMPT.repeat(3));
    }

    #[test]
    fn test_exit_without_newline() {
        let (triggered, _, _) = run("exit");
        assert!(triggered);
    }
}
