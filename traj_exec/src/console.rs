//! # Telecommand console
//!
//! Reads telecommands typed on a console, one per line (e.g. `notch b2`), on a background thread
//! and hands them to the executive loop through a channel. Ctrl-C on the interactive console
//! sends a `stop`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, warn};
use rustyline::{error::ReadlineError, DefaultEditor};
use std::io::BufRead;
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::thread;

use comms_if::tc::{Tc, TcParseError};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

const PROMPT: &str = "tc> ";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

pub struct TcConsole {
    receiver: Receiver<String>,
    connected: bool
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TcConsole {
    /// Start an interactive console with line editing and history.
    pub fn interactive() -> Self {
        let (sender, receiver) = channel();

        thread::spawn(move || {
            let mut rl = match DefaultEditor::new() {
                Ok(r) => r,
                Err(e) => {
                    warn!("Cannot open the console: {}", e);
                    return
                }
            };

            loop {
                match rl.readline(PROMPT) {
                    Ok(line) => {
                        rl.add_history_entry(line.as_str()).ok();
                        if sender.send(line).is_err() {
                            break
                        }
                    },
                    Err(ReadlineError::Interrupted) => {
                        sender.send(String::from("stop")).ok();
                        break
                    },
                    Err(ReadlineError::Eof) => break,
                    Err(e) => {
                        warn!("Console read error: {}", e);
                        break
                    }
                }
            }
            debug!("Console input closed");
        });

        Self {
            receiver,
            connected: true
        }
    }

    /// Start reading telecommands from any line based reader.
    pub fn from_reader<R: BufRead + Send + 'static>(reader: R) -> Self {
        let (sender, receiver) = channel();

        thread::spawn(move || {
            for line in reader.lines() {
                let line = match line {
                    Ok(l) => l,
                    Err(e) => {
                        warn!("Console read error: {}", e);
                        break
                    }
                };

                if sender.send(line).is_err() {
                    break
                }
            }
            debug!("Console input closed");
        });

        Self {
            receiver,
            connected: true
        }
    }

    /// Whether the console can still provide new telecommands.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Get all telecommands received since the last call.
    ///
    /// Blank lines are ignored and lines which are not valid telecommands are logged and
    /// dropped.
    pub fn pending_tcs(&mut self) -> Vec<Tc> {
        let mut tcs = Vec::new();

        loop {
            match self.receiver.try_recv() {
                Ok(line) => match Tc::from_console(&line) {
                    Ok(tc) => tcs.push(tc),
                    Err(TcParseError::Empty) => (),
                    Err(e) => warn!("Invalid console TC {:?}: {}", line, e)
                },
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.connected = false;
                    break
                }
            }
        }

        tcs
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;
    use std::time::{Duration, Instant};
    use comms_if::tc::train_ctrl::{ControlMode, Notch};

    #[test]
    fn test_console() {
        let mut console = TcConsole::from_reader(Cursor::new(
            "mode manual\n\nnotch t2\nfly away\nstart\n"
        ));

        // Collect until the reader thread has finished
        let mut tcs = Vec::new();
        let t0 = Instant::now();
        while console.is_connected() && t0.elapsed() < Duration::from_secs(5) {
            tcs.extend(console.pending_tcs());
            thread::sleep(Duration::from_millis(1));
        }

        assert!(!console.is_connected());
        assert_eq!(tcs, vec![
            Tc::Mode { mode: ControlMode::Manual },
            Tc::Notch { notch: Notch::Traction2 },
            Tc::Start
        ]);
    }
}
