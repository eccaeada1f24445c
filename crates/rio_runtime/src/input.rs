//! Line commands from stdin
//!
//! A reader thread parses each line and forwards it over a channel so the
//! tick loop never blocks on the terminal.

use crossbeam_channel::{Receiver, Sender};
use std::io::BufRead;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputCommand {
    /// Steering intent, held until the next steer command
    Steer { thrust: f32, turn: f32 },
    /// Numbered choice: a fork branch, or a dialogue answer while one is open
    Choose(usize),
    /// Move an open dialogue on, or close a trade
    Continue,
    Pause,
    Resume,
    Status,
    Quit,
}

impl InputCommand {
    pub fn parse(line: &str) -> Option<Self> {
        let command = match line.trim().to_lowercase().as_str() {
            "w" | "up" => Self::Steer { thrust: 1.0, turn: 0.0 },
            "s" | "down" => Self::Steer { thrust: -1.0, turn: 0.0 },
            "a" | "left" => Self::Steer { thrust: 0.0, turn: -1.0 },
            "d" | "right" => Self::Steer { thrust: 0.0, turn: 1.0 },
            "wa" => Self::Steer { thrust: 1.0, turn: -1.0 },
            "wd" => Self::Steer { thrust: 1.0, turn: 1.0 },
            "x" | "stop" => Self::Steer { thrust: 0.0, turn: 0.0 },
            "c" | "" => Self::Continue,
            "p" | "pause" => Self::Pause,
            "r" | "resume" => Self::Resume,
            "i" | "status" => Self::Status,
            "q" | "quit" | "exit" => Self::Quit,
            other => match other.parse::<usize>() {
                Ok(n) if (1..=9).contains(&n) => Self::Choose(n - 1),
                _ => return None,
            },
        };
        Some(command)
    }
}

pub const HELP: &str = "w/s/a/d steer, x stop, 1-3 choose, c continue, p pause, r resume, i status, q quit";

/// Start the stdin reader thread
pub fn spawn_stdin_reader() -> std::io::Result<Receiver<InputCommand>> {
    let (tx, rx) = crossbeam_channel::unbounded();
    std::thread::Builder::new()
        .name("rio-stdin".into())
        .spawn(move || read_lines(std::io::stdin().lock(), tx))?;
    Ok(rx)
}

fn read_lines(reader: impl BufRead, tx: Sender<InputCommand>) {
    for line in reader.lines() {
        let Ok(line) = line else {
            break;
        };
        match InputCommand::parse(&line) {
            Some(command) => {
                if tx.send(command).is_err() {
                    break;
                }
            }
            None => log::warn!("Unknown command '{}'. {}", line.trim(), HELP),
        }
    }
    log::debug!("stdin closed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(InputCommand::parse("W"), Some(InputCommand::Steer { thrust: 1.0, turn: 0.0 }));
        assert_eq!(InputCommand::parse(" 2 "), Some(InputCommand::Choose(1)));
        assert_eq!(InputCommand::parse(""), Some(InputCommand::Continue));
        assert_eq!(InputCommand::parse("quit"), Some(InputCommand::Quit));
        assert_eq!(InputCommand::parse("0"), None);
        assert_eq!(InputCommand::parse("jump"), None);
    }

    #[test]
    fn test_reader_forwards_until_eof() {
        let (tx, rx) = crossbeam_channel::unbounded();
        read_lines("d\nbogus\n1\nq\n".as_bytes(), tx);
        let commands: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            commands,
            vec![
                InputCommand::Steer { thrust: 0.0, turn: 1.0 },
                InputCommand::Choose(0),
                InputCommand::Quit,
            ]
        );
    }
}
