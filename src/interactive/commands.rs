//! Keyboard commands for the interactive loop.

use crossbeam_channel::{Receiver, TryRecvError};
use std::collections::VecDeque;
use std::io::BufRead;
use std::thread;

/// A command typed by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// `p`: pause or resume listening
    TogglePause,
    /// `h`: show recent translations
    ShowHistory,
    /// `q`: quit
    Quit,
}

impl ControlCommand {
    /// Parse one line of input. Unknown input is ignored.
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "p" => Some(Self::TogglePause),
            "h" => Some(Self::ShowHistory),
            "q" => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Non-blocking source of user commands.
pub trait CommandSource: Send {
    /// Next pending command, or `None` if nothing was typed since the last poll.
    fn poll_for_command(&mut self) -> Option<ControlCommand>;
}

/// Commands read line by line from stdin on a background thread.
///
/// EOF on stdin is delivered as [`ControlCommand::Quit`].
pub struct StdinCommands {
    rx: Receiver<ControlCommand>,
}

impl StdinCommands {
    pub fn spawn() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();

        thread::spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if let Some(command) = ControlCommand::parse(&line)
                    && tx.send(command).is_err()
                {
                    return;
                }
            }
            tx.send(ControlCommand::Quit).ok();
        });

        Self { rx }
    }
}

impl CommandSource for StdinCommands {
    fn poll_for_command(&mut self) -> Option<ControlCommand> {
        match self.rx.try_recv() {
            Ok(command) => Some(command),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }
}

/// Replays a fixed script, one entry per poll.
///
/// `None` entries are polls where nothing was typed, so they separate the
/// commands seen by successive loop iterations.
#[derive(Debug, Default)]
pub struct ScriptedCommands {
    script: VecDeque<Option<ControlCommand>>,
}

impl ScriptedCommands {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, command: ControlCommand) -> Self {
        self.script.push_back(Some(command));
        self
    }

    /// An empty poll; the loop runs one iteration before seeing the rest.
    pub fn then_idle(mut self) -> Self {
        self.script.push_back(None);
        self
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl CommandSource for ScriptedCommands {
    fn poll_for_command(&mut self) -> Option<ControlCommand> {
        self.script.pop_front().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_letters() {
        assert_eq!(ControlCommand::parse("p"), Some(ControlCommand::TogglePause));
        assert_eq!(ControlCommand::parse("H\n"), Some(ControlCommand::ShowHistory));
        assert_eq!(ControlCommand::parse("  q "), Some(ControlCommand::Quit));
    }

    #[test]
    fn test_parse_ignores_other_input() {
        assert_eq!(ControlCommand::parse(""), None);
        assert_eq!(ControlCommand::parse("pause"), None);
        assert_eq!(ControlCommand::parse("x"), None);
    }

    #[test]
    fn test_scripted_commands_replay_with_idle_polls() {
        let mut source = ScriptedCommands::new()
            .then(ControlCommand::TogglePause)
            .then_idle()
            .then(ControlCommand::Quit);

        assert_eq!(source.poll_for_command(), Some(ControlCommand::TogglePause));
        assert_eq!(source.poll_for_command(), None);
        assert_eq!(source.poll_for_command(), Some(ControlCommand::Quit));
        assert_eq!(source.poll_for_command(), None);
        assert_eq!(source.remaining(), 0);
    }
}
