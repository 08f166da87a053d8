//! Line commands read by the terminal client.

use std::str::FromStr;

use crate::{error::ClientError, state::game::Choice};

/// One user action typed on stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `register <name>`
    Register(String),
    /// `select <A-D>`
    Select(Choice),
    /// `submit`
    Submit,
    /// `start-registration`
    StartRegistration,
    /// `start-game`
    StartGame,
    /// `start-first-question`
    StartFirstQuestion,
    /// `next`
    NextQuestion,
    /// `status`
    Status,
    /// `help`
    Help,
    /// `quit`
    Quit,
}

/// Usage text printed by `help`.
pub const USAGE: &str = "\
commands:
  register <name>        register as a participant
  select <A-D>           select an answer for the current question
  submit                 submit the selected answer
  start-registration     (host) open registration
  start-game             (host) start the game
  start-first-question   (host) show the first question
  next                   (host) move to the next question
  status                 print the current session
  help                   show this message
  quit                   leave the session";

impl FromStr for Command {
    type Err = ClientError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        let command = match verb.to_ascii_lowercase().as_str() {
            "register" if !rest.is_empty() => Command::Register(rest.to_string()),
            "register" => {
                return Err(ClientError::InvalidInput("usage: register <name>".into()));
            }
            "select" => Command::Select(rest.parse()?),
            "submit" => Command::Submit,
            "start-registration" => Command::StartRegistration,
            "start-game" => Command::StartGame,
            "start-first-question" => Command::StartFirstQuestion,
            "next" | "next-question" => Command::NextQuestion,
            "status" => Command::Status,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            "" => return Err(ClientError::InvalidInput("empty command".into())),
            other => {
                return Err(ClientError::InvalidInput(format!(
                    "unknown command `{other}` (try `help`)"
                )));
            }
        };

        Ok(command)
    }
}
