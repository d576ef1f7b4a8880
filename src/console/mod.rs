//! # Console Front End
//!
//! The interactive command loop behind the `vapor` binary. A `Session`
//! reads commands through a `Prompter`, collects and validates one value per
//! parameter, invokes the action on its connection and prints the outcome.
//!
//! Commands:
//! - `help` lists the meta commands and every action token
//! - `exit` quits after a `yes` confirmation
//! - `cancel`, while filling out fields, abandons the current action
//! - any action token runs that action

pub mod helper;
pub mod table;

use std::io::{self, Write};

use crate::action::{Action, Catalog};
use crate::backend::Connection;
use crate::invoke::{invoke, Arguments, Outcome};

pub use helper::{CommandHelper, EditorPrompter};
pub use table::render_table;

pub const GREETING: &str = "Welcome to the Vapor Game Store CLI";
pub const COMMAND_PROMPT: &str = "Enter a command: ";
pub const EXIT_PROMPT: &str = "Confirm exit (yes): ";
pub const CANCEL_PROMPT: &str = "Cancel the command (Y) or treat as input (i)?: ";
pub const META_COMMANDS: [(&str, &str); 3] = [
    ("help", "print list of commands"),
    ("exit", "quit the application"),
    ("cancel", "while filling out fields, cancel the command"),
];

#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Line editor error: {0}")]
    Readline(String),
}

/// Source of user input lines
pub trait Prompter {
    /// Show `prompt` and read one line. `None` means input is exhausted
    /// (end of file or interrupt).
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>, ConsoleError>;
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The user confirmed `exit`
    Exited,
    /// Input ran out
    EndOfInput,
    /// The database connection became unusable
    ConnectionLost,
}

enum Collected {
    Arguments(Arguments),
    Cancelled,
    EndOfInput,
}

/// One interactive console session over a single connection
pub struct Session<'a, P, W> {
    catalog: &'a Catalog,
    prompter: P,
    out: W,
    connection: Box<dyn Connection>,
}

impl<'a, P: Prompter, W: Write> Session<'a, P, W> {
    pub fn new(catalog: &'a Catalog, prompter: P, out: W, connection: Box<dyn Connection>) -> Self {
        Session {
            catalog,
            prompter,
            out,
            connection,
        }
    }

    /// Run commands until the user exits, input ends or the connection is
    /// lost. The connection is closed on every path.
    pub async fn run(mut self) -> Result<SessionEnd, ConsoleError> {
        let result = self.command_loop().await;
        self.connection.close().await;
        tracing::info!(end = ?result.as_ref().ok(), "session_closed");
        result
    }

    /// Consume the session and return its output writer
    pub fn into_output(self) -> W {
        self.out
    }

    async fn command_loop(&mut self) -> Result<SessionEnd, ConsoleError> {
        writeln!(self.out, "{GREETING}")?;
        writeln!(self.out, "Enter 'help' for a list of commands, 'exit' to quit.")?;

        loop {
            let Some(line) = self.prompter.read_line(COMMAND_PROMPT)? else {
                return Ok(SessionEnd::EndOfInput);
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if line.eq_ignore_ascii_case("help") {
                self.print_help()?;
                continue;
            }

            if line.eq_ignore_ascii_case("exit") {
                match self.prompter.read_line(EXIT_PROMPT)? {
                    Some(answer) if answer.trim().eq_ignore_ascii_case("yes") => {
                        return Ok(SessionEnd::Exited)
                    }
                    Some(_) => continue,
                    None => return Ok(SessionEnd::EndOfInput),
                }
            }

            let catalog = self.catalog;
            let Some(action) = catalog.lookup(line) else {
                writeln!(self.out, "Invalid action, try again")?;
                continue;
            };

            let arguments = match self.collect_arguments(action)? {
                Collected::Arguments(arguments) => arguments,
                Collected::Cancelled => continue,
                Collected::EndOfInput => return Ok(SessionEnd::EndOfInput),
            };

            if !self.perform(action, &arguments).await? {
                writeln!(self.out, "Database error occurred, exiting.")?;
                return Ok(SessionEnd::ConnectionLost);
            }
        }
    }

    fn print_help(&mut self) -> io::Result<()> {
        writeln!(self.out, "Available commands: [Command : Description]")?;
        let entries = META_COMMANDS
            .iter()
            .copied()
            .chain(self.catalog.iter().map(|a| (a.token, a.description)));
        for (command, description) in entries {
            writeln!(self.out, "   {command:<7}|  {description}")?;
        }
        Ok(())
    }

    /// Prompt for each parameter in declared order, re-prompting until the
    /// value passes validation
    fn collect_arguments(&mut self, action: &Action) -> Result<Collected, ConsoleError> {
        let mut arguments = Arguments::with_capacity(action.parameters.len());

        for param in &action.parameters {
            let prompt = format!("Enter value for '{}': ", param.display_label);
            loop {
                let Some(input) = self.prompter.read_line(&prompt)? else {
                    return Ok(Collected::EndOfInput);
                };
                let input = input.trim().to_string();

                if input.eq_ignore_ascii_case("cancel") {
                    match self.confirm_cancel()? {
                        Some(true) => return Ok(Collected::Cancelled),
                        Some(false) => {}
                        None => return Ok(Collected::EndOfInput),
                    }
                }

                match param.validate(&input) {
                    Ok(()) => {
                        arguments.insert(param.binding_name.to_string(), input);
                        break;
                    }
                    Err(rejection) => writeln!(self.out, "Error: {rejection}")?,
                }
            }
        }

        Ok(Collected::Arguments(arguments))
    }

    /// `Some(true)` to cancel, `Some(false)` to keep the literal input
    fn confirm_cancel(&mut self) -> Result<Option<bool>, ConsoleError> {
        loop {
            let Some(answer) = self.prompter.read_line(CANCEL_PROMPT)? else {
                return Ok(None);
            };
            let answer = answer.trim();
            if answer.eq_ignore_ascii_case("y") {
                return Ok(Some(true));
            }
            if answer.eq_ignore_ascii_case("i") {
                return Ok(Some(false));
            }
        }
    }

    /// Invoke and print the outcome. Returns false once the connection is no
    /// longer usable.
    async fn perform(&mut self, action: &Action, arguments: &Arguments) -> Result<bool, ConsoleError> {
        let outcome = match invoke(action, arguments, self.connection.as_mut()).await {
            Ok(outcome) => outcome,
            Err(e) => {
                writeln!(self.out, "Error occurred while performing command: {e}")?;
                return Ok(true);
            }
        };

        match outcome {
            Outcome::Rows { table } => {
                writeln!(self.out, "Results for: {}", action.description)?;
                for line in render_table(&table) {
                    writeln!(self.out, "{line}")?;
                }
            }
            Outcome::Empty { .. } => {
                writeln!(self.out, "Results for: {}", action.description)?;
                writeln!(self.out, "No results")?;
            }
            Outcome::Success {
                generated_id: Some(id),
            } => writeln!(self.out, "ID of new item: {id}")?,
            Outcome::Success { generated_id: None } => {}
            Outcome::Failure {
                message,
                connection_lost,
            } => {
                writeln!(self.out, "Error occurred while performing command: {message}")?;
                if connection_lost || !self.connection.is_usable() {
                    return Ok(false);
                }
            }
        }

        Ok(true)
    }
}
