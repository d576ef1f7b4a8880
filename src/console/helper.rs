//! Rustyline integration for the console.
//!
//! `CommandHelper` completes action tokens and meta commands at the start of
//! the line and hints an action's description once its token is typed.
//! `EditorPrompter` adapts a rustyline `Editor` to the session's `Prompter`.

use std::borrow::Cow;

use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Context, Editor, Helper, Result};

use super::{ConsoleError, Prompter, META_COMMANDS};
use crate::action::Catalog;

const RESET: &str = "\x1b[0m";
const HINT_COLOR: &str = "\x1b[2m"; // dim
const PROMPT_COLOR: &str = "\x1b[1;32m"; // bold green

/// Rustyline helper that completes commands for the console
pub struct CommandHelper {
    /// (command, description) in help order
    commands: Vec<(String, String)>,
}

impl CommandHelper {
    pub fn new(catalog: &Catalog) -> Self {
        let commands = META_COMMANDS
            .iter()
            .map(|(c, d)| ((*c).to_string(), (*d).to_string()))
            .chain(
                catalog
                    .iter()
                    .map(|a| (a.token.to_string(), a.description.to_string())),
            )
            .collect();
        CommandHelper { commands }
    }

    /// Commands starting with `prefix`, ignoring case
    pub fn candidates(&self, prefix: &str) -> Vec<&str> {
        let prefix = prefix.to_lowercase();
        self.commands
            .iter()
            .map(|(c, _)| c.as_str())
            .filter(|c| c.to_lowercase().starts_with(&prefix))
            .collect()
    }

    fn description(&self, command: &str) -> Option<&str> {
        self.commands
            .iter()
            .find(|(c, _)| c.eq_ignore_ascii_case(command))
            .map(|(_, d)| d.as_str())
    }
}

impl Helper for CommandHelper {}

impl Completer for CommandHelper {
    type Candidate = Pair;

    fn complete(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Result<(usize, Vec<Pair>)> {
        let typed = &line[..pos];
        if typed.contains(char::is_whitespace) {
            return Ok((pos, Vec::new()));
        }
        let pairs = self
            .candidates(typed)
            .into_iter()
            .map(|c| Pair {
                display: c.to_string(),
                replacement: c.to_string(),
            })
            .collect();
        Ok((0, pairs))
    }
}

impl Hinter for CommandHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        if pos < line.len() {
            return None;
        }
        self.description(line.trim()).map(|d| format!("  {d}"))
    }
}

impl Validator for CommandHelper {
    fn validate(&self, _ctx: &mut ValidationContext<'_>) -> Result<ValidationResult> {
        Ok(ValidationResult::Valid(None))
    }
}

impl Highlighter for CommandHelper {
    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(format!("{HINT_COLOR}{hint}{RESET}"))
    }

    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(
        &'s self,
        prompt: &'p str,
        _default: bool,
    ) -> Cow<'b, str> {
        if prompt.is_empty() {
            Cow::Borrowed(prompt)
        } else {
            Cow::Owned(format!("{PROMPT_COLOR}{prompt}{RESET}"))
        }
    }
}

/// `Prompter` backed by a rustyline editor with history
pub struct EditorPrompter {
    editor: Editor<CommandHelper, DefaultHistory>,
}

impl EditorPrompter {
    pub fn new(catalog: &Catalog) -> std::result::Result<Self, ConsoleError> {
        let mut editor = Editor::<CommandHelper, DefaultHistory>::new()
            .map_err(|e| ConsoleError::Readline(e.to_string()))?;
        editor.set_helper(Some(CommandHelper::new(catalog)));
        Ok(EditorPrompter { editor })
    }
}

impl Prompter for EditorPrompter {
    fn read_line(&mut self, prompt: &str) -> std::result::Result<Option<String>, ConsoleError> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.editor.add_history_entry(line.as_str());
                }
                Ok(Some(line))
            }
            Err(ReadlineError::Eof | ReadlineError::Interrupted) => Ok(None),
            Err(e) => Err(ConsoleError::Readline(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidates_include_meta_and_tokens() {
        let helper = CommandHelper::new(&Catalog::game_store());
        assert_eq!(helper.candidates("he"), vec!["help"]);
        let lf: Vec<&str> = helper.candidates("LF");
        assert_eq!(lf, vec!["lfr", "lfd"]);
        assert!(helper.candidates("zzz").is_empty());
    }

    #[test]
    fn test_empty_prefix_lists_everything() {
        let catalog = Catalog::game_store();
        let helper = CommandHelper::new(&catalog);
        assert_eq!(helper.candidates("").len(), META_COMMANDS.len() + catalog.len());
    }

    #[test]
    fn test_description_lookup() {
        let helper = CommandHelper::new(&Catalog::game_store());
        assert_eq!(helper.description("FU"), Some("have userA follow userB"));
        assert_eq!(helper.description("nope"), None);
    }

    #[test]
    fn test_highlight_hint_is_dimmed() {
        let helper = CommandHelper::new(&Catalog::game_store());
        let hinted = helper.highlight_hint("  create account");
        assert!(hinted.starts_with(HINT_COLOR));
        assert!(hinted.ends_with(RESET));
    }
}
