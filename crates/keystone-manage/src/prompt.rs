//! Declarative option prompting.
//!
//! # Design
//! - Options that may be prompted for are described by an [`OptionSpec`];
//!   [`fill`] resolves each one before the command runs.
//! - Terminal access sits behind [`Prompter`] so the rules (empty input,
//!   confirmation, attempt limit) are testable without a TTY.
//! - Without an interactive stdin, a missing value is a validation error.

use std::io::{self, BufRead, IsTerminal, Write};

use crate::error::{CliError, CliResult, io_failure};

/// Attempts allowed before prompting gives up.
pub(crate) const MAX_PROMPT_ATTEMPTS: usize = 3;

const CONFIRM_PROMPT: &str = "Repeat for confirmation";

/// How an option is prompted for when it was not supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct OptionSpec {
    /// Long flag name, without dashes.
    pub(crate) name: &'static str,
    /// Text shown before reading.
    pub(crate) prompt: &'static str,
    /// Hide input while typing.
    pub(crate) secret: bool,
    /// Ask twice and require both entries to match.
    pub(crate) confirm: bool,
}

/// Source of operator input.
pub(crate) trait Prompter {
    /// Whether an operator can answer prompts.
    fn is_interactive(&self) -> bool;

    /// Show `prompt` and read one line, without its line terminator.
    fn read(&mut self, prompt: &str, secret: bool) -> io::Result<String>;

    /// Report a rejected entry.
    fn warn(&mut self, message: &str);
}

/// Prompter backed by the controlling terminal.
pub(crate) struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn is_interactive(&self) -> bool {
        io::stdin().is_terminal()
    }

    fn read(&mut self, prompt: &str, secret: bool) -> io::Result<String> {
        let label = format!("{prompt}: ");
        if secret {
            return rpassword::prompt_password(label);
        }
        let mut stdout = io::stdout();
        stdout.write_all(label.as_bytes())?;
        stdout.flush()?;
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed"));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn warn(&mut self, message: &str) {
        eprintln!("Error: {message}");
    }
}

/// Resolve `spec` from `supplied`, prompting through `prompter` when absent.
pub(crate) fn fill(
    spec: &OptionSpec,
    supplied: Option<String>,
    prompter: &mut dyn Prompter,
) -> CliResult<String> {
    if let Some(value) = supplied {
        if value.trim().is_empty() {
            return Err(CliError::validation(format!(
                "--{} cannot be empty",
                spec.name
            )));
        }
        return Ok(value);
    }
    if !prompter.is_interactive() {
        return Err(CliError::validation(format!(
            "--{name} is required; supply --{name} when running non-interactively",
            name = spec.name
        )));
    }

    for _ in 0..MAX_PROMPT_ATTEMPTS {
        let value = read_value(spec, spec.prompt, prompter)?;
        if value.trim().is_empty() {
            prompter.warn("the value cannot be empty");
            continue;
        }
        if spec.confirm {
            let repeated = read_value(spec, CONFIRM_PROMPT, prompter)?;
            if repeated != value {
                prompter.warn("the two entered values do not match");
                continue;
            }
        }
        return Ok(value);
    }
    Err(CliError::validation(format!(
        "--{} not provided after {MAX_PROMPT_ATTEMPTS} attempts",
        spec.name
    )))
}

fn read_value(spec: &OptionSpec, prompt: &str, prompter: &mut dyn Prompter) -> CliResult<String> {
    let value = prompter
        .read(prompt, spec.secret)
        .map_err(|err| io_failure(&format!("read --{}", spec.name), err))?;
    Ok(if spec.secret {
        value
    } else {
        value.trim().to_string()
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::commands::superuser::{EMAIL, PASSWORD};
    use std::collections::VecDeque;

    /// Prompter that replays canned answers.
    pub(crate) struct ScriptedPrompter {
        pub(crate) interactive: bool,
        pub(crate) answers: VecDeque<String>,
        pub(crate) prompts: Vec<String>,
        pub(crate) warnings: Vec<String>,
    }

    impl ScriptedPrompter {
        pub(crate) fn new(answers: &[&str]) -> Self {
            Self {
                interactive: true,
                answers: answers.iter().map(|answer| (*answer).to_string()).collect(),
                prompts: Vec::new(),
                warnings: Vec::new(),
            }
        }
    }

    impl Prompter for ScriptedPrompter {
        fn is_interactive(&self) -> bool {
            self.interactive
        }

        fn read(&mut self, prompt: &str, _secret: bool) -> io::Result<String> {
            self.prompts.push(prompt.to_string());
            self.answers
                .pop_front()
                .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "script exhausted"))
        }

        fn warn(&mut self, message: &str) {
            self.warnings.push(message.to_string());
        }
    }

    #[test]
    fn supplied_values_skip_prompting() {
        let mut prompter = ScriptedPrompter::new(&[]);
        let value = fill(&EMAIL, Some("a@x.com".into()), &mut prompter);
        assert_eq!(value.ok().as_deref(), Some("a@x.com"));
        assert!(prompter.prompts.is_empty());
    }

    #[test]
    fn supplied_empty_value_is_rejected() {
        let mut prompter = ScriptedPrompter::new(&[]);
        let err = fill(&EMAIL, Some("  ".into()), &mut prompter).err();
        assert!(matches!(err, Some(CliError::Validation(_))));
    }

    #[test]
    fn missing_value_is_prompted_and_trimmed() {
        let mut prompter = ScriptedPrompter::new(&[" a@x.com "]);
        let value = fill(&EMAIL, None, &mut prompter);
        assert_eq!(value.ok().as_deref(), Some("a@x.com"));
        assert_eq!(prompter.prompts, ["Enter email"]);
    }

    #[test]
    fn non_interactive_missing_value_is_validation_error() {
        let mut prompter = ScriptedPrompter::new(&["ignored"]);
        prompter.interactive = false;
        let err = fill(&EMAIL, None, &mut prompter).err();
        assert!(matches!(err, Some(CliError::Validation(ref msg)) if msg.contains("--email")));
        assert!(prompter.prompts.is_empty());
    }

    #[test]
    fn secret_mismatch_reprompts_then_succeeds() {
        let mut prompter = ScriptedPrompter::new(&["secret", "secert", "secret", "secret"]);
        let value = fill(&PASSWORD, None, &mut prompter);
        assert_eq!(value.ok().as_deref(), Some("secret"));
        assert_eq!(
            prompter.prompts,
            [
                "Enter password",
                CONFIRM_PROMPT,
                "Enter password",
                CONFIRM_PROMPT
            ]
        );
        assert_eq!(prompter.warnings, ["the two entered values do not match"]);
    }

    #[test]
    fn attempts_are_bounded() {
        let mut prompter = ScriptedPrompter::new(&["a", "b", "", "c", "d"]);
        let err = fill(&PASSWORD, None, &mut prompter).err();
        assert!(matches!(err, Some(CliError::Validation(_))));
        assert_eq!(prompter.warnings.len(), MAX_PROMPT_ATTEMPTS);
        assert!(prompter.answers.is_empty());
    }

    #[test]
    fn closed_input_is_a_failure() {
        let mut prompter = ScriptedPrompter::new(&[]);
        let err = fill(&EMAIL, None, &mut prompter).err();
        assert!(matches!(err, Some(CliError::Failure(_))));
    }
}
