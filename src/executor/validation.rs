// ABOUTME: Pre-spawn command validation for the CLI sandbox.
// ABOUTME: Fixed allow/deny verb lists plus shell-metacharacter rejection.

use thiserror::Error;

/// Verbs the sandbox will pass to the platform CLI.
pub const ALLOWED_VERBS: [&str; 16] = [
    "whoami",
    "status",
    "list",
    "init",
    "link",
    "up",
    "add",
    "redeploy",
    "restart",
    "down",
    "domain",
    "logs",
    "variable",
    "environment",
    "service",
    "connect",
];

/// Verbs rejected outright. Checked before the allow-list so they stay denied
/// even if one were ever added there.
pub const DENIED_VERBS: [&str; 7] = ["login", "logout", "open", "delete", "ssh", "shell", "run"];

/// Characters that would let a command string escape into shell evaluation.
pub const SHELL_METACHARACTERS: [char; 9] = [';', '&', '|', '`', '$', '(', ')', '{', '}'];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("command cannot be empty")]
    Empty,

    #[error("command contains forbidden shell metacharacter '{0}'")]
    ShellMetacharacter(char),

    #[error("command verb '{0}' is explicitly denied")]
    Denied(String),

    #[error("command verb '{0}' is not on the allow-list")]
    NotAllowed(String),
}

/// Validate a command string before anything is spawned.
///
/// The whole string is scanned for metacharacters, not just the verb: an
/// allowed verb followed by `; rm -rf` must still be rejected.
pub fn validate_command(command: &str) -> Result<(), ValidationError> {
    let trimmed = command.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty);
    }

    if let Some(c) = command.chars().find(|c| SHELL_METACHARACTERS.contains(c)) {
        return Err(ValidationError::ShellMetacharacter(c));
    }

    let verb = match trimmed.split_whitespace().next() {
        Some(verb) => verb,
        None => return Err(ValidationError::Empty),
    };

    if DENIED_VERBS.contains(&verb) {
        return Err(ValidationError::Denied(verb.to_string()));
    }
    if !ALLOWED_VERBS.contains(&verb) {
        return Err(ValidationError::NotAllowed(verb.to_string()));
    }
    Ok(())
}
