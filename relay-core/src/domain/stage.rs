//! Stage domain types

use serde::{Deserialize, Serialize};

/// One resolved stage of a run pipeline
///
/// The argument list is passed to the program verbatim; it is never
/// joined into a shell string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSpec {
    /// Human-readable name used in logs ("Train", "Render", ...)
    pub name: String,
    pub program: String,
    pub args: Vec<String>,
}

impl StageSpec {
    pub fn new(name: impl Into<String>, program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args,
        }
    }

    /// The command as it is written to run logs
    ///
    /// Arguments that are empty or contain whitespace are single-quoted so
    /// the logged line stays unambiguous.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(quote)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn quote(word: &str) -> String {
    if !word.is_empty() && !word.chars().any(char::is_whitespace) {
        return word.to_string();
    }
    format!("'{}'", word.replace('\'', r"'\''"))
}
