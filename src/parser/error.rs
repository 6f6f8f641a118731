//! User-friendly script load error type and formatting.
//!
//! A malformed annotation line aborts the whole load; the error carries the
//! source identifier and the literal offending line so the user can correct
//! the script.

use std::fmt;

/// A structured error for an annotation line that could not be classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptParseError {
    /// Human-readable error message.
    pub message: String,
    /// Source identifier shown in the error header (file path or `<script>`).
    pub source_name: String,
    /// Line number (1-indexed).
    pub line: usize,
    /// The literal offending line, including its `##` prefix.
    pub line_text: String,
    /// Optional suggestion to help the user fix the line.
    pub hint: Option<String>,
}

impl ScriptParseError {
    /// Build the error for an annotation line that matched no known form.
    #[must_use]
    pub fn malformed(source_name: &str, line: usize, line_text: &str) -> Self {
        ScriptParseError {
            message: "annotation line is not a recognised flag, override, parameter \
                      or output declaration"
                .to_string(),
            source_name: source_name.to_string(),
            line,
            line_text: line_text.to_string(),
            hint: hint_for(line_text),
        }
    }
}

/// Return an actionable hint based on the shape of the offending line.
fn hint_for(line_text: &str) -> Option<String> {
    let stripped = line_text.trim_start_matches('#');

    if !stripped.contains('=') {
        return Some(
            "An annotation is either a flag (`##showplots`, `##dontuserasterpackage`, \
             `##passfilenames`) or a declaration of the form `##identifier=type`."
                .to_string(),
        );
    }

    Some(
        "Declarations look like `##layer=raster`, `##size=number 10`, or \
         `##result=output vector`. Check the type keyword and its arguments."
            .to_string(),
    )
}

impl fmt::Display for ScriptParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // ── error header ────────────────────────────────────────────────────
        //   error: <message>
        //     --> <source>:<line>
        writeln!(f, "error: {}", self.message)?;
        writeln!(f, "  --> {}:{}", self.source_name, self.line)?;

        // ── source context ──────────────────────────────────────────────────
        //    |
        // NN | <offending line>
        //    |
        let num = self.line.to_string();
        let pad = " ".repeat(num.len());
        writeln!(f, "   {pad} |")?;
        writeln!(f, "   {num} | {}", self.line_text)?;
        writeln!(f, "   {pad} |")?;

        if let Some(ref hint) = self.hint {
            writeln!(f)?;
            write!(f, "   = hint: {hint}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ScriptParseError {}

// ── Tests ─────────────────────────────────────────────────────────────────────
