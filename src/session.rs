//! Per-run execution session state.
//!
//! A [`RunSession`] owns everything tied to a single interpreter run: the
//! script filename, the console-output filename derived from it, the verbose
//! commands whose output is surfaced, and the plots filename. One session per
//! run, never shared across runs.

use std::path::{Path, PathBuf};

use crate::ast::{ResolvedValues, ScriptDeclaration};
use crate::generator;

#[derive(Debug, Clone)]
pub struct RunSession {
    script_file: PathBuf,
    verbose_commands: Vec<String>,
    plots_file: Option<String>,
}

impl RunSession {
    /// Build the session for one run of `decl` with the given resolved
    /// output destinations.
    #[must_use]
    pub fn new(script_file: PathBuf, decl: &ScriptDeclaration, outputs: &ResolvedValues) -> Self {
        Self {
            script_file,
            verbose_commands: decl.verbose_commands.clone(),
            plots_file: generator::plots_filename(decl, outputs),
        }
    }

    #[must_use]
    pub fn script_file(&self) -> &Path {
        &self.script_file
    }

    /// Where `R CMD BATCH` writes the console transcript.
    #[must_use]
    pub fn console_output_file(&self) -> PathBuf {
        let mut name = self.script_file.clone().into_os_string();
        name.push(".Rout");
        PathBuf::from(name)
    }

    /// The PNG file the plotting device writes to, when plots are captured.
    #[must_use]
    pub fn plots_file(&self) -> Option<&str> {
        self.plots_file.as_deref()
    }

    /// Isolate the console transcript against this session's verbose
    /// commands.
    #[must_use]
    pub fn parse_console_output(&self, transcript: &str) -> ConsoleOutput {
        parse_console_output(transcript, &self.verbose_commands)
    }
}

/// The interpreter console transcript, split into the lines belonging to
/// verbose commands and the full log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsoleOutput {
    /// Output lines that followed a verbose-command prompt.
    pub verbose_results: Vec<String>,
    /// Every transcript line, prompt markers stripped.
    pub all_lines: Vec<String>,
}

impl ConsoleOutput {
    /// Render the captured verbose output as the HTML document surfaced to
    /// the user.
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut html = String::from("<font face=\"courier\">\n<h2>R Output</h2>\n");
        for line in &self.verbose_results {
            html.push_str("<p>");
            html.push_str(line);
            html.push_str("</p>\n");
        }
        html.push_str("</font>\n");
        html
    }
}

/// Scan an interpreter transcript, capturing output between prompts.
///
/// A `>`-prefixed prompt line switches capture on when its command text
/// matches one of `verbose_commands`, and off otherwise, so only the output
/// of verbose commands is surfaced.
#[must_use]
pub fn parse_console_output(transcript: &str, verbose_commands: &[String]) -> ConsoleOutput {
    let mut capture = false;
    let mut verbose_results = Vec::new();
    let mut all_lines = Vec::new();

    for raw in transcript.lines() {
        let mut line = raw.trim().to_string();
        if let Some(command) = line.strip_prefix('>') {
            let command = command.trim_start_matches(' ');
            capture = verbose_commands.iter().any(|v| v == command);
            line = command.to_string();
        } else if capture {
            verbose_results.push(line.clone());
        }
        all_lines.push(line);
    }

    ConsoleOutput {
        verbose_results,
        all_lines,
    }
}

/// The HTML wrapper for the captured plots image.
#[must_use]
pub fn plots_html(png_file: &str) -> String {
    format!("<html><img src=\"{png_file}\"/></html>")
}
