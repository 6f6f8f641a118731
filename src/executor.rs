//! Script execution against the external R interpreter.
//!
//! Generates the command list, writes it to the session script file, runs
//! `R CMD BATCH --vanilla`, and materialises the synthetic HTML outputs from
//! the console transcript.

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::ast::{BoundValue, R_CONSOLE_OUTPUT, RPLOTS, ResolvedValues, ScriptDeclaration};
use crate::config;
use crate::generator::{self, GenerateOptions, Platform};
use crate::session::{ConsoleOutput, RunSession, plots_html};

/// The R installation location could not be resolved on a platform that
/// requires explicit configuration. Raised before any command is generated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentNotConfigured {
    pub message: String,
}

impl fmt::Display for EnvironmentNotConfigured {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for EnvironmentNotConfigured {}

impl EnvironmentNotConfigured {
    fn new(message: &str) -> Self {
        EnvironmentNotConfigured {
            message: message.to_string(),
        }
    }
}

/// The result of one run: the commands that were executed and the parsed
/// console transcript.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub commands: Vec<String>,
    pub console: ConsoleOutput,
}

/// The Windows executable subdirectory, selected by the 64-bit setting.
fn exec_dir() -> &'static str {
    if config::use_64bit() { "x64" } else { "i386" }
}

/// Check that the R interpreter is available.
///
/// # Errors
///
/// Returns `Err` when R cannot be located: on Windows the configured R folder
/// must contain the executable, elsewhere `R` must be on `PATH`.
pub fn check_r_installed() -> Result<(), EnvironmentNotConfigured> {
    if cfg!(target_os = "windows") {
        let Some(folder) = config::r_folder() else {
            return Err(EnvironmentNotConfigured::new(
                "R folder is not configured.\nPlease configure it before running R scripts.",
            ));
        };
        let executable = folder.join("bin").join(exec_dir()).join("R.exe");
        if executable.is_file() {
            Ok(())
        } else {
            Err(EnvironmentNotConfigured::new(&format!(
                "R executable not found at {}.\nPlease configure the R folder before running R scripts.",
                executable.display()
            )))
        }
    } else if which::which("R").is_ok() {
        Ok(())
    } else {
        Err(EnvironmentNotConfigured::new(
            "R was not found on PATH.\nPlease install R before running R scripts.",
        ))
    }
}

/// Write the generated commands one per line to the session script file.
///
/// # Errors
///
/// Returns `Err` on any I/O failure.
pub fn write_script(commands: &[String], path: &Path) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    for command in commands {
        writeln!(file, "{command}")?;
    }
    drop(file);

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    }

    Ok(())
}

/// Build the platform-specific `R CMD BATCH` invocation for the session.
fn r_invocation(session: &RunSession) -> Result<Command, EnvironmentNotConfigured> {
    let mut command = if cfg!(target_os = "windows") {
        let Some(folder) = config::r_folder() else {
            return Err(EnvironmentNotConfigured::new(
                "R folder is not configured.\nPlease configure it before running R scripts.",
            ));
        };
        Command::new(folder.join("bin").join(exec_dir()).join("R.exe"))
    } else {
        Command::new("R")
    };
    command
        .arg("CMD")
        .arg("BATCH")
        .arg("--vanilla")
        .arg(session.script_file())
        .arg(session.console_output_file());
    Ok(command)
}

/// Run a declaration end to end.
///
/// # Errors
///
/// Returns `Err` when the R environment is not configured, when generation
/// fails (unsupported input format), or on any I/O failure around the script
/// and output files.
pub fn run(
    decl: &ScriptDeclaration,
    parameters: &ResolvedValues,
    outputs: &ResolvedValues,
) -> Result<RunOutcome, Box<dyn std::error::Error>> {
    check_r_installed()?;

    let options = GenerateOptions {
        platform: Platform::current(),
        library_path: Some(config::r_libs_folder().to_string_lossy().into_owned()),
    };
    let commands = generator::generate(decl, parameters, outputs, &options)?;

    let script_file = std::env::temp_dir().join(format!("rbridge_script_{}.r", std::process::id()));
    let session = RunSession::new(script_file, decl, outputs);
    write_script(&commands, session.script_file())?;

    // R CMD BATCH reports script errors through the transcript, so the exit
    // status is not treated as fatal here.
    let _status = r_invocation(&session)?
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()?;

    let transcript = fs::read_to_string(session.console_output_file()).unwrap_or_default();
    let console = session.parse_console_output(&transcript);

    if decl.show_console_output {
        if let Some(BoundValue::Text(path)) = outputs.get(R_CONSOLE_OUTPUT) {
            fs::write(path, console.to_html())?;
        }
    }
    if let (Some(png), Some(BoundValue::Text(path))) =
        (session.plots_file(), outputs.get(RPLOTS))
    {
        fs::write(path, plots_html(png))?;
    }

    Ok(RunOutcome { commands, console })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::parser::parse_script;

    #[test]
    fn test_write_script_one_command_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("script.r");
        let commands = vec!["library(\"raster\")".to_string(), "x = NULL".to_string()];

        write_script(&commands, &path).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, "library(\"raster\")\nx = NULL\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_write_script_sets_executable_bit() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("script.r");
        write_script(&[], &path).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0o111, "script should be executable");
    }

    #[test]
    fn test_r_invocation_arguments() {
        let decl = parse_script("x <- 1\n", None).unwrap();
        let session = RunSession::new(
            std::path::PathBuf::from("/tmp/s.r"),
            &decl,
            &ResolvedValues::new(),
        );
        let command = r_invocation(&session).unwrap();
        let args: Vec<String> = command
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(args[..3], ["CMD", "BATCH", "--vanilla"]);
        assert!(args[3].ends_with("s.r"));
        assert!(args[4].ends_with("s.r.Rout"));
    }

    #[test]
    fn test_environment_error_display() {
        let err = EnvironmentNotConfigured::new("R folder is not configured.");
        assert!(err.to_string().contains("not configured"));
    }
}
