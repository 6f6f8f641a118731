//! CLI module containing the main entry point logic.
//!
//! This module is separated from main.rs so the binding and dispatch logic
//! stays testable through the library.

use clap::Parser as ClapParser;
use std::path::PathBuf;

use crate::ast::{BoundValue, ParameterKind, ResolvedValues, ScriptDeclaration};
use crate::generator::{self, GenerateOptions, Platform};
use crate::{config, executor, fatal_error, help, parser};

const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// CLI arguments for the rbridge tool.
#[derive(ClapParser)]
#[command(name = "rbridge")]
#[command(version = PKG_VERSION)]
#[command(
    about = "Translate annotated R analysis scripts into runnable R commands",
    long_about = None
)]
struct Cli {
    /// Annotated R script (.rsx) to inspect, translate, or execute
    #[arg(value_name = "SCRIPT")]
    script: Option<PathBuf>,

    /// Bind a parameter value, e.g. --set layer=/data/dem.tif
    #[arg(long = "set", value_name = "NAME=VALUE")]
    set: Vec<String>,

    /// Bind an output destination, e.g. --out result=/tmp/out.shp
    #[arg(long = "out", value_name = "NAME=PATH")]
    out: Vec<String>,

    /// Print the parsed declaration as JSON instead of running
    #[arg(long)]
    inspect: bool,

    /// Print the generated R commands instead of running
    #[arg(long)]
    show_commands: bool,

    /// Target platform for --show-commands (defaults to the host platform)
    #[arg(long, value_name = "PLATFORM")]
    platform: Option<PlatformArg>,

    /// List scripts in the configured script folders
    #[arg(short, long)]
    list: bool,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum PlatformArg {
    Windows,
    Other,
}

impl PlatformArg {
    fn platform(self) -> Platform {
        match self {
            Self::Windows => Platform::Windows,
            Self::Other => Platform::Other,
        }
    }
}

/// Main CLI logic that can be called from external wrappers.
pub fn run_cli() {
    let cli = Cli::parse();

    if cli.list {
        list_scripts();
        return;
    }

    let Some(script) = cli.script else {
        fatal_error("Error: no script given. Pass a script path or use --list.");
    };

    let decl = match parser::parse_file(&script) {
        Ok(decl) => decl,
        Err(error) => fatal_error(&format!("Could not load script: {error}")),
    };

    if cli.inspect {
        match serde_json::to_string_pretty(&decl) {
            Ok(json) => println!("{json}"),
            Err(error) => fatal_error(&format!("Could not serialise declaration: {error}")),
        }
        if let Some(description) = help::short_description(&script) {
            eprintln!("{description}");
        }
        return;
    }

    let mut parameters = default_bindings(&decl);
    for pair in &cli.set {
        let (name, raw) = split_binding(pair);
        let Some(parameter) = decl.parameter(name) else {
            fatal_error(&format!("Error: unknown parameter `{name}`"));
        };
        parameters.insert(name.to_string(), coerce(&parameter.kind, raw));
    }

    let mut outputs = ResolvedValues::new();
    for pair in &cli.out {
        let (name, raw) = split_binding(pair);
        if decl.output(name).is_none() {
            fatal_error(&format!("Error: unknown output `{name}`"));
        }
        outputs.insert(name.to_string(), BoundValue::Text(raw.to_string()));
    }

    if cli.show_commands {
        let options = GenerateOptions {
            platform: cli.platform.map_or_else(Platform::current, PlatformArg::platform),
            library_path: Some(config::r_libs_folder().to_string_lossy().into_owned()),
        };
        match generator::generate(&decl, &parameters, &outputs, &options) {
            Ok(commands) => {
                for command in commands {
                    println!("{command}");
                }
            }
            Err(error) => fatal_error(&format!("{error}")),
        }
        return;
    }

    match executor::run(&decl, &parameters, &outputs) {
        Ok(outcome) => {
            for line in &outcome.console.all_lines {
                println!("{line}");
            }
        }
        Err(error) => fatal_error(&format!("{error}")),
    }
}

/// Split a `name=value` binding argument.
fn split_binding(pair: &str) -> (&str, &str) {
    match pair.split_once('=') {
        Some((name, value)) => (name, value),
        None => fatal_error(&format!("Error: bindings use name=value, got `{pair}`")),
    }
}

/// Initial bindings from the declared defaults.
fn default_bindings(decl: &ScriptDeclaration) -> ResolvedValues {
    let mut values = ResolvedValues::new();
    for parameter in &decl.parameters {
        let value = match &parameter.kind {
            ParameterKind::Number {
                default: Some(default),
                ..
            } => BoundValue::Number(*default),
            ParameterKind::Boolean { default } => BoundValue::Bool(*default),
            ParameterKind::String {
                default: Some(default),
            }
            | ParameterKind::Crs {
                default: Some(default),
            } => BoundValue::Text(default.clone()),
            ParameterKind::Selection { .. } => BoundValue::Number(0.0),
            _ => continue,
        };
        values.insert(parameter.name.clone(), value);
    }
    values
}

/// Coerce a raw command-line value by the declared parameter kind.
fn coerce(kind: &ParameterKind, raw: &str) -> BoundValue {
    match kind {
        ParameterKind::Number { .. } | ParameterKind::Selection { .. } => raw
            .parse::<f64>()
            .map_or_else(|_| BoundValue::Text(raw.to_string()), BoundValue::Number),
        ParameterKind::Boolean { .. } => {
            BoundValue::Bool(raw == "1" || raw.eq_ignore_ascii_case("true"))
        }
        ParameterKind::MultipleRaster | ParameterKind::MultipleVector => {
            BoundValue::List(raw.split(';').map(str::to_string).collect())
        }
        ParameterKind::Raster
        | ParameterKind::Vector
        | ParameterKind::Table
        | ParameterKind::Field { .. }
        | ParameterKind::String { .. }
        | ParameterKind::File
        | ParameterKind::Extent
        | ParameterKind::Crs { .. } => BoundValue::Text(raw.to_string()),
    }
}

/// Print the `.rsx` scripts found in the configured script folders.
fn list_scripts() {
    let folders = config::script_folders();
    let mut found = false;
    for folder in &folders {
        let Ok(entries) = std::fs::read_dir(folder) else {
            continue;
        };
        let mut scripts: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("rsx"))
            })
            .collect();
        scripts.sort();
        for script in scripts {
            println!("{}", script.display());
            found = true;
        }
    }
    if !found {
        println!("No scripts found in {} folder(s).", folders.len());
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::parser::parse_script;

    #[test]
    fn test_coerce_number() {
        let kind = ParameterKind::Number {
            default: None,
            min: None,
            max: None,
        };
        assert_eq!(coerce(&kind, "3"), BoundValue::Number(3.0));
        assert_eq!(coerce(&kind, "0.5"), BoundValue::Number(0.5));
    }

    #[test]
    fn test_coerce_boolean() {
        let kind = ParameterKind::Boolean { default: false };
        assert_eq!(coerce(&kind, "true"), BoundValue::Bool(true));
        assert_eq!(coerce(&kind, "TRUE"), BoundValue::Bool(true));
        assert_eq!(coerce(&kind, "1"), BoundValue::Bool(true));
        assert_eq!(coerce(&kind, "false"), BoundValue::Bool(false));
        assert_eq!(coerce(&kind, "no"), BoundValue::Bool(false));
    }

    #[test]
    fn test_coerce_multiple_splits_on_semicolon() {
        let kind = ParameterKind::MultipleRaster;
        assert_eq!(
            coerce(&kind, "/a.tif;/b.tif"),
            BoundValue::List(vec!["/a.tif".to_string(), "/b.tif".to_string()])
        );
    }

    #[test]
    fn test_coerce_paths_stay_text() {
        let kind = ParameterKind::Raster;
        assert_eq!(
            coerce(&kind, "C:\\data\\dem.tif"),
            BoundValue::Text("C:\\data\\dem.tif".to_string())
        );
    }

    #[test]
    fn test_default_bindings() {
        let decl = parse_script(
            "##threshold=number 0.5\n##verbose=boolean\n##title=string Untitled\n\
             ##method=selection a;b\n##layer=raster\n",
            None,
        )
        .unwrap();
        let values = default_bindings(&decl);
        assert_eq!(values.get("threshold"), Some(&BoundValue::Number(0.5)));
        assert_eq!(values.get("verbose"), Some(&BoundValue::Bool(false)));
        assert_eq!(
            values.get("title"),
            Some(&BoundValue::Text("Untitled".to_string()))
        );
        assert_eq!(values.get("method"), Some(&BoundValue::Number(0.0)));
        assert_eq!(values.get("layer"), None);
    }

    #[test]
    fn test_split_binding() {
        assert_eq!(split_binding("layer=/data/dem.tif"), ("layer", "/data/dem.tif"));
        assert_eq!(split_binding("bbox=0,10,0,10"), ("bbox", "0,10,0,10"));
    }
}
