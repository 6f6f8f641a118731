// Command generation for resolved script declarations
//
// Converts a parsed declaration plus resolved parameter/output values into the
// ordered list of R statements fed to the interpreter: import commands, the
// verbatim script body, then export commands.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

use crate::ast::{
    BoundValue, OutputKind, ParameterKind, ParameterSpec, ResolvedValues, RPLOTS,
    ScriptDeclaration,
};
use crate::utils::{ensure_extension, file_stem, format_number, normalize_path, parent_dir, quoted};

/// Target platform for command generation. Only the import phase differs:
/// Windows needs an explicit library search path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Other,
}

impl Platform {
    /// The platform the host is running on.
    #[must_use]
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else {
            Platform::Other
        }
    }
}

impl Default for Platform {
    fn default() -> Self {
        Platform::current()
    }
}

/// Options for one generation call.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub platform: Platform,
    /// Library directory for the Windows `.libPaths` command; ignored on
    /// other platforms.
    pub library_path: Option<String>,
}

/// Generation failure: a parameter value uses a file format the generator has
/// no loading command for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerateError {
    UnsupportedFormat { parameter: String, path: String },
}

impl fmt::Display for GenerateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerateError::UnsupportedFormat { parameter, path } => {
                write!(f, "unsupported input file format for `{parameter}`: {path}")
            }
        }
    }
}

impl std::error::Error for GenerateError {}

/// Packages always loaded: raster I/O and vector I/O support.
const REQUIRED_PACKAGES: [&str; 2] = ["rgdal", "raster"];

/// Fixed package repository mirror.
const CRAN_MIRROR: &str = "http://cran.at.r-project.org/";

/// Matches `library("pkg")` and `library(pkg)` calls that are not immediately
/// preceded by a comment marker (compiled once).
#[allow(clippy::expect_used)]
static LIBRARY_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?:^|[^#])library\("?([^")]+?)"?\)"#).expect("library call regex is valid")
});

/// Generate the full ordered command list for one run.
///
/// The result is always `imports ++ body ++ exports`; the body is the
/// verbatim script body from parsing. Generation is pure: identical inputs
/// produce identical output.
///
/// # Errors
///
/// Returns `Err` when a table value is not a `.csv` file, or when a
/// multiple-vector element is not a `.shp` file while pass-filenames is off.
pub fn generate(
    decl: &ScriptDeclaration,
    parameters: &ResolvedValues,
    outputs: &ResolvedValues,
    options: &GenerateOptions,
) -> Result<Vec<String>, GenerateError> {
    let mut commands = import_commands(decl, parameters, outputs, options)?;
    commands.extend(decl.body.iter().cloned());
    commands.extend(export_commands(decl, outputs));
    Ok(commands)
}

/// The import phase: mirror selection, library path, package guards, package
/// loads, one binding per declared parameter in declaration order, and the
/// plotting device when plots are captured.
fn import_commands(
    decl: &ScriptDeclaration,
    parameters: &ResolvedValues,
    outputs: &ResolvedValues,
    options: &GenerateOptions,
) -> Result<Vec<String>, GenerateError> {
    let mut commands = Vec::new();

    commands.push(format!("options(\"repos\"={})", quoted(CRAN_MIRROR)));

    if options.platform == Platform::Windows {
        if let Some(library_path) = &options.library_path {
            commands.push(format!(".libPaths({})", quoted(&normalize_path(library_path))));
        }
    }

    for package in required_packages(&decl.body) {
        commands.push(format!(
            "tryCatch(find.package({0}), error=function(e) install.packages({0}, dependencies=TRUE))",
            quoted(&package)
        ));
    }
    commands.push("library(\"raster\")".to_string());
    commands.push("library(\"rgdal\")".to_string());

    for parameter in &decl.parameters {
        bind_parameter(&mut commands, decl, parameter, parameters.get(&parameter.name))?;
    }

    if let Some(png) = plots_filename(decl, outputs) {
        commands.push(format!("png({})", quoted(&png)));
    }

    Ok(commands)
}

/// Packages the script needs: `library(...)` references found in the body,
/// in discovery order, followed by the always-required I/O packages.
fn required_packages(body: &[String]) -> Vec<String> {
    let script = body.join("\n");
    let mut packages: Vec<String> = Vec::new();
    for captures in LIBRARY_CALL.captures_iter(&script) {
        if let Some(name) = captures.get(1) {
            let name = name.as_str().to_string();
            if !packages.contains(&name) {
                packages.push(name);
            }
        }
    }
    for required in REQUIRED_PACKAGES {
        if !packages.iter().any(|p| p == required) {
            packages.push(required.to_string());
        }
    }
    packages
}

/// The PNG filename the plotting device writes to, derived from the resolved
/// path of the plots output. `None` when plots are off or the output is
/// unbound.
#[must_use]
pub fn plots_filename(decl: &ScriptDeclaration, outputs: &ResolvedValues) -> Option<String> {
    if !decl.show_plots {
        return None;
    }
    text_value(outputs.get(RPLOTS)).map(|path| format!("{}.png", normalize_path(path)))
}

fn null_binding(name: &str) -> String {
    format!("{name} = NULL")
}

fn text_value(value: Option<&BoundValue>) -> Option<&str> {
    match value {
        Some(BoundValue::Text(text)) => Some(text),
        _ => None,
    }
}

/// Elements of a multiple-input value. A plain text value is treated as a
/// `;`-separated list, matching how hosts commonly join layer selections.
fn list_value(value: Option<&BoundValue>) -> Option<Vec<String>> {
    match value {
        Some(BoundValue::List(items)) => Some(items.clone()),
        Some(BoundValue::Text(text)) => Some(text.split(';').map(str::to_string).collect()),
        _ => None,
    }
}

/// Emit the binding command(s) for one parameter.
///
/// The dispatch is exhaustive over [`ParameterKind`] so a new variant cannot
/// silently fall through to no-op.
fn bind_parameter(
    commands: &mut Vec<String>,
    decl: &ScriptDeclaration,
    parameter: &ParameterSpec,
    value: Option<&BoundValue>,
) -> Result<(), GenerateError> {
    let name = &parameter.name;

    match &parameter.kind {
        ParameterKind::Raster => {
            let Some(path) = text_value(value) else {
                commands.push(null_binding(name));
                return Ok(());
            };
            let path = normalize_path(path);
            commands.push(if decl.pass_file_names {
                format!("{name} = {}", quoted(&path))
            } else if decl.use_raster_package {
                format!("{name} = brick({})", quoted(&path))
            } else {
                format!("{name} = readGDAL({})", quoted(&path))
            });
        }
        ParameterKind::Vector => {
            let Some(path) = text_value(value) else {
                commands.push(null_binding(name));
                return Ok(());
            };
            let path = normalize_path(path);
            if decl.pass_file_names {
                commands.push(format!("{name} = {}", quoted(&path)));
            } else {
                commands.push(format!(
                    "{name} = readOGR({},layer={})",
                    quoted(parent_dir(&path)),
                    quoted(file_stem(&path))
                ));
            }
        }
        ParameterKind::Table => {
            let Some(raw) = text_value(value) else {
                commands.push(null_binding(name));
                return Ok(());
            };
            if !raw.to_lowercase().ends_with(".csv") {
                return Err(GenerateError::UnsupportedFormat {
                    parameter: name.clone(),
                    path: raw.to_string(),
                });
            }
            let path = normalize_path(raw);
            if decl.pass_file_names {
                commands.push(format!("{name} = {}", quoted(&path)));
            } else {
                commands.push(format!(
                    "{name} <- read.csv({}, head=TRUE, sep=\",\")",
                    quoted(&path)
                ));
            }
        }
        ParameterKind::Extent => match text_value(value) {
            Some(bounds) => {
                let joined = bounds
                    .split(',')
                    .map(str::trim)
                    .collect::<Vec<_>>()
                    .join(",");
                commands.push(format!("{name} = extent({joined})"));
            }
            None => commands.push(null_binding(name)),
        },
        ParameterKind::Crs { .. } => match text_value(value) {
            Some(code) => commands.push(format!("{name} = {}", quoted(code))),
            None => commands.push(null_binding(name)),
        },
        ParameterKind::Field { .. } | ParameterKind::String { .. } => match text_value(value) {
            Some(text) => commands.push(format!("{name}={}", quoted(text))),
            None => commands.push(null_binding(name)),
        },
        ParameterKind::File => match text_value(value) {
            Some(path) => commands.push(format!("{name}={}", quoted(&normalize_path(path)))),
            None => commands.push(null_binding(name)),
        },
        ParameterKind::Number { .. } | ParameterKind::Selection { .. } => match value {
            Some(BoundValue::Number(number)) => {
                commands.push(format!("{name}={}", format_number(*number)));
            }
            Some(BoundValue::Text(raw)) => commands.push(format!("{name}={raw}")),
            _ => commands.push(null_binding(name)),
        },
        ParameterKind::Boolean { .. } => {
            // Booleans always bind to a concrete literal; absence means false.
            let truthy = matches!(value, Some(BoundValue::Bool(true)));
            commands.push(format!("{name}={}", if truthy { "TRUE" } else { "FALSE" }));
        }
        ParameterKind::MultipleRaster => {
            let Some(layers) = list_value(value) else {
                commands.push(null_binding(name));
                return Ok(());
            };
            for (index, layer) in layers.iter().enumerate() {
                let path = normalize_path(layer);
                commands.push(if decl.pass_file_names {
                    format!("tempvar{index} <- {}", quoted(&path))
                } else if decl.use_raster_package {
                    format!("tempvar{index} <- brick({})", quoted(&path))
                } else {
                    format!("tempvar{index} <- readGDAL({})", quoted(&path))
                });
            }
            commands.push(collect_binding(name, layers.len()));
        }
        ParameterKind::MultipleVector => {
            let Some(layers) = list_value(value) else {
                commands.push(null_binding(name));
                return Ok(());
            };
            // Validate every element before emitting anything for this
            // parameter.
            if !decl.pass_file_names {
                for layer in &layers {
                    if !layer.to_lowercase().ends_with(".shp") {
                        return Err(GenerateError::UnsupportedFormat {
                            parameter: name.clone(),
                            path: layer.clone(),
                        });
                    }
                }
            }
            for (index, layer) in layers.iter().enumerate() {
                let path = normalize_path(layer);
                if decl.pass_file_names {
                    commands.push(format!("tempvar{index} <- {}", quoted(&path)));
                } else {
                    commands.push(format!(
                        "tempvar{index} <- readOGR({},layer={})",
                        quoted(parent_dir(&path)),
                        quoted(file_stem(&path))
                    ));
                }
            }
            commands.push(collect_binding(name, layers.len()));
        }
    }

    Ok(())
}

/// Bind a multiple-input name to a collection over its temp variables.
fn collect_binding(name: &str, count: usize) -> String {
    let references = (0..count)
        .map(|index| format!("tempvar{index}"))
        .collect::<Vec<_>>()
        .join(",");
    format!("{name} = c({references})")
}

/// The export phase: one write command per declared output, in declaration
/// order, then the plotting-device close when plots are captured. Outputs
/// without a resolved destination emit nothing; HTML outputs are materialised
/// by the executor after the run.
fn export_commands(decl: &ScriptDeclaration, outputs: &ResolvedValues) -> Vec<String> {
    let mut commands = Vec::new();

    for output in &decl.outputs {
        let Some(value) = text_value(outputs.get(&output.name)) else {
            continue;
        };
        match output.kind {
            OutputKind::Raster => {
                let path = normalize_path(value);
                if decl.use_raster_package || decl.pass_file_names {
                    commands.push(format!(
                        "writeRaster({},{}, overwrite=TRUE)",
                        output.name,
                        quoted(&path)
                    ));
                } else {
                    let path = ensure_extension(&path, "tif");
                    commands.push(format!("writeGDAL({},{})", output.name, quoted(&path)));
                }
            }
            OutputKind::Vector => {
                let path = ensure_extension(&normalize_path(value), "shp");
                commands.push(format!(
                    "writeOGR({},{},{}, driver=\"ESRI Shapefile\")",
                    output.name,
                    quoted(&path),
                    quoted(file_stem(&path))
                ));
            }
            OutputKind::Table => {
                let path = normalize_path(value);
                commands.push(format!("write.csv({},{})", output.name, quoted(&path)));
            }
            OutputKind::Html => {}
        }
    }

    if decl.show_plots {
        commands.push("dev.off()".to_string());
    }

    commands
}
