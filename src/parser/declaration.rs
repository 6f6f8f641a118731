//! Shorthand declaration grammar for parameters and outputs
//!
//! Annotation lines declare parameters and outputs as
//! `identifier=TypeKeyword[ args]`. Type keywords are case-insensitive.
//! Output declarations use the `output` keyword followed by the output kind;
//! parameter declarations use a larger keyword set with optional defaults,
//! choice lists, and numeric bounds.

use crate::ast::{OutputKind, OutputSpec, ParameterKind, ParameterSpec};

/// Parse the right-hand side of a declaration as an output.
///
/// Returns `None` when the text is not an output declaration, so the caller
/// can fall through to parameter parsing.
pub(super) fn parse_output(name: &str, spec: &str) -> Option<OutputSpec> {
    let tokens: Vec<&str> = spec.split_whitespace().collect();
    let [keyword, kind] = tokens.as_slice() else {
        return None;
    };
    if !keyword.eq_ignore_ascii_case("output") {
        return None;
    }
    let kind = match kind.to_lowercase().as_str() {
        "raster" => OutputKind::Raster,
        "vector" => OutputKind::Vector,
        "table" => OutputKind::Table,
        "html" => OutputKind::Html,
        _ => return None,
    };
    Some(OutputSpec::new(name, kind))
}

/// Parse the right-hand side of a declaration as a parameter.
pub(super) fn parse_parameter(name: &str, spec: &str) -> Option<ParameterSpec> {
    let trimmed = spec.trim();
    let (keyword, args) = match trimmed.split_once(char::is_whitespace) {
        Some((keyword, rest)) => (keyword, rest.trim()),
        None => (trimmed, ""),
    };

    let kind = match (keyword.to_lowercase().as_str(), args) {
        ("raster", "") => ParameterKind::Raster,
        ("vector", "") => ParameterKind::Vector,
        ("table", "") => ParameterKind::Table,
        ("extent", "") => ParameterKind::Extent,
        ("file", "") => ParameterKind::File,
        ("field", parent) => ParameterKind::Field {
            parent: non_empty(parent),
        },
        ("string", default) => ParameterKind::String {
            default: non_empty(default),
        },
        ("crs", default) => ParameterKind::Crs {
            default: non_empty(default),
        },
        ("number", bounds) => parse_number(bounds)?,
        ("boolean", default) => parse_boolean(default)?,
        ("selection", options) => parse_selection(options)?,
        ("multiple", kind) => parse_multiple(kind)?,
        _ => return None,
    };

    Some(ParameterSpec::new(name, kind))
}

fn non_empty(text: &str) -> Option<String> {
    (!text.is_empty()).then(|| text.to_string())
}

/// `number [default [min max]]` — one literal is a default, two are a range
/// without a default, three are default then range.
fn parse_number(args: &str) -> Option<ParameterKind> {
    let literals = args
        .split_whitespace()
        .map(str::parse::<f64>)
        .collect::<Result<Vec<f64>, _>>()
        .ok()?;

    let (default, min, max) = match literals.as_slice() {
        [] => (None, None, None),
        [default] => (Some(*default), None, None),
        [min, max] => (None, Some(*min), Some(*max)),
        [default, min, max] => (Some(*default), Some(*min), Some(*max)),
        _ => return None,
    };
    Some(ParameterKind::Number { default, min, max })
}

fn parse_boolean(args: &str) -> Option<ParameterKind> {
    let default = match args.to_lowercase().as_str() {
        "" | "false" => false,
        "true" => true,
        _ => return None,
    };
    Some(ParameterKind::Boolean { default })
}

fn parse_selection(args: &str) -> Option<ParameterKind> {
    if args.is_empty() {
        return None;
    }
    let options = args.split(';').map(str::to_string).collect();
    Some(ParameterKind::Selection { options })
}

fn parse_multiple(args: &str) -> Option<ParameterKind> {
    match args.to_lowercase().as_str() {
        "raster" => Some(ParameterKind::MultipleRaster),
        "vector" => Some(ParameterKind::MultipleVector),
        _ => None,
    }
}
