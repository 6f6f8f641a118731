//! Annotation parser for annotated R analysis scripts
//!
//! This module converts raw script text into a [`ScriptDeclaration`]:
//! `##`-prefixed annotation lines declare parameters, outputs, and flags,
//! `>`-prefixed lines are verbose commands whose console output is surfaced,
//! and every other line is opaque body text passed through verbatim.

mod declaration;
pub mod error;

pub use error::ScriptParseError;

use std::fs;
use std::path::Path;

use crate::ast::{
    OutputKind, OutputSpec, R_CONSOLE_OUTPUT, RPLOTS, ScriptDeclaration,
};
use crate::utils;

/// Ten consecutive blank lines terminate the scan. In well-formed scripts the
/// body runs to end of file, so this is a safety valve against pathological
/// input rather than a meaningful terminator.
const BLANK_LINE_LIMIT: u32 = 10;

/// Parse script text into a declaration.
///
/// `source` names the script in error messages and supplies the default
/// script name (the file stem with underscores replaced by spaces); anonymous
/// text parses under the name "Unnamed script".
///
/// # Errors
///
/// Returns `Err` when an annotation line cannot be classified as a known
/// flag, a `name=`/`group=` override, a parameter declaration, or an output
/// declaration. The first malformed line aborts the whole parse.
pub fn parse_script(
    input: &str,
    source: Option<&Path>,
) -> Result<ScriptDeclaration, ScriptParseError> {
    let source_name = source.map_or_else(|| "<script>".to_string(), |p| p.display().to_string());
    let default_name = source
        .and_then(Path::file_stem)
        .and_then(|stem| stem.to_str())
        .map_or_else(|| "Unnamed script".to_string(), utils::descriptive_name);

    let mut decl = ScriptDeclaration::new(default_name, "User scripts");
    let mut ender = 0;

    for (index, raw_line) in input.lines().enumerate() {
        if ender >= BLANK_LINE_LIMIT {
            break;
        }
        // Only trailing carriage returns are stripped; interior whitespace is
        // preserved because body lines are passed through verbatim.
        let line = raw_line.strip_suffix('\r').unwrap_or(raw_line);

        if line.starts_with("##") {
            if !process_annotation(&mut decl, line) {
                return Err(ScriptParseError::malformed(&source_name, index + 1, line));
            }
        } else if let Some(command) = line.strip_prefix('>') {
            decl.body.push(command.to_string());
            decl.verbose_commands.push(command.to_string());
            if !decl.show_console_output {
                decl.show_console_output = true;
                decl.outputs.push(OutputSpec::with_description(
                    R_CONSOLE_OUTPUT,
                    "R Console Output",
                    OutputKind::Html,
                ));
            }
        } else {
            if line.is_empty() {
                ender += 1;
            } else {
                ender = 0;
            }
            decl.body.push(line.to_string());
        }

        decl.raw_script.push_str(line);
        decl.raw_script.push('\n');
    }

    Ok(decl)
}

/// Parse a script file, deriving the declaration name from the file stem.
///
/// # Errors
///
/// Returns `Err` when the file cannot be read or when the text fails to
/// parse (see [`parse_script`]).
pub fn parse_file(path: &Path) -> Result<ScriptDeclaration, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path)?;
    Ok(parse_script(&text, Some(path))?)
}

/// Dispatch one annotation line. Returns `false` when the line matches no
/// known form, in which case the caller reports it as malformed.
fn process_annotation(decl: &mut ScriptDeclaration, line: &str) -> bool {
    let stripped: String = line.chars().filter(|&c| c != '#').collect();
    let lowered = stripped.trim().to_lowercase();

    // Flag keywords take precedence and are not tokenized further.
    if lowered.starts_with("showplots") {
        decl.show_plots = true;
        decl.outputs.push(OutputSpec::with_description(
            RPLOTS,
            "R Plots",
            OutputKind::Html,
        ));
        return true;
    }
    if lowered.starts_with("dontuserasterpackage") {
        decl.use_raster_package = false;
        return true;
    }
    if lowered.starts_with("passfilenames") {
        decl.pass_file_names = true;
        return true;
    }

    let Some((key, rest)) = stripped.split_once('=') else {
        return false;
    };

    // Overrides keep the raw left token, not the descriptive form.
    let rhs = rest.trim().to_lowercase();
    if rhs == "group" {
        decl.group = key.to_string();
        decl.localized_group = key.to_string();
        return true;
    }
    if rhs == "name" {
        decl.name = key.to_string();
        decl.localized_name = key.to_string();
        return true;
    }

    if let Some(output) = declaration::parse_output(key, rest) {
        decl.outputs.push(output);
        return true;
    }
    if let Some(parameter) = declaration::parse_parameter(key, rest) {
        decl.parameters.push(parameter);
        return true;
    }

    false
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ast::ParameterKind;

    fn parse(input: &str) -> ScriptDeclaration {
        parse_script(input, None).unwrap()
    }

    #[test]
    fn test_parse_parameters_in_declaration_order() {
        let decl = parse(
            "##layer=raster\n\
             ##size=number 10\n\
             ##zones=vector\n\
             result <- analyse(layer, size, zones)\n",
        );
        let names: Vec<&str> = decl.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["layer", "size", "zones"]);
        assert_eq!(decl.body, ["result <- analyse(layer, size, zones)"]);
    }

    #[test]
    fn test_parse_output_declaration() {
        let decl = parse("##result=output vector\nresult <- x\n");
        assert_eq!(decl.outputs.len(), 1);
        assert_eq!(decl.outputs[0].name, "result");
        assert_eq!(decl.outputs[0].kind, OutputKind::Vector);
    }

    #[test]
    fn test_showplots_registers_html_output() {
        let decl = parse("##showplots\nplot(x)\n");
        assert!(decl.show_plots);
        assert_eq!(decl.outputs.len(), 1);
        assert_eq!(decl.outputs[0].name, RPLOTS);
        assert_eq!(decl.outputs[0].description, "R Plots");
        assert_eq!(decl.outputs[0].kind, OutputKind::Html);
    }

    #[test]
    fn test_flag_keywords() {
        let decl = parse("##dontuserasterpackage\n##passfilenames\n");
        assert!(!decl.use_raster_package);
        assert!(decl.pass_file_names);
    }

    #[test]
    fn test_flag_keywords_case_insensitive() {
        let decl = parse("##ShowPlots\n##DontUseRasterPackage\n");
        assert!(decl.show_plots);
        assert!(!decl.use_raster_package);
    }

    #[test]
    fn test_group_and_name_overrides_keep_raw_token() {
        let decl = parse("##Terrain_tools=group\n##Slope_analysis=name\n");
        assert_eq!(decl.group, "Terrain_tools");
        assert_eq!(decl.localized_group, "Terrain_tools");
        assert_eq!(decl.name, "Slope_analysis");
        assert_eq!(decl.localized_name, "Slope_analysis");
    }

    #[test]
    fn test_defaults_without_overrides() {
        let decl = parse("x <- 1\n");
        assert_eq!(decl.name, "Unnamed script");
        assert_eq!(decl.group, "User scripts");
    }

    #[test]
    fn test_name_derived_from_source_file() {
        let decl =
            parse_script("x <- 1\n", Some(Path::new("/scripts/slope_analysis.rsx"))).unwrap();
        assert_eq!(decl.name, "slope analysis");
    }

    #[test]
    fn test_verbose_commands_collected_and_console_output_registered_once() {
        let decl = parse(">print(summary(x))\n>print(y)\nz <- 1\n");
        assert_eq!(decl.verbose_commands, ["print(summary(x))", "print(y)"]);
        assert_eq!(decl.body, ["print(summary(x))", "print(y)", "z <- 1"]);
        assert!(decl.show_console_output);
        let console: Vec<&OutputSpec> = decl
            .outputs
            .iter()
            .filter(|o| o.name == R_CONSOLE_OUTPUT)
            .collect();
        assert_eq!(console.len(), 1);
        assert_eq!(console[0].description, "R Console Output");
    }

    #[test]
    fn test_malformed_annotation_fails_with_line_context() {
        let input = "##layer=raster\n##bad syntax here\n";
        let err = parse_script(input, Some(Path::new("analysis.rsx"))).unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.line_text, "##bad syntax here");
        assert!(err.source_name.contains("analysis.rsx"));
    }

    #[test]
    fn test_unknown_type_keyword_is_malformed() {
        assert!(parse_script("##layer=rastr\n", None).is_err());
    }

    #[test]
    fn test_raw_script_reconstructs_input() {
        let input = "##layer=raster\n\nresult <- layer\n";
        let decl = parse(input);
        assert_eq!(decl.raw_script, input);
    }

    #[test]
    fn test_body_preserves_blank_lines() {
        let decl = parse("a <- 1\n\nb <- 2\n");
        assert_eq!(decl.body, ["a <- 1", "", "b <- 2"]);
    }

    #[test]
    fn test_ten_consecutive_blank_lines_stop_the_scan() {
        let input = format!("a <- 1\n{}b <- 2\n", "\n".repeat(10));
        let decl = parse(&input);
        assert!(!decl.body.contains(&"b <- 2".to_string()));
        // The ten blank lines themselves are still consumed.
        assert_eq!(decl.body.len(), 11);
    }

    #[test]
    fn test_blank_line_counter_resets_on_content() {
        let input = format!("a <- 1\n{}b <- 2\n{}c <- 3\n", "\n".repeat(9), "\n".repeat(9));
        let decl = parse(&input);
        assert!(decl.body.contains(&"b <- 2".to_string()));
        assert!(decl.body.contains(&"c <- 3".to_string()));
    }

    #[test]
    fn test_carriage_returns_stripped() {
        let decl = parse("##layer=raster\r\nresult <- layer\r\n");
        assert_eq!(decl.parameters[0].name, "layer");
        assert_eq!(decl.body, ["result <- layer"]);
    }

    #[test]
    fn test_annotation_lines_do_not_reach_the_body() {
        let decl = parse("##layer=raster\nresult <- layer\n");
        assert_eq!(decl.body, ["result <- layer"]);
    }

    #[test]
    fn test_parameter_kinds_from_annotations() {
        let decl = parse(
            "##layer=raster\n\
             ##zones=vector\n\
             ##records=table\n\
             ##threshold=number 0.5\n\
             ##verbose=boolean true\n\
             ##method=selection nearest;bilinear\n\
             ##bbox=extent\n\
             ##projection=crs\n\
             ##attr=field zones\n\
             ##title=string Untitled\n\
             ##path=file\n\
             ##stack=multiple raster\n",
        );
        assert_eq!(decl.parameters.len(), 12);
        assert_eq!(decl.parameters[3].name, "threshold");
        assert_eq!(
            decl.parameters[3].kind,
            ParameterKind::Number {
                default: Some(0.5),
                min: None,
                max: None,
            }
        );
        assert_eq!(decl.parameters[11].kind, ParameterKind::MultipleRaster);
    }

    #[test]
    fn test_parse_is_idempotent() {
        let input = "##layer=raster\n##result=output raster\n>print(x)\nresult <- layer\n";
        let first = parse(input);
        let second = parse(input);
        assert_eq!(first, second);
    }
}
