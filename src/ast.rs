// Data model for parsed script declarations

use serde::Serialize;
use std::collections::HashMap;

use crate::utils;

/// Name of the synthetic HTML output registered by the `showplots` flag.
pub const RPLOTS: &str = "RPLOTS";

/// Name of the synthetic HTML output registered by the first verbose command.
pub const R_CONSOLE_OUTPUT: &str = "R_CONSOLE_OUTPUT";

/// A fully parsed annotated script: metadata, declared parameters and outputs,
/// behaviour flags, and the verbatim command body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScriptDeclaration {
    pub name: String,
    pub localized_name: String,
    pub group: String,
    pub localized_group: String,

    /// Declared parameters in declaration order. Order is load-bearing: import
    /// bindings are emitted in exactly this order.
    pub parameters: Vec<ParameterSpec>,

    /// Declared outputs in declaration order, including the synthetic HTML
    /// outputs registered by flags and verbose commands.
    pub outputs: Vec<OutputSpec>,

    pub show_plots: bool,
    pub show_console_output: bool,
    pub use_raster_package: bool,
    pub pass_file_names: bool,

    /// Non-annotation lines, passed through to the interpreter verbatim.
    /// Verbose lines appear here with their `>` marker stripped.
    pub body: Vec<String>,

    /// The `>`-prefixed lines, marker stripped, in order of appearance.
    pub verbose_commands: Vec<String>,

    /// The original text reconstructed line by line.
    #[serde(skip)]
    pub raw_script: String,
}

impl ScriptDeclaration {
    /// Create an empty declaration with default metadata and flags.
    #[must_use]
    pub fn new(name: impl Into<String>, group: impl Into<String>) -> Self {
        let name = name.into();
        let group = group.into();
        Self {
            localized_name: name.clone(),
            name,
            localized_group: group.clone(),
            group,
            parameters: Vec::new(),
            outputs: Vec::new(),
            show_plots: false,
            show_console_output: false,
            use_raster_package: true,
            pass_file_names: false,
            body: Vec::new(),
            verbose_commands: Vec::new(),
            raw_script: String::new(),
        }
    }

    /// Look up a declared parameter by name.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Look up a declared output by name.
    #[must_use]
    pub fn output(&self, name: &str) -> Option<&OutputSpec> {
        self.outputs.iter().find(|o| o.name == name)
    }
}

/// A declared input parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterSpec {
    /// Identifier used both as the interpreter variable name and as the
    /// resolved-value lookup key.
    pub name: String,
    /// Human-readable label (identifier with underscores replaced by spaces).
    pub description: String,
    pub kind: ParameterKind,
}

impl ParameterSpec {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ParameterKind) -> Self {
        let name = name.into();
        Self {
            description: utils::descriptive_name(&name),
            name,
            kind,
        }
    }
}

/// The closed set of parameter variants the generator dispatches on.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParameterKind {
    /// A raster layer reference.
    Raster,
    /// A vector layer reference.
    Vector,
    /// A tabular (CSV) data reference.
    Table,
    /// A field within a table/vector parameter.
    Field { parent: Option<String> },
    /// Free-form text.
    String { default: Option<String> },
    /// A filesystem path passed through as text.
    File,
    /// A numeric value with optional default and bounds.
    Number {
        default: Option<f64>,
        min: Option<f64>,
        max: Option<f64>,
    },
    /// A true/false toggle.
    Boolean { default: bool },
    /// A single selection from a fixed choice list; resolves to an index.
    Selection { options: Vec<String> },
    /// A bounding box of four numeric bounds (xmin, xmax, ymin, ymax).
    Extent,
    /// A coordinate-reference-system identifier.
    Crs { default: Option<String> },
    /// A homogeneous collection of raster references.
    MultipleRaster,
    /// A homogeneous collection of vector references.
    MultipleVector,
}

/// A declared output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputSpec {
    pub name: String,
    pub description: String,
    pub kind: OutputKind,
}

impl OutputSpec {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: OutputKind) -> Self {
        let name = name.into();
        Self {
            description: utils::descriptive_name(&name),
            name,
            kind,
        }
    }

    /// Construct an output with an explicit description, used for the
    /// synthetic HTML outputs whose labels are fixed.
    #[must_use]
    pub fn with_description(
        name: impl Into<String>,
        description: impl Into<String>,
        kind: OutputKind,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind,
        }
    }
}

/// The closed set of output variants the export phase dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    Raster,
    Vector,
    Table,
    /// Synthetic HTML result, materialised by the executor after the run
    /// rather than written by an export command.
    Html,
}

/// A concrete value bound to a parameter or output at run time.
///
/// Binding is external to parsing: the host (CLI or library caller) resolves
/// values after the user supplies them. A name absent from the resolved-value
/// map means "no value", which binds as `NULL` for every variant but boolean.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundValue {
    Text(String),
    Number(f64),
    Bool(bool),
    /// Elements of a multiple-input parameter, in order.
    List(Vec<String>),
}

/// Resolved values keyed by parameter or output name.
pub type ResolvedValues = HashMap<String, BoundValue>;
