//! Utility functions shared across modules
//!
//! Path normalization and literal quoting live here because every generator
//! branch embeds paths into command text; keeping them in one place keeps the
//! emitted commands consistent.

/// Normalize filesystem path separators to forward slashes.
///
/// Every path embedded in a generated command goes through this, so commands
/// are identical regardless of the platform the path came from.
#[must_use]
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// Wrap a value in double quotes for embedding in a command.
///
/// Values are embedded as raw, unescaped literals; upstream validation
/// guarantees no literal quote characters are present.
#[must_use]
pub fn quoted(value: &str) -> String {
    format!("\"{value}\"")
}

/// Derive a human-readable description from an identifier.
#[must_use]
pub fn descriptive_name(identifier: &str) -> String {
    identifier.replace('_', " ")
}

/// Append `.{extension}` to `path` unless it already carries that suffix
/// (case-insensitive).
#[must_use]
pub fn ensure_extension(path: &str, extension: &str) -> String {
    let suffix = format!(".{extension}");
    if path.to_lowercase().ends_with(&suffix) {
        path.to_string()
    } else {
        format!("{path}{suffix}")
    }
}

/// The final path component without its extension.
///
/// Operates on forward-slash paths; callers normalize first.
#[must_use]
pub fn file_stem(path: &str) -> &str {
    let base = path.rsplit('/').next().unwrap_or(path);
    match base.rfind('.') {
        Some(index) => &base[..index],
        None => base,
    }
}

/// Everything before the final path component, or the empty string when the
/// path has no directory part.
#[must_use]
pub fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(index) => &path[..index],
        None => "",
    }
}

/// Format a numeric value as an R literal.
///
/// Whole numbers print without a decimal point, so a resolved value of `3`
/// binds as `3` rather than `3.0`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_backslashes() {
        assert_eq!(normalize_path("C:\\data\\dem.tif"), "C:/data/dem.tif");
        assert_eq!(normalize_path("/tmp/out.shp"), "/tmp/out.shp");
    }

    #[test]
    fn test_quoted() {
        assert_eq!(quoted("C:/data/dem.tif"), "\"C:/data/dem.tif\"");
        assert_eq!(quoted(""), "\"\"");
    }

    #[test]
    fn test_descriptive_name() {
        assert_eq!(descriptive_name("max_distance"), "max distance");
        assert_eq!(descriptive_name("layer"), "layer");
    }

    #[test]
    fn test_ensure_extension_appends() {
        assert_eq!(ensure_extension("/tmp/out", "shp"), "/tmp/out.shp");
        assert_eq!(ensure_extension("/tmp/out.tmp", "tif"), "/tmp/out.tmp.tif");
    }

    #[test]
    fn test_ensure_extension_keeps_existing() {
        assert_eq!(ensure_extension("/tmp/out.shp", "shp"), "/tmp/out.shp");
        assert_eq!(ensure_extension("/tmp/OUT.SHP", "shp"), "/tmp/OUT.SHP");
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("/data/layers/roads.shp"), "roads");
        assert_eq!(file_stem("roads.shp"), "roads");
        assert_eq!(file_stem("/data/noext"), "noext");
    }

    #[test]
    fn test_parent_dir() {
        assert_eq!(parent_dir("/data/layers/roads.shp"), "/data/layers");
        assert_eq!(parent_dir("roads.shp"), "");
    }

    #[test]
    fn test_format_number_whole() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(-10.0), "-10");
    }

    #[test]
    fn test_format_number_fractional() {
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(-2.25), "-2.25");
    }
}
