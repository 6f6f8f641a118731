//! Settings resolution for the R environment.
//!
//! Every setting is an environment variable with a per-OS discovery fallback,
//! so the tool works out of the box on a standard install and can be pointed
//! elsewhere without a config file.

use std::fs;
use std::path::PathBuf;

/// Override for the R installation folder (Windows).
pub const R_FOLDER_VAR: &str = "RBRIDGE_R_FOLDER";
/// Override for the user package library directory.
pub const R_LIBS_VAR: &str = "RBRIDGE_R_LIBS";
/// Override for the script search folders (`;`-separated).
pub const SCRIPTS_FOLDER_VAR: &str = "RBRIDGE_SCRIPTS_FOLDER";
/// Use the 64-bit R executable on Windows when set to `1` or `true`.
pub const R_USE64_VAR: &str = "RBRIDGE_R_USE64";

/// Get the user's home directory in a cross-platform way.
#[must_use]
pub fn get_home_dir() -> Option<PathBuf> {
    // Try HOME first (Unix-like systems)
    if let Some(home) = std::env::var_os("HOME") {
        return Some(PathBuf::from(home));
    }

    // Try USERPROFILE (Windows)
    if let Some(userprofile) = std::env::var_os("USERPROFILE") {
        return Some(PathBuf::from(userprofile));
    }

    // Try HOMEDRIVE + HOMEPATH (older Windows)
    if let (Some(homedrive), Some(homepath)) =
        (std::env::var_os("HOMEDRIVE"), std::env::var_os("HOMEPATH"))
    {
        let mut path = PathBuf::from(homedrive);
        path.push(homepath);
        return Some(path);
    }

    None
}

/// The per-user settings folder, created on demand.
fn user_folder() -> Option<PathBuf> {
    let folder = get_home_dir()?.join(".rbridge");
    let _ = fs::create_dir_all(&folder);
    Some(folder)
}

/// Resolve the R installation folder.
///
/// The environment override wins; otherwise Windows installs are discovered
/// under the Program Files directories by picking the lexically greatest
/// `R-*` version folder. Returns `None` when nothing resolves — on Windows
/// that means the environment is not configured; on other platforms `R` is
/// expected on `PATH` and no folder is needed.
#[must_use]
pub fn r_folder() -> Option<PathBuf> {
    if let Some(folder) = std::env::var_os(R_FOLDER_VAR) {
        return Some(PathBuf::from(folder));
    }
    if cfg!(target_os = "windows") {
        discover_windows_r_folder()
    } else {
        None
    }
}

fn discover_windows_r_folder() -> Option<PathBuf> {
    let mut install_root = PathBuf::from("C:\\R");
    for var in ["ProgramW6432", "PROGRAMFILES(x86)", "PROGRAMFILES"] {
        if let Some(value) = std::env::var_os(var) {
            let candidate = PathBuf::from(value).join("R");
            if candidate.is_dir() {
                install_root = candidate;
                break;
            }
        }
    }
    if !install_root.is_dir() {
        return None;
    }

    let mut versions: Vec<PathBuf> = fs::read_dir(&install_root)
        .ok()?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with("R-"))
        })
        .collect();
    versions.sort();
    versions.pop()
}

/// The user package library directory, created on demand.
#[must_use]
pub fn r_libs_folder() -> PathBuf {
    let folder = std::env::var_os(R_LIBS_VAR)
        .map(PathBuf::from)
        .or_else(|| user_folder().map(|base| base.join("rlibs")))
        .unwrap_or_else(|| PathBuf::from("rlibs"));
    let _ = fs::create_dir_all(&folder);
    folder
}

/// The folders searched for annotated scripts.
#[must_use]
pub fn script_folders() -> Vec<PathBuf> {
    if let Ok(value) = std::env::var(SCRIPTS_FOLDER_VAR) {
        return value
            .split(';')
            .filter(|part| !part.is_empty())
            .map(PathBuf::from)
            .collect();
    }
    match user_folder() {
        Some(base) => {
            let folder = base.join("rscripts");
            let _ = fs::create_dir_all(&folder);
            vec![folder]
        }
        None => Vec::new(),
    }
}

/// Whether to run the 64-bit R executable on Windows.
#[must_use]
pub fn use_64bit() -> bool {
    std::env::var(R_USE64_VAR).is_ok_and(|value| value == "1" || value.eq_ignore_ascii_case("true"))
}
