//! # rbridge
//!
//! Translate annotated R analysis scripts into runnable R commands.
//!
//! ## Usage
//!
//! - Inspect a script: `rbridge analysis.rsx --inspect`
//! - Print the generated commands: `rbridge analysis.rsx --set layer=/data/dem.tif --show-commands`
//! - Execute a script: `rbridge analysis.rsx --set layer=/data/dem.tif --out result=/tmp/out.shp`
//! - List known scripts: `rbridge --list`

/// Entry point for the CLI tool.
fn main() {
    rbridge::cli::run_cli();
}
