//! Client-facing layer for the Karel simulator: command scripts, the help
//! table, history paging and run reports.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use karel_core::{KarelConfig, World};

pub mod command;
pub mod present;
pub mod report;
pub mod script;

pub use command::{Answer, COMMANDS, Command, CommandHelp, Query, help_text};
pub use present::{Page, Pager, latest};
pub use report::{FrameRecord, RunSummary};
pub use script::{Failure, QueryRecord, RunReport, Script, ScriptError};

/// Reads and parses a command script.
pub fn load_script(path: &Path) -> Result<Script> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read script {}", path.display()))?;
    Script::parse(&text).with_context(|| format!("failed to parse script {}", path.display()))
}

/// Reads a JSON [`KarelConfig`]; missing fields take their defaults.
pub fn load_config(path: &Path) -> Result<KarelConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config: KarelConfig = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(config)
}

/// Reads a text grid (`.` open, `#` wall, digits for beepers; top row first).
pub fn load_world(path: &Path) -> Result<World> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read world {}", path.display()))?;
    World::parse(&text).with_context(|| format!("failed to parse world {}", path.display()))
}
