//! Module discovery under the function root
//!
//! Global invariants enforced:
//! - Deterministic traversal order (file names sorted at every level)
//! - Files deeper than `max_depth` are never returned
//! - Schema is the first path segment below the root, empty for root files

use crate::body::MODULE_SUFFIX;
use crate::config::ResolvedConfig;
use anyhow::{Context, Result};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// A compiled module and the schema it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleUnit {
    /// `<dir>/<name>` without extension; inputs and output hang off this
    pub stem: PathBuf,
    /// Module file name without the `.js` suffix
    pub name: String,
    /// First directory below the root, or empty
    pub schema: String,
}

/// Collect every convertible module below `config.root`
///
/// Fails if the root does not exist or cannot be read.
pub fn discover_modules(config: &ResolvedConfig) -> Result<Vec<ModuleUnit>> {
    let root = &config.root;
    if !root.is_dir() {
        anyhow::bail!("function root is not a directory: {}", root.display());
    }

    let mut units = Vec::new();
    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(config.max_depth)
        .follow_links(false)
        .sort_by_file_name();

    for entry in walker {
        let entry =
            entry.with_context(|| format!("failed to read directory: {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let Some(file_name) = entry.file_name().to_str() else {
            continue;
        };
        let Some(name) = file_name.strip_suffix(MODULE_SUFFIX) else {
            continue;
        };
        if name.is_empty() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(root)
            .with_context(|| format!("{} escaped the function root", entry.path().display()))?;
        if !config.should_include(relative) {
            tracing::debug!("excluded by config: {}", relative.display());
            continue;
        }

        units.push(ModuleUnit {
            stem: entry.path().with_file_name(name),
            name: name.to_string(),
            schema: schema_for(relative),
        });
    }

    Ok(units)
}

/// Schema name for a module path relative to the root
fn schema_for(relative: &Path) -> String {
    let mut components = relative.components();
    // Drop the file name; whatever remains is the directory chain
    components.next_back();
    match components.next() {
        Some(Component::Normal(dir)) => dir.to_string_lossy().into_owned(),
        _ => String::new(),
    }
}
