//! Configuration file support for plv8gen
//!
//! Loads project-specific configuration from JSON files.
//!
//! Search order:
//! 1. Explicit path (--config CLI flag)
//! 2. `.plv8genrc.json` in project root
//! 3. `plv8gen.config.json` in project root
//! 4. `"plv8gen"` key in `package.json`
//!
//! All fields are optional. CLI flags take precedence over config file values.

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Function root used when neither config nor CLI names one
pub const DEFAULT_ROOT: &str = "build/src/functions";

/// Root files plus one level of schema directories
pub const DEFAULT_MAX_DEPTH: usize = 2;

/// Default exclude patterns applied when no config is specified
const DEFAULT_EXCLUDES: &[&str] = &["**/*.test.js", "**/*.spec.js"];

/// plv8gen configuration loaded from a JSON config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Plv8genConfig {
    /// Directory holding compiled function modules (default: build/src/functions)
    #[serde(default)]
    pub root: Option<PathBuf>,

    /// Emit `drop function if exists` before each definition
    #[serde(default)]
    pub drop: Option<bool>,

    /// How many directory levels below the root to scan (default: 2)
    #[serde(default)]
    pub max_depth: Option<usize>,

    /// Glob patterns, relative to the root, for modules to include (default: all)
    #[serde(default)]
    pub include: Vec<String>,

    /// Glob patterns, relative to the root, for modules to skip (default: test/spec files)
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Resolved configuration with compiled glob patterns
#[derive(Debug)]
pub struct ResolvedConfig {
    pub root: PathBuf,
    pub drop: bool,
    pub max_depth: usize,
    /// Compiled include patterns (None means include all)
    pub include: Option<GlobSet>,
    /// Compiled exclude patterns
    pub exclude: GlobSet,
    /// Path the config was loaded from (None if defaults)
    pub config_path: Option<PathBuf>,
}

impl Plv8genConfig {
    /// Validate the configuration for logical errors
    pub fn validate(&self) -> Result<()> {
        if self.max_depth == Some(0) {
            anyhow::bail!("max_depth must be at least 1 (got 0)");
        }

        if let Some(ref root) = self.root {
            if root.as_os_str().is_empty() {
                anyhow::bail!("root must not be empty");
            }
        }

        // Validate glob patterns compile
        for pattern in &self.include {
            Glob::new(pattern).with_context(|| format!("invalid include pattern: {}", pattern))?;
        }
        for pattern in &self.exclude {
            Glob::new(pattern).with_context(|| format!("invalid exclude pattern: {}", pattern))?;
        }

        Ok(())
    }

    /// Resolve config into compiled form ready for use
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        self.validate()?;

        let include = if self.include.is_empty() {
            None
        } else {
            Some(build_globset(self.include.iter().map(String::as_str))?)
        };

        // User excludes replace the defaults rather than extending them
        let exclude = if self.exclude.is_empty() {
            build_globset(DEFAULT_EXCLUDES.iter().copied())?
        } else {
            build_globset(self.exclude.iter().map(String::as_str))?
        };

        Ok(ResolvedConfig {
            root: self
                .root
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ROOT)),
            drop: self.drop.unwrap_or(false),
            max_depth: self.max_depth.unwrap_or(DEFAULT_MAX_DEPTH),
            include,
            exclude,
            config_path: None,
        })
    }
}

fn build_globset<'a>(patterns: impl Iterator<Item = &'a str>) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

impl ResolvedConfig {
    /// Check if a module path, relative to the root, passes include/exclude patterns
    pub fn should_include(&self, relative: &Path) -> bool {
        let path_str = relative.to_string_lossy();

        // Check exclude first
        if self.exclude.is_match(path_str.as_ref()) {
            return false;
        }

        // If include patterns exist, file must match at least one
        if let Some(ref include) = self.include {
            return include.is_match(path_str.as_ref());
        }

        true
    }

    /// Build a ResolvedConfig with all defaults (no config file)
    pub fn defaults() -> Result<Self> {
        Plv8genConfig::default().resolve()
    }
}

/// Discover and load a config file from the project root
///
/// Search order:
/// 1. `.plv8genrc.json`
/// 2. `plv8gen.config.json`
/// 3. `"plv8gen"` key in `package.json`
///
/// Returns `None` if no config file is found (use defaults).
pub fn discover_config(project_root: &Path) -> Result<Option<(Plv8genConfig, PathBuf)>> {
    for name in [".plv8genrc.json", "plv8gen.config.json"] {
        let path = project_root.join(name);
        if path.exists() {
            let config = load_config_file(&path)?;
            return Ok(Some((config, path)));
        }
    }

    let pkg_path = project_root.join("package.json");
    if pkg_path.exists() {
        if let Some(config) = load_from_package_json(&pkg_path)? {
            return Ok(Some((config, pkg_path)));
        }
    }

    Ok(None)
}

/// Load config from an explicit file path
pub fn load_config_file(path: &Path) -> Result<Plv8genConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;

    let config: Plv8genConfig = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;

    config
        .validate()
        .with_context(|| format!("invalid config in: {}", path.display()))?;

    Ok(config)
}

/// Load plv8gen config from the "plv8gen" key in package.json
fn load_from_package_json(path: &Path) -> Result<Option<Plv8genConfig>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let pkg: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    match pkg.get("plv8gen") {
        Some(value) => {
            let config: Plv8genConfig = serde_json::from_value(value.clone())
                .with_context(|| format!("invalid plv8gen config in {}", path.display()))?;
            config
                .validate()
                .with_context(|| format!("invalid plv8gen config in {}", path.display()))?;
            Ok(Some(config))
        }
        None => Ok(None),
    }
}

/// Load and resolve config for a project
///
/// If `config_path` is provided, loads from that file.
/// Otherwise, discovers config from the project root.
/// Returns default config if nothing is found.
pub fn load_and_resolve(project_root: &Path, config_path: Option<&Path>) -> Result<ResolvedConfig> {
    let (config, source_path) = if let Some(path) = config_path {
        let config = load_config_file(path)?;
        (config, Some(path.to_path_buf()))
    } else {
        match discover_config(project_root)? {
            Some((config, path)) => (config, Some(path)),
            None => (Plv8genConfig::default(), None),
        }
    };

    let mut resolved = config.resolve()?;
    // A relative root in a config file is relative to the project root
    if resolved.root.is_relative() {
        resolved.root = project_root.join(&resolved.root);
    }
    resolved.config_path = source_path;
    Ok(resolved)
}
