//! Conversion orchestration - ties together discovery, extraction, and generation

use crate::body;
use crate::config::ResolvedConfig;
use crate::discover::{self, ModuleUnit};
use crate::error::{ConvertError, Result};
use crate::generate::{self, ProcedureDefinition};
use crate::signature;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static SQL_IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]*$").expect("valid identifier regex"));

/// A unit that could not be converted, and why
#[derive(Debug)]
pub struct FailedUnit {
    pub unit: ModuleUnit,
    pub error: ConvertError,
}

/// Outcome of a whole run
#[derive(Debug, Default)]
pub struct ConversionSummary {
    /// Paths of the generated `.sql` files, in discovery order
    pub converted: Vec<PathBuf>,
    pub failed: Vec<FailedUnit>,
}

impl ConversionSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Build the validated definition for one unit without writing anything
pub fn build_definition(unit: &ModuleUnit) -> Result<ProcedureDefinition> {
    if !unit.schema.is_empty() && !SQL_IDENTIFIER.is_match(&unit.schema) {
        return Err(ConvertError::InvalidSchema {
            path: unit.stem.clone(),
            schema: unit.schema.clone(),
        });
    }

    let signature = signature::extract_signature(&unit.stem)?;
    let body = body::extract_body(&unit.stem)?;

    if signature.name != body.name {
        return Err(ConvertError::NameMismatch {
            path: unit.stem.clone(),
            declared: signature.name,
            exported: body.name,
        });
    }

    tracing::debug!(
        "{}: {}({}) returns {}{}",
        unit.stem.display(),
        signature.name,
        signature.params,
        signature.return_type,
        body.options.clause()
    );

    Ok(ProcedureDefinition {
        schema: unit.schema.clone(),
        signature,
        body,
    })
}

/// Convert one unit and write `<stem>.sql`
pub fn convert_unit(unit: &ModuleUnit, include_drop: bool) -> Result<PathBuf> {
    let definition = build_definition(unit)?;
    generate::write_definition(&unit.stem, &definition, include_drop)
}

/// Convert every module under the configured root
///
/// Per-unit failures are logged and collected; they never stop the walk.
/// Only a missing or unreadable root is returned as an error.
pub fn convert_tree(config: &ResolvedConfig) -> anyhow::Result<ConversionSummary> {
    let units = discover::discover_modules(config)?;
    Ok(convert_units(units, config.drop))
}

/// Convert already-discovered units in order
pub fn convert_units(units: Vec<ModuleUnit>, include_drop: bool) -> ConversionSummary {
    let mut summary = ConversionSummary::default();

    for unit in units {
        tracing::info!("Converting {}", display_name(&unit));
        match convert_unit(&unit, include_drop) {
            Ok(path) => summary.converted.push(path),
            Err(error) => {
                tracing::error!("{}", error);
                summary.failed.push(FailedUnit { unit, error });
            }
        }
    }

    summary
}

/// `schema/name` for schema units, `name` otherwise
pub fn display_name(unit: &ModuleUnit) -> String {
    if unit.schema.is_empty() {
        unit.name.clone()
    } else {
        Path::new(&unit.schema).join(&unit.name).display().to_string()
    }
}
