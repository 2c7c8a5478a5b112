//! PL/v8 function definition rendering and output
//!
//! Global invariants enforced:
//! - Rendering is a pure function of the definition and the drop flag
//! - Identical input yields byte-for-byte identical output

use crate::body::FunctionBody;
use crate::error::{ConvertError, Result};
use crate::signature::FunctionSignature;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Suffix appended to a unit stem for the generated definition
pub const OUTPUT_SUFFIX: &str = ".sql";

/// Everything needed to render one `create function` statement
#[derive(Debug, Clone)]
pub struct ProcedureDefinition {
    /// Schema qualifier; empty for functions directly under the root
    pub schema: String,
    pub signature: FunctionSignature,
    pub body: FunctionBody,
}

impl ProcedureDefinition {
    /// Function name, prefixed with `schema.` when a schema is set
    pub fn qualified_name(&self) -> String {
        if self.schema.is_empty() {
            self.signature.name.clone()
        } else {
            format!("{}.{}", self.schema, self.signature.name)
        }
    }

    /// Render the definition as SQL text with a single trailing newline
    pub fn render(&self, include_drop: bool) -> String {
        let qualified = self.qualified_name();
        let params = &self.signature.params;

        let mut lines: Vec<String> = Vec::with_capacity(self.body.lines.len() + 4);
        if include_drop {
            lines.push(format!("drop function if exists {}({});", qualified, params));
        }
        lines.push(format!("create or replace function {}({})", qualified, params));
        lines.push(format!("returns {} AS $$", self.signature.return_type));
        lines.extend(self.body.lines.iter().cloned());
        lines.push(format!("$$ language plv8{};", self.body.options.clause()));

        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}

/// Render `definition` and write it to `<stem>.sql`, replacing any existing file
pub fn write_definition(
    stem: &Path,
    definition: &ProcedureDefinition,
    include_drop: bool,
) -> Result<PathBuf> {
    let path = crate::with_suffix(stem, OUTPUT_SUFFIX);
    atomic_write(&path, &definition.render(include_drop))?;
    Ok(path)
}

/// Write through a temporary sibling and rename it into place
///
/// The temporary file is removed again if any step after its creation fails.
fn atomic_write(path: &Path, contents: &str) -> Result<()> {
    let temp_path = crate::with_suffix(path, ".tmp");

    let mut file = std::fs::File::create(&temp_path).map_err(|e| ConvertError::io(&temp_path, e))?;
    let written = file
        .write_all(contents.as_bytes())
        .and_then(|()| file.sync_all())
        .map_err(|e| ConvertError::io(&temp_path, e));
    drop(file);

    let result = written.and_then(|()| {
        std::fs::rename(&temp_path, path).map_err(|e| ConvertError::io(path, e))
    });
    if result.is_err() {
        let _ = std::fs::remove_file(&temp_path);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::PlOptions;

    /// `options` is a module source line; pass `""` for a module without a marker line
    fn definition(schema: &str, params: &str, return_type: &str, options: &str) -> ProcedureDefinition {
        ProcedureDefinition {
            schema: schema.to_string(),
            signature: FunctionSignature {
                name: "addOne".to_string(),
                params: params.to_string(),
                return_type: return_type.to_string(),
            },
            body: FunctionBody {
                name: "addOne".to_string(),
                lines: vec!["return n+1;".to_string()],
                options: PlOptions::from_lines([options]),
            },
        }
    }

    #[test]
    fn test_render_without_schema_or_options() {
        let sql = definition("", "n number", "number", "").render(false);
        assert_eq!(
            sql,
            "create or replace function addOne(n number)\n\
             returns number AS $$\n\
             return n+1;\n\
             $$ language plv8;\n"
        );
    }

    #[test]
    fn test_render_with_options() {
        let sql = definition("", "n number", "number", "// plv8: immutable").render(false);
        assert!(sql.ends_with("$$ language plv8 immutable;\n"));
    }

    #[test]
    fn test_marker_line_without_keywords_keeps_space() {
        let sql = definition("", "n number", "number", "// plv8: parallel safe").render(false);
        assert!(sql.ends_with("$$ language plv8 ;\n"));
    }

    #[test]
    fn test_render_qualifies_schema() {
        let def = definition("public", "n number", "number", "");
        assert_eq!(def.qualified_name(), "public.addOne");
        let sql = def.render(false);
        assert!(sql.starts_with("create or replace function public.addOne(n number)\n"));
    }

    #[test]
    fn test_drop_line_matches_create_line() {
        let sql = definition("public", "n number", "number", "").render(true);
        let lines: Vec<&str> = sql.lines().collect();
        assert_eq!(lines[0], "drop function if exists public.addOne(n number);");
        assert_eq!(lines[1], "create or replace function public.addOne(n number)");
    }

    #[test]
    fn test_render_trigger() {
        let sql = definition("audit", "", "trigger", "").render(false);
        assert!(sql.starts_with("create or replace function audit.addOne()\nreturns trigger AS $$\n"));
    }

    #[test]
    fn test_single_trailing_newline() {
        let sql = definition("", "", "void", "").render(true);
        assert!(sql.ends_with(";\n"));
        assert!(!sql.ends_with("\n\n"));
    }

    #[test]
    fn test_write_definition_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let stem = dir.path().join("addOne");
        std::fs::write(dir.path().join("addOne.sql"), "stale").unwrap();

        let def = definition("", "n number", "number", "");
        let path = write_definition(&stem, &def, false).unwrap();

        assert_eq!(path, dir.path().join("addOne.sql"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), def.render(false));
        assert!(!dir.path().join("addOne.sql.tmp").exists());
    }

    #[test]
    fn test_failed_rename_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let stem = dir.path().join("f");
        // A non-empty directory in the way makes the final rename fail
        std::fs::create_dir(dir.path().join("f.sql")).unwrap();
        std::fs::write(dir.path().join("f.sql").join("keep"), "x").unwrap();

        let def = definition("", "n number", "number", "");
        let err = write_definition(&stem, &def, false).unwrap_err();

        assert!(matches!(err, ConvertError::Io { .. }));
        assert!(!dir.path().join("f.sql.tmp").exists());
        assert!(dir.path().join("f.sql").join("keep").exists());
    }
}
