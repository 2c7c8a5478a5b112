//! Function body and PL/v8 option extraction from compiled modules
//!
//! Global invariants enforced:
//! - Exactly one top-level `export function` per module
//! - Body lines are copied verbatim; only code sharing a line with a brace is trimmed
//! - Option order follows `OPTION_VOCABULARY`, never the source line

use crate::error::{ConvertError, Result};
use crate::parser;
use std::path::Path;
use swc_common::{sync::Lrc, SourceMap};
use swc_ecma_ast::{Decl, FnDecl, ModuleDecl, ModuleItem};

/// Suffix appended to a unit stem to find its compiled module
pub const MODULE_SUFFIX: &str = ".js";

/// Substring marking the comment line that carries procedure options
pub const OPTIONS_MARKER: &str = "plv8:";

/// Recognized procedure options, in output order
pub const OPTION_VOCABULARY: [&str; 5] = [
    "immutable",
    "stable",
    "volatile",
    "security definer",
    "security invoker",
];

/// Procedure attributes found on the options marker line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlOptions {
    /// Whether a marker line was present at all
    marked: bool,
    found: Vec<&'static str>,
}

impl PlOptions {
    /// Detect options in the first line of `lines` that carries the marker
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        lines
            .into_iter()
            .find(|line| line.contains(OPTIONS_MARKER))
            .map(Self::from_marker_line)
            .unwrap_or_default()
    }

    /// Detect options by substring presence in a single marker line
    pub fn from_marker_line(line: &str) -> Self {
        let found = OPTION_VOCABULARY
            .iter()
            .copied()
            .filter(|option| line.contains(option))
            .collect();
        PlOptions { marked: true, found }
    }

    pub fn is_empty(&self) -> bool {
        self.found.is_empty()
    }

    pub fn keywords(&self) -> &[&'static str] {
        &self.found
    }

    /// Suffix for the `language plv8` clause
    ///
    /// Empty without a marker line; otherwise a leading space and the keywords,
    /// so a marker line with no known keyword still yields a single space.
    pub fn clause(&self) -> String {
        if self.marked {
            format!(" {}", self.found.join(" "))
        } else {
            String::new()
        }
    }
}

/// Body of the exported function plus its procedure options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionBody {
    /// Name of the exported function
    pub name: String,
    pub lines: Vec<String>,
    pub options: PlOptions,
}

/// Read `<stem>.js` and extract the exported function body
pub fn extract_body(stem: &Path) -> Result<FunctionBody> {
    let path = crate::with_suffix(stem, MODULE_SUFFIX);
    let src = std::fs::read_to_string(&path).map_err(|e| ConvertError::io(&path, e))?;
    parse_module_body(&src, &path)
}

/// Extract the body and options from compiled module source text
pub fn parse_module_body(src: &str, path: &Path) -> Result<FunctionBody> {
    let options = PlOptions::from_lines(src.lines());

    let cm: Lrc<SourceMap> = Default::default();
    let module = parser::parse_source(src, &cm, path)?;

    let exported: Vec<&FnDecl> = module.body.iter().filter_map(exported_function).collect();
    let function = match exported.as_slice() {
        [] => {
            return Err(ConvertError::MissingExport {
                path: path.to_path_buf(),
            })
        }
        [function] => *function,
        many => {
            return Err(ConvertError::MultipleExports {
                path: path.to_path_buf(),
                count: many.len(),
            })
        }
    };

    let name = function.ident.sym.to_string();
    let block = function
        .function
        .body
        .as_ref()
        .ok_or_else(|| ConvertError::MissingExport {
            path: path.to_path_buf(),
        })?;
    let block_text = parser::snippet(&cm, block.span, path)?;

    Ok(FunctionBody {
        name,
        lines: body_lines(&block_text),
        options,
    })
}

fn exported_function(item: &ModuleItem) -> Option<&FnDecl> {
    match item {
        ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) => match &export.decl {
            Decl::Fn(fn_decl) => Some(fn_decl),
            _ => None,
        },
        _ => None,
    }
}

/// Lines strictly inside a `{ ... }` block
///
/// Code on the same line as the opening or closing brace is kept, trimmed,
/// so `{ return n + 1; }` yields `return n + 1;`.
fn body_lines(block: &str) -> Vec<String> {
    let inner = block
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
        .unwrap_or(block);

    let mut lines: Vec<&str> = inner.lines().collect();
    // `lines()` drops a trailing empty segment, so re-add it when the block ends on a newline
    if inner.ends_with('\n') {
        lines.push("");
    }

    let last = lines.len().saturating_sub(1);
    lines
        .iter()
        .enumerate()
        .filter_map(|(idx, line)| {
            if idx == 0 || idx == last {
                let trimmed = line.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            } else {
                Some(line.to_string())
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn parse(src: &str) -> Result<FunctionBody> {
        parse_module_body(src, &PathBuf::from("fixture.js"))
    }

    #[test]
    fn test_multiline_body_is_verbatim() {
        let src = "export function addOne(n) {\n    const m = n + 1;\n    return m;\n}\n";
        let body = parse(src).unwrap();
        assert_eq!(body.name, "addOne");
        assert_eq!(body.lines, vec!["    const m = n + 1;", "    return m;"]);
        assert!(body.options.is_empty());
    }

    #[test]
    fn test_single_line_body() {
        let body = parse("export function addOne(n) { return n+1; }\n").unwrap();
        assert_eq!(body.lines, vec!["return n+1;"]);
    }

    #[test]
    fn test_empty_body() {
        let body = parse("export function noop() {\n}\n").unwrap();
        assert!(body.lines.is_empty());
    }

    #[test]
    fn test_blank_lines_inside_body_are_kept() {
        let src = "export function f() {\n    let a = 1;\n\n    return a;\n}\n";
        let body = parse(src).unwrap();
        assert_eq!(body.lines, vec!["    let a = 1;", "", "    return a;"]);
    }

    #[test]
    fn test_code_after_body_is_excluded() {
        // Only the exported function's braces bound the body
        let src = "export function f() {\n    return helper();\n}\nfunction helper() {\n    return 1;\n}\n";
        let body = parse(src).unwrap();
        assert_eq!(body.lines, vec!["    return helper();"]);
    }

    #[test]
    fn test_options_detected_in_vocabulary_order() {
        let src = "// plv8: security definer volatile\nexport function f() {\n    return 1;\n}\n";
        let body = parse(src).unwrap();
        assert_eq!(body.options.keywords(), &["volatile", "security definer"]);
        assert_eq!(body.options.clause(), " volatile security definer");
    }

    #[test]
    fn test_only_first_options_line_counts() {
        let lines = ["// plv8: immutable", "// plv8: security invoker"];
        let options = PlOptions::from_lines(lines);
        assert_eq!(options.keywords(), &["immutable"]);
    }

    #[test]
    fn test_no_options_line_gives_empty_clause() {
        let options = PlOptions::from_lines(["export function f() {}"]);
        assert!(options.is_empty());
        assert_eq!(options.clause(), "");
    }

    #[test]
    fn test_marker_line_without_known_options() {
        let options = PlOptions::from_marker_line("// plv8: parallel safe");
        assert!(options.is_empty());
        assert_eq!(options.clause(), " ");
    }

    #[test]
    fn test_missing_export() {
        let err = parse("function addOne(n) { return n + 1; }\n").unwrap_err();
        assert!(matches!(err, ConvertError::MissingExport { .. }));
        assert!(err.to_string().contains("'export function'"));
    }

    #[test]
    fn test_multiple_exports_fail_fast() {
        let src = "export function a() {\n    return 1;\n}\nexport function b() {\n    return 2;\n}\n";
        let err = parse(src).unwrap_err();
        assert!(matches!(err, ConvertError::MultipleExports { count: 2, .. }));
    }

    #[test]
    fn test_exported_constants_are_not_functions() {
        let src = "export const LIMIT = 10;\nexport function f() {\n    return LIMIT;\n}\n";
        let body = parse(src).unwrap();
        assert_eq!(body.name, "f");
    }
}
