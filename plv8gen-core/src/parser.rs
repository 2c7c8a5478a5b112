//! Declaration and module parsing using SWC
//!
//! Global invariants enforced:
//! - Syntax is chosen from the file name alone
//! - Formatting, comments, and whitespace must not affect what is extracted

use crate::error::{ConvertError, Result};
use std::path::Path;
use swc_common::{sync::Lrc, FileName, SourceFile, SourceMap, SourceMapper, Span};
use swc_ecma_ast::{EsVersion, Module};
use swc_ecma_parser::{lexer::Lexer, Parser, StringInput, Syntax};

/// Determine the parser syntax for a declaration (`.d.ts`) or compiled module
fn syntax_for_file(filename: &str) -> Syntax {
    if filename.ends_with(".ts") {
        Syntax::Typescript(swc_ecma_parser::TsSyntax {
            tsx: false,
            decorators: false,
            dts: filename.ends_with(".d.ts"),
            ..Default::default()
        })
    } else {
        // Compiled output: plain ES module
        Syntax::Es(swc_ecma_parser::EsSyntax {
            jsx: false,
            decorators: false,
            ..Default::default()
        })
    }
}

/// Parse a `.d.ts` declaration file or a compiled `.js` module
///
/// The source is registered in `source_map` so spans in the returned module
/// can be turned back into text with [`snippet`].
pub fn parse_source(src: &str, source_map: &Lrc<SourceMap>, path: &Path) -> Result<Module> {
    let filename = path.to_string_lossy();
    let syntax = syntax_for_file(&filename);

    let source_file: Lrc<SourceFile> = source_map.new_source_file(
        FileName::Custom(filename.to_string()).into(),
        src.to_string(),
    );

    let input = StringInput::from(&*source_file);
    let lexer = Lexer::new(syntax, EsVersion::Es2022, input, None);
    let mut parser = Parser::new_from(lexer);

    let parse_error = |e: swc_ecma_parser::error::Error| ConvertError::Parse {
        path: path.to_path_buf(),
        message: e.kind().msg().to_string(),
    };

    let module = parser.parse_module().map_err(parse_error)?;

    // Recovered errors still mean the input is not what the compiler emits
    if let Some(e) = parser.take_errors().into_iter().next() {
        return Err(parse_error(e));
    }

    Ok(module)
}

/// Source text covered by `span`
pub fn snippet(source_map: &SourceMap, span: Span, path: &Path) -> Result<String> {
    source_map
        .span_to_snippet(span)
        .map_err(|e| ConvertError::Parse {
            path: path.to_path_buf(),
            message: format!("span outside of source: {:?}", e),
        })
}
