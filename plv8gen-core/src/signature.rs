//! Function signature extraction from `.d.ts` declaration files
//!
//! The declaration emitted next to each compiled module carries the typed
//! signature that the compiled `.js` has lost. Only the first declared
//! function is used.

use crate::error::{ConvertError, Result};
use crate::parser;
use std::path::Path;
use swc_common::{sync::Lrc, SourceMap, Spanned};
use swc_ecma_ast::{Decl, FnDecl, ModuleDecl, ModuleItem, Param, Pat, Stmt, TsTypeAnn};

/// Suffix appended to a unit stem to find its declaration file
pub const DECLARATION_SUFFIX: &str = ".d.ts";

/// Return type that marks a trigger procedure
pub const TRIGGER_RETURN_TYPE: &str = "trigger";

/// Name, parameter list and return type of a declared function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSignature {
    pub name: String,
    /// Parameter list as written, with every `:` removed (`n number, s text`)
    pub params: String,
    pub return_type: String,
}

impl FunctionSignature {
    pub fn is_trigger(&self) -> bool {
        self.return_type == TRIGGER_RETURN_TYPE
    }
}

/// Read `<stem>.d.ts` and extract the declared function signature
pub fn extract_signature(stem: &Path) -> Result<FunctionSignature> {
    let path = crate::with_suffix(stem, DECLARATION_SUFFIX);
    let src = std::fs::read_to_string(&path).map_err(|e| ConvertError::io(&path, e))?;
    parse_declaration(&src, &path)
}

/// Extract the signature from declaration source text
///
/// `path` is used for parser syntax selection and diagnostics.
pub fn parse_declaration(src: &str, path: &Path) -> Result<FunctionSignature> {
    let cm: Lrc<SourceMap> = Default::default();
    let module = parser::parse_source(src, &cm, path)?;

    let decl = module
        .body
        .iter()
        .find_map(declared_function)
        .ok_or_else(|| ConvertError::MissingDeclaration {
            path: path.to_path_buf(),
        })?;

    let name = decl.ident.sym.to_string();

    let return_type = match &decl.function.return_type {
        Some(ann) => parser::snippet(&cm, ann.type_ann.span(), path)?.trim().to_string(),
        None => {
            return Err(ConvertError::MissingReturnType {
                path: path.to_path_buf(),
                name,
            })
        }
    };

    if return_type == TRIGGER_RETURN_TYPE {
        // Triggers receive NEW/OLD implicitly; declared parameters are dropped
        return Ok(FunctionSignature {
            name,
            params: String::new(),
            return_type: TRIGGER_RETURN_TYPE.to_string(),
        });
    }

    let params = parameter_list(&cm, &decl.function.params, path)?.replace(':', "");

    Ok(FunctionSignature {
        name,
        params,
        return_type,
    })
}

/// Match a bodiless function declaration, bare or exported
fn declared_function(item: &ModuleItem) -> Option<&FnDecl> {
    let decl = match item {
        ModuleItem::Stmt(Stmt::Decl(decl)) => decl,
        ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) => &export.decl,
        _ => return None,
    };
    match decl {
        Decl::Fn(fn_decl) if fn_decl.function.body.is_none() => Some(fn_decl),
        _ => None,
    }
}

/// Source text from the first parameter through the last one, annotations included
fn parameter_list(cm: &SourceMap, params: &[Param], path: &Path) -> Result<String> {
    let (Some(first), Some(last)) = (params.first(), params.last()) else {
        return Ok(String::new());
    };
    let hi = match pattern_annotation(&last.pat) {
        Some(ann) => last.span.hi.max(ann.span.hi),
        None => last.span.hi,
    };
    Ok(parser::snippet(cm, first.span.with_hi(hi), path)?.trim().to_string())
}

fn pattern_annotation(pat: &Pat) -> Option<&TsTypeAnn> {
    match pat {
        Pat::Ident(ident) => ident.type_ann.as_deref(),
        Pat::Rest(rest) => rest.type_ann.as_deref(),
        Pat::Array(array) => array.type_ann.as_deref(),
        Pat::Object(object) => object.type_ann.as_deref(),
        _ => None,
    }
}
