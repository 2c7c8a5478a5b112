//! plv8gen core library - PL/v8 function definitions from compiled TypeScript modules

// Global invariants enforced in this crate:
// - Conversion is strictly per-module; no state is shared between units
// - No randomness, clocks, threads, or async
// - Deterministic traversal order must be explicit
// - Identical input yields byte-for-byte identical output
// - A failing unit never aborts the rest of the run

pub mod body;
pub mod config;
pub mod convert;
pub mod discover;
pub mod error;
pub mod generate;
pub mod parser;
pub mod signature;

pub use config::ResolvedConfig;
pub use convert::{convert_tree, convert_unit, ConversionSummary, FailedUnit};
pub use discover::ModuleUnit;
pub use error::ConvertError;
pub use generate::ProcedureDefinition;

use std::path::{Path, PathBuf};

/// Append `suffix` to the full path (`dir/addOne` + `.d.ts` -> `dir/addOne.d.ts`)
///
/// Unlike `Path::with_extension`, this never replaces an existing dot segment.
pub(crate) fn with_suffix(stem: &Path, suffix: &str) -> PathBuf {
    let mut path = stem.as_os_str().to_owned();
    path.push(suffix);
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_suffix_keeps_dotted_stems() {
        assert_eq!(
            with_suffix(Path::new("fns/addOne.test"), ".js"),
            PathBuf::from("fns/addOne.test.js")
        );
        assert_eq!(
            with_suffix(Path::new("fns/addOne"), ".d.ts"),
            PathBuf::from("fns/addOne.d.ts")
        );
    }
}
