//! Post-compilation JavaScript transformation for coffee-build-rs.
//!
//! The CoffeeScript compiler hands back JavaScript plus a V3 source map.
//! Before that output can join a package build, three textual edits run over
//! it, in order:
//!
//! - Pruning: package-exported names are removed from the compiled file's
//!   top-level `var` declaration line, so those bindings land in the
//!   enclosing package scope instead of the file scope.
//! - Wrapping (helpers/events dialects only): the bare object literal the
//!   compiler emits is turned into a `Template.<name>.<kind>` assignment
//!   target.
//! - Header injection: a shared-namespace header is spliced in so files in
//!   the same package can share bindings through `share`.
//!
//! Every edit is line-preserving: replacements are padded to the original
//! line length and insertions stay within a line. The one exception is the
//! header becoming a new first line, which is paired with a single unmapped
//! group prepended to the source map. That discipline is what keeps the
//! compiler's map valid without re-encoding any of it.
//!
//! # Example
//!
//! ```
//! use camino::Utf8Path;
//! use coffee_transformer::{postprocess, CompiledArtifact, Dialect, SHARED_HEADER};
//! use source_map::SourceMapV3;
//!
//! let artifact = CompiledArtifact {
//!     js: "foo();\n".to_string(),
//!     source_map: SourceMapV3::from_json(
//!         r#"{"version":3,"sources":["app.coffee"],"names":[],"mappings":"AAAA"}"#,
//!     )
//!     .unwrap(),
//! };
//!
//! let exports = Default::default();
//! let result = postprocess(
//!     artifact,
//!     Utf8Path::new("app.coffee"),
//!     Dialect::Plain,
//!     &exports,
//! );
//! assert!(result.js.starts_with(SHARED_HEADER));
//! ```

mod dialect;
mod header;
mod prune;
mod transform;
mod wrapper;

pub use dialect::{Dialect, WrapperKind};
pub use header::{add_shared_header, SHARED_HEADER};
pub use prune::strip_exported_vars;
pub use transform::{postprocess, CompiledArtifact};
pub use wrapper::{add_template_wrapper, template_base_name};
