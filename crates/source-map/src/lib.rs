//! Version-3 source map model for coffee-build-rs.
//!
//! This crate provides a structured view of the JSON source maps produced by
//! the CoffeeScript compiler, so the post-compilation pipeline can keep the
//! map valid while it edits the generated JavaScript. The only structural
//! edit the pipeline ever performs is prepending a single unmapped generated
//! line; everything else is in-place text surgery that leaves the map alone.

mod v3;

pub use v3::{SourceMapError, SourceMapV3};
