//! Pipeline sequencing.

use crate::dialect::Dialect;
use crate::header::add_shared_header;
use crate::prune::strip_exported_vars;
use crate::wrapper::add_template_wrapper;
use camino::Utf8Path;
use rustc_hash::FxHashSet;
use smol_str::SmolStr;
use source_map::SourceMapV3;

/// Compiled JavaScript together with the source map that describes it.
///
/// Each pipeline stage consumes one artifact and yields the next; nothing is
/// shared between stages.
#[derive(Debug, Clone)]
pub struct CompiledArtifact {
    pub js: String,
    pub source_map: SourceMapV3,
}

/// Runs the post-compilation pipeline over one compiled file.
///
/// Stage order is fixed: prune the exported declarations, apply the template
/// wrapper when the dialect calls for one, then always inject the
/// shared-scope header. Only the header stage can change the line count, and
/// it keeps the map in step when it does.
pub fn postprocess(
    artifact: CompiledArtifact,
    file_path: &Utf8Path,
    dialect: Dialect,
    exports: &FxHashSet<SmolStr>,
) -> CompiledArtifact {
    let CompiledArtifact { js, mut source_map } = artifact;

    let js = strip_exported_vars(&js, exports);

    let js = match dialect.wrapper() {
        Some(kind) => add_template_wrapper(&js, file_path, kind),
        None => js,
    };

    let js = add_shared_header(&js, &mut source_map);

    CompiledArtifact { js, source_map }
}
