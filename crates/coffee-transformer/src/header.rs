//! Shared-scope header injection.

use source_map::SourceMapV3;

/// Header spliced into every compiled file.
///
/// `__coffeescriptShare` is visible at the package level (a pruned binding
/// in package mode, a global in app mode) while `share` is the file-local
/// alias, so CoffeeScript files can share package-local values without
/// reintroducing the top-level declarations the pruner removed.
/// Ends in a newline to keep the added-line source map adjustment simple.
pub const SHARED_HEADER: &str = "__coffeescriptShare = typeof __coffeescriptShare === 'object' \
     ? __coffeescriptShare : {}; var share = __coffeescriptShare;\n";

/// Injects [`SHARED_HEADER`] into `source`, updating `source_map` when the
/// edit changes the line count.
///
/// A leading strict-mode directive has to stay the first statement, so in
/// that case the header is appended to the directive's own line and the map
/// is untouched. Otherwise the header becomes a new first line and the map
/// gets one unmapped group prepended, shifting every following line's
/// mapping down by one index.
pub fn add_shared_header(source: &str, source_map: &mut SourceMapV3) -> String {
    for directive in ["\"use strict\";", "'use strict';"] {
        let with_newline = format!("{directive}\n");
        if let Some(rest) = source.strip_prefix(&with_newline) {
            return format!("{directive}  {SHARED_HEADER}{rest}");
        }
    }

    source_map.prepend_unmapped_line();
    format!("{SHARED_HEADER}{source}")
}
