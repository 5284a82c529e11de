//! Template wrapper injection.
//!
//! A `.helpers.coffee` or `.events.coffee` file compiles to a bare
//! parenthesized object literal. Prefixing that literal with
//! `Template.<name>.<kind>` turns it into a call on the template's binding
//! map. The prefix lands on the line where the literal opens, past any
//! strict-mode directive and compiler helper declarations, so no line is
//! added and the source map needs no adjustment.

use crate::dialect::WrapperKind;
use camino::Utf8Path;

/// Inserts the `Template.<name>.<kind>` prefix into compiled wrapper-dialect
/// output. Line count is unchanged.
pub fn add_template_wrapper(source: &str, file_path: &Utf8Path, kind: WrapperKind) -> String {
    let prefix = format!(
        "Template.{}.{}",
        template_base_name(file_path, kind),
        kind.as_str()
    );

    let at = insert_offset(source);
    let mut out = String::with_capacity(source.len() + prefix.len());
    out.push_str(&source[..at]);
    out.push_str(&prefix);
    out.push_str(&source[at..]);
    out
}

/// Template name for a wrapper-dialect file: the file name with the dialect
/// suffix stripped (`sidebar.helpers.coffee` -> `sidebar`).
pub fn template_base_name(file_path: &Utf8Path, kind: WrapperKind) -> String {
    let name = file_path.file_name().unwrap_or(file_path.as_str());
    name.strip_suffix(kind.suffix()).unwrap_or(name).to_string()
}

/// Byte offset of the line where the object literal begins: past the leading
/// run of strict-mode directives, top-level `var ...;` helper lines, and any
/// blank lines trailing them. The run may be empty, in which case the prefix
/// lands at the very start.
fn insert_offset(source: &str) -> usize {
    let mut offset = 0;
    let mut in_run = false;

    for line in source.split_inclusive('\n') {
        // A line without its newline cannot be part of the leading run.
        let Some(text) = line.strip_suffix('\n') else {
            break;
        };

        let is_directive = text == "\"use strict\";" || text == "'use strict';";
        let is_helper_decl = text.starts_with("var") && text.ends_with(';');

        if is_directive || is_helper_decl {
            in_run = true;
            offset += line.len();
        } else if text.is_empty() && in_run {
            // Blank lines only belong to the run once it has started.
            offset += line.len();
        } else {
            break;
        }
    }

    offset
}
