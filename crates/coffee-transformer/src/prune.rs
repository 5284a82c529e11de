//! Declaration pruning.
//!
//! The compiler collects every top-level binding of a file into a single
//! unindented `var` line. Names the package has declared as exports must not
//! be bound at file scope, since the enclosing package closure supplies
//! them, so they are removed from that line here.
//!
//! The edit relies on the compiler's observed output shape:
//! - there is exactly one unindented, assignment-free `var` line, and every
//!   relevant name is on it;
//! - declaration lines that carry assignments only ever hold compiler
//!   helpers, never user bindings, and are skipped whole.
//!
//! Only the first qualifying line is ever edited. If the output violates the
//! shape (names spread over several lines), the extras stay unpruned:
//! downstream export binding depends on matching the compiler's shape, so
//! this stays first-match-only rather than getting "fixed".

use rustc_hash::FxHashSet;
use smol_str::SmolStr;

/// Removes `exports` from the compiled file's top-level `var` declaration
/// line, preserving the line count and every line's byte offsets.
///
/// With an empty export set, or when no qualifying line exists, the input
/// comes back unchanged.
pub fn strip_exported_vars(source: &str, exports: &FxHashSet<SmolStr>) -> String {
    if exports.is_empty() {
        return source.to_string();
    }

    let mut lines: Vec<String> = source.split('\n').map(String::from).collect();

    for line in &mut lines {
        let Some((names, terminator)) = split_declaration_line(line) else {
            continue;
        };

        let kept: Vec<&str> = names
            .split(", ")
            .filter(|name| !exports.contains(*name))
            .collect();

        let replacement = if !kept.is_empty() {
            format!("var {}{}", kept.join(", "), terminator)
        } else if terminator == ';' {
            // Every name on the line was an export; drop the whole statement.
            String::new()
        } else {
            // The declaration continues on the next line, so the keyword has
            // to survive for the continuation to stay attached.
            "var".to_string()
        };

        // The replacement can only shrink, so padding restores the exact
        // original length and every later line's offsets stay valid.
        let width = line.len();
        *line = replacement;
        while line.len() < width {
            line.push(' ');
        }
        break;
    }

    lines.join("\n")
}

/// Splits a candidate declaration line into its name list and terminator.
///
/// A candidate is unindented, starts with `var `, ends in `;` or `,`, and
/// carries no assignment.
fn split_declaration_line(line: &str) -> Option<(&str, char)> {
    let rest = line.strip_prefix("var ")?;
    let terminator = rest.chars().last()?;
    if terminator != ';' && terminator != ',' {
        return None;
    }
    let names = &rest[..rest.len() - 1];
    if names.is_empty() || names.contains('=') {
        return None;
    }
    Some((names, terminator))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn exports(names: &[&str]) -> FxHashSet<SmolStr> {
        names.iter().map(|n| SmolStr::new(n)).collect()
    }

    #[test]
    fn empty_export_set_is_identity() {
        let source = "var a, b;\na = 1;\n";
        assert_eq!(strip_exported_vars(source, &exports(&[])), source);
    }

    #[test]
    fn removes_exported_name_and_pads() {
        let source = "var a, b;\na = 1;\n\nb = 2;\n";
        let result = strip_exported_vars(source, &exports(&["a"]));
        assert_eq!(result, "var b;   \na = 1;\n\nb = 2;\n");
    }

    #[test]
    fn removing_every_name_blanks_the_line() {
        let source = "var a, b;\na = 1;\n";
        let result = strip_exported_vars(source, &exports(&["a", "b"]));
        assert_eq!(result, "         \na = 1;\n");
    }

    #[test]
    fn continuation_line_keeps_the_keyword() {
        let source = "var a,\n  b;\na = 1;\n";
        let result = strip_exported_vars(source, &exports(&["a"]));
        assert_eq!(result, "var   \n  b;\na = 1;\n");
    }

    #[test]
    fn assignment_lines_are_skipped_entirely() {
        let source = "var _this = this;\nvar a, b;\n";
        let result = strip_exported_vars(source, &exports(&["a"]));
        assert_eq!(result, "var _this = this;\nvar b;   \n");
    }

    #[test]
    fn indented_declarations_never_match() {
        let source = "f = function() {\n  var a;\n};\n";
        assert_eq!(strip_exported_vars(source, &exports(&["a"])), source);
    }

    #[test]
    fn only_the_first_qualifying_line_is_edited() {
        let source = "var a;\nvar b;\n";
        let result = strip_exported_vars(source, &exports(&["a", "b"]));
        assert_eq!(result, "      \nvar b;\n");
    }

    #[test]
    fn no_qualifying_line_is_a_no_op() {
        let source = "foo();\nbar();\n";
        assert_eq!(strip_exported_vars(source, &exports(&["a"])), source);
    }

    #[test]
    fn names_absent_from_the_line_leave_it_untouched_in_content() {
        let source = "var a, b;\n";
        let result = strip_exported_vars(source, &exports(&["zz"]));
        assert_eq!(result, "var a, b;\n");
    }

    #[test]
    fn line_count_and_lengths_are_preserved() {
        let source = "var alpha, beta, gamma;\nalpha = 1;\nbeta = 2;\n";
        let result = strip_exported_vars(source, &exports(&["alpha", "gamma"]));

        let original_lines: Vec<&str> = source.split('\n').collect();
        let result_lines: Vec<&str> = result.split('\n').collect();
        assert_eq!(result_lines.len(), original_lines.len());
        for (orig, new) in original_lines.iter().zip(&result_lines) {
            assert_eq!(orig.len(), new.len());
        }
        assert_eq!(result_lines[0], "var beta;              ");
    }
}
