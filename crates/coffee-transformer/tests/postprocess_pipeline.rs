//! End-to-end tests for the post-compilation pipeline.
//!
//! These feed compiler-shaped JavaScript + source map pairs through the full
//! prune -> wrap -> header sequence and check the emitted text together with
//! the map bookkeeping.

use camino::Utf8Path;
use coffee_transformer::{postprocess, CompiledArtifact, Dialect, SHARED_HEADER};
use pretty_assertions::assert_eq;
use rustc_hash::FxHashSet;
use smol_str::SmolStr;
use source_map::SourceMapV3;

fn compiler_output(js: &str, mappings: &str) -> CompiledArtifact {
    CompiledArtifact {
        js: js.to_string(),
        source_map: SourceMapV3::from_json(&format!(
            r#"{{
                "version": 3,
                "file": "/app.coffee.js",
                "sources": ["app.coffee"],
                "names": [],
                "mappings": "{mappings}",
                "sourcesContent": ["a = 1\nb = 2\n"]
            }}"#
        ))
        .unwrap(),
    }
}

fn exports(names: &[&str]) -> FxHashSet<SmolStr> {
    names.iter().map(|n| SmolStr::new(n)).collect()
}

/// The compiled shape of `a = 1\nb = 2` with `a` exported by the package:
/// `b` stays declared locally, `a` does not, and the shared header leads.
#[test]
fn full_pipeline_for_a_plain_file() {
    let input = compiler_output("var a, b;\n\na = 1;\n\nb = 2;\n", "AAAA;;AACA;;AACA");
    let result = postprocess(
        input,
        Utf8Path::new("app.coffee"),
        Dialect::Plain,
        &exports(&["a"]),
    );

    let lines: Vec<&str> = result.js.split('\n').collect();
    assert_eq!(lines[0], SHARED_HEADER.trim_end_matches('\n'));
    assert_eq!(lines[1], "var b;   ");
    assert!(result.js.contains("a = 1;"));
    assert!(result.js.contains("b = 2;"));

    // One generated line was added, and exactly one unmapped group with it.
    assert_eq!(result.source_map.mappings, ";AAAA;;AACA;;AACA");
}

#[test]
fn strict_mode_file_keeps_its_line_count() {
    let input = compiler_output("\"use strict\";\nvar a;\n\na = 1;\n", "AAAA;AACA;;AACA");
    let original_groups = input.source_map.group_count();

    let result = postprocess(
        input,
        Utf8Path::new("strict.coffee"),
        Dialect::Plain,
        &exports(&["a"]),
    );

    assert!(result.js.starts_with(&format!("\"use strict\";  {SHARED_HEADER}")));
    assert_eq!(result.source_map.group_count(), original_groups);
    // The pruned declaration line is blanked in place.
    assert_eq!(result.js.split('\n').nth(1), Some("      "));
}

#[test]
fn helpers_file_is_wrapped_and_headed() {
    let input = compiler_output("({\n  bar: 1\n});\n", "AAAA;AACA;AAFA");
    let result = postprocess(
        input,
        Utf8Path::new("client/foo.helpers.coffee"),
        Dialect::Helpers,
        &exports(&[]),
    );

    assert_eq!(
        result.js,
        format!("{SHARED_HEADER}Template.foo.helpers({{\n  bar: 1\n}});\n")
    );
    assert_eq!(result.source_map.mappings, ";AAAA;AACA;AAFA");
}

#[test]
fn events_file_with_compiler_helpers_keeps_them_above_the_wrapper() {
    let input = compiler_output(
        "var __slice = [].slice;\n\n({\n  'click button': 1\n});\n",
        "AAAA;;AACA;AACA;AAFA",
    );
    let result = postprocess(
        input,
        Utf8Path::new("toolbar.events.coffee"),
        Dialect::Events,
        &exports(&[]),
    );

    assert_eq!(
        result.js,
        format!(
            "{SHARED_HEADER}var __slice = [].slice;\n\nTemplate.toolbar.events({{\n  'click button': 1\n}});\n"
        )
    );
}

/// The line-preservation contract: whatever the inputs, the only line-count
/// change across the whole pipeline is the single header line, and the map's
/// group table tracks it exactly.
#[test]
fn pipeline_adds_at_most_one_line_and_tracks_it() {
    let cases = [
        ("var a, b;\na = 1;\nb = 2;\n", "AAAA;AACA;AACA", Dialect::Plain),
        ("\"use strict\";\nfoo();\n", "AAAA;AACA", Dialect::Plain),
        ("({\n});\n", "AAAA;AACA", Dialect::Helpers),
    ];

    for (js, mappings, dialect) in cases {
        let input = compiler_output(js, mappings);
        let input_lines = js.split('\n').count();
        let input_groups = input.source_map.group_count();

        let result = postprocess(
            input,
            Utf8Path::new("x.helpers.coffee"),
            dialect,
            &exports(&["a"]),
        );

        let line_delta = result.js.split('\n').count() - input_lines;
        let group_delta = result.source_map.group_count() - input_groups;
        assert!(line_delta <= 1);
        assert_eq!(line_delta, group_delta);
    }
}

#[test]
fn metadata_fields_survive_the_pipeline() {
    let input = compiler_output("foo();\n", "AAAA");
    let result = postprocess(
        input,
        Utf8Path::new("app.coffee"),
        Dialect::Plain,
        &exports(&[]),
    );

    assert_eq!(result.source_map.file.as_deref(), Some("/app.coffee.js"));
    assert_eq!(result.source_map.sources, vec!["app.coffee".to_string()]);
    assert_eq!(
        result.source_map.sources_content,
        Some(vec!["a = 1\nb = 2\n".to_string()])
    );
}
