//! Main orchestration logic.

use crate::cli::Args;
use crate::config::BuildConfig;
use crate::output::{BuildDiagnostic, BuildSummary, Formatter};
use camino::{Utf8Path, Utf8PathBuf};
use coffee_runner::{CoffeeRunner, CompileInput, CompileOptions, CompileOutput};
use coffee_transformer::{postprocess, CompiledArtifact, Dialect};
use globset::{Glob, GlobSet, GlobSetBuilder};
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use smol_str::SmolStr;
use source_map::{SourceMapError, SourceMapV3};
use std::fs;
use std::time::Instant;
use thiserror::Error;
use walkdir::WalkDir;

/// Orchestration errors.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Invalid glob pattern.
    #[error("invalid glob pattern: {0}")]
    InvalidGlob(String),

    /// Compiler runner failed.
    #[error("compiler runner error: {0}")]
    Runner(#[from] coffee_runner::CoffeeError),
}

/// One source file queued for compilation, with everything the pipeline
/// needs decided up front.
#[derive(Debug, Clone)]
pub struct CompilationUnit {
    /// Workspace-relative input path.
    pub path: Utf8PathBuf,
    pub source: String,
    pub dialect: Dialect,
}

/// A finished compile for one unit.
#[derive(Debug)]
pub struct BuildArtifact {
    /// Workspace-relative output path: the input path + `.js`.
    pub output_path: Utf8PathBuf,
    pub source_path: Utf8PathBuf,
    pub js: String,
    pub source_map: SourceMapV3,
    /// Compiled in bare mode, without the top-level safety wrapper.
    pub bare: bool,
}

/// Runs the build on all files.
pub async fn run(args: Args) -> Result<BuildSummary, OrchestratorError> {
    let workspace = if args.workspace.is_relative() {
        std::env::current_dir()
            .map(|p| Utf8PathBuf::try_from(p).unwrap_or_default())
            .unwrap_or_default()
            .join(&args.workspace)
    } else {
        args.workspace.clone()
    };

    let config = BuildConfig::load(&workspace);
    let out_dir = args
        .out_dir
        .clone()
        .unwrap_or_else(|| workspace.join(".coffee-build"));

    // The package-level export set applies to every unit.
    let exports: FxHashSet<SmolStr> = config
        .exports
        .iter()
        .chain(&args.export)
        .map(|name| SmolStr::new(name))
        .collect();

    let ignore_set = build_ignore_set(args.ignore.iter().chain(&config.ignore))?;

    // Find CoffeeScript files
    let scan_start = Instant::now();
    let files = find_source_files(&workspace, &ignore_set);
    let scan_time = scan_start.elapsed();

    let mut units = Vec::new();
    for path in files {
        let source = match fs::read_to_string(workspace.join(&path)) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Failed to read {}: {}", path, e);
                continue;
            }
        };
        // from_path never fails here: the scan only kept matching files
        let Some(dialect) = Dialect::from_path(path.as_str()) else {
            continue;
        };
        units.push(CompilationUnit {
            path,
            source,
            dialect,
        });
    }

    // Compile everything through one worker.
    let compile_start = Instant::now();
    let node = CoffeeRunner::find_node(args.node_path.as_deref())?;
    let runner = CoffeeRunner::new(node, workspace.clone())?;
    let inputs: Vec<CompileInput> = units.iter().map(compile_input).collect();
    let compiled = runner.compile_batch(inputs).await?;
    let compile_time = compile_start.elapsed();

    // Post-process and write artifacts in parallel; each file's pipeline is
    // strictly sequential and independent of every other file's.
    let emit_start = Instant::now();
    let paired: Vec<_> = units.iter().zip(compiled).collect();
    let outcomes: Vec<Result<Utf8PathBuf, BuildDiagnostic>> = paired
        .into_par_iter()
        .map(|(unit, result)| {
            let output = result.output.map_err(|e| BuildDiagnostic {
                filename: e.path.to_string(),
                line: e.line,
                message: e.message,
            })?;

            let artifact = build_artifact(unit, output, &exports).map_err(|e| BuildDiagnostic {
                filename: unit.path.to_string(),
                line: None,
                message: e.to_string(),
            })?;

            if args.emit_js {
                eprintln!("=== JS for {} ===\n{}", unit.path, artifact.js);
            }

            write_artifact(&out_dir, &artifact).map_err(|e| BuildDiagnostic {
                filename: unit.path.to_string(),
                line: None,
                message: e,
            })?;

            Ok(artifact.output_path)
        })
        .collect();
    let emit_time = emit_start.elapsed();

    let diagnostics: Vec<BuildDiagnostic> = outcomes
        .iter()
        .filter_map(|o| o.as_ref().err().cloned())
        .collect();
    let summary = BuildSummary {
        compiled: outcomes.iter().filter(|o| o.is_ok()).count(),
        failed: diagnostics.len(),
    };

    let formatter = Formatter::new(args.output);
    print!("{}", formatter.format_report(&diagnostics, &summary));

    if args.timings {
        eprintln!("=== coffee-build-rs timings ===");
        eprintln!("scan:        {:?} ({} files)", scan_time, summary.compiled + summary.failed);
        eprintln!("compile:     {:?}", compile_time);
        eprintln!("postprocess: {:?}", emit_time);
    }

    Ok(summary)
}

fn build_ignore_set<'a>(
    patterns: impl Iterator<Item = &'a String>,
) -> Result<GlobSet, OrchestratorError> {
    let mut builder = GlobSetBuilder::new();

    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| OrchestratorError::InvalidGlob(e.to_string()))?;
        builder.add(glob);
    }

    // Add default ignores
    for pattern in ["**/node_modules/**", "**/.git/**", "**/.coffee-build/**"] {
        if let Ok(glob) = Glob::new(pattern) {
            builder.add(glob);
        }
    }

    builder
        .build()
        .map_err(|e| OrchestratorError::InvalidGlob(e.to_string()))
}

/// Walks the workspace and returns the workspace-relative paths of every
/// CoffeeScript file whose dialect resolves and that no ignore matches.
fn find_source_files(workspace: &Utf8Path, ignore_set: &GlobSet) -> Vec<Utf8PathBuf> {
    WalkDir::new(workspace)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| Utf8PathBuf::try_from(e.into_path()).ok())
        .filter_map(|p| p.strip_prefix(workspace).map(Utf8PathBuf::from).ok())
        .filter(|p| Dialect::from_path(p.as_str()).is_some())
        .filter(|p| !ignore_set.is_match(p.as_str()))
        .collect()
}

/// Compiler options for one unit: bare output, literate per dialect, source
/// map with embedded original source, generated file named after the input.
fn compile_input(unit: &CompilationUnit) -> CompileInput {
    CompileInput {
        path: unit.path.clone(),
        source: unit.source.clone(),
        options: CompileOptions {
            bare: true,
            literate: unit.dialect.is_literate(),
            filename: unit.path.to_string(),
            source_map: true,
            inline: true,
            generated_file: format!("/{}.js", unit.path),
            source_files: vec![unit.path.to_string()],
        },
    }
}

/// Runs the post-compilation pipeline over one compiled unit.
pub fn build_artifact(
    unit: &CompilationUnit,
    output: CompileOutput,
    exports: &FxHashSet<SmolStr>,
) -> Result<BuildArtifact, SourceMapError> {
    let source_map = SourceMapV3::from_json(&output.v3_source_map)?;

    let artifact = postprocess(
        CompiledArtifact {
            js: output.js,
            source_map,
        },
        &unit.path,
        unit.dialect,
        exports,
    );

    Ok(BuildArtifact {
        output_path: Utf8PathBuf::from(format!("{}.js", unit.path)),
        source_path: unit.path.clone(),
        js: artifact.js,
        source_map: artifact.source_map,
        bare: true,
    })
}

/// Writes the JavaScript and its map under the output root, mirroring the
/// source tree, with a `sourceMappingURL` comment linking the two.
fn write_artifact(out_dir: &Utf8Path, artifact: &BuildArtifact) -> Result<(), String> {
    let js_path = out_dir.join(&artifact.output_path);
    let map_path = Utf8PathBuf::from(format!("{}.map", js_path));

    if let Some(parent) = js_path.parent() {
        fs::create_dir_all(parent).map_err(|e| format!("failed to create {}: {}", parent, e))?;
    }

    let map_name = map_path.file_name().unwrap_or("map");
    let mut js = artifact.js.clone();
    if !js.ends_with('\n') {
        js.push('\n');
    }
    js.push_str(&format!("//# sourceMappingURL={}\n", map_name));

    fs::write(&js_path, js).map_err(|e| format!("failed to write {}: {}", js_path, e))?;
    fs::write(&map_path, artifact.source_map.to_json())
        .map_err(|e| format!("failed to write {}: {}", map_path, e))?;

    Ok(())
}
