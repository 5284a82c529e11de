//! node process runner.

use blake3::Hasher;
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::process::Stdio;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::task::JoinHandle;

const NODE_SCRIPT_FILENAME: &str = "coffee-build-compiler.mjs";
const NODE_SCRIPT_SOURCE: &str = r#"import { createInterface } from 'node:readline';
import { stdin, stdout } from 'node:process';
import { createRequire } from 'node:module';
import { pathToFileURL } from 'node:url';

let compile = null;
try {
  const require = createRequire(pathToFileURL(process.cwd() + '/'));
  let mod;
  try {
    mod = require('coffeescript');
  } catch {
    mod = require('coffee-script');
  }
  compile = mod.compile;
} catch (err) {
  const message = err && err.message ? err.message : String(err);
  console.error(`coffee-build-rs runner failed to load the coffeescript package: ${message}`);
  process.exit(2);
}

stdout.write(JSON.stringify({ ready: true }) + '\n');

const rl = createInterface({ input: stdin, crlfDelay: Infinity });

for await (const line of rl) {
  if (!line.trim()) continue;

  let req;
  try {
    req = JSON.parse(line);
  } catch (err) {
    const message = err && err.message ? err.message : String(err);
    stdout.write(JSON.stringify({ id: null, error: `invalid json: ${message}` }) + '\n');
    continue;
  }

  const id = req.id;
  const source = req.source;
  const options = req.options || {};

  try {
    const result = compile(source, {
      bare: options.bare,
      literate: options.literate,
      filename: options.filename,
      sourceMap: options.sourceMap,
      inline: options.inline,
      generatedFile: options.generatedFile,
      sourceFiles: options.sourceFiles
    });
    stdout.write(JSON.stringify({ id, js: result.js, v3SourceMap: result.v3SourceMap }) + '\n');
  } catch (err) {
    const message = err && err.message ? err.message : String(err);
    const line_ = err && err.location ? err.location.first_line + 1 : null;
    stdout.write(JSON.stringify({ id, failure: { line: line_, message } }) + '\n');
  }
}
"#;

/// Error types for the compiler runner. These are batch-fatal; per-file
/// syntax errors travel as [`CoffeeSyntaxError`] values instead.
#[derive(Debug, Error)]
pub enum CoffeeError {
    /// Failed to spawn the node process.
    #[error("failed to spawn node: {0}")]
    SpawnFailed(#[from] std::io::Error),

    /// node process exited with error.
    #[error("node exited with code {code}: {stderr}")]
    ProcessFailed { code: i32, stderr: String },

    /// node binary not found at an explicit override path.
    #[error("node binary not found at: {0}")]
    NotFound(Utf8PathBuf),

    /// node binary not found on PATH.
    #[error("node binary not found on PATH")]
    NotOnPath,

    /// Runner protocol error.
    #[error("compiler runner protocol error: {0}")]
    ProtocolError(String),

    /// Failed to parse a runner response.
    #[error("failed to parse compiler response: {0}")]
    ParseError(String),

    /// Failed to install the runner script.
    #[error("failed to install runner script: {0}")]
    ScriptInstallFailed(String),
}

/// A CoffeeScript syntax error for a single input file.
///
/// The line is 1-based when the compiler reported a location. Display
/// matches the `path:line: message` convention diagnostics are printed with.
#[derive(Debug, Clone)]
pub struct CoffeeSyntaxError {
    pub path: Utf8PathBuf,
    pub line: Option<u32>,
    pub message: String,
}

impl std::fmt::Display for CoffeeSyntaxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{}: {}", self.path, line, self.message),
            None => write!(f, "{}: {}", self.path, self.message),
        }
    }
}

/// Options forwarded to `compile(source, options)` in the worker, mirroring
/// the compiler's own option names.
#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CompileOptions {
    /// Emit bare output, without the top-level function safety wrapper.
    pub bare: bool,
    /// Treat the source as literate CoffeeScript.
    pub literate: bool,
    /// Input path, used by the compiler for error reporting.
    pub filename: String,
    /// Produce a V3 source map.
    pub source_map: bool,
    /// Embed the original source in the map's `sourcesContent`.
    pub inline: bool,
    /// Becomes the map's `file` field.
    pub generated_file: String,
    /// Becomes the map's `sources` field.
    pub source_files: Vec<String>,
}

/// One file to compile.
#[derive(Debug, Clone)]
pub struct CompileInput {
    pub path: Utf8PathBuf,
    pub source: String,
    pub options: CompileOptions,
}

/// Successful compiler output for one file.
#[derive(Debug, Clone)]
pub struct CompileOutput {
    /// The generated JavaScript.
    pub js: String,
    /// The V3 source map, as the JSON text the compiler produced.
    pub v3_source_map: String,
}

/// Per-file compile outcome. A syntax failure in one file never aborts the
/// rest of the batch.
#[derive(Debug)]
pub struct FileCompileResult {
    pub path: Utf8PathBuf,
    pub output: Result<CompileOutput, CoffeeSyntaxError>,
}

#[derive(Debug, Serialize)]
struct CompileRequest<'a> {
    id: u64,
    source: &'a str,
    options: &'a CompileOptions,
}

#[derive(Debug, Deserialize)]
struct CompileResponse {
    id: Option<u64>,
    js: Option<String>,
    #[serde(rename = "v3SourceMap")]
    v3_source_map: Option<String>,
    failure: Option<CompileFailure>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompileFailure {
    line: Option<u32>,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RunnerReady {
    ready: bool,
}

/// The compiler runner: a node process hosting the CoffeeScript compiler,
/// spoken to over line-delimited JSON.
#[derive(Debug, Clone)]
pub struct CoffeeRunner {
    node_path: Utf8PathBuf,
    workspace_root: Utf8PathBuf,
    script_path: Utf8PathBuf,
}

impl CoffeeRunner {
    /// Creates a runner for the given workspace, installing the worker
    /// script into the cache directory if needed.
    pub fn new(node_path: Utf8PathBuf, workspace_root: Utf8PathBuf) -> Result<Self, CoffeeError> {
        let script_path = ensure_script()?;
        Ok(Self {
            node_path,
            workspace_root,
            script_path,
        })
    }

    /// Locates the node binary.
    ///
    /// An explicit override (tilde- and variable-expanded) wins; otherwise
    /// PATH is searched.
    pub fn find_node(override_path: Option<&str>) -> Result<Utf8PathBuf, CoffeeError> {
        if let Some(raw) = override_path {
            let expanded = shellexpand::full(raw)
                .map(|s| Utf8PathBuf::from(s.as_ref()))
                .map_err(|_| CoffeeError::NotFound(Utf8PathBuf::from(raw)))?;
            if expanded.exists() {
                return Ok(expanded);
            }
            return Err(CoffeeError::NotFound(expanded));
        }

        which::which("node")
            .ok()
            .and_then(|p| Utf8PathBuf::try_from(p).ok())
            .ok_or(CoffeeError::NotOnPath)
    }

    /// Gets the cache directory for coffee-build-rs.
    pub fn get_cache_dir() -> Option<Utf8PathBuf> {
        dirs::cache_dir()
            .and_then(|p| Utf8PathBuf::try_from(p).ok())
            .map(|p| p.join("coffee-build-rs"))
    }

    /// Compiles a batch of files through one worker.
    ///
    /// Results come back in input order. Syntax errors are per-file data;
    /// only worker-level failures abort the batch.
    pub async fn compile_batch(
        &self,
        inputs: Vec<CompileInput>,
    ) -> Result<Vec<FileCompileResult>, CoffeeError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let mut worker = CompilerWorker::spawn(
            self.node_path.clone(),
            self.workspace_root.clone(),
            self.script_path.clone(),
        )
        .await?;
        worker.compile_batch(inputs).await
    }

    /// Compiles a single file.
    pub async fn compile(&self, input: CompileInput) -> Result<FileCompileResult, CoffeeError> {
        let mut results = self.compile_batch(vec![input]).await?;
        results
            .pop()
            .ok_or_else(|| CoffeeError::ProtocolError("missing compile result".to_string()))
    }
}

fn ensure_script() -> Result<Utf8PathBuf, CoffeeError> {
    let cache_dir = CoffeeRunner::get_cache_dir().ok_or_else(|| {
        CoffeeError::ScriptInstallFailed("could not determine cache directory".into())
    })?;
    fs::create_dir_all(&cache_dir)
        .map_err(|e| CoffeeError::ScriptInstallFailed(format!("failed to create cache dir: {e}")))?;

    let script_path = cache_dir.join(NODE_SCRIPT_FILENAME);
    let mut hasher = Hasher::new();
    hasher.update(NODE_SCRIPT_SOURCE.as_bytes());
    let expected_hash = hasher.finalize();

    if let Ok(existing) = fs::read(&script_path) {
        let mut hasher = Hasher::new();
        hasher.update(&existing);
        if hasher.finalize() == expected_hash {
            return Ok(script_path);
        }
    }

    fs::write(&script_path, NODE_SCRIPT_SOURCE).map_err(|e| {
        CoffeeError::ScriptInstallFailed(format!("failed to write runner script: {e}"))
    })?;

    Ok(script_path)
}

struct CompilerWorker {
    child: Child,
    stdin: ChildStdin,
    stdout: tokio::io::Lines<BufReader<ChildStdout>>,
    stderr_task: Option<JoinHandle<String>>,
}

impl CompilerWorker {
    async fn spawn(
        node_path: Utf8PathBuf,
        workspace_root: Utf8PathBuf,
        script_path: Utf8PathBuf,
    ) -> Result<Self, CoffeeError> {
        let mut child = Command::new(&node_path)
            .arg(&script_path)
            .current_dir(&workspace_root)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(CoffeeError::SpawnFailed)?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| CoffeeError::ProtocolError("failed to open node stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| CoffeeError::ProtocolError("failed to open node stdout".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| CoffeeError::ProtocolError("failed to open node stderr".to_string()))?;

        let stderr_task = tokio::spawn(async move {
            let mut reader = BufReader::new(stderr);
            let mut buffer = String::new();
            let _ = reader.read_to_string(&mut buffer).await;
            buffer
        });

        let mut stdout_reader = BufReader::new(stdout).lines();

        let ready_line = stdout_reader
            .next_line()
            .await
            .map_err(|e| CoffeeError::ProtocolError(format!("failed to read runner ready: {e}")))?;

        let Some(ready_line) = ready_line else {
            let stderr = stderr_task.await.unwrap_or_default();
            let status = child.wait().await.map_err(CoffeeError::SpawnFailed)?;
            return Err(CoffeeError::ProcessFailed {
                code: status.code().unwrap_or(-1),
                stderr,
            });
        };

        let ready: RunnerReady = serde_json::from_str(&ready_line)
            .map_err(|e| CoffeeError::ParseError(format!("invalid ready response: {e}")))?;
        if !ready.ready {
            return Err(CoffeeError::ProtocolError(format!(
                "unexpected runner ready response: {ready_line}"
            )));
        }

        Ok(Self {
            child,
            stdin,
            stdout: stdout_reader,
            stderr_task: Some(stderr_task),
        })
    }

    async fn compile_batch(
        &mut self,
        inputs: Vec<CompileInput>,
    ) -> Result<Vec<FileCompileResult>, CoffeeError> {
        let mut pending = HashMap::new();

        for (idx, input) in inputs.iter().enumerate() {
            let id = idx as u64 + 1;

            let request = CompileRequest {
                id,
                source: &input.source,
                options: &input.options,
            };

            let line = serde_json::to_string(&request).map_err(|e| {
                CoffeeError::ProtocolError(format!("failed to serialize request: {e}"))
            })?;
            self.stdin.write_all(line.as_bytes()).await.map_err(|e| {
                CoffeeError::ProtocolError(format!("failed to write to node stdin: {e}"))
            })?;
            self.stdin
                .write_all(b"\n")
                .await
                .map_err(|e| CoffeeError::ProtocolError(format!("failed to write newline: {e}")))?;

            pending.insert(id, idx);
        }

        self.stdin
            .flush()
            .await
            .map_err(|e| CoffeeError::ProtocolError(format!("failed to flush node stdin: {e}")))?;

        let mut results: Vec<Option<FileCompileResult>> =
            inputs.iter().map(|_| None).collect();

        while !pending.is_empty() {
            let line = self.stdout.next_line().await.map_err(|e| {
                CoffeeError::ProtocolError(format!("failed to read runner response: {e}"))
            })?;

            let Some(line) = line else {
                let stderr = match self.stderr_task.take() {
                    Some(handle) => handle.await.unwrap_or_default(),
                    None => String::new(),
                };
                let status = self.child.wait().await.map_err(CoffeeError::SpawnFailed)?;
                return Err(CoffeeError::ProcessFailed {
                    code: status.code().unwrap_or(-1),
                    stderr,
                });
            };

            let response: CompileResponse = serde_json::from_str(&line)
                .map_err(|e| CoffeeError::ParseError(format!("invalid response: {e} ({line})")))?;

            if let Some(error) = response.error {
                return Err(CoffeeError::ProtocolError(error));
            }

            let id = response
                .id
                .ok_or_else(|| CoffeeError::ProtocolError(format!("missing response id: {line}")))?;

            let idx = *pending
                .get(&id)
                .ok_or_else(|| CoffeeError::ProtocolError(format!("unexpected response id {id}")))?;
            let input = &inputs[idx];

            let output = if let Some(failure) = response.failure {
                Err(CoffeeSyntaxError {
                    path: input.path.clone(),
                    line: failure.line,
                    message: failure.message,
                })
            } else {
                match (response.js, response.v3_source_map) {
                    (Some(js), Some(v3_source_map)) => Ok(CompileOutput { js, v3_source_map }),
                    _ => {
                        return Err(CoffeeError::ParseError(format!(
                            "response {id} carries neither output nor failure"
                        )))
                    }
                }
            };

            results[idx] = Some(FileCompileResult {
                path: input.path.clone(),
                output,
            });
            pending.remove(&id);
        }

        Ok(results.into_iter().flatten().collect())
    }
}
