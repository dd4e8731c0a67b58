//! ## lookout-detection::pipeline
//! **Running the external detection program**
//!
//! ### Expectations:
//! - Stateless between calls; safe to share across threads
//! - A run either yields a complete table or an error, never a partial table
//! - The child's stderr tail is kept for diagnosis

use std::borrow::Cow;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use lookout_config::PipelineConfig;
use lookout_core::{ResultTable, TableError};
use thiserror::Error;
use tracing::{debug, warn};

const STDERR_TAIL_LINES: usize = 20;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to launch `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("cannot resolve {path}: {source}")]
    Resolve {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("pipeline exited with {status}: {stderr}")]
    Failed { status: ExitStatus, stderr: String },

    #[error("pipeline produced no output at {0}")]
    MissingOutput(PathBuf),

    #[error("pipeline output unreadable: {0}")]
    Table(#[from] TableError),
}

/// Runs detection on one input file and returns the table written to `output`.
pub trait PipelineInvoker: Send + Sync {
    fn run(
        &self,
        input: &Path,
        output: &Path,
        input_is_raw_capture: bool,
    ) -> Result<ResultTable, PipelineError>;
}

/// Shells out to the configured program:
/// `<program> <args..> --input <input> --output <output> [--pcap]`.
#[derive(Debug, Clone)]
pub struct CommandPipeline {
    program: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
}

impl CommandPipeline {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            working_dir: None,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            working_dir: config.working_dir.clone(),
        }
    }

    /// Relative paths are ours, not the child's, once it runs elsewhere.
    fn resolve<'a>(&self, path: &'a Path) -> Result<Cow<'a, Path>, PipelineError> {
        if self.working_dir.is_none() || path.is_absolute() {
            return Ok(Cow::Borrowed(path));
        }
        std::path::absolute(path)
            .map(Cow::Owned)
            .map_err(|source| PipelineError::Resolve {
                path: path.to_path_buf(),
                source,
            })
    }

    fn command(&self, input: &Path, output: &Path, input_is_raw_capture: bool) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg("--input")
            .arg(input)
            .arg("--output")
            .arg(output);
        if input_is_raw_capture {
            cmd.arg("--pcap");
        }
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

impl PipelineInvoker for CommandPipeline {
    fn run(
        &self,
        input: &Path,
        output: &Path,
        input_is_raw_capture: bool,
    ) -> Result<ResultTable, PipelineError> {
        debug!(
            program = %self.program,
            input = %input.display(),
            output = %output.display(),
            input_is_raw_capture,
            "Invoking detection pipeline"
        );

        let input = self.resolve(input)?;
        let output = self.resolve(output)?;

        let result = self
            .command(&input, &output, input_is_raw_capture)
            .output()
            .map_err(|source| PipelineError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !result.status.success() {
            let stderr = stderr_tail(&result.stderr);
            warn!(status = %result.status, "Detection pipeline failed");
            return Err(PipelineError::Failed {
                status: result.status,
                stderr,
            });
        }

        if !output.exists() {
            return Err(PipelineError::MissingOutput(output.into_owned()));
        }

        Ok(ResultTable::load(&output)?)
    }
}

fn stderr_tail(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    /// `sh -c <script> sh --input .. --output .. [--pcap]`
    fn shell(script: &str) -> CommandPipeline {
        CommandPipeline::new("sh", vec!["-c".into(), script.into(), "sh".into()])
    }

    const WRITE_TABLE: &str = r#"
out=""; raw=0
while [ $# -gt 0 ]; do
  case "$1" in
    --output) out="$2"; shift ;;
    --pcap) raw=1 ;;
  esac
  shift
done
printf 'flow_id,raw,Label,Attack_Type\n1,%s,BENIGN,\n2,%s,ATTACK,SYN-flood\n' "$raw" "$raw" > "$out"
"#;

    #[test]
    fn runs_program_and_loads_table() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.csv");

        let table = shell(WRITE_TABLE)
            .run(Path::new("capture.pcap"), &output, true)
            .unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.columns(), ["flow_id", "raw", "Label", "Attack_Type"]);
        let first = table.record(&table.rows()[0]);
        assert_eq!(first["raw"], 1);
    }

    #[test]
    fn feature_input_omits_pcap_flag() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.csv");

        let table = shell(WRITE_TABLE)
            .run(Path::new("flows.csv"), &output, false)
            .unwrap();
        assert_eq!(table.record(&table.rows()[1])["raw"], 0);
    }

    #[test]
    fn nonzero_exit_keeps_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let err = shell("echo 'model not found' >&2; exit 3")
            .run(Path::new("x.pcap"), &dir.path().join("out.csv"), true)
            .unwrap_err();

        match err {
            PipelineError::Failed { status, stderr } => {
                assert_eq!(status.code(), Some(3));
                assert_eq!(stderr, "model not found");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn success_without_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = shell("exit 0")
            .run(Path::new("x.pcap"), &dir.path().join("out.csv"), true)
            .unwrap_err();
        assert!(matches!(err, PipelineError::MissingOutput(_)));
    }

    #[test]
    fn working_dir_keeps_relative_paths_anchored_here() {
        let here = tempfile::tempdir_in(".").unwrap();
        let elsewhere = tempfile::tempdir().unwrap();
        let output = Path::new(".")
            .join(here.path().file_name().unwrap())
            .join("out.csv");
        assert!(output.is_relative());

        let pipeline = CommandPipeline::from_config(&PipelineConfig {
            program: "sh".into(),
            args: vec!["-c".into(), WRITE_TABLE.into(), "sh".into()],
            working_dir: Some(elsewhere.path().to_path_buf()),
        });
        let table = pipeline
            .run(Path::new("live/capture_x.pcap"), &output, true)
            .unwrap();

        assert_eq!(table.len(), 2);
        assert!(output.exists());
        assert!(!elsewhere.path().join(&output).exists());
    }

    #[test]
    fn missing_program() {
        let err = CommandPipeline::new("lookout-no-such-program", Vec::new())
            .run(Path::new("x.pcap"), Path::new("out.csv"), true)
            .unwrap_err();
        assert!(matches!(err, PipelineError::Spawn { .. }));
    }

    #[test]
    fn stderr_tail_keeps_last_lines() {
        let raw: String = (0..30).map(|i| format!("line {i}\n")).collect();
        let tail = stderr_tail(raw.as_bytes());
        assert!(tail.starts_with("line 10"));
        assert!(tail.ends_with("line 29"));
    }
}
