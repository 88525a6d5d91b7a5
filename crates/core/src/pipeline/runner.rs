//! External script execution

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Environment variable naming the per-run output directory
pub const OUTPUT_DIR_ENV: &str = "DATALOOM_OUTPUT_DIR";

/// `[runner]` configuration section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Interpreter to run scripts with
    pub program: String,
    /// Arguments placed before the script path
    pub args: Vec<String>,
    /// Suffix of the temporary script file
    pub script_suffix: String,
    /// Kill scripts running longer than this
    pub timeout_secs: Option<u64>,
    /// Working directory (defaults to the locator directory)
    pub working_dir: Option<PathBuf>,
    /// Extra environment variables
    pub env: BTreeMap<String, String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            program: "python".to_string(),
            args: vec!["-X".to_string(), "utf8".to_string()],
            script_suffix: ".py".to_string(),
            timeout_secs: None,
            working_dir: None,
            env: BTreeMap::new(),
        }
    }
}

impl RunnerConfig {
    /// Use a different interpreter
    pub fn with_program(mut self, program: impl Into<String>, args: Vec<String>) -> Self {
        self.program = program.into();
        self.args = args;
        self
    }

    /// Set the script file suffix
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.script_suffix = suffix.into();
        self
    }

    /// Set a timeout
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }
}

/// Errors that prevent a script from producing an exit status
#[derive(Error, Debug)]
pub enum RunnerError {
    /// The temporary script file could not be written
    #[error("Unable to write script file: {0}")]
    ScriptFile(#[from] std::io::Error),

    /// The interpreter could not be started
    #[error("Unable to start {program}: {message}")]
    Spawn { program: String, message: String },

    /// The script ran past the timeout
    #[error("Script timed out after {0}s")]
    TimedOut(u64),

    /// The async runtime could not be created
    #[error("Runtime error: {0}")]
    Runtime(String),
}

/// Captured result of a finished script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptOutput {
    /// Exit status was zero
    pub success: bool,
    /// Exit code, `None` when killed by a signal
    pub exit_code: Option<i32>,
    /// Standard output, lossily decoded
    pub stdout: String,
    /// Standard error, lossily decoded
    pub stderr: String,
    /// Wall-clock run time
    pub duration: Duration,
}

/// Runs script source through the configured interpreter
#[derive(Debug, Clone, Default)]
pub struct ScriptRunner {
    config: RunnerConfig,
}

impl ScriptRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run `source` and wait for it to exit
    ///
    /// The source is written to a temporary file that is removed when this
    /// returns, whatever the outcome. `output_dir` is exported as
    /// `DATALOOM_OUTPUT_DIR`; `default_dir` is the working directory unless
    /// one is configured.
    pub fn run(
        &self,
        source: &str,
        output_dir: &Path,
        default_dir: &Path,
    ) -> Result<ScriptOutput, RunnerError> {
        let mut file = tempfile::Builder::new()
            .prefix("dataloom-script-")
            .suffix(&self.config.script_suffix)
            .tempfile()?;
        file.write_all(source.as_bytes())?;
        file.flush()?;

        let working_dir = self.config.working_dir.as_deref().unwrap_or(default_dir);

        let mut command = tokio::process::Command::new(&self.config.program);
        command
            .args(&self.config.args)
            .arg(file.path())
            .current_dir(working_dir)
            .env("PYTHONIOENCODING", "utf-8")
            .env(OUTPUT_DIR_ENV, output_dir)
            .envs(&self.config.env)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| RunnerError::Runtime(e.to_string()))?;

        debug!(
            program = %self.config.program,
            script = %file.path().display(),
            "Running script"
        );

        let start = Instant::now();
        let output = runtime.block_on(async {
            let pending = command.output();
            match self.config.timeout_secs {
                Some(secs) => tokio::time::timeout(Duration::from_secs(secs), pending)
                    .await
                    .map_err(|_| RunnerError::TimedOut(secs))?,
                None => pending.await,
            }
            .map_err(|e| RunnerError::Spawn {
                program: self.config.program.clone(),
                message: e.to_string(),
            })
        });
        let duration = start.elapsed();

        let output = match output {
            Ok(output) => output,
            Err(e) => {
                warn!(error = %e, "Script did not finish");
                return Err(e);
            }
        };

        Ok(ScriptOutput {
            success: output.status.success(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            duration,
        })
    }
}
