//! External processes
//!
//! Long-running collaborators (the indexing pipeline, the query CLI) run as
//! child processes: spawn, wait with a deadline, capture output, and map the
//! exit status to a typed result. A child that outlives its deadline is killed.

use crate::config::ToolkitConfig;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum TaskError {
    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Lost track of '{program}' while waiting for it: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' timed out after {}s", .after.as_secs())]
    TimedOut { program: String, after: Duration },

    #[error("'{program}' exited with {}: {stderr}", .code.map(|c| c.to_string()).unwrap_or_else(|| "signal".to_string()))]
    Failed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
}

pub type TaskResult<T> = Result<T, TaskError>;

/// Captured output of a successful run
#[derive(Debug, Clone)]
pub struct TaskOutput {
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

/// A command line with a deadline
#[derive(Debug, Clone)]
pub struct ExternalTask {
    program: String,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
    timeout: Duration,
}

impl ExternalTask {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            timeout: Duration::from_secs(60),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    pub fn get_timeout(&self) -> Duration {
        self.timeout
    }

    /// Space-joined command line for display
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run to completion. Nonzero exit is an error carrying stderr.
    pub async fn run(&self) -> TaskResult<TaskOutput> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }

        debug!("Spawning: {}", self.command_line());
        let started = Instant::now();
        let child = cmd.spawn().map_err(|source| TaskError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|source| TaskError::Wait {
                program: self.program.clone(),
                source,
            })?,
            Err(_) => {
                warn!("'{}' exceeded {:?}, killed", self.program, self.timeout);
                return Err(TaskError::TimedOut {
                    program: self.program.clone(),
                    after: self.timeout,
                });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            return Err(TaskError::Failed {
                program: self.program.clone(),
                code: output.status.code(),
                stderr,
            });
        }

        Ok(TaskOutput {
            stdout,
            stderr,
            elapsed: started.elapsed(),
        })
    }
}

/// The knowledge-graph indexing pipeline
///
/// Runs `<python> -m <module> --config <settings>` in the workspace root and
/// populates the output tables as a side effect.
pub struct IndexingJob {
    task: ExternalTask,
}

impl IndexingJob {
    pub fn from_config(config: &ToolkitConfig) -> Self {
        let indexing = &config.indexing;
        let task = ExternalTask::new(&indexing.python)
            .args(["-m", indexing.module.as_str(), "--config"])
            .arg(config.workspace.settings_file.to_string_lossy())
            .current_dir(&config.workspace.root)
            .timeout(Duration::from_secs(indexing.timeout_secs));
        Self { task }
    }

    pub fn task(&self) -> &ExternalTask {
        &self.task
    }

    pub async fn run(&self) -> TaskResult<TaskOutput> {
        info!("Starting indexing: {}", self.task.command_line());
        let output = self.task.run().await?;
        info!("Indexing finished in {:.1}s", output.elapsed.as_secs_f64());
        Ok(output)
    }
}
