// crates/lineage-core/src/job.rs

use serde::{Deserialize, Serialize};

/// Configuration shared by every job kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobConf {
    /// Path the job writes its output (stdout for command-line jobs) to.
    pub output_file_path: String,
}

impl JobConf {
    pub fn new(output_file_path: impl Into<String>) -> Self {
        Self {
            output_file_path: output_file_path.into(),
        }
    }
}

/// A job defined by a shell command string and a configured output path.
///
/// This is the only job kind with a journal encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandLineJob {
    /// The command text, executed through the shell.
    pub command: String,
    /// Job configuration (output path).
    pub conf: JobConf,
}

impl CommandLineJob {
    pub fn new(command: impl Into<String>, conf: JobConf) -> Self {
        Self {
            command: command.into(),
            conf,
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn output_file_path(&self) -> &str {
        &self.conf.output_file_path
    }
}

/// A job submitted through an in-process framework binding.
///
/// Framework jobs can be tracked in memory but have no durable form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameworkJob {
    /// Framework-assigned job name.
    pub name: String,
    /// Job configuration (output path).
    pub conf: JobConf,
}

/// The job that produces a lineage's output files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Job {
    /// Shell command job. Durable.
    CommandLine(CommandLineJob),
    /// Framework-submitted job. Not durable.
    Framework(FrameworkJob),
}

impl Job {
    /// The string identifying this job: the command text for command-line
    /// jobs, the job name for framework jobs.
    pub fn command(&self) -> &str {
        match self {
            Job::CommandLine(job) => &job.command,
            Job::Framework(job) => &job.name,
        }
    }

    pub fn conf(&self) -> &JobConf {
        match self {
            Job::CommandLine(job) => &job.conf,
            Job::Framework(job) => &job.conf,
        }
    }

    /// Returns the command-line job if this is one.
    pub fn as_command_line(&self) -> Option<&CommandLineJob> {
        match self {
            Job::CommandLine(job) => Some(job),
            Job::Framework(_) => None,
        }
    }

    /// Short kind tag used in log lines and CLI output.
    pub fn kind(&self) -> &'static str {
        match self {
            Job::CommandLine(_) => "command_line",
            Job::Framework(_) => "framework",
        }
    }
}

impl From<CommandLineJob> for Job {
    fn from(job: CommandLineJob) -> Self {
        Job::CommandLine(job)
    }
}

impl From<FrameworkJob> for Job {
    fn from(job: FrameworkJob) -> Self {
        Job::Framework(job)
    }
}
