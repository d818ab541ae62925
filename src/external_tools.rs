use crate::cli::Scan2CnvArgs;
use crate::errors::{AppError, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use tracing::{info, warn};

pub const MAIL_DOMAIN: &str = "mail.nih.gov";
pub const MAIL_EVENTS: &str = "beas";
pub const JOB_SHELL: &str = "/bin/sh";
pub const JOB_PREFIX: &str = "Scan2CNV";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalTools {
    pub qsub: String,
    pub whoami: String,
}

/// Everything `qsub` needs to queue the gateway job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitRequest {
    pub script: PathBuf,
    pub queue: String,
    pub job_name: String,
    pub notify: Option<String>,
}

impl SubmitRequest {
    pub fn new(script: &Path, output_dir: &Path, queue: &str, notify: Option<String>) -> Self {
        let base = output_dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            script: script.to_path_buf(),
            queue: queue.to_string(),
            job_name: format!("{JOB_PREFIX}.{base}"),
            notify,
        }
    }

    /// `<dir>/Scan2CNV.sh` -> `<dir>/Scan2CNV`, the stem for the job's stdout/stderr.
    fn log_stem(&self) -> PathBuf {
        self.script.with_extension("")
    }

    pub fn stdout_path(&self) -> PathBuf {
        self.log_stem().with_extension("stdout")
    }

    pub fn stderr_path(&self) -> PathBuf {
        self.log_stem().with_extension("stderr")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub command: Vec<String>,
    pub status: ExitStatus,
}

impl Submission {
    pub fn succeeded(&self) -> bool {
        self.status.success()
    }

    /// Scheduler exit code, or 1 when the submit command was killed by a signal.
    pub fn exit_code(&self) -> i32 {
        self.status.code().unwrap_or(1)
    }
}

pub fn notify_address(user: &str) -> String {
    format!("{user}@{MAIL_DOMAIN}")
}

impl ExternalTools {
    pub fn from_args(args: &Scan2CnvArgs) -> Self {
        Self {
            qsub: args.qsub.clone(),
            whoami: args.whoami.clone(),
        }
    }

    pub fn current_user(&self) -> Result<String> {
        let output = Command::new(&self.whoami)
            .stdin(Stdio::null())
            .output()
            .map_err(|err| AppError::from_spawn(&self.whoami, err))?;

        if !output.status.success() {
            return Err(AppError::CommandFailed {
                command: self.whoami.clone(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        let user = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if user.is_empty() || user.chars().any(char::is_whitespace) {
            return Err(AppError::CommandFailed {
                command: self.whoami.clone(),
                code: output.status.code(),
                stderr: format!("unexpected user name: {user:?}"),
            });
        }
        Ok(user)
    }

    /// Notification address for the invoking user; `None` disables email rather than failing.
    pub fn notification_address(&self) -> Option<String> {
        match self.current_user() {
            Ok(user) => Some(notify_address(&user)),
            Err(error) => {
                warn!(%error, "could not determine user; submitting without email notification");
                None
            }
        }
    }

    pub fn qsub_command(&self, request: &SubmitRequest) -> Vec<String> {
        let mut command = vec![self.qsub.clone()];
        if let Some(address) = &request.notify {
            command.push("-M".to_string());
            command.push(address.clone());
            command.push("-m".to_string());
            command.push(MAIL_EVENTS.to_string());
        }
        command.push("-q".to_string());
        command.push(request.queue.clone());
        command.push("-o".to_string());
        command.push(request.stdout_path().to_string_lossy().into_owned());
        command.push("-e".to_string());
        command.push(request.stderr_path().to_string_lossy().into_owned());
        command.push("-N".to_string());
        command.push(request.job_name.clone());
        command.push("-S".to_string());
        command.push(JOB_SHELL.to_string());
        command.push(request.script.to_string_lossy().into_owned());
        command
    }

    /// Runs `qsub`. A non-zero exit is returned as-is for the caller to pass through.
    pub fn submit(&self, request: &SubmitRequest) -> Result<Submission> {
        let argv = self.qsub_command(request);
        info!(command = %argv.join(" "), "submitting gateway job");

        let status = Command::new(&argv[0])
            .args(&argv[1..])
            .stdin(Stdio::null())
            .status()
            .map_err(|err| AppError::from_spawn(&self.qsub, err))?;

        if !status.success() {
            warn!(code = ?status.code(), "qsub returned a non-zero status");
        }
        Ok(Submission {
            command: argv,
            status,
        })
    }
}
