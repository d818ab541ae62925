use crate::cli::Scan2CnvArgs;
use crate::errors::{AppError, Result};
use crate::writer::write_text_file;
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const CONFIG_FILE: &str = "config.yaml";

/// `time.ctime()`-style stamp, e.g. `Mon Oct 19 07:00:00 2026`.
const START_TIME_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

/// Parameters handed to the Snakefile. Field order is the on-disk key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    pub gtc_dir: String,
    pub output_dir: String,
    pub bpm: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pfb: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hmm: Option<String>,
    pub project_name: String,
    pub repo_scripts: String,
    pub start_time: String,
}

impl RunConfig {
    pub fn from_args(args: &Scan2CnvArgs, start_time: String) -> Self {
        Self {
            gtc_dir: args.gtc_dir.clone(),
            output_dir: args.output_dir.clone(),
            bpm: args.bpm.clone(),
            pfb: args.pfb.clone(),
            hmm: args.hmm.clone(),
            project_name: args.project_name.clone(),
            repo_scripts: args.scripts_dir.to_string_lossy().into_owned(),
            start_time,
        }
    }

    pub fn render(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|err| AppError::ParseError {
            message: format!("failed to serialize run configuration: {err}"),
        })
    }
}

pub fn config_path(output_dir: &Path) -> PathBuf {
    output_dir.join(CONFIG_FILE)
}

pub fn now_start_time() -> String {
    Local::now().format(START_TIME_FORMAT).to_string()
}

/// Reads `start_time` from an existing configuration, if there is one.
pub fn load_start_time(path: &Path) -> Result<Option<String>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    if raw.trim().is_empty() {
        return Ok(None);
    }

    let record: Value = serde_yaml::from_str(&raw).map_err(|err| AppError::InvalidConfig {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;
    if !record.is_mapping() && !record.is_null() {
        return Err(AppError::InvalidConfig {
            path: path.to_path_buf(),
            reason: "expected a key: value mapping".to_string(),
        });
    }

    let start_time = match record.get("start_time") {
        Some(Value::String(value)) => Some(value.clone()),
        Some(Value::Number(value)) => Some(value.to_string()),
        Some(Value::Bool(value)) => Some(value.to_string()),
        _ => None,
    };
    Ok(start_time.filter(|value| !value.trim().is_empty()))
}

pub fn resolve_start_time(path: &Path) -> Result<String> {
    match load_start_time(path)? {
        Some(existing) => {
            debug!(start_time = %existing, "reusing start time from existing configuration");
            Ok(existing)
        }
        None => Ok(now_start_time()),
    }
}

/// Overwrites `<output_dir>/config.yaml`. `start_time` comes from [`resolve_start_time`],
/// which must run before anything in the output directory is touched.
pub fn write_config(args: &Scan2CnvArgs, start_time: String) -> Result<RunConfig> {
    let path = config_path(args.output_path());
    let config = RunConfig::from_args(args, start_time);
    write_text_file(&path, &config.render()?, 0o644)?;
    info!(
        path = %path.display(),
        start_time = %config.start_time,
        "wrote run configuration"
    );
    Ok(config)
}
