//! Gateway job script: loads the cluster environment and hands control to Snakemake.

use crate::cli::Scan2CnvArgs;
use crate::errors::Result;
use crate::writer::write_text_file;
use std::path::{Path, PathBuf};
use tracing::info;

pub const LAUNCHER_FILE: &str = "Scan2CNV.sh";
pub const DAG_FILE: &str = "rule.dag.svg";
pub const LOGS_DIR: &str = "logs";
pub const MAX_CLUSTER_JOBS: u32 = 4000;
pub const LATENCY_WAIT_SECS: u32 = 300;

pub const DEFAULT_MODULES: [&str; 3] = ["sge", "python3/3.5.1", "R/3.3.0"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LauncherSpec {
    pub output_dir: String,
    pub modules: Vec<String>,
    pub queue: String,
    pub render_dag: bool,
    pub unlock: bool,
    pub max_jobs: u32,
    pub latency_wait_secs: u32,
}

impl LauncherSpec {
    /// `dag_present` is whether `rule.dag.svg` already exists in the output directory.
    pub fn for_run(args: &Scan2CnvArgs, dag_present: bool) -> Self {
        Self {
            output_dir: args.output_dir.clone(),
            modules: DEFAULT_MODULES.iter().map(|m| m.to_string()).collect(),
            queue: args.queue.clone(),
            render_dag: !dag_present,
            unlock: args.unlock,
            max_jobs: MAX_CLUSTER_JOBS,
            latency_wait_secs: LATENCY_WAIT_SECS,
        }
    }

    pub fn logs_dir(&self) -> String {
        format!("{}/{}/", self.output_dir.trim_end_matches('/'), LOGS_DIR)
    }

    /// Submit template Snakemake fills in per rule; `{threads}` is left for the engine.
    pub fn cluster_command(&self) -> String {
        let logs = self.logs_dir();
        format!(
            "qsub -q {} -pe by_node {{threads}} -o {logs} -e {logs}",
            self.queue
        )
    }
}

pub fn render(spec: &LauncherSpec) -> String {
    let mut lines = vec![
        "#!/bin/bash".to_string(),
        String::new(),
        format!("cd {}", spec.output_dir),
    ];
    lines.extend(spec.modules.iter().map(|module| format!("module load {module}")));
    if spec.render_dag {
        lines.push(format!("snakemake --rulegraph | dot -Tsvg > {DAG_FILE}"));
    }
    if spec.unlock {
        lines.push("snakemake --unlock".to_string());
    }
    lines.push(format!(
        "snakemake --rerun-incomplete --cluster \"{}\" --jobs {} --latency-wait {}",
        spec.cluster_command(),
        spec.max_jobs,
        spec.latency_wait_secs
    ));

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

pub fn launcher_path(output_dir: &Path) -> PathBuf {
    output_dir.join(LAUNCHER_FILE)
}

pub fn write_launcher(output_dir: &Path, spec: &LauncherSpec) -> Result<PathBuf> {
    let path = launcher_path(output_dir);
    write_text_file(&path, &render(spec), 0o755)?;
    info!(
        path = %path.display(),
        unlock = spec.unlock,
        render_dag = spec.render_dag,
        "wrote launcher script"
    );
    Ok(path)
}
