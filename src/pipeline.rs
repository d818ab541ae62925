use crate::cli::Scan2CnvArgs;
use crate::config::{self, RunConfig};
use crate::errors::Result;
use crate::external_tools::{ExternalTools, SubmitRequest, Submission};
use crate::launcher::{self, DAG_FILE, LOGS_DIR, LauncherSpec};
use crate::templates;
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// Files laid down in the output directory before submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRun {
    pub logs_dir: PathBuf,
    pub snakefile: PathBuf,
    pub config: RunConfig,
    pub launcher: PathBuf,
}

pub fn prepare(args: &Scan2CnvArgs) -> Result<PreparedRun> {
    args.validate()?;
    let output_dir = args.output_path();
    let start_time = config::resolve_start_time(&config::config_path(output_dir))?;

    let logs_dir = output_dir.join(LOGS_DIR);
    if !logs_dir.is_dir() {
        fs::create_dir_all(&logs_dir)?;
        info!(path = %logs_dir.display(), "created logs directory");
    }
    let dag_present = output_dir.join(DAG_FILE).exists();

    let snakefile = templates::install_snakefile(&args.scripts_dir, output_dir, args.mode())?;
    let config = config::write_config(args, start_time)?;
    let launcher =
        launcher::write_launcher(output_dir, &LauncherSpec::for_run(args, dag_present))?;

    Ok(PreparedRun {
        logs_dir,
        snakefile,
        config,
        launcher,
    })
}

pub fn run(args: &Scan2CnvArgs) -> Result<Submission> {
    info!(
        project = %args.project_name,
        output = %args.output_dir,
        mode = ?args.mode(),
        queue = %args.queue,
        unlock = args.unlock,
        "preparing Scan2CNV run"
    );
    let prepared = prepare(args)?;

    let tools = ExternalTools::from_args(args);
    let request = SubmitRequest::new(
        &prepared.launcher,
        args.output_path(),
        &args.queue,
        tools.notification_address(),
    );
    tools.submit(&request)
}
