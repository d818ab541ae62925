pub mod cli;
pub mod config;
pub mod errors;
pub mod external_tools;
pub mod launcher;
pub mod pipeline;
pub mod templates;
pub mod writer;

use cli::Scan2CnvArgs;
use errors::Result;
use external_tools::Submission;
use std::sync::Once;
use tracing_subscriber::EnvFilter;

pub const SUBMITTED_MESSAGE: &str = "Scan2CNV Pipeline submitted.  You should receive an email when the pipeline starts and when it completes.";

static TRACING_INIT: Once = Once::new();

pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
    });
}

pub fn run_from_args(args: Scan2CnvArgs) -> Result<Submission> {
    pipeline::run(&args)
}
