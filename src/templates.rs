use crate::errors::{AppError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const ACTIVE_SNAKEFILE: &str = "Snakefile";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineMode {
    /// Call CNVs for each sample against an existing PFB.
    SingleSample,
    /// Build the PFB reference files from the whole batch.
    ReferenceFiles,
}

impl PipelineMode {
    pub fn from_make_pfb(make_pfb: bool) -> Self {
        if make_pfb {
            Self::ReferenceFiles
        } else {
            Self::SingleSample
        }
    }

    pub fn template_name(self) -> &'static str {
        match self {
            Self::SingleSample => "Snakefile_one_samp",
            Self::ReferenceFiles => "Snakefile_ref_files",
        }
    }
}

/// Copies the template for `mode` over `<output_dir>/Snakefile`.
pub fn install_snakefile(
    scripts_dir: &Path,
    output_dir: &Path,
    mode: PipelineMode,
) -> Result<PathBuf> {
    let source = scripts_dir.join(mode.template_name());
    if !source.is_file() {
        return Err(AppError::MissingTemplate { path: source });
    }
    let target = output_dir.join(ACTIVE_SNAKEFILE);
    fs::copy(&source, &target)?;
    info!(
        template = %source.display(),
        target = %target.display(),
        "installed pipeline definition"
    );
    Ok(target)
}
