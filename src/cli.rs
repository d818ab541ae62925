use crate::errors::{AppError, Result};
use crate::templates::PipelineMode;
use clap::error::ErrorKind;
use clap::{ArgAction, Parser};
use std::path::{Path, PathBuf};

pub const DEFAULT_QUEUE: &str = "all.q";

#[derive(Debug, Clone, Parser)]
#[command(
    name = "scan2cnv",
    about = "Wrapper that configures and submits the Scan2CNV Snakemake pipeline",
    after_help = "Required: -n/--name_of_project, -g/--path_to_gtc_directory, \
                  -d/--directory_for_output (absolute path), -b/--bpm_file",
    disable_version_flag = true
)]
struct CliArgs {
    /// Name to give to project for some output files
    #[arg(short = 'n', long = "name_of_project")]
    name_of_project: Option<String>,
    /// Full path to directory containing gtc files (searched recursively)
    #[arg(short = 'g', long = "path_to_gtc_directory")]
    path_to_gtc_directory: Option<String>,
    /// Full path to the base directory for the pipeline output
    #[arg(short = 'd', long = "directory_for_output")]
    directory_for_output: Option<String>,
    /// Full path to Illumina .bpm manifest file
    #[arg(short = 'b', long = "bpm_file")]
    bpm_file: Option<String>,
    /// Path to PennCNV PFB file; required for CNV calling, use -m to create
    #[arg(short = 'p', long = "pfb_file")]
    pfb_file: Option<String>,
    /// Path to PennCNV hmm file
    #[arg(long = "hmm")]
    hmm: Option<String>,
    /// Generate the PFB reference files instead of calling CNVs
    #[arg(short = 'm', long = "make_pfb", action = ArgAction::SetTrue)]
    make_pfb: bool,
    /// Queue on cluster to use to submit jobs
    #[arg(short = 'q', long = "queue", default_value = DEFAULT_QUEUE)]
    queue: String,
    /// Unlock the working directory if the pipeline was killed unexpectedly
    #[arg(short = 'u', long = "unlock_snakemake", action = ArgAction::SetTrue)]
    unlock_snakemake: bool,
    /// Directory holding the Snakefile templates and pipeline scripts
    #[arg(long = "scripts-dir")]
    scripts_dir: Option<PathBuf>,
    /// Cluster job submission command used for the gateway job
    #[arg(long = "qsub", default_value = "qsub")]
    qsub: String,
    /// Command printing the user name for qsub email notification
    #[arg(long = "whoami", default_value = "whoami")]
    whoami: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scan2CnvArgs {
    pub project_name: String,
    pub gtc_dir: String,
    pub output_dir: String,
    pub bpm: String,
    pub pfb: Option<String>,
    pub hmm: Option<String>,
    pub make_pfb: bool,
    pub queue: String,
    pub unlock: bool,
    pub scripts_dir: PathBuf,
    pub qsub: String,
    pub whoami: String,
}

impl Default for Scan2CnvArgs {
    fn default() -> Self {
        Self {
            project_name: String::new(),
            gtc_dir: String::new(),
            output_dir: String::new(),
            bpm: String::new(),
            pfb: None,
            hmm: None,
            make_pfb: false,
            queue: DEFAULT_QUEUE.to_string(),
            unlock: false,
            scripts_dir: default_scripts_dir(),
            qsub: "qsub".to_string(),
            whoami: "whoami".to_string(),
        }
    }
}

impl Scan2CnvArgs {
    pub fn mode(&self) -> PipelineMode {
        PipelineMode::from_make_pfb(self.make_pfb)
    }

    pub fn output_path(&self) -> &Path {
        Path::new(&self.output_dir)
    }

    pub fn validate(&self) -> Result<()> {
        let required = [
            (&self.project_name, "--name_of_project"),
            (&self.gtc_dir, "--path_to_gtc_directory"),
            (&self.output_dir, "--directory_for_output"),
            (&self.bpm, "--bpm_file"),
        ];
        for (value, field) in required {
            if value.is_empty() {
                return Err(AppError::MissingRequired {
                    field: field.to_string(),
                });
            }
        }
        if !self.output_path().is_absolute() {
            return Err(AppError::RelativeOutputDir {
                path: self.output_dir.clone(),
            });
        }
        Ok(())
    }
}

pub fn parse_from_env() -> Result<Scan2CnvArgs> {
    parse_args(std::env::args())
}

pub fn parse_args<I, S>(args: I) -> Result<Scan2CnvArgs>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut tokens: Vec<String> = args.into_iter().map(Into::into).collect();
    if tokens.is_empty() {
        tokens.push("scan2cnv".to_string());
    }

    let normalized = normalize_legacy_tokens(tokens);
    let cli = CliArgs::try_parse_from(normalized).map_err(map_clap_error)?;

    let parsed = Scan2CnvArgs {
        project_name: cli.name_of_project.unwrap_or_default(),
        gtc_dir: cli.path_to_gtc_directory.unwrap_or_default(),
        output_dir: cli.directory_for_output.unwrap_or_default(),
        bpm: cli.bpm_file.unwrap_or_default(),
        pfb: non_empty(cli.pfb_file),
        hmm: non_empty(cli.hmm),
        make_pfb: cli.make_pfb,
        queue: cli.queue,
        unlock: cli.unlock_snakemake,
        scripts_dir: cli.scripts_dir.unwrap_or_else(default_scripts_dir),
        qsub: cli.qsub,
        whoami: cli.whoami,
    };

    parsed.validate()?;
    Ok(parsed)
}

/// Templates ship next to the installed binary unless `--scripts-dir` says otherwise.
pub fn default_scripts_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn normalize_legacy_tokens(tokens: Vec<String>) -> Vec<String> {
    tokens
        .into_iter()
        .map(|token| {
            if token == "-hmm" {
                "--hmm".to_string()
            } else if let Some(value) = token.strip_prefix("-hmm=") {
                format!("--hmm={value}")
            } else {
                token
            }
        })
        .collect()
}

fn map_clap_error(error: clap::Error) -> AppError {
    let kind = error.kind();
    let rendered = error.to_string();
    match kind {
        ErrorKind::DisplayHelp | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
            AppError::Help { text: rendered }
        }
        ErrorKind::UnknownArgument => AppError::UnsupportedArgument {
            arg: first_quoted_token(&rendered).unwrap_or(rendered),
        },
        ErrorKind::TooFewValues | ErrorKind::WrongNumberOfValues | ErrorKind::InvalidValue => {
            AppError::MissingValue {
                flag: first_quoted_token(&rendered).unwrap_or_else(|| "argument".to_string()),
            }
        }
        _ => AppError::ParseError {
            message: clap_error_message(&rendered),
        },
    }
}

fn first_quoted_token(message: &str) -> Option<String> {
    let start = message.find('\'')?;
    let end = message[start + 1..].find('\'')?;
    Some(message[start + 1..start + 1 + end].to_string())
}

fn clap_error_message(message: &str) -> String {
    message
        .lines()
        .find_map(|line| line.strip_prefix("error: "))
        .or_else(|| message.lines().next())
        .unwrap_or("failed to parse arguments")
        .to_string()
}
