use mimalloc::MiMalloc;
use scan2cnv::errors::AppError;
use std::process::ExitCode;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn main() -> ExitCode {
    scan2cnv::init_tracing();
    match scan2cnv::cli::parse_from_env().and_then(scan2cnv::run_from_args) {
        Ok(submission) if submission.succeeded() => {
            println!("{}", scan2cnv::SUBMITTED_MESSAGE);
            ExitCode::SUCCESS
        }
        Ok(submission) => ExitCode::from(submission.exit_code().clamp(1, 255) as u8),
        Err(AppError::Help { text }) => {
            print!("{text}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("scan2cnv: {error}");
            ExitCode::from(1)
        }
    }
}
