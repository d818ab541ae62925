#![cfg(unix)]

use scan2cnv::config::RunConfig;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::{Mutex, MutexGuard};
use tempfile::TempDir;

const SUBMITTED: &str = "Scan2CNV Pipeline submitted.";

// Writing an executable while another test forks can leave it busy (ETXTBSY).
static SERIAL: Mutex<()> = Mutex::new(());

struct Harness {
    _guard: MutexGuard<'static, ()>,
    root: TempDir,
}

impl Harness {
    fn new() -> Self {
        let guard = SERIAL.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let root = tempfile::tempdir().expect("expected temp dir");
        let scripts = root.path().join("scripts");
        fs::create_dir(&scripts).unwrap();
        fs::write(scripts.join("Snakefile_one_samp"), "# single-sample rules\n").unwrap();
        fs::write(scripts.join("Snakefile_ref_files"), "# reference rules\n").unwrap();

        let bin = root.path().join("bin");
        fs::create_dir(&bin).unwrap();
        write_executable(
            &bin.join("qsub"),
            &format!(
                "#!/bin/sh\nprintf '%s\\n' \"$@\" > '{}'\nexit ${{FAKE_QSUB_STATUS:-0}}\n",
                root.path().join("qsub.args").display()
            ),
        );
        write_executable(&bin.join("whoami"), "#!/bin/sh\necho tester\n");

        Self {
            _guard: guard,
            root,
        }
    }

    fn out_dir(&self) -> PathBuf {
        self.root.path().join("out").join("proj1")
    }

    fn run(&self, extra: &[&str], qsub_status: i32) -> Output {
        let out_dir = self.out_dir();
        let mut args = vec![
            "-n".to_string(),
            "proj1".to_string(),
            "-g".to_string(),
            "/data/gtc".to_string(),
            "-d".to_string(),
            out_dir.to_string_lossy().into_owned(),
            "-b".to_string(),
            "/data/manifest.bpm".to_string(),
        ];
        args.extend(extra.iter().map(|s| s.to_string()));
        self.run_raw(&args, qsub_status)
    }

    fn run_raw(&self, args: &[String], qsub_status: i32) -> Output {
        let bin = self.root.path().join("bin");
        Command::new(env!("CARGO_BIN_EXE_scan2cnv"))
            .args(args)
            .arg("--scripts-dir")
            .arg(self.root.path().join("scripts"))
            .arg("--qsub")
            .arg(bin.join("qsub"))
            .arg("--whoami")
            .arg(bin.join("whoami"))
            .env("FAKE_QSUB_STATUS", qsub_status.to_string())
            .env("RUST_LOG", "warn")
            .current_dir(self.root.path())
            .output()
            .expect("expected scan2cnv binary to execute")
    }

    fn qsub_args(&self) -> Vec<String> {
        fs::read_to_string(self.root.path().join("qsub.args"))
            .expect("expected qsub to have been called")
            .lines()
            .map(str::to_string)
            .collect()
    }
}

fn write_executable(path: &Path, body: &str) {
    fs::write(path, body).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

fn read_config(out_dir: &Path) -> (String, RunConfig) {
    let text = fs::read_to_string(out_dir.join("config.yaml")).expect("expected config.yaml");
    let config = serde_yaml::from_str(&text).expect("expected valid yaml");
    (text, config)
}

#[test]
fn single_sample_run_lays_out_output_and_submits() {
    let harness = Harness::new();
    let output = harness.run(&[], 0);

    assert!(
        output.status.success(),
        "expected success: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains(SUBMITTED));

    let out_dir = harness.out_dir();
    assert!(out_dir.join("logs").is_dir());
    assert_eq!(
        fs::read_to_string(out_dir.join("Snakefile")).unwrap(),
        "# single-sample rules\n"
    );

    let (text, config) = read_config(&out_dir);
    assert_eq!(config.gtc_dir, "/data/gtc");
    assert_eq!(config.output_dir, out_dir.to_string_lossy());
    assert_eq!(config.bpm, "/data/manifest.bpm");
    assert_eq!(config.project_name, "proj1");
    assert!(!text.contains("pfb:"));
    assert!(!text.contains("hmm:"));

    let script = fs::read_to_string(out_dir.join("Scan2CNV.sh")).unwrap();
    assert!(script.starts_with("#!/bin/bash\n"));
    assert!(script.contains("--jobs 4000 --latency-wait 300"));
    assert!(!script.contains("--unlock"));

    let qsub = harness.qsub_args();
    assert_eq!(qsub.first().map(String::as_str), Some("-M"));
    assert_eq!(qsub[1], "tester@mail.nih.gov");
    assert!(qsub.windows(2).any(|w| w[0] == "-N" && w[1] == "Scan2CNV.proj1"));
    assert_eq!(
        qsub.last().map(PathBuf::from),
        Some(out_dir.join("Scan2CNV.sh"))
    );
}

#[test]
fn rerun_keeps_original_start_time() {
    let harness = Harness::new();
    let out_dir = harness.out_dir();
    fs::create_dir_all(&out_dir).unwrap();
    fs::write(
        out_dir.join("config.yaml"),
        "gtc_dir: /old/gtc\nstart_time: Thu Feb  2 08:30:00 2017\n",
    )
    .unwrap();

    assert!(harness.run(&[], 0).status.success());
    let (_, first) = read_config(&out_dir);
    assert_eq!(first.start_time, "Thu Feb  2 08:30:00 2017");
    assert_eq!(first.gtc_dir, "/data/gtc");

    assert!(harness.run(&["-p", "/data/batch.pfb"], 0).status.success());
    let (_, second) = read_config(&out_dir);
    assert_eq!(second.start_time, first.start_time);
    assert_eq!(second.pfb.as_deref(), Some("/data/batch.pfb"));
}

#[test]
fn generated_start_time_survives_rerun() {
    let harness = Harness::new();
    let out_dir = harness.out_dir();
    assert!(!out_dir.exists());

    assert!(harness.run(&[], 0).status.success());
    let (_, first) = read_config(&out_dir);
    assert!(!first.start_time.trim().is_empty());

    assert!(harness.run(&["-u"], 0).status.success());
    let (_, second) = read_config(&out_dir);
    assert_eq!(second.start_time, first.start_time);
}

#[test]
fn reference_mode_with_unlock() {
    let harness = Harness::new();
    let output = harness.run(&["-m", "-u", "-hmm", "/data/hhall.hmm", "-q", "seq.q"], 0);
    assert!(output.status.success());

    let out_dir = harness.out_dir();
    assert_eq!(
        fs::read_to_string(out_dir.join("Snakefile")).unwrap(),
        "# reference rules\n"
    );
    let script = fs::read_to_string(out_dir.join("Scan2CNV.sh")).unwrap();
    assert!(script.contains("snakemake --unlock\n"));
    assert!(script.contains("qsub -q seq.q -pe by_node {threads}"));

    let (_, config) = read_config(&out_dir);
    assert_eq!(config.hmm.as_deref(), Some("/data/hhall.hmm"));
    assert!(harness.qsub_args().windows(2).any(|w| w[0] == "-q" && w[1] == "seq.q"));
}

#[test]
fn relative_output_dir_exits_one_without_writes() {
    let harness = Harness::new();
    let args: Vec<String> = ["-n", "proj1", "-g", "/data/gtc", "-d", "out/proj1", "-b", "/b.bpm"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let output = harness.run_raw(&args, 0);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("full path"));
    assert!(!harness.root.path().join("out").exists());
    assert!(!harness.root.path().join("qsub.args").exists());
}

#[test]
fn scheduler_failure_code_is_passed_through() {
    let harness = Harness::new();
    let output = harness.run(&[], 3);

    assert_eq!(output.status.code(), Some(3));
    assert!(!String::from_utf8_lossy(&output.stdout).contains(SUBMITTED));
    assert!(harness.out_dir().join("Scan2CNV.sh").is_file());
}
