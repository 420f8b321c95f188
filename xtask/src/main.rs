use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{exit, Command, ExitStatus};

use clap::{Parser, Subcommand, ValueEnum};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the handler lifecycle workspace",
    long_about = "A unified CLI for CI checks and Lambda artifact packaging\n\
                  in the handler lifecycle workspace."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run CI checks (fmt, clippy, tests)
    Ci {
        /// Job to run
        #[arg(value_enum, default_value_t = CiJob::Check)]
        job: CiJob,
    },
    /// Build and package the Lambda binaries as `bootstrap` zip artifacts
    LambdaPackage {
        /// Compilation target triple for Lambda binaries
        #[arg(long, default_value = "x86_64-unknown-linux-gnu")]
        target: String,
        /// Build profile used for binaries
        #[arg(value_enum, long, default_value_t = BuildProfile::Release)]
        profile: BuildProfile,
        /// Directory receiving the zip artifacts
        #[arg(long, default_value = "dist")]
        out_dir: String,
    },
}

#[derive(Clone, ValueEnum)]
enum CiJob {
    /// Formatting, clippy, and tests
    Check,
    /// Debug build of every Lambda binary
    Build,
    /// Run check + build
    All,
}

#[derive(Clone, Copy, ValueEnum)]
enum BuildProfile {
    Debug,
    Release,
}

impl BuildProfile {
    fn dir_name(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Release => "release",
        }
    }

    fn as_cargo_flag(self) -> Option<&'static str> {
        match self {
            Self::Debug => None,
            Self::Release => Some("--release"),
        }
    }
}

// ── helpers ────────────────────────────────────────────────────────

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

fn cargo(args: &[&str]) -> ExitStatus {
    eprintln!("+ cargo {}", args.join(" "));
    Command::new("cargo")
        .args(args)
        .status()
        .expect("failed to execute cargo")
}

fn run_cargo(args: &[&str]) {
    let status = cargo(args);
    if !status.success() {
        exit(status.code().unwrap_or(1));
    }
}

const LAMBDA_PACKAGE: &str = "handler_lifecycle_lambda";
const LAMBDA_BINARIES: &[&str] = &["http_lambda", "identity_lambda"];

/// `cargo build` arguments covering every Lambda binary.
fn lambda_build_args<'a>(target: Option<&'a str>, profile: BuildProfile) -> Vec<&'a str> {
    let mut args = vec!["build", "-p", LAMBDA_PACKAGE];
    for bin in LAMBDA_BINARIES {
        args.extend(["--bin", *bin]);
    }
    if let Some(target) = target {
        args.extend(["--target", target]);
    }
    args.extend(profile.as_cargo_flag());
    args
}

fn package_lambdas(target: &str, profile: BuildProfile, out_dir: &str) {
    require_rust_target(target);

    step("Build lambda binaries");
    run_cargo(&lambda_build_args(Some(target), profile));

    step("Package lambda zip artifacts");
    let binaries_dir = Path::new("target").join(target).join(profile.dir_name());
    let dist_dir = Path::new(out_dir);
    fs::create_dir_all(dist_dir).expect("failed to create lambda dist directory");

    for bin in LAMBDA_BINARIES {
        let zip_path = dist_dir.join(format!("{bin}.zip"));
        write_bootstrap_zip(&binaries_dir.join(bin), &zip_path);
        eprintln!("packaged {}", zip_path.display());
    }
}

/// Stops early with an actionable message when `rustup` reports the target
/// missing. A missing `rustup` skips the check.
fn require_rust_target(target: &str) {
    let Ok(output) = Command::new("rustup")
        .args(["target", "list", "--installed"])
        .output()
    else {
        eprintln!("warning: rustup unavailable, skipping target check for `{target}`");
        return;
    };

    let installed = String::from_utf8_lossy(&output.stdout);
    if output.status.success() && installed.lines().all(|line| line.trim() != target) {
        eprintln!("rust target `{target}` is not installed; run `rustup target add {target}`");
        exit(1);
    }
}

/// Lambda's custom runtime expects a single executable named `bootstrap`.
fn write_bootstrap_zip(binary_path: &Path, zip_path: &Path) {
    let binary = fs::read(binary_path).unwrap_or_else(|error| {
        panic!("failed to read lambda binary '{}': {error}", binary_path.display())
    });
    let mut zip = ZipWriter::new(fs::File::create(zip_path).expect("failed to create lambda zip"));
    zip.start_file(
        "bootstrap",
        FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o755),
    )
    .expect("failed to start bootstrap entry");
    zip.write_all(&binary).expect("failed to write bootstrap entry");
    zip.finish().expect("failed to finish lambda zip");
}

// ── CI jobs ────────────────────────────────────────────────────────

fn ci_check() {
    step("Check formatting");
    run_cargo(&["fmt", "--all", "--", "--check"]);

    step("Clippy");
    run_cargo(&[
        "clippy",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ]);

    step("Test handler_lifecycle_core");
    run_cargo(&["test", "-p", "handler_lifecycle_core"]);

    step("Test handler_lifecycle_lambda");
    run_cargo(&["test", "-p", LAMBDA_PACKAGE]);
}

fn ci_build() {
    step("Build lambda binaries");
    run_cargo(&lambda_build_args(None, BuildProfile::Debug));
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ci { job } => {
            match job {
                CiJob::Check => ci_check(),
                CiJob::Build => ci_build(),
                CiJob::All => {
                    ci_check();
                    ci_build();
                }
            }
            eprintln!("\nCI job passed.");
        }
        Commands::LambdaPackage {
            target,
            profile,
            out_dir,
        } => {
            package_lambdas(&target, profile, &out_dir);
        }
    }
}
