use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use chunkmill_core::config::{self, GeneratorConfig, PathStyle, DEFAULT_CHUNKS_DIR};
use chunkmill_core::{restore, Generator, Manifest};

#[derive(Parser)]
#[command(name = "chunkmill", version, about = "Split a build tree into chunks plus a manifest")]
struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(long, global = true, default_value_t = false)]
    verbose: bool,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Chunk a build directory and write its manifest
    Build {
        /// Path to build directory
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value = "build.manifest")]
        output: PathBuf,
        #[arg(long, default_value = DEFAULT_CHUNKS_DIR)]
        chunks_dir: PathBuf,
        #[arg(long)]
        workers: Option<usize>,
        /// Fixed chunk size in bytes (skips estimation)
        #[arg(long)]
        chunk_size: Option<u64>,
        #[arg(long, default_value_t = config::DEFAULT_MIN_CHUNK_SIZE)]
        min_chunk_size: u64,
        #[arg(long, default_value_t = config::DEFAULT_MAX_CHUNK_SIZE)]
        max_chunk_size: u64,
        /// Write `/` instead of `\` in manifest paths
        #[arg(long, default_value_t = false)]
        unix_paths: bool,
        #[arg(long, default_value_t = false)]
        progress: bool,
    },
    /// Rebuild a tree from a manifest and its chunks
    Restore {
        manifest: PathBuf,
        dest: PathBuf,
        #[arg(long, default_value = DEFAULT_CHUNKS_DIR)]
        chunks_dir: PathBuf,
    },
}

/// Each failure cause gets its own exit code.
#[derive(Clone, Copy, Debug)]
enum Failure {
    InputNotFound = 2,
    Init = 3,
    Generation = 4,
    Write = 5,
    Restore = 6,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);
    let res = match cli.cmd {
        Cmd::Build {
            input,
            output,
            chunks_dir,
            workers,
            chunk_size,
            min_chunk_size,
            max_chunk_size,
            unix_paths,
            progress,
        } => {
            let mut cfg = GeneratorConfig {
                chunk_size,
                chunks_dir,
                path_style: if unix_paths { PathStyle::Unix } else { PathStyle::Windows },
                progress,
                ..Default::default()
            };
            cfg.bounds.min = min_chunk_size;
            cfg.bounds.max = max_chunk_size;
            if let Some(n) = workers {
                cfg.workers = n;
                cfg.queue_depth = n.max(1) * 10;
            }
            build(&input, &output, cfg)
        }
        Cmd::Restore { manifest, dest, chunks_dir } => {
            restore_tree(&manifest, &chunks_dir, &dest).map_err(|e| (Failure::Restore, e))
        }
    };
    match res {
        Ok(()) => ExitCode::SUCCESS,
        Err((failure, err)) => {
            eprintln!("✗ {err:#}");
            ExitCode::from(failure as u8)
        }
    }
}

fn setup_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn build(input: &Path, output: &Path, cfg: GeneratorConfig) -> Result<(), (Failure, anyhow::Error)> {
    if !input.is_dir() {
        return Err((
            Failure::InputNotFound,
            anyhow::anyhow!("directory does not exist: {}", input.display()),
        ));
    }
    let start = Instant::now();
    eprintln!("• Processing: {}", input.display());

    let generator = Generator::new(cfg)
        .context("failed to initialize generator")
        .map_err(|e| (Failure::Init, e))?;
    let manifest = generator
        .generate(input)
        .context("generation failed")
        .map_err(|e| (Failure::Generation, e))?;
    manifest
        .write(output)
        .with_context(|| format!("write failed: {}", output.display()))
        .map_err(|e| (Failure::Write, e))?;

    println!(
        "✓ Generated {} chunks for {} files ({} bytes) in {} ms",
        manifest.chunk_count(),
        manifest.file_count(),
        manifest.total_size,
        start.elapsed().as_millis()
    );
    println!("• Output: {}", output.display());
    Ok(())
}

fn restore_tree(manifest_path: &Path, chunks_dir: &Path, dest: &Path) -> Result<()> {
    let manifest = Manifest::read(manifest_path)
        .with_context(|| format!("read manifest {}", manifest_path.display()))?;
    let report = restore::restore(&manifest, chunks_dir, dest)
        .with_context(|| format!("restore into {}", dest.display()))?;
    println!("✓ Restored {} files ({} bytes) into {}", report.files, report.bytes, dest.display());
    Ok(())
}
