use anyhow::{bail, Result};
use clap::Parser;
use std::io;
use std::io::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};
use treehash::Mode;
use treesum::{cli::Inner, HasherGenerator, LOG_ENV, NAME};

// Logs go to stderr so they never mix with sums on stdout. Nothing is logged
// unless TREESUM_LOG is set.
fn setup_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("off"));
    let stderr_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .with_filter(filter);
    Registry::default().with(stderr_layer).init();
}

struct Args {
    inner: Inner,
    file_args: Vec<PathBuf>,
    generator: HasherGenerator,
}

impl Args {
    fn parse() -> Result<Self> {
        let inner = Inner::parse();
        let file_args = if !inner.file.is_empty() {
            inner.file.clone()
        } else {
            vec!["-".into()]
        };
        if inner.raw && file_args.len() > 1 {
            bail!("Only one filename can be provided when using --raw");
        }
        if inner.length == 0 && !inner.check {
            bail!(treehash::Error::InvalidOutputLength);
        }
        let generator = if inner.keyed {
            // In keyed mode the key comes from stdin, so files are required.
            let key = treesum::read_key(io::stdin().lock())?;
            HasherGenerator::from_mode(Mode::KeyedHash(&key))?
        } else if let Some(context) = &inner.derive_key {
            HasherGenerator::from_mode(Mode::DeriveKey(context))?
        } else {
            HasherGenerator::new()
        };
        Ok(Self {
            inner,
            file_args,
            generator,
        })
    }

    fn raw(&self) -> bool {
        self.inner.raw
    }

    // Plain stdin input has no name to print.
    fn print_names(&self) -> bool {
        !self.inner.file.is_empty() && !self.inner.no_names && !self.inner.raw
    }
}

// Errors from this function get handled by the file loop and printed per-file.
fn hash_one_input(path: &Path, args: &Args) -> Result<()> {
    let mut output = treesum::hash_path(path, &args.generator)?;
    output.set_position(args.inner.seek);
    let stdout = io::stdout();
    let mut stdout = stdout.lock();
    if args.raw() {
        treesum::write_raw_output(output, &mut stdout, args.inner.length)?;
        return Ok(());
    }
    let filepath = treesum::filepath_to_string(path);
    if args.print_names() && filepath.is_escaped {
        stdout.write_all(b"\\")?;
    }
    treesum::write_hex_output(output, &mut stdout, args.inner.length)?;
    if args.print_names() {
        writeln!(stdout, "  {}", filepath.filepath_string)?;
    } else {
        writeln!(stdout)?;
    }
    Ok(())
}

fn main() -> Result<()> {
    setup_tracing();
    let args = Args::parse()?;
    info!(
        inputs = args.file_args.len(),
        check = args.inner.check,
        "starting"
    );
    let mut files_failed = 0u64;
    for path in &args.file_args {
        if args.inner.check {
            match treesum::check::check_checkfile(path, &args.generator, args.inner.quiet) {
                Ok(summary) => {
                    for warning in summary.warnings() {
                        eprintln!("{warning}");
                    }
                    if !summary.all_ok() {
                        files_failed += 1;
                    }
                }
                Err(e) => {
                    files_failed += 1;
                    eprintln!("{}: {}: {}", NAME, path.to_string_lossy(), e);
                }
            }
        } else if let Err(e) = hash_one_input(path, &args) {
            files_failed += 1;
            eprintln!("{}: {}: {}", NAME, path.to_string_lossy(), e);
        }
    }
    debug!(files_failed, "done");
    std::process::exit(if files_failed > 0 { 1 } else { 0 });
}
