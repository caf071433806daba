//! Checkfiles: lines of `<hex>  <path>` as printed by `treesum`, verified with
//! `treesum --check`.

use crate::{HasherGenerator, Input, NAME};
use anyhow::{bail, ensure, Context, Result};
use std::fmt;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;
use treehash::{Hash, OUT_LEN};

/// One parsed checkfile line.
#[derive(Debug)]
pub struct CheckLine {
    // The name exactly as it appeared in the checkfile, escape marker included.
    display_name: String,
    path: PathBuf,
    expected: Hash,
}

impl CheckLine {
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn expected(&self) -> &Hash {
        &self.expected
    }

    /// Hash the named file and compare it with the expected hash.
    pub fn check(&self, gen: &HasherGenerator) -> CheckStatus {
        let found = Input::open(&self.path, gen.is_keyed())
            .and_then(|mut input| input.hash(gen.make_hasher()));
        match found {
            Ok(mut output) => {
                let mut found = [0; OUT_LEN];
                output.fill(&mut found);
                // `Hash` equality is constant-time.
                if self.expected == found {
                    CheckStatus::Ok
                } else {
                    CheckStatus::Mismatch
                }
            }
            Err(err) => CheckStatus::Unreadable(format!("{err:#}")),
        }
    }
}

impl FromStr for CheckLine {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim_end_matches('\n');
        let (escaped, rest) = match line.strip_prefix('\\') {
            Some(rest) => (true, rest),
            None => (false, line),
        };
        let (hash_hex, name) = rest
            .split_once("  ")
            .context("Expected a hash and a path separated by two spaces")?;
        ensure!(
            hash_hex.len() == 2 * OUT_LEN
                && hash_hex.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')),
            "Expected {} lowercase hex digits",
            2 * OUT_LEN
        );
        ensure!(!name.is_empty(), "Missing path");
        let expected = Hash::from_hex(hash_hex)?;
        let path = if escaped { unescape(name)? } else { name.to_owned() };
        validate_path(&path)?;
        Ok(Self {
            display_name: if escaped { format!("\\{name}") } else { name.to_owned() },
            path: path.into(),
            expected,
        })
    }
}

// `\\` and `\n` are the only escapes `filepath_to_string` produces.
fn unescape(escaped: &str) -> Result<String> {
    let mut path = String::with_capacity(escaped.len());
    let mut chars = escaped.chars();
    while let Some(c) = chars.next() {
        let c = match c {
            '\\' => match chars.next() {
                Some('\\') => '\\',
                Some('n') => '\n',
                _ => bail!("Invalid backslash escape"),
            },
            c => c,
        };
        path.push(c);
    }
    Ok(path)
}

// Reject paths that could name a different file than the one that was
// hashed. Lossy UTF-8 conversion maps every invalid sequence to U+FFFD.
fn validate_path(path: &str) -> Result<()> {
    for (c, what) in [('\0', "null character"), ('\u{FFFD}', "Unicode replacement character")] {
        ensure!(!path.contains(c), "Path contains a {what}");
    }
    ensure!(
        !(cfg!(windows) && path.contains('\\')),
        "Path contains a backslash"
    );
    Ok(())
}

/// The outcome of checking one line.
#[derive(Debug, PartialEq, Eq)]
pub enum CheckStatus {
    Ok,
    Mismatch,
    Unreadable(String),
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckStatus::Ok => f.write_str("OK"),
            CheckStatus::Mismatch => f.write_str("FAILED"),
            CheckStatus::Unreadable(err) => write!(f, "FAILED ({err})"),
        }
    }
}

/// Counts of the results of one checkfile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CheckSummary {
    pub ok: u64,
    pub mismatched: u64,
    pub unreadable: u64,
    pub malformed: u64,
}

impl CheckSummary {
    pub fn all_ok(&self) -> bool {
        self.mismatched == 0 && self.unreadable == 0 && self.malformed == 0
    }

    // Warnings in the style of md5sum, for stderr.
    pub fn warnings(&self) -> Vec<String> {
        [
            (self.malformed, "line is", "lines are", "improperly formatted"),
            (self.unreadable, "listed file", "listed files", "could not be read"),
            (self.mismatched, "computed checksum", "computed checksums", "did NOT match"),
        ]
        .into_iter()
        .filter(|&(n, ..)| n > 0)
        .map(|(n, one, many, what)| {
            let noun = if n == 1 { one } else { many };
            format!("{NAME}: WARNING: {n} {noun} {what}")
        })
        .collect()
    }
}

/// Check every line read from `checkfile`, writing one result line per file
/// to `out`. OK lines are skipped when `quiet` is set. Malformed lines are
/// reported on stderr and counted, but don't stop the check.
pub fn check_lines(
    checkfile: impl BufRead,
    gen: &HasherGenerator,
    quiet: bool,
    out: &mut impl Write,
) -> Result<CheckSummary> {
    let mut summary = CheckSummary::default();
    for (index, line) in checkfile.lines().enumerate() {
        let line = line?;
        let parsed = match line.parse::<CheckLine>() {
            Ok(parsed) => parsed,
            Err(err) => {
                debug!(line = index + 1, "malformed checkfile line");
                eprintln!("{NAME}: line {}: {err}", index + 1);
                summary.malformed += 1;
                continue;
            }
        };
        let status = parsed.check(gen);
        match status {
            CheckStatus::Ok => summary.ok += 1,
            CheckStatus::Mismatch => summary.mismatched += 1,
            CheckStatus::Unreadable(_) => summary.unreadable += 1,
        }
        if !(quiet && status == CheckStatus::Ok) {
            writeln!(out, "{}: {status}", parsed.display_name())?;
        }
    }
    Ok(summary)
}

/// Open a checkfile, or stdin for `-`, and check it to stdout.
pub fn check_checkfile(path: &Path, gen: &HasherGenerator, quiet: bool) -> Result<CheckSummary> {
    let checkfile = io::BufReader::new(Input::open(path, gen.is_keyed())?);
    let stdout = io::stdout();
    let summary = check_lines(checkfile, gen, quiet, &mut stdout.lock())?;
    debug!(?summary, "checked");
    Ok(summary)
}
