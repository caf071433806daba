use anyhow::{bail, Context, Result};
use std::cmp;
use std::fs::File;
use std::io;
use std::io::prelude::*;
use std::path::Path;
use tracing::debug;
use treehash::{Domain, Hasher, Mode, OutputReader};

pub mod check;
pub mod cli;


pub const NAME: &str = "treesum";

/// The environment variable holding the log filter directives.
pub const LOG_ENV: &str = "TREESUM_LOG";

/// Produces fresh hashers that all share one mode and key.
#[derive(Clone, Debug)]
pub struct HasherGenerator {
    hasher: Hasher,
}

impl HasherGenerator {
    /// Make a `HasherGenerator` for any [`Mode`]. Keys of the wrong length are
    /// an error.
    pub fn from_mode(mode: Mode<'_>) -> Result<Self> {
        let hasher = Hasher::with_mode(mode)?;
        Ok(Self { hasher })
    }

    /// Make a `HasherGenerator` which produces the default hashers.
    pub fn new() -> Self {
        Self {
            hasher: Hasher::new(),
        }
    }

    /// Return `true` if the generator produces keyed hashers.
    pub fn is_keyed(&self) -> bool {
        self.hasher.domain() == Domain::KeyedHash
    }

    pub fn make_hasher(&self) -> Hasher {
        self.hasher.clone()
    }
}

impl Default for HasherGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Read a keyed-mode key from `reader`. The key must be exactly
/// [`treehash::KEY_LEN`] raw bytes.
pub fn read_key(reader: impl Read) -> Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(treehash::KEY_LEN + 1);
    let n = reader
        .take(treehash::KEY_LEN as u64 + 1)
        .read_to_end(&mut bytes)
        .context("failed to read the key")?;
    if n > treehash::KEY_LEN {
        bail!("read more than {} key bytes", treehash::KEY_LEN);
    }
    Ok(bytes)
}

pub(crate) enum Input {
    File(File),
    Stdin,
}

impl Input {
    // "-" means stdin. This convention applies both to command line arguments
    // and to filepaths that appear in a checkfile.
    pub(crate) fn open(path: &Path, keyed: bool) -> Result<Self> {
        if path == Path::new("-") {
            if keyed {
                bail!("Cannot open `-` in keyed mode");
            }
            return Ok(Self::Stdin);
        }
        Ok(Self::File(File::open(path)?))
    }

    pub(crate) fn hash(&mut self, mut hasher: Hasher) -> Result<OutputReader> {
        match self {
            Self::File(file) => {
                hasher.update_reader(file)?;
            }
            Self::Stdin => {
                hasher.update_reader(io::stdin().lock())?;
            }
        }
        debug!(bytes = hasher.count(), "hashed input");
        Ok(hasher.finalize_xof()?)
    }
}

impl Read for Input {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::File(file) => file.read(buf),
            Self::Stdin => io::stdin().read(buf),
        }
    }
}

/// Open a file, or stdin for `-`, and hash it.
pub fn hash_path(path: &Path, gen: &HasherGenerator) -> Result<OutputReader> {
    Input::open(path, gen.is_keyed())?.hash(gen.make_hasher())
}

/// Write `len` raw output bytes to a writer.
pub fn write_raw_output(output: OutputReader, writer: &mut impl Write, len: u64) -> io::Result<u64> {
    io::copy(&mut output.take(len), writer)
}

/// Write the hex encoding of `len` output bytes to a writer.
pub fn write_hex_output(mut output: OutputReader, writer: &mut impl Write, mut len: u64) -> io::Result<()> {
    // Encoding multiples of the block size is most efficient.
    let mut block = [0; treehash::BLOCK_LEN];
    while len > 0 {
        output.fill(&mut block);
        let hex_str = hex::encode(&block[..]);
        let take_bytes = cmp::min(len, block.len() as u64);
        writer.write_all(hex_str[..2 * take_bytes as usize].as_bytes())?;
        len -= take_bytes;
    }
    Ok(())
}

/// A path as it's printed in a sum line.
#[derive(Debug, PartialEq, Eq)]
pub struct FilepathString {
    pub filepath_string: String,
    pub is_escaped: bool,
}

// Paths with backslashes or newlines get escaped like md5sum does, and the
// whole line gets a leading backslash to say so.
pub fn filepath_to_string(filepath: &Path) -> FilepathString {
    let mut filepath_string = filepath.to_string_lossy().to_string();
    if cfg!(windows) {
        filepath_string = filepath_string.replace('\\', "/");
    }
    let mut is_escaped = false;
    if filepath_string.contains(['\\', '\n']) {
        filepath_string = filepath_string.replace('\\', "\\\\").replace('\n', "\\n");
        is_escaped = true;
    }
    FilepathString {
        filepath_string,
        is_escaped,
    }
}
