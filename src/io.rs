//! `std::io` adapters, available with the `std` feature.

use crate::{Error, Hasher, OutputReader};
use std::cmp;
use std::io;

impl Hasher {
    /// Read all of `reader` into the hash state, using a 64 KiB buffer.
    ///
    /// Equivalent to [`std::io::copy`] into the hasher, but with a larger
    /// buffer. Interrupted reads are retried.
    pub fn update_reader(&mut self, mut reader: impl io::Read) -> io::Result<&mut Self> {
        if self.is_finalized() {
            return Err(io::Error::new(io::ErrorKind::Other, Error::AlreadyFinalized));
        }
        let mut buf = [0; 65536];
        loop {
            match reader.read(&mut buf) {
                Ok(0) => return Ok(self),
                Ok(n) => {
                    self.update(&buf[..n]);
                }
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

impl io::Write for Hasher {
    /// This is equivalent to [`update`](#method.update), except that writing
    /// to a finalized hasher is an error rather than a panic.
    #[inline]
    fn write(&mut self, input: &[u8]) -> io::Result<usize> {
        if self.is_finalized() {
            return Err(io::Error::new(io::ErrorKind::Other, Error::AlreadyFinalized));
        }
        self.update(input);
        Ok(input.len())
    }

    #[inline]
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl io::Read for OutputReader {
    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.fill(buf);
        Ok(buf.len())
    }
}

impl io::Seek for OutputReader {
    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        let max_position = u64::MAX as i128;
        let target_position: i128 = match pos {
            io::SeekFrom::Start(x) => x as i128,
            io::SeekFrom::Current(x) => self.position() as i128 + x as i128,
            io::SeekFrom::End(_) => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "seek from end not supported",
                ));
            }
        };
        if target_position < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek before start",
            ));
        }
        self.set_position(cmp::min(target_position, max_position) as u64);
        Ok(self.position())
    }
}
