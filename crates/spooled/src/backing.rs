//! The storage behind a spooled buffer: a growable byte vector or an
//! anonymous temporary file.
//!
//! Every primitive here is positional. The caller owns the cursor and passes
//! an absolute offset into each call, so the OS file position carries no
//! meaning and reads only need `&self` (through `impl Read for &File`).
use std::{
    fs::File,
    io::{self, Read, Seek, SeekFrom, Write},
    path::Path,
};

use bstr::ByteSlice;

/// Chunk size used when scanning a disk-backed store for a line end.
const SCAN_CHUNK: usize = 8 * 1024;

#[derive(Debug)]
pub(crate) enum Backing {
    Memory(Vec<u8>),
    Disk(File),
}

/// Grows `buf` to `len` bytes, zero-filling, without aborting when the
/// allocation cannot be satisfied.
fn grow(buf: &mut Vec<u8>, len: usize) -> io::Result<()> {
    if let Some(additional) = len.checked_sub(buf.len()) {
        buf.try_reserve_exact(additional)
            .map_err(|err| io::Error::new(io::ErrorKind::OutOfMemory, err))?;
    }
    buf.resize(len, 0);
    Ok(())
}

fn to_index(pos: u64) -> io::Result<usize> {
    usize::try_from(pos).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "offset exceeds addressable memory",
        )
    })
}

impl Backing {
    pub(crate) fn is_disk(&self) -> bool {
        matches!(self, Backing::Disk(_))
    }

    pub(crate) fn len(&self) -> io::Result<u64> {
        match self {
            Backing::Memory(buf) => Ok(buf.len() as u64),
            Backing::Disk(file) => Ok(file.metadata()?.len()),
        }
    }

    /// Reads at most `max` bytes starting at `pos`. Reading at or past the
    /// end yields an empty vector.
    pub(crate) fn read_at(&self, pos: u64, max: usize) -> io::Result<Vec<u8>> {
        match self {
            Backing::Memory(buf) => {
                let start = to_index(pos)?.min(buf.len());
                let end = start.saturating_add(max).min(buf.len());
                Ok(buf[start..end].to_vec())
            }
            Backing::Disk(file) => {
                let available = file.metadata()?.len().saturating_sub(pos);
                let want = available.min(max as u64);
                let mut out = Vec::with_capacity(to_index(want)?);
                let mut handle: &File = file;
                handle.seek(SeekFrom::Start(pos))?;
                handle.take(want).read_to_end(&mut out)?;
                Ok(out)
            }
        }
    }

    /// Returns the offset just past the line starting at `pos`: one past the
    /// next `byte`, or the end of the content if there is none.
    pub(crate) fn line_end(&self, pos: u64, byte: u8) -> io::Result<u64> {
        match self {
            Backing::Memory(buf) => {
                let start = to_index(pos)?.min(buf.len());
                Ok(match buf[start..].find_byte(byte) {
                    Some(idx) => (start + idx + 1) as u64,
                    None => buf.len() as u64,
                })
            }
            Backing::Disk(_) => {
                let mut offset = pos;
                loop {
                    let chunk = self.read_at(offset, SCAN_CHUNK)?;
                    if chunk.is_empty() {
                        return Ok(offset);
                    }
                    if let Some(idx) = chunk.find_byte(byte) {
                        return Ok(offset + idx as u64 + 1);
                    }
                    offset += chunk.len() as u64;
                }
            }
        }
    }

    /// Writes `data` at `pos`, overwriting in place and extending as needed.
    /// A gap between the current end and `pos` reads back as zeros.
    pub(crate) fn write_at(&mut self, pos: u64, data: &[u8]) -> io::Result<()> {
        match self {
            Backing::Memory(buf) => {
                let start = to_index(pos)?;
                let end = start.checked_add(data.len()).ok_or_else(|| {
                    io::Error::new(io::ErrorKind::InvalidInput, "write overflows buffer")
                })?;
                if buf.len() < end {
                    grow(buf, end)?;
                }
                buf[start..end].copy_from_slice(data);
                Ok(())
            }
            Backing::Disk(file) => {
                file.seek(SeekFrom::Start(pos))?;
                file.write_all(data)
            }
        }
    }

    /// Sets the content length to exactly `len`, zero-filling on growth.
    pub(crate) fn set_len(&mut self, len: u64) -> io::Result<()> {
        match self {
            Backing::Memory(buf) => grow(buf, to_index(len)?),
            Backing::Disk(file) => file.set_len(len),
        }
    }

    /// Moves in-memory content into a fresh temporary file.
    ///
    /// Returns `false` if the store was already on disk. On failure the
    /// in-memory content is left untouched.
    pub(crate) fn spill(&mut self, dir: Option<&Path>) -> io::Result<bool> {
        let Backing::Memory(buf) = self else {
            return Ok(false);
        };
        let mut file = match dir {
            Some(dir) => tempfile::tempfile_in(dir)?,
            None => tempfile::tempfile()?,
        };
        tracing::trace!(dir = ?dir, "created rollover file");
        file.write_all(buf)?;
        file.flush()?;
        *self = Backing::Disk(file);
        Ok(true)
    }

    #[cfg(unix)]
    pub(crate) fn raw_fd(&self) -> Option<std::os::fd::RawFd> {
        use std::os::fd::AsRawFd;

        match self {
            Backing::Memory(_) => None,
            Backing::Disk(file) => Some(file.as_raw_fd()),
        }
    }
}
