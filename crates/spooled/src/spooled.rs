//! [`SpooledBuffer`]: a random-access, file-like buffer that starts in memory
//! and rolls over to an anonymous temporary file once it grows past a
//! threshold.
//!
//! The buffer owns exactly one [`Backing`] store at a time plus a byte cursor.
//! Every operation addresses the store positionally from that cursor, so the
//! observable content and cursor are identical before and after a rollover.
use core::{fmt, marker::PhantomData};
use std::io::{self, SeekFrom};

use crate::{
    backing::Backing,
    error::{Result, SpoolError},
    kind::{Binary, Chunk, ElementKind, Kind, Text},
    options::SpoolOptions,
};

/// Separator that terminates a line on this platform.
#[cfg(windows)]
pub const LINE_SEPARATOR: &str = "\r\n";
/// Separator that terminates a line on this platform.
#[cfg(not(windows))]
pub const LINE_SEPARATOR: &str = "\n";

/// Lines are split after this byte, the final byte of [`LINE_SEPARATOR`].
const LINE_TERMINATOR: u8 = LINE_SEPARATOR.as_bytes()[LINE_SEPARATOR.len() - 1];

/// A spooled buffer of raw bytes.
pub type SpooledBytes = SpooledBuffer<Binary>;

/// A spooled buffer of UTF-8 text.
pub type SpooledText = SpooledBuffer<Text>;

/// A file-like buffer that keeps its content in memory until it exceeds
/// [`SpoolOptions::max_size`] and then moves it to a temporary file.
///
/// The element kind `K` is fixed for the lifetime of the buffer. Writes accept
/// any [`Chunk`] and reject the other kind with [`SpoolError::InvalidType`];
/// reads return `K::Output` (`Vec<u8>` or `String`).
///
/// Offsets, [`tell`](Self::tell), and [`len`](Self::len) are always byte
/// counts, including for text buffers.
///
/// Once [`close`](Self::close)d, every operation except `close`,
/// [`closed`](Self::closed) and the line-buffering hint accessors fails with
/// [`SpoolError::Closed`]. Dropping the buffer closes it.
///
/// # Examples
///
/// ```rust
/// use std::io::SeekFrom;
///
/// use spooled::SpooledText;
///
/// let mut buffer = SpooledText::with_max_size(16);
/// buffer.write("first line\n").unwrap();
/// assert!(!buffer.is_rolled_over());
///
/// buffer.write("second line\n").unwrap();
/// assert!(buffer.is_rolled_over());
///
/// buffer.seek(SeekFrom::Start(0)).unwrap();
/// let lines: Vec<String> = buffer.lines().collect::<Result<_, _>>().unwrap();
/// assert_eq!(lines, ["first line\n", "second line\n"]);
/// ```
pub struct SpooledBuffer<K: ElementKind> {
    backing: Option<Backing>,
    cursor: u64,
    options: SpoolOptions,
    line_buffering_hint: bool,
    kind: PhantomData<K>,
}

impl<K: ElementKind> SpooledBuffer<K> {
    /// Creates an empty in-memory buffer with no rollover threshold.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(SpoolOptions::default())
    }

    /// Creates an empty buffer that rolls over once it holds more than
    /// `max_size` bytes. A `max_size` of zero disables automatic rollover.
    #[must_use]
    pub fn with_max_size(max_size: u64) -> Self {
        Self::with_options(SpoolOptions {
            max_size: Some(max_size),
            ..SpoolOptions::default()
        })
    }

    /// Creates an empty buffer from a full set of options.
    #[must_use]
    pub fn with_options(options: SpoolOptions) -> Self {
        Self {
            backing: Some(Backing::Memory(Vec::new())),
            cursor: 0,
            options,
            line_buffering_hint: false,
            kind: PhantomData,
        }
    }

    /// The element kind this buffer accepts and emits.
    #[must_use]
    pub fn kind(&self) -> Kind {
        K::KIND
    }

    /// The options the buffer was created with.
    #[must_use]
    pub fn options(&self) -> &SpoolOptions {
        &self.options
    }

    fn store(&self) -> Result<&Backing> {
        self.backing.as_ref().ok_or(SpoolError::Closed)
    }

    fn store_mut(&mut self) -> Result<&mut Backing> {
        self.backing.as_mut().ok_or(SpoolError::Closed)
    }

    // ───────────────────────────── writing ─────────────────────────────

    /// Writes `data` at the cursor, overwriting existing bytes and extending
    /// the content as needed, then advances the cursor past it.
    ///
    /// If the cursor sits past the end, the gap is filled with zero bytes.
    /// When the new length would exceed the rollover threshold, the buffer
    /// moves to disk first and the bytes are written there.
    ///
    /// Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// [`SpoolError::InvalidType`] if `data` is not of kind `K`,
    /// [`SpoolError::Closed`] after [`close`](Self::close), and
    /// [`SpoolError::Io`] if the backing store fails.
    pub fn write<'a>(&mut self, data: impl Into<Chunk<'a>>) -> Result<usize> {
        self.write_chunk(data.into())
    }

    fn write_chunk(&mut self, chunk: Chunk<'_>) -> Result<usize> {
        let cursor = self.cursor;
        self.store()?;
        if chunk.kind() != K::KIND {
            return Err(SpoolError::InvalidType {
                expected: K::KIND,
                found: chunk.kind(),
            });
        }

        let bytes = chunk.as_bytes();
        if bytes.is_empty() {
            return Ok(0);
        }
        let end = cursor.saturating_add(bytes.len() as u64);
        self.spill_before_growth(end)?;
        self.store_mut()?.write_at(cursor, bytes)?;
        self.cursor = end;
        Ok(bytes.len())
    }

    /// Rolls over ahead of any change that would leave more than the
    /// threshold in memory, so the growth itself happens on disk.
    fn spill_before_growth(&mut self, new_len: u64) -> Result<()> {
        let Some(max) = self.options.threshold() else {
            return Ok(());
        };
        let store = self.store()?;
        if !store.is_disk() && new_len.max(store.len()?) > max {
            self.spill("threshold")?;
        }
        Ok(())
    }

    /// Writes every item of `lines` in order. No separators are added.
    ///
    /// Returns the total number of bytes written.
    ///
    /// # Errors
    ///
    /// Stops at the first failing write; see [`write`](Self::write).
    pub fn writelines<'a, I>(&mut self, lines: I) -> Result<usize>
    where
        I: IntoIterator,
        I::Item: Into<Chunk<'a>>,
    {
        lines
            .into_iter()
            .try_fold(0, |total, line| Ok(total + self.write(line)?))
    }

    // ───────────────────────────── rollover ────────────────────────────

    /// Moves the content to a fresh temporary file. Content and cursor are
    /// unchanged. Does nothing if the buffer is already on disk.
    ///
    /// # Errors
    ///
    /// [`SpoolError::Closed`] after [`close`](Self::close), or
    /// [`SpoolError::Io`] if the file cannot be created or written. On failure
    /// the buffer stays in memory, intact.
    pub fn rollover(&mut self) -> Result<()> {
        self.spill("manual")
    }

    fn spill(&mut self, reason: &'static str) -> Result<()> {
        let cursor = self.cursor;
        let dir = self.options.temp_dir.as_deref();
        let store = self.backing.as_mut().ok_or(SpoolError::Closed)?;
        let bytes = store.len()?;
        if store.spill(dir)? {
            tracing::debug!(bytes, cursor, reason, "rolled over to disk");
        }
        Ok(())
    }

    /// Whether the content currently lives in a temporary file.
    #[must_use]
    pub fn is_rolled_over(&self) -> bool {
        self.backing.as_ref().is_some_and(Backing::is_disk)
    }

    // ───────────────────────────── reading ─────────────────────────────

    /// Reads up to `n` elements from the cursor, or everything remaining when
    /// `n` is `None`, and advances the cursor by the bytes consumed.
    ///
    /// For text buffers `n` counts characters and a multi-byte character is
    /// never split. At the end of the content the result is empty.
    ///
    /// # Errors
    ///
    /// [`SpoolError::Closed`] or [`SpoolError::Io`].
    pub fn read(&mut self, n: Option<usize>) -> Result<K::Output> {
        let window = n.map_or(usize::MAX, |n| n.saturating_mul(K::MAX_WIDTH));
        let mut bytes = self.store()?.read_at(self.cursor, window)?;
        if let Some(n) = n {
            bytes.truncate(K::span(&bytes, n));
        }
        self.cursor += bytes.len() as u64;
        Ok(K::decode(bytes))
    }

    /// Reads one line from the cursor, including its terminator.
    ///
    /// The last line of the content may lack a terminator. At the end of the
    /// content the result is empty.
    ///
    /// # Errors
    ///
    /// [`SpoolError::Closed`] or [`SpoolError::Io`].
    pub fn readline(&mut self) -> Result<K::Output> {
        self.read_line(None)
    }

    /// Like [`readline`](Self::readline), but returns at most `limit`
    /// elements; the rest of the line is left for the next read.
    ///
    /// # Errors
    ///
    /// [`SpoolError::Closed`] or [`SpoolError::Io`].
    pub fn readline_limited(&mut self, limit: usize) -> Result<K::Output> {
        self.read_line(Some(limit))
    }

    fn read_line(&mut self, limit: Option<usize>) -> Result<K::Output> {
        let store = self.store()?;
        let end = store.line_end(self.cursor, LINE_TERMINATOR)?;
        let count = usize::try_from(end.saturating_sub(self.cursor)).unwrap_or(usize::MAX);
        let mut bytes = store.read_at(self.cursor, count)?;
        if let Some(limit) = limit {
            bytes.truncate(K::span(&bytes, limit));
        }
        self.cursor += bytes.len() as u64;
        Ok(K::decode(bytes))
    }

    /// Reads the next line, or `None` once the cursor is at or past the end.
    ///
    /// # Errors
    ///
    /// [`SpoolError::Closed`] or [`SpoolError::Io`].
    pub fn next_line(&mut self) -> Result<Option<K::Output>> {
        let line = self.readline()?;
        if line == K::Output::default() {
            Ok(None)
        } else {
            Ok(Some(line))
        }
    }

    /// Reads every remaining line.
    ///
    /// # Errors
    ///
    /// [`SpoolError::Closed`] or [`SpoolError::Io`].
    pub fn readlines(&mut self) -> Result<Vec<K::Output>> {
        self.readlines_hint(0)
    }

    /// Reads lines until their combined size reaches `hint` bytes, or all
    /// remaining lines if `hint` is zero.
    ///
    /// # Errors
    ///
    /// [`SpoolError::Closed`] or [`SpoolError::Io`].
    pub fn readlines_hint(&mut self, hint: u64) -> Result<Vec<K::Output>> {
        let mut lines = Vec::new();
        let start = self.cursor;
        while let Some(line) = self.next_line()? {
            lines.push(line);
            if hint > 0 && self.cursor - start >= hint {
                break;
            }
        }
        Ok(lines)
    }

    /// Iterates over lines from the cursor onward.
    ///
    /// The iterator walks the live cursor: it is not a snapshot, and once
    /// exhausted it yields nothing until the cursor is moved back with
    /// [`seek`](Self::seek).
    pub fn lines(&mut self) -> Lines<'_, K> {
        Lines { buffer: self }
    }

    /// Returns the whole content without moving the cursor.
    ///
    /// # Errors
    ///
    /// [`SpoolError::Closed`] or [`SpoolError::Io`].
    pub fn get_contents(&self) -> Result<K::Output> {
        self.contents_bytes().map(K::decode)
    }

    /// Alias for [`get_contents`](Self::get_contents).
    ///
    /// # Errors
    ///
    /// See [`get_contents`](Self::get_contents).
    pub fn buf(&self) -> Result<K::Output> {
        self.get_contents()
    }

    fn contents_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.store()?.read_at(0, usize::MAX)?)
    }

    // ─────────────────────────── positioning ───────────────────────────

    /// Moves the cursor and returns its new byte offset.
    ///
    /// Seeking past the end is allowed; a later write there leaves a
    /// zero-filled gap.
    ///
    /// # Errors
    ///
    /// [`SpoolError::NegativeSeek`] if the target is before the start (the
    /// cursor is left where it was), [`SpoolError::Closed`], or
    /// [`SpoolError::Io`].
    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        let store = self.store()?;
        let target = match pos {
            SeekFrom::Start(offset) => i128::from(offset),
            SeekFrom::Current(delta) => i128::from(self.cursor) + i128::from(delta),
            SeekFrom::End(delta) => i128::from(store.len()?) + i128::from(delta),
        };
        if target < 0 {
            return Err(SpoolError::NegativeSeek(
                i64::try_from(target).unwrap_or(i64::MIN),
            ));
        }
        self.cursor = u64::try_from(target).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidInput, "seek position overflows u64")
        })?;
        Ok(self.cursor)
    }

    /// The cursor's byte offset.
    ///
    /// # Errors
    ///
    /// [`SpoolError::Closed`].
    pub fn tell(&self) -> Result<u64> {
        self.store()?;
        Ok(self.cursor)
    }

    /// Alias for [`tell`](Self::tell).
    ///
    /// # Errors
    ///
    /// [`SpoolError::Closed`].
    pub fn pos(&self) -> Result<u64> {
        self.tell()
    }

    /// Sets the content length and returns it. The cursor never moves.
    ///
    /// With `None` the content is cut at the cursor. With `Some(size)` the
    /// length becomes exactly `size`: longer content is discarded, shorter
    /// content is zero-extended. Growing past the rollover threshold moves
    /// the buffer to disk first.
    ///
    /// # Errors
    ///
    /// [`SpoolError::NegativeSize`] for a negative size,
    /// [`SpoolError::Closed`], or [`SpoolError::Io`].
    pub fn truncate(&mut self, size: Option<i64>) -> Result<u64> {
        let cursor = self.cursor;
        self.store()?;
        let size = match size {
            None => cursor,
            Some(size) => u64::try_from(size).map_err(|_| SpoolError::NegativeSize(size))?,
        };
        self.spill_before_growth(size)?;
        self.store_mut()?.set_len(size)?;
        Ok(size)
    }

    /// [`truncate`](Self::truncate) for callers holding a runtime argument
    /// list, such as scripting bridges. Accepts zero or one argument.
    ///
    /// # Errors
    ///
    /// [`SpoolError::InvalidArgumentCount`] for two or more arguments,
    /// otherwise as [`truncate`](Self::truncate).
    pub fn truncate_args(&mut self, args: &[i64]) -> Result<u64> {
        match *args {
            [] => self.truncate(None),
            [size] => self.truncate(Some(size)),
            _ => Err(SpoolError::InvalidArgumentCount {
                max: 1,
                given: args.len(),
            }),
        }
    }

    /// Content length in bytes. Does not move the cursor.
    ///
    /// # Errors
    ///
    /// [`SpoolError::Closed`] or [`SpoolError::Io`].
    pub fn len(&self) -> Result<u64> {
        Ok(self.store()?.len()?)
    }

    /// Whether the content is empty.
    ///
    /// # Errors
    ///
    /// [`SpoolError::Closed`] or [`SpoolError::Io`].
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    // ──────────────────────────── lifecycle ────────────────────────────

    /// Releases the backing store, deleting the temporary file if there is
    /// one. Calling it again does nothing.
    pub fn close(&mut self) {
        if let Some(backing) = self.backing.take() {
            tracing::trace!(rolled = backing.is_disk(), "closing spooled buffer");
        }
    }

    /// Whether [`close`](Self::close) has been called.
    #[must_use]
    pub fn closed(&self) -> bool {
        self.backing.is_none()
    }

    /// Runs `f` with the buffer and closes it afterwards, whatever `f`
    /// returns. A panic inside `f` closes it through `Drop`.
    ///
    /// # Errors
    ///
    /// Whatever `f` returns.
    pub fn scope<T, E>(mut self, f: impl FnOnce(&mut Self) -> Result<T, E>) -> Result<T, E> {
        let result = f(&mut self);
        self.close();
        result
    }

    /// Forces a rollover and returns the temporary file's descriptor.
    ///
    /// # Errors
    ///
    /// As [`rollover`](Self::rollover).
    #[cfg(unix)]
    pub fn fileno(&mut self) -> Result<std::os::fd::RawFd> {
        self.rollover()?;
        self.store()?
            .raw_fd()
            .ok_or_else(|| io::Error::other("buffer is not backed by a file").into())
    }

    // ─────────────────────── file-object parity ────────────────────────

    /// Nothing is buffered between the caller and the store; kept for
    /// file-object parity.
    ///
    /// # Errors
    ///
    /// [`SpoolError::Closed`].
    pub fn flush(&mut self) -> Result<()> {
        self.store()?;
        Ok(())
    }

    /// Always `false`.
    ///
    /// # Errors
    ///
    /// [`SpoolError::Closed`].
    pub fn isatty(&self) -> Result<bool> {
        self.store()?;
        Ok(false)
    }

    /// Always `true` while open.
    ///
    /// # Errors
    ///
    /// [`SpoolError::Closed`].
    pub fn seekable(&self) -> Result<bool> {
        self.store()?;
        Ok(true)
    }

    /// Always `true` while open.
    ///
    /// # Errors
    ///
    /// [`SpoolError::Closed`].
    pub fn readable(&self) -> Result<bool> {
        self.store()?;
        Ok(true)
    }

    /// Always `true` while open.
    ///
    /// # Errors
    ///
    /// [`SpoolError::Closed`].
    pub fn writable(&self) -> Result<bool> {
        self.store()?;
        Ok(true)
    }

    /// Caller-owned flag carried for file-object compatibility. Stored and
    /// returned, never consulted.
    #[must_use]
    pub fn line_buffering_hint(&self) -> bool {
        self.line_buffering_hint
    }

    /// Sets the compatibility attribute returned by
    /// [`line_buffering_hint`](Self::line_buffering_hint).
    pub fn set_line_buffering_hint(&mut self, hint: bool) {
        self.line_buffering_hint = hint;
    }
}

impl<K: ElementKind> Default for SpooledBuffer<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: ElementKind> Drop for SpooledBuffer<K> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<K: ElementKind> fmt::Debug for SpooledBuffer<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpooledBuffer")
            .field("kind", &K::KIND)
            .field("rolled_over", &self.is_rolled_over())
            .field("cursor", &self.cursor)
            .field("closed", &self.closed())
            .finish_non_exhaustive()
    }
}

/// Buffers are equal when they have the same element kind and byte-identical
/// content. A binary and a text buffer are never equal, and a closed buffer
/// equals nothing.
impl<A: ElementKind, B: ElementKind> PartialEq<SpooledBuffer<B>> for SpooledBuffer<A> {
    fn eq(&self, other: &SpooledBuffer<B>) -> bool {
        if A::KIND != B::KIND {
            return false;
        }
        match (self.contents_bytes(), other.contents_bytes()) {
            (Ok(ours), Ok(theirs)) => ours == theirs,
            _ => false,
        }
    }
}

/// Iterator over the lines of a [`SpooledBuffer`], returned by
/// [`SpooledBuffer::lines`].
#[derive(Debug)]
pub struct Lines<'a, K: ElementKind> {
    buffer: &'a mut SpooledBuffer<K>,
}

impl<K: ElementKind> Iterator for Lines<'_, K> {
    type Item = Result<K::Output>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buffer.next_line().transpose()
    }
}

impl<'a, K: ElementKind> IntoIterator for &'a mut SpooledBuffer<K> {
    type Item = Result<K::Output>;
    type IntoIter = Lines<'a, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines()
    }
}

impl io::Read for SpooledBuffer<Binary> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let bytes = self.store()?.read_at(self.cursor, buf.len())?;
        buf[..bytes.len()].copy_from_slice(&bytes);
        self.cursor += bytes.len() as u64;
        Ok(bytes.len())
    }
}

impl io::Write for SpooledBuffer<Binary> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(self.write_chunk(Chunk::Bytes(buf))?)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(SpooledBuffer::flush(self)?)
    }
}

impl<K: ElementKind> io::Seek for SpooledBuffer<K> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Ok(SpooledBuffer::seek(self, pos)?)
    }
}

impl fmt::Write for SpooledBuffer<Text> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write_chunk(Chunk::Text(s))
            .map(|_| ())
            .map_err(|_| fmt::Error)
    }
}
