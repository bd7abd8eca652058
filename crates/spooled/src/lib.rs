//! A file-like buffer that keeps small data in memory and spools large data
//! to a temporary file.
//!
//! [`SpooledBuffer`] behaves like a random-access file: callers write, read,
//! seek, truncate, and iterate lines without knowing whether the bytes
//! currently live in RAM or on disk. Once the content grows past
//! [`SpoolOptions::max_size`], the buffer *rolls over*: the content moves to
//! an anonymous temporary file, with content and cursor preserved exactly.
//!
//! Two element kinds are provided: [`SpooledBytes`] for raw bytes and
//! [`SpooledText`] for UTF-8 text.
//!
//! ```rust
//! use std::io::SeekFrom;
//!
//! use spooled::SpooledBytes;
//!
//! let mut buffer = SpooledBytes::with_max_size(4);
//! buffer.write(b"spool").unwrap();
//! assert!(buffer.is_rolled_over());
//!
//! buffer.seek(SeekFrom::Start(1)).unwrap();
//! assert_eq!(buffer.read(Some(3)).unwrap(), b"poo");
//! assert_eq!(buffer.get_contents().unwrap(), b"spool");
//! ```

mod backing;
mod error;
mod kind;
mod options;
mod spooled;

#[cfg(test)]
mod tests;

pub use error::{Result, SpoolError};
pub use kind::{Binary, Chunk, ElementKind, Kind, Text};
pub use options::SpoolOptions;
pub use spooled::{LINE_SEPARATOR, Lines, SpooledBuffer, SpooledBytes, SpooledText};
