//! Element kinds: the binary-vs-text mode a buffer is fixed to.
//!
//! A [`SpooledBuffer`](crate::SpooledBuffer) always stores bytes. The element
//! kind decides what a write must supply, what a read hands back, and what a
//! read limit counts:
//!
//! | Kind       | write accepts         | read returns | `n` counts   |
//! |------------|-----------------------|--------------|--------------|
//! | [`Binary`] | [`Chunk::Bytes`]      | `Vec<u8>`    | bytes        |
//! | [`Text`]   | [`Chunk::Text`]       | `String`     | UTF-8 scalars|
//!
//! Text reads never split a multi-byte sequence. Stored bytes that are not
//! valid UTF-8 (only reachable by overwriting or truncating in the middle of a
//! character) decode to U+FFFD, one replacement per maximal invalid prefix.
use core::fmt;

use bstr::ByteSlice;

/// Runtime tag for the element kind of a buffer or a [`Chunk`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Raw bytes.
    Binary,
    /// UTF-8 text.
    Text,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Binary => f.write_str("binary"),
            Kind::Text => f.write_str("text"),
        }
    }
}

/// Borrowed write input, tagged with the kind of data it carries.
///
/// Most callers never name this type: `&[u8]`, byte-string literals, `&str`
/// and `&String` all convert into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chunk<'a> {
    /// Binary data.
    Bytes(&'a [u8]),
    /// Text data, stored as its UTF-8 encoding.
    Text(&'a str),
}

impl<'a> Chunk<'a> {
    /// The kind of data this chunk carries.
    #[must_use]
    pub fn kind(&self) -> Kind {
        match self {
            Chunk::Bytes(_) => Kind::Binary,
            Chunk::Text(_) => Kind::Text,
        }
    }

    /// The bytes that would be stored for this chunk.
    #[must_use]
    pub fn as_bytes(&self) -> &'a [u8] {
        match *self {
            Chunk::Bytes(bytes) => bytes,
            Chunk::Text(text) => text.as_bytes(),
        }
    }
}

impl<'a> From<&'a [u8]> for Chunk<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Chunk::Bytes(bytes)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for Chunk<'a> {
    fn from(bytes: &'a [u8; N]) -> Self {
        Chunk::Bytes(bytes)
    }
}

impl<'a> From<&'a Vec<u8>> for Chunk<'a> {
    fn from(bytes: &'a Vec<u8>) -> Self {
        Chunk::Bytes(bytes)
    }
}

impl<'a> From<&'a str> for Chunk<'a> {
    fn from(text: &'a str) -> Self {
        Chunk::Text(text)
    }
}

impl<'a> From<&'a String> for Chunk<'a> {
    fn from(text: &'a String) -> Self {
        Chunk::Text(text)
    }
}

mod sealed {
    pub trait Sealed {}

    impl Sealed for super::Binary {}
    impl Sealed for super::Text {}
}

/// Capability of an element kind: how stored bytes are measured and decoded.
///
/// Sealed; the only implementors are [`Binary`] and [`Text`].
pub trait ElementKind: sealed::Sealed + 'static {
    /// The runtime tag checked against every write.
    const KIND: Kind;

    /// Most bytes a single element can occupy.
    const MAX_WIDTH: usize;

    /// What reads return.
    type Output: Clone + Default + fmt::Debug + PartialEq;

    /// Length in bytes of the longest prefix of `bytes` holding at most
    /// `limit` elements.
    fn span(bytes: &[u8], limit: usize) -> usize;

    /// Converts stored bytes into the read output.
    fn decode(bytes: Vec<u8>) -> Self::Output;
}

/// Marker for buffers of raw bytes.
#[derive(Debug, Clone, Copy)]
pub enum Binary {}

/// Marker for buffers of UTF-8 text.
#[derive(Debug, Clone, Copy)]
pub enum Text {}

impl ElementKind for Binary {
    const KIND: Kind = Kind::Binary;
    const MAX_WIDTH: usize = 1;

    type Output = Vec<u8>;

    fn span(bytes: &[u8], limit: usize) -> usize {
        bytes.len().min(limit)
    }

    fn decode(bytes: Vec<u8>) -> Self::Output {
        bytes
    }
}

impl ElementKind for Text {
    const KIND: Kind = Kind::Text;
    const MAX_WIDTH: usize = 4;

    type Output = String;

    fn span(bytes: &[u8], limit: usize) -> usize {
        let mut offset = 0;
        for _ in 0..limit {
            if offset >= bytes.len() {
                break;
            }
            let (_, len) = bstr::decode_utf8(&bytes[offset..]);
            offset += len;
        }
        offset
    }

    fn decode(bytes: Vec<u8>) -> Self::Output {
        match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(err) => err.as_bytes().to_str_lossy().into_owned(),
        }
    }
}
