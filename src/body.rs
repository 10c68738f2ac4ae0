//! This module provides the `Contents` struct, the replaceable body producer carried by
//! every [`Response`](crate::types::Response). A producer writes the response bytes into
//! whatever sink the transport hands it and is consumed by that single call, so wrapping
//! one (for example with a compressing filter) means moving it into a new producer.

use std::{
    fmt,
    io::{self, Write},
};

use bytes::Bytes;
use http_body_util::Full;

/// A value that can write itself to an output sink exactly once.
///
/// Closures of the shape `FnOnce(&mut dyn Write) -> io::Result<()>` implement it, so most
/// handlers never name the trait directly.
pub trait WriteBody: Send + 'static {
    fn write_to(self: Box<Self>, sink: &mut dyn Write) -> io::Result<()>;
}

impl<F> WriteBody for F
where
    F: FnOnce(&mut dyn Write) -> io::Result<()> + Send + 'static,
{
    fn write_to(self: Box<Self>, sink: &mut dyn Write) -> io::Result<()> {
        (*self)(sink)
    }
}

/// Producer for bytes that are already in memory.
struct Buffered(Bytes);

impl WriteBody for Buffered {
    fn write_to(self: Box<Self>, sink: &mut dyn Write) -> io::Result<()> {
        sink.write_all(&self.0)
    }
}

/// The `Contents` struct is a wrapper around a boxed [`WriteBody`] producer.
///
/// # Example
///
/// ```rust
/// use tako_gzip::body::Contents;
///
/// let empty = Contents::empty();
/// let text = Contents::from("Hello, world!".to_string());
/// let lazy = Contents::from_fn(|sink| sink.write_all(b"generated on demand"));
/// ```
pub struct Contents(Box<dyn WriteBody>);

impl Contents {
    /// Creates a new `Contents` from any producer.
    pub fn new<W>(producer: W) -> Self
    where
        W: WriteBody,
    {
        Self(Box::new(producer))
    }

    /// Creates a `Contents` from a closure that writes the body into the sink.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: FnOnce(&mut dyn Write) -> io::Result<()> + Send + 'static,
    {
        Self::new(f)
    }

    /// Creates an empty `Contents`.
    pub fn empty() -> Self {
        Self::new(Buffered(Bytes::new()))
    }

    /// Runs the producer against `sink`, consuming it.
    pub fn write_to(self, sink: &mut dyn Write) -> io::Result<()> {
        self.0.write_to(sink)
    }

    /// Materializes the producer into memory.
    pub fn into_bytes(self) -> io::Result<Bytes> {
        let mut buf = Vec::new();
        self.write_to(&mut buf)?;
        Ok(Bytes::from(buf))
    }

    /// Materializes the producer into a body the hyper transport can send.
    pub fn into_full(self) -> io::Result<Full<Bytes>> {
        self.into_bytes().map(Full::new)
    }
}

impl Default for Contents {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Contents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Contents(..)")
    }
}

impl From<()> for Contents {
    fn from(_: ()) -> Self {
        Self::empty()
    }
}

impl From<&'static str> for Contents {
    fn from(s: &'static str) -> Self {
        Self::new(Buffered(Bytes::from_static(s.as_bytes())))
    }
}

macro_rules! contents_from_impl {
    ($ty:ty) => {
        impl From<$ty> for Contents {
            fn from(buf: $ty) -> Self {
                Self::new(Buffered(Bytes::from(buf)))
            }
        }
    };
}

contents_from_impl!(String);
contents_from_impl!(Vec<u8>);
contents_from_impl!(Bytes);
