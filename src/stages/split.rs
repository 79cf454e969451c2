//! Tokenize a flow of readable streams into one flat flow of tokens.
//!
//! [`Split`] scans each upstream stream to completion, one character at a time, and
//! cuts a token at every delimiter character and at the end of the stream. Streams are
//! chained transparently, but a token never spans two streams.
//!
//! After a stream has been read to the end it is rewound (see [`Rewind`]) before the
//! tokenizer lets go of it. When the upstream lends its streams by reference, the
//! caller gets them back positioned at the start, ready for another pass. The same
//! holds when the token flow is dropped partway through a stream.
//!
//! ```
//! use pipeflow::*;
//! use std::io::Cursor;
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut files = vec![Cursor::new("10 2"), Cursor::new("3")];
//! let numbers = AsDataFlow::new(&mut files)
//!     .pipe(Split::new(" "))
//!     .pipe(Transform::new(|t: String| t.parse::<i32>().ok()))
//!     .pipe(DropNone)
//!     .pipe(AsVector)?;
//! assert_eq!(numbers, vec![10, 2, 3]);
//! # Ok(())
//! # }
//! ```

use crate::flow::{DataFlow, Fault, Stage};
use anyhow::{Context, Error};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor, Read, Seek};
use tracing::{trace, warn};

/// A stream that can be repositioned at its beginning.
pub trait Rewind {
    fn rewind(&mut self) -> io::Result<()>;
}

impl<T: AsRef<[u8]>> Rewind for Cursor<T> {
    fn rewind(&mut self) -> io::Result<()> {
        self.set_position(0);
        Ok(())
    }
}

impl Rewind for File {
    fn rewind(&mut self) -> io::Result<()> {
        Seek::rewind(self)
    }
}

impl<R: Read + Seek> Rewind for BufReader<R> {
    fn rewind(&mut self) -> io::Result<()> {
        Seek::rewind(self)
    }
}

impl Rewind for io::Empty {
    fn rewind(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<R: Rewind + ?Sized> Rewind for &mut R {
    fn rewind(&mut self) -> io::Result<()> {
        (**self).rewind()
    }
}

impl<R: Rewind + ?Sized> Rewind for Box<R> {
    fn rewind(&mut self) -> io::Result<()> {
        (**self).rewind()
    }
}

/// Tokenizer stage. See the [module documentation](self).
#[derive(Clone, Debug)]
pub struct Split {
    delimiters: Vec<char>,
    keep_empty: bool,
}

impl Split {
    /// Split on any of the characters in `delimiters`.
    pub fn new(delimiters: impl AsRef<str>) -> Self {
        Self {
            delimiters: delimiters.as_ref().chars().collect(),
            keep_empty: false,
        }
    }

    /// Yield empty fields between consecutive delimiters inside a stream.
    ///
    /// Off by default: delimiters then only terminate tokens. Either way a stream
    /// never produces a trailing empty token at its end.
    #[must_use]
    pub fn keep_empty(mut self, keep: bool) -> Self {
        self.keep_empty = keep;
        self
    }
}

impl<I> Stage<I> for Split
where
    I: DataFlow,
    I::Item: Read + Rewind,
{
    type Output = Tokens<I>;

    fn apply(self, input: I) -> Self::Output {
        Tokens {
            upstream: input,
            current: None,
            stream_index: 0,
            delimiters: self.delimiters,
            keep_empty: self.keep_empty,
            fault: Fault::default(),
        }
    }
}

/// Flow of tokens produced by [`Split`].
///
/// Dropping it before the end rewinds the stream it was reading.
pub struct Tokens<I: Iterator>
where
    I::Item: Rewind,
{
    upstream: I,
    current: Option<Chars<I::Item>>,
    stream_index: usize,
    delimiters: Vec<char>,
    keep_empty: bool,
    fault: Fault,
}

impl<I> Tokens<I>
where
    I: DataFlow,
    I::Item: Read + Rewind,
{
    /// Scan the current stream up to the next token boundary.
    ///
    /// `Ok(None)` means the stream ended with nothing pending; it has already been
    /// rewound and released.
    fn scan(&mut self) -> io::Result<Option<String>> {
        let Some(chars) = self.current.as_mut() else {
            return Ok(None);
        };
        let mut token = String::new();
        while let Some(c) = chars.next_char()? {
            if !self.delimiters.contains(&c) {
                token.push(c);
            } else if self.keep_empty || !token.is_empty() {
                return Ok(Some(token));
            }
        }
        self.release()?;
        Ok((!token.is_empty()).then_some(token))
    }

    fn release(&mut self) -> io::Result<()> {
        if let Some(chars) = self.current.take() {
            let mut stream = chars.into_inner();
            stream.rewind()?;
            trace!(stream = self.stream_index, "split: stream exhausted");
        }
        Ok(())
    }
}

impl<I: Iterator> Drop for Tokens<I>
where
    I::Item: Rewind,
{
    fn drop(&mut self) {
        if let Some(chars) = self.current.take() {
            let mut stream = chars.into_inner();
            if let Err(err) = stream.rewind() {
                warn!(stream = self.stream_index, error = %err, "split: rewind on drop failed");
            }
        }
    }
}

impl<I> Iterator for Tokens<I>
where
    I: DataFlow,
    I::Item: Read + Rewind,
{
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.fault.is_set() {
            return None;
        }
        loop {
            if self.current.is_none() {
                let stream = self.upstream.next()?;
                self.stream_index += 1;
                trace!(stream = self.stream_index, "split: advancing to stream");
                self.current = Some(Chars::new(stream));
            }
            match self.scan() {
                Ok(Some(token)) => return Some(token),
                Ok(None) => continue,
                Err(err) => {
                    self.current = None;
                    let err = Error::new(err)
                        .context(format!("split: reading stream #{}", self.stream_index));
                    self.fault.park(err);
                    return None;
                }
            }
        }
    }
}

impl<I> DataFlow for Tokens<I>
where
    I: DataFlow,
    I::Item: Read + Rewind,
{
    fn take_error(&mut self) -> Option<Error> {
        self.fault.take().or_else(|| self.upstream.take_error())
    }
}

/// UTF-8 character cursor over a buffered stream.
struct Chars<R> {
    reader: BufReader<R>,
}

impl<R> Chars<R> {
    fn into_inner(self) -> R {
        self.reader.into_inner()
    }
}

impl<R: Read> Chars<R> {
    fn new(stream: R) -> Self {
        Self {
            reader: BufReader::new(stream),
        }
    }

    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        let byte = loop {
            match self.reader.fill_buf() {
                Ok(buf) => break buf.first().copied(),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        };
        if byte.is_some() {
            self.reader.consume(1);
        }
        Ok(byte)
    }

    fn next_char(&mut self) -> io::Result<Option<char>> {
        let Some(lead) = self.next_byte()? else {
            return Ok(None);
        };
        let width = utf8_width(lead).ok_or_else(|| invalid_utf8(lead))?;
        let mut bytes = [lead, 0, 0, 0];
        for slot in &mut bytes[1..width] {
            *slot = self.next_byte()?.ok_or_else(|| {
                io::Error::new(io::ErrorKind::UnexpectedEof, "stream ends inside a UTF-8 sequence")
            })?;
        }
        let decoded = std::str::from_utf8(&bytes[..width])
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        Ok(decoded.chars().next())
    }
}

fn utf8_width(lead: u8) -> Option<usize> {
    match lead {
        0x00..=0x7F => Some(1),
        0xC2..=0xDF => Some(2),
        0xE0..=0xEF => Some(3),
        0xF0..=0xF4 => Some(4),
        _ => None,
    }
}

fn invalid_utf8(lead: u8) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("invalid UTF-8 lead byte 0x{lead:02x}"),
    )
}

/// Tokenize a handful of in-memory texts, each one treated as its own stream.
pub fn split_text<S: AsRef<str>>(texts: &[S], delimiters: &str) -> anyhow::Result<Vec<String>> {
    let streams: Vec<Cursor<&[u8]>> = texts
        .iter()
        .map(|t| Cursor::new(t.as_ref().as_bytes()))
        .collect();
    let mut tokens = Split::new(delimiters).apply(crate::from_vec(streams));
    let out: Vec<String> = tokens.by_ref().collect();
    match tokens.take_error() {
        Some(err) => Err(err).context("split_text"),
        None => Ok(out),
    }
}
