//! Terminal stages.
//!
//! Every sink drains its upstream and then checks it for a parked collaborator
//! failure, so a pipeline either completes with the requested result or returns the
//! first failure that stopped it.
//!
//! - [`AsVector`] -- collect every item, in order.
//! - [`FailFast`] -- collect the successes of a `Result` flow, stopping at the first error.
//! - [`WriteTo`] -- append each item's text and a delimiter to a writer.
//! - [`Out`] -- append each item's text as one line to a writer.
//! - [`WriteJsonLines`] -- append each item as one line of compact JSON (feature `io-jsonl`).

use crate::flow::{DataFlow, Stage, drain};
use anyhow::{Context, Result, anyhow};
use std::fmt::Display;
use std::io::{self, Write};

/// Collect the whole flow into a `Vec`, preserving order.
#[derive(Clone, Copy, Debug, Default)]
pub struct AsVector;

impl<I: DataFlow> Stage<I> for AsVector {
    type Output = Result<Vec<I::Item>>;

    fn apply(self, mut input: I) -> Self::Output {
        drain(&mut input)
    }
}

/// Collect a flow of `Result<T, E>`, failing on the first item error.
///
/// The error is reported as `element failed: {e}`. Use
/// [`SplitResults`](crate::SplitResults) to keep going past bad items instead.
#[derive(Clone, Copy, Debug, Default)]
pub struct FailFast;

impl<I, T, E> Stage<I> for FailFast
where
    I: DataFlow<Item = Result<T, E>>,
    E: Display,
{
    type Output = Result<Vec<T>>;

    fn apply(self, mut input: I) -> Self::Output {
        let mut ok = Vec::new();
        for item in input.by_ref() {
            match item {
                Ok(v) => ok.push(v),
                Err(e) => return Err(anyhow!("element failed: {e}")),
            }
        }
        match input.take_error() {
            Some(err) => Err(err),
            None => Ok(ok),
        }
    }
}

/// Write each item followed by `delimiter`, then hand back the drained upstream.
///
/// ```
/// use pipeflow::*;
///
/// # fn main() -> anyhow::Result<()> {
/// let mut buf = Vec::new();
/// from_vec(vec!["a.txt", "b.txt"]).pipe(WriteTo::new(&mut buf, "/"))?;
/// assert_eq!(buf, b"a.txt/b.txt/");
/// # Ok(())
/// # }
/// ```
pub struct WriteTo<W> {
    sink: W,
    delimiter: String,
}

impl<W: Write> WriteTo<W> {
    pub fn new(sink: W, delimiter: impl Into<String>) -> Self {
        Self {
            sink,
            delimiter: delimiter.into(),
        }
    }
}

impl<I, W> Stage<I> for WriteTo<W>
where
    I: DataFlow,
    I::Item: Display,
    W: Write,
{
    type Output = Result<I>;

    fn apply(mut self, mut input: I) -> Self::Output {
        for (i, item) in input.by_ref().enumerate() {
            write!(self.sink, "{item}{}", self.delimiter)
                .with_context(|| format!("write item #{i}"))?;
        }
        self.sink.flush().context("flush sink")?;
        match input.take_error() {
            Some(err) => Err(err),
            None => Ok(input),
        }
    }
}

impl WriteTo<io::Stdout> {
    /// Print to standard output, each item followed by `delimiter`.
    #[must_use]
    pub fn stdout(delimiter: impl Into<String>) -> Self {
        Self::new(io::stdout(), delimiter)
    }
}

/// Write each item on its own line.
pub struct Out<W> {
    sink: W,
}

impl<W: Write> Out<W> {
    pub fn new(sink: W) -> Self {
        Self { sink }
    }
}

impl Out<io::Stdout> {
    /// Print to standard output.
    #[must_use]
    pub fn stdout() -> Self {
        Self { sink: io::stdout() }
    }
}

impl<I, W> Stage<I> for Out<W>
where
    I: DataFlow,
    I::Item: Display,
    W: Write,
{
    type Output = Result<()>;

    fn apply(mut self, mut input: I) -> Self::Output {
        for (i, item) in input.by_ref().enumerate() {
            writeln!(self.sink, "{item}").with_context(|| format!("write line #{i}"))?;
        }
        self.sink.flush().context("flush sink")?;
        match input.take_error() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Write each item as one line of compact JSON; returns how many were written.
#[cfg_attr(docsrs, doc(cfg(feature = "io-jsonl")))]
#[cfg(feature = "io-jsonl")]
pub struct WriteJsonLines<W> {
    sink: W,
}

#[cfg(feature = "io-jsonl")]
impl<W: Write> WriteJsonLines<W> {
    pub fn new(sink: W) -> Self {
        Self { sink }
    }
}

#[cfg(feature = "io-jsonl")]
impl<I, W> Stage<I> for WriteJsonLines<W>
where
    I: DataFlow,
    I::Item: serde::Serialize,
    W: Write,
{
    type Output = Result<usize>;

    fn apply(mut self, mut input: I) -> Self::Output {
        let mut written = 0;
        for item in input.by_ref() {
            serde_json::to_writer(&mut self.sink, &item)
                .with_context(|| format!("serialize item #{written}"))?;
            self.sink.write_all(b"\n")?;
            written += 1;
        }
        self.sink.flush().context("flush sink")?;
        match input.take_error() {
            Some(err) => Err(err),
            None => Ok(written),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Pipe, from_vec};

    #[test]
    fn out_writes_one_line_per_item() {
        let mut buf = Vec::new();
        from_vec(vec![1.5, 2.0]).pipe(Out::new(&mut buf)).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "1.5\n2\n");
    }

    #[test]
    fn write_to_returns_exhausted_upstream() {
        let mut buf = Vec::new();
        let mut rest = from_vec(vec!['x', 'y']).pipe(WriteTo::new(&mut buf, ",")).unwrap();
        assert_eq!(rest.next(), None);
        assert_eq!(buf, b"x,y,");
    }

    #[test]
    fn write_to_stdout_keeps_delimiter() {
        let sink = WriteTo::stdout(" ");
        assert_eq!(sink.delimiter, " ");
        let mut rest = from_vec(Vec::<u8>::new()).pipe(sink).unwrap();
        assert_eq!(rest.next(), None);
    }

    #[test]
    fn fail_fast_reports_first_bad_item() {
        let err = from_vec(vec![Ok(1), Err("boom"), Err("later")])
            .pipe(FailFast)
            .unwrap_err();
        assert_eq!(err.to_string(), "element failed: boom");

        let ok = from_vec(vec![Ok::<_, String>(1), Ok(2)]).pipe(FailFast).unwrap();
        assert_eq!(ok, vec![1, 2]);
    }

    #[test]
    fn sink_write_failure_is_surfaced() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::other("sink closed"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }
        let err = from_vec(vec![1]).pipe(Out::new(Broken)).unwrap_err();
        assert!(format!("{err:#}").contains("sink closed"));
    }

    #[cfg(feature = "io-jsonl")]
    #[test]
    fn json_lines_counts_rows() {
        let mut buf = Vec::new();
        let n = from_vec(vec![crate::KeyValue::new("k", 1)])
            .pipe(WriteJsonLines::new(&mut buf))
            .unwrap();
        assert_eq!(n, 1);
        assert_eq!(String::from_utf8(buf).unwrap(), "{\"key\":\"k\",\"value\":1}\n");
    }
}
