//! Open a flow of paths as a flow of readable, rewindable streams.

use super::compression::detect_codec;
use crate::flow::{DataFlow, Fault, Stage};
use crate::stages::Rewind;
use anyhow::{Context, Error, Result};
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read, Seek};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Stage that opens each upstream path as a [`FileStream`], one at a time.
///
/// A file is opened only when the downstream pulls it, and it is closed as soon as the
/// downstream drops it. With [`decompress`](OpenFiles::decompress) on (the default),
/// files recognised by the codec registry are decompressed transparently. A file that
/// cannot be opened ends the flow with a parked failure.
#[derive(Clone, Copy, Debug)]
pub struct OpenFiles {
    decompress: bool,
}

impl OpenFiles {
    pub fn new() -> Self {
        Self { decompress: true }
    }

    /// Toggle transparent decompression of `.gz`/`.zst` (or magic-byte detected) files.
    #[must_use]
    pub fn decompress(mut self, on: bool) -> Self {
        self.decompress = on;
        self
    }
}

impl Default for OpenFiles {
    fn default() -> Self {
        Self::new()
    }
}

impl<I> Stage<I> for OpenFiles
where
    I: DataFlow,
    I::Item: AsRef<Path>,
{
    type Output = Opened<I>;

    fn apply(self, input: I) -> Self::Output {
        Opened {
            upstream: input,
            decompress: self.decompress,
            fault: Fault::default(),
        }
    }
}

/// Flow produced by [`OpenFiles`].
pub struct Opened<I> {
    upstream: I,
    decompress: bool,
    fault: Fault,
}

impl<I> Iterator for Opened<I>
where
    I: DataFlow,
    I::Item: AsRef<Path>,
{
    type Item = FileStream;

    fn next(&mut self) -> Option<FileStream> {
        if self.fault.is_set() {
            return None;
        }
        let path = self.upstream.next()?;
        match FileStream::open(path.as_ref(), self.decompress) {
            Ok(stream) => Some(stream),
            Err(err) => {
                self.fault.park(err);
                None
            }
        }
    }
}

impl<I> DataFlow for Opened<I>
where
    I: DataFlow,
    I::Item: AsRef<Path>,
{
    fn take_error(&mut self) -> Option<Error> {
        self.fault.take().or_else(|| self.upstream.take_error())
    }
}

enum Source {
    Plain(BufReader<File>),
    Decoded { codec: String, reader: Box<dyn Read> },
}

/// An open file, readable from the start and rewindable.
///
/// Plain files rewind by seeking; decompressed files rewind by reopening.
pub struct FileStream {
    path: PathBuf,
    decompress: bool,
    source: Source,
}

impl FileStream {
    /// Open `path`, decompressing it if `decompress` is set and a codec matches.
    pub fn open(path: impl AsRef<Path>, decompress: bool) -> Result<Self> {
        let path = path.as_ref();
        let source =
            open_source(path, decompress).with_context(|| format!("open {}", path.display()))?;
        match &source {
            Source::Plain(_) => debug!(path = %path.display(), "open_files: opened"),
            Source::Decoded { codec, .. } => {
                debug!(path = %path.display(), codec = %codec, "open_files: opened compressed");
            }
        }
        Ok(Self {
            path: path.to_path_buf(),
            decompress,
            source,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn open_source(path: &Path, decompress: bool) -> io::Result<Source> {
    let mut buffered = BufReader::new(File::open(path)?);
    let codec = if decompress {
        detect_codec(path, &mut buffered)
    } else {
        None
    };
    Ok(match codec {
        None => Source::Plain(buffered),
        Some(codec) => Source::Decoded {
            codec: codec.name().to_string(),
            reader: codec.wrap_reader_dyn(Box::new(buffered))?,
        },
    })
}

impl Read for FileStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.source {
            Source::Plain(reader) => reader.read(buf),
            Source::Decoded { reader, .. } => reader.read(buf),
        }
    }
}

impl Rewind for FileStream {
    fn rewind(&mut self) -> io::Result<()> {
        if let Source::Plain(reader) = &mut self.source {
            return Seek::rewind(reader);
        }
        self.source = open_source(&self.path, self.decompress)?;
        Ok(())
    }
}

impl fmt::Debug for FileStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let codec = match &self.source {
            Source::Plain(_) => None,
            Source::Decoded { codec, .. } => Some(codec.as_str()),
        };
        f.debug_struct("FileStream")
            .field("path", &self.path)
            .field("codec", &codec)
            .finish()
    }
}
