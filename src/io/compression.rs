//! Transparent decompression for file streams.
//!
//! A small registry of [`CompressionCodec`]s, looked up by file extension first and
//! by the magic bytes at the start of the stream second. [`OpenFiles`](crate::OpenFiles)
//! consults it when decompression is enabled, so a tree mixing `notes.txt` and
//! `notes.txt.gz` tokenizes the same way.
//!
//! ## Built-in codecs
//! - **Gzip** (`.gz`) via `flate2` (feature `compression-gzip`)
//! - **Zstd** (`.zst`) via `zstd` (feature `compression-zstd`)
//!
//! ## Custom codecs
//! ```
//! use pipeflow::io::compression::{CompressionCodec, register_codec};
//! use std::io::Read;
//! use std::sync::Arc;
//!
//! struct Identity;
//!
//! impl CompressionCodec for Identity {
//!     fn name(&self) -> &str { "identity" }
//!     fn extensions(&self) -> &[&str] { &[".id"] }
//!     fn magic_bytes(&self) -> Option<&[u8]> { None }
//!     fn wrap_reader_dyn(&self, reader: Box<dyn Read>) -> std::io::Result<Box<dyn Read>> {
//!         Ok(reader)
//!     }
//! }
//!
//! register_codec(Arc::new(Identity));
//! ```

use anyhow::{Context, Result};
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

static CODEC_REGISTRY: RwLock<Option<Vec<Arc<dyn CompressionCodec>>>> = RwLock::new(None);

fn builtin_codecs() -> Vec<Arc<dyn CompressionCodec>> {
    vec![
        #[cfg(feature = "compression-gzip")]
        Arc::new(GzipCodec),
        #[cfg(feature = "compression-zstd")]
        Arc::new(ZstdCodec),
    ]
}

fn registry() -> Vec<Arc<dyn CompressionCodec>> {
    let mut lock = CODEC_REGISTRY.write().unwrap_or_else(PoisonError::into_inner);
    lock.get_or_insert_with(builtin_codecs).clone()
}

/// Add a codec to the global registry, after the built-in ones.
pub fn register_codec(codec: Arc<dyn CompressionCodec>) {
    let mut lock = CODEC_REGISTRY.write().unwrap_or_else(PoisonError::into_inner);
    lock.get_or_insert_with(builtin_codecs).push(codec);
}

/// A decompression algorithm that can be detected from a path or a stream header.
///
/// Codecs live in a process-wide registry, so implementations must be `Send + Sync`.
pub trait CompressionCodec: Send + Sync {
    /// Short name used in logs and error context (e.g. "gzip").
    fn name(&self) -> &str;

    /// Lowercase file extensions including the leading dot (e.g. `&[".gz"]`).
    fn extensions(&self) -> &[&str];

    /// Signature at the start of a compressed stream, if the format has one.
    fn magic_bytes(&self) -> Option<&[u8]>;

    /// Wrap `reader` so that reading from the result yields decompressed bytes.
    fn wrap_reader_dyn(&self, reader: Box<dyn Read>) -> io::Result<Box<dyn Read>>;
}

fn detect_from_extension(path: &Path) -> Option<Arc<dyn CompressionCodec>> {
    let lowered = path.to_string_lossy().to_lowercase();
    registry()
        .into_iter()
        .find(|codec| codec.extensions().iter().any(|ext| lowered.ends_with(ext)))
}

/// Peek at the buffered header without consuming it.
fn detect_from_magic<R: BufRead>(reader: &mut R) -> Option<Arc<dyn CompressionCodec>> {
    let header = reader.fill_buf().ok()?;
    if header.is_empty() {
        return None;
    }
    registry().into_iter().find(|codec| {
        codec
            .magic_bytes()
            .is_some_and(|magic| header.starts_with(magic))
    })
}

/// Find the codec for a stream: extension first, then magic bytes.
pub(crate) fn detect_codec<R: BufRead>(
    path: &Path,
    reader: &mut R,
) -> Option<Arc<dyn CompressionCodec>> {
    detect_from_extension(path).or_else(|| detect_from_magic(reader))
}

/// Wrap `reader` with the codec detected for `path_hint`, or buffer it unchanged.
///
/// ```no_run
/// use pipeflow::io::compression::auto_detect_reader;
/// use std::fs::File;
/// # fn main() -> anyhow::Result<()> {
/// let reader = auto_detect_reader(File::open("words.txt.gz")?, "words.txt.gz")?;
/// # Ok(())
/// # }
/// ```
pub fn auto_detect_reader<R: Read + 'static>(
    reader: R,
    path_hint: impl AsRef<Path>,
) -> Result<Box<dyn Read>> {
    let mut buffered = BufReader::new(reader);
    match detect_codec(path_hint.as_ref(), &mut buffered) {
        Some(codec) => codec
            .wrap_reader_dyn(Box::new(buffered))
            .with_context(|| format!("wrap reader with {} codec", codec.name())),
        None => Ok(Box::new(buffered)),
    }
}

#[cfg(feature = "compression-gzip")]
struct GzipCodec;

#[cfg(feature = "compression-gzip")]
impl CompressionCodec for GzipCodec {
    fn name(&self) -> &str {
        "gzip"
    }

    fn extensions(&self) -> &[&str] {
        &[".gz", ".gzip"]
    }

    fn magic_bytes(&self) -> Option<&[u8]> {
        Some(&[0x1f, 0x8b])
    }

    fn wrap_reader_dyn(&self, reader: Box<dyn Read>) -> io::Result<Box<dyn Read>> {
        Ok(Box::new(flate2::read::GzDecoder::new(reader)))
    }
}

#[cfg(feature = "compression-zstd")]
struct ZstdCodec;

#[cfg(feature = "compression-zstd")]
impl CompressionCodec for ZstdCodec {
    fn name(&self) -> &str {
        "zstd"
    }

    fn extensions(&self) -> &[&str] {
        &[".zst", ".zstd"]
    }

    fn magic_bytes(&self) -> Option<&[u8]> {
        Some(&[0x28, 0xb5, 0x2f, 0xfd])
    }

    fn wrap_reader_dyn(&self, reader: Box<dyn Read>) -> io::Result<Box<dyn Read>> {
        zstd::stream::read::Decoder::new(reader).map(|d| Box::new(d) as Box<dyn Read>)
    }
}
