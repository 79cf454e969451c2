//! Filesystem source adapters.
//!
//! - [`Dir`] -- entries below a directory, flat or recursive.
//! - [`Glob`] -- files matching a glob pattern.
//! - [`OpenFiles`] -- stage turning paths into readable [`FileStream`]s, with
//!   transparent decompression through the [`compression`] registry.
//!
//! All of them open things lazily, on the pull that needs them, and park any failure
//! in the flow so the sink at the end of the pipeline reports it.

pub mod compression;
mod dir;
mod files;
mod glob;

pub use self::dir::Dir;
pub use self::files::{FileStream, OpenFiles, Opened};
pub use self::glob::Glob;
