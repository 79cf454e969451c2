//! # Pipeflow
//!
//! Lazy, composable sequence pipelines for Rust. A pipeline is a source, a chain of
//! stages and a sink, bound left to right with [`pipe`](Pipe::pipe):
//!
//! ```no_run
//! use pipeflow::*;
//! use std::path::PathBuf;
//!
//! # fn main() -> anyhow::Result<()> {
//! // Count word occurrences over every `.txt` file below `corpus/`.
//! let counts = Dir::new("corpus", true)
//!     .files_only()
//!     .pipe(Filter::new(|p: &PathBuf| p.extension().is_some_and(|e| e == "txt")))
//!     .pipe(OpenFiles::new())
//!     .pipe(Split::new(" \t\r\n.,;:!?"))
//!     .pipe(AggregateByKey::new(0u64, |_: &String, n: &mut u64| *n += 1, |w: &String| w.to_lowercase()))
//!     .pipe(AsVector)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! ### Data flows
//!
//! A [`DataFlow`] is a single-pass, pull-based, finite [`Iterator`]. Nothing runs until
//! a sink pulls. If an external collaborator fails along the way (a directory cannot be
//! read, a file cannot be opened, a stream is not valid UTF-8), the flow stops and
//! keeps the failure; every sink returns it as an [`anyhow::Error`].
//!
//! ### Stages
//!
//! A [`Stage`] is configured once and applied to one flow.
//!
//! #### Lazy
//! - [`Filter`], [`Transform`], [`DropNone`], [`Inspect`] -- element-wise
//! - [`Split`] -- tokenize a flow of readable streams
//! - [`SplitResults`] -- route `Result` items into an error view and a success view
//! - [`OpenFiles`] -- open a flow of paths
//!
//! #### Eager
//! - [`AggregateByKey`], [`CombineValues`] -- per-key accumulation in first-seen key order
//! - [`JoinOnKey`], [`JoinBy`] -- one-to-many equality joins yielding [`JoinResult`]s
//!
//! ### Sinks
//! - [`AsVector`], [`FailFast`] -- collect
//! - [`WriteTo`], [`Out`], [`WriteJsonLines`] -- write
//!
//! ### Combiners
//!
//! [`CombineValues`] takes any [`CombineFn`]; the [`combiners`] module provides
//! [`Count`], [`Sum`], [`Min`], [`Max`], [`ToList`] and [`DistinctCount`].
//!
//! ## Logging
//!
//! The crate logs through [`tracing`]: flow failures at `warn`, walks, file opens and
//! group sizes at `debug`, per-stream tokenizer progress at `trace`. It never installs
//! a subscriber.
//!
//! ## Feature Flags
//!
//! - `compression-gzip` - decompress `.gz` files in [`OpenFiles`] (default)
//! - `compression-zstd` - decompress `.zst` files in [`OpenFiles`] (default)
//! - `io-jsonl` - the [`WriteJsonLines`] sink (default)
//!
//! ## Module Overview
//!
//! - [`flow`] - the flow and stage contracts, in-memory sources, `pipe`
//! - [`stages`] - every intermediate stage
//! - [`sinks`] - terminal stages
//! - [`combiners`] - reusable per-key aggregations
//! - [`io`] - directory, glob and file sources, decompression
//! - [`testing`] - assertions and fixtures for pipeline tests

pub mod combiners;
pub mod flow;
pub mod io;
pub mod sinks;
pub mod stages;
pub mod testing;

pub use combiners::{CombineFn, Count, DistinctCount, Max, Min, Sum, ToList};
pub use flow::{AsDataFlow, DataFlow, Materialized, Pipe, Stage, from_iter, from_vec, pipe};
pub use io::{Dir, FileStream, Glob, OpenFiles};
pub use sinks::{AsVector, FailFast, Out, WriteTo};
pub use stages::*;

#[cfg(feature = "io-jsonl")]
pub use sinks::WriteJsonLines;
