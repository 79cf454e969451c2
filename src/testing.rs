//! Testing utilities for pipelines.
//!
//! - **Assertions**: compare sink output with expected results, or assert that a flow
//!   ends with a collaborator failure.
//! - **Fixtures**: temporary directory trees and in-memory text streams.
//!
//! ```
//! use pipeflow::*;
//! use pipeflow::testing::*;
//!
//! let words = from_vec(text_streams(&["a b", "c"])).pipe(Split::new(" "));
//! assert_flow_yields(words, &["a".to_string(), "b".into(), "c".into()]);
//! ```

mod assertions;
mod fixtures;

pub use assertions::*;
pub use fixtures::*;
