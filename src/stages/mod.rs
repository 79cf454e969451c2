//! Intermediate stages.
//!
//! Lazy stages return a flow that pulls from its upstream only when pulled itself:
//! [`Filter`], [`Transform`], [`DropNone`], [`Inspect`], [`Split`] and the two views of
//! [`SplitResults`]. Grouping and joining stages ([`AggregateByKey`],
//! [`CombineValues`], [`JoinOnKey`], [`JoinBy`]) drain their upstream first and yield a
//! [`Materialized`](crate::Materialized) flow.

mod aggregate;
mod join;
mod split;
mod split_results;
mod stateless;

pub use aggregate::{AggregateByKey, CombineValues};
pub use join::{JoinBy, JoinOnKey, JoinResult, KeyValue};
pub use split::{Rewind, Split, Tokens, split_text};
pub use split_results::{Errors, SplitResults, Successes};
pub use stateless::{DropNone, Filter, Filtered, Inspect, Inspected, Present, Transform, Transformed};
