//! Reusable per-key combiners for [`CombineValues`](crate::CombineValues).
//!
//! A [`CombineFn`] describes how to build an accumulator for one key, fold values
//! into it, and turn it into the output:
//!
//! - [`Count`] -- number of values.
//! - [`Sum<T>`] -- sum of values.
//! - [`Min<T>`] / [`Max<T>`] -- smallest / largest value.
//! - [`ToList<T>`] -- all values, in arrival order.
//! - [`DistinctCount<T>`] -- number of distinct values.
//!
//! # Examples
//! ```
//! use pipeflow::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! let highest = from_vec(vec![("a", 3u64), ("a", 7), ("b", 1)])
//!     .pipe(CombineValues::new(Max::<u64>::new()))
//!     .pipe(AsVector)?;
//! assert_eq!(highest, vec![("a", 7), ("b", 1)]);
//! # Ok(())
//! # }
//! ```

mod basic;
mod collect;

pub use basic::{Count, Max, Min, Sum};
pub use collect::{DistinctCount, ToList};

/// Per-key aggregation over values of type `V`: `create` a fresh accumulator,
/// `add_input` each value, `finish` into the output.
pub trait CombineFn<V> {
    type Acc;
    type Out;

    fn create(&self) -> Self::Acc;
    fn add_input(&self, acc: &mut Self::Acc, v: V);
    fn finish(&self, acc: Self::Acc) -> Self::Out;
}
