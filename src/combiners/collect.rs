//! Collection combiners: `ToList`, `DistinctCount`

use super::CombineFn;
use std::collections::HashSet;
use std::hash::Hash;
use std::marker::PhantomData;

/// All values per key, in arrival order.
#[derive(Clone, Copy, Debug, Default)]
pub struct ToList<T>(pub PhantomData<T>);
impl<T> ToList<T> {
    /// Convenience constructor (same as `Default`).
    #[must_use]
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> CombineFn<T> for ToList<T> {
    type Acc = Vec<T>;
    type Out = Vec<T>;

    fn create(&self) -> Vec<T> {
        Vec::new()
    }

    fn add_input(&self, acc: &mut Vec<T>, v: T) {
        acc.push(v);
    }

    fn finish(&self, acc: Vec<T>) -> Vec<T> {
        acc
    }
}

/// Count of **distinct** values per key.
///
/// - Accumulator: `HashSet<T>`
/// - Output: `u64`
#[derive(Clone, Copy, Debug, Default)]
pub struct DistinctCount<T>(pub PhantomData<T>);
impl<T> DistinctCount<T> {
    /// Convenience constructor (same as `Default`).
    #[must_use]
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T: Eq + Hash> CombineFn<T> for DistinctCount<T> {
    type Acc = HashSet<T>;
    type Out = u64;

    fn create(&self) -> HashSet<T> {
        HashSet::new()
    }

    fn add_input(&self, acc: &mut HashSet<T>, v: T) {
        acc.insert(v);
    }

    fn finish(&self, acc: HashSet<T>) -> u64 {
        acc.len() as u64
    }
}
