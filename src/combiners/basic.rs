//! Basic arithmetic combiners: Count, Sum, Min, Max

use super::CombineFn;
use std::cmp::Ord;
use std::marker::PhantomData;
use std::mem::take;
use std::ops::Add;

/* ===================== Count ===================== */

/// Number of values per key.
#[derive(Clone, Copy, Debug, Default)]
pub struct Count;

impl<V> CombineFn<V> for Count {
    type Acc = u64;
    type Out = u64;

    fn create(&self) -> u64 {
        0
    }

    fn add_input(&self, acc: &mut u64, _v: V) {
        *acc += 1;
    }

    fn finish(&self, acc: u64) -> u64 {
        acc
    }
}

/* ===================== Sum<T> ===================== */

/// Sum of values per key.
///
/// - Accumulator: `T`
/// - Output: `T`
///
/// Requires `T: Add<Output=T> + Default`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sum<T>(pub PhantomData<T>);
impl<T> Sum<T> {
    /// Convenience constructor (same as `Default`).
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> CombineFn<T> for Sum<T>
where
    T: Add<Output = T> + Default,
{
    type Acc = T;
    type Out = T;

    fn create(&self) -> T {
        T::default()
    }

    fn add_input(&self, acc: &mut T, v: T) {
        *acc = take(acc) + v;
    }

    fn finish(&self, acc: T) -> T {
        acc
    }
}

/* ===================== Min<T> ===================== */

/// Minimum value per key (requires `Ord`).
///
/// - Accumulator: `Option<T>`
/// - Output: `T`
#[derive(Clone, Copy, Debug, Default)]
pub struct Min<T>(pub PhantomData<T>);
impl<T> Min<T> {
    /// Convenience constructor (same as `Default`).
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T: Ord> CombineFn<T> for Min<T> {
    type Acc = Option<T>;
    type Out = T;

    fn create(&self) -> Option<T> {
        None
    }

    fn add_input(&self, acc: &mut Option<T>, v: T) {
        match acc {
            Some(cur) if v >= *cur => {}
            _ => *acc = Some(v),
        }
    }

    fn finish(&self, acc: Option<T>) -> T {
        // A group only exists once its first value has been added.
        acc.expect("Min::finish called on empty group")
    }
}

/* ===================== Max<T> ===================== */

/// Maximum value per key (requires `Ord`).
///
/// - Accumulator: `Option<T>`
/// - Output: `T`
#[derive(Clone, Copy, Debug, Default)]
pub struct Max<T>(pub PhantomData<T>);
impl<T> Max<T> {
    /// Convenience constructor (same as `Default`).
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T: Ord> CombineFn<T> for Max<T> {
    type Acc = Option<T>;
    type Out = T;

    fn create(&self) -> Option<T> {
        None
    }

    fn add_input(&self, acc: &mut Option<T>, v: T) {
        match acc {
            Some(cur) if v <= *cur => {}
            _ => *acc = Some(v),
        }
    }

    fn finish(&self, acc: Option<T>) -> T {
        acc.expect("Max::finish called on empty group")
    }
}
