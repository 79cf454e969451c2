//! Element-wise stages: [`Filter`], [`Transform`], [`DropNone`] and [`Inspect`].
//!
//! None of these keep state across items and none can fail on their own. Each one
//! wraps its upstream and advances it only as far as needed to produce the next item.

use crate::flow::{DataFlow, Stage};
use anyhow::Error;
use std::fmt::Debug;
use tracing::debug;

/* ===================== Filter ===================== */

/// Keep only the items for which `pred` returns `true`.
#[derive(Clone)]
pub struct Filter<P> {
    pred: P,
}

impl<P> Filter<P> {
    pub fn new(pred: P) -> Self {
        Self { pred }
    }
}

impl<I, P> Stage<I> for Filter<P>
where
    I: DataFlow,
    P: FnMut(&I::Item) -> bool,
{
    type Output = Filtered<I, P>;

    fn apply(self, input: I) -> Self::Output {
        Filtered {
            upstream: input,
            pred: self.pred,
        }
    }
}

/// Flow produced by [`Filter`].
pub struct Filtered<I, P> {
    upstream: I,
    pred: P,
}

impl<I, P> Iterator for Filtered<I, P>
where
    I: DataFlow,
    P: FnMut(&I::Item) -> bool,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        for item in self.upstream.by_ref() {
            if (self.pred)(&item) {
                return Some(item);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.upstream.size_hint().1)
    }
}

impl<I, P> DataFlow for Filtered<I, P>
where
    I: DataFlow,
    P: FnMut(&I::Item) -> bool,
{
    fn take_error(&mut self) -> Option<Error> {
        self.upstream.take_error()
    }
}

/* ===================== Transform ===================== */

/// Map every item through `f`, one output per input.
#[derive(Clone)]
pub struct Transform<F> {
    f: F,
}

impl<F> Transform<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<I, F, O> Stage<I> for Transform<F>
where
    I: DataFlow,
    F: FnMut(I::Item) -> O,
{
    type Output = Transformed<I, F>;

    fn apply(self, input: I) -> Self::Output {
        Transformed {
            upstream: input,
            f: self.f,
        }
    }
}

/// Flow produced by [`Transform`].
pub struct Transformed<I, F> {
    upstream: I,
    f: F,
}

impl<I, F, O> Iterator for Transformed<I, F>
where
    I: DataFlow,
    F: FnMut(I::Item) -> O,
{
    type Item = O;

    #[inline]
    fn next(&mut self) -> Option<O> {
        self.upstream.next().map(&mut self.f)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.upstream.size_hint()
    }
}

impl<I, F, O> DataFlow for Transformed<I, F>
where
    I: DataFlow,
    F: FnMut(I::Item) -> O,
{
    fn take_error(&mut self) -> Option<Error> {
        self.upstream.take_error()
    }
}

/* ===================== DropNone ===================== */

/// Unwrap a flow of `Option<T>`, silently skipping `None`s.
///
/// Absent values are filtered, not reported; use [`SplitResults`](crate::SplitResults)
/// when the absence carries an error.
#[derive(Clone, Copy, Debug, Default)]
pub struct DropNone;

impl<I, T> Stage<I> for DropNone
where
    I: DataFlow<Item = Option<T>>,
{
    type Output = Present<I>;

    fn apply(self, input: I) -> Self::Output {
        Present { upstream: input }
    }
}

/// Flow produced by [`DropNone`].
pub struct Present<I> {
    upstream: I,
}

impl<I, T> Iterator for Present<I>
where
    I: DataFlow<Item = Option<T>>,
{
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.upstream.by_ref().flatten().next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.upstream.size_hint().1)
    }
}

impl<I, T> DataFlow for Present<I>
where
    I: DataFlow<Item = Option<T>>,
{
    fn take_error(&mut self) -> Option<Error> {
        self.upstream.take_error()
    }
}

/* ===================== Inspect ===================== */

/// Pass items through unchanged, logging each one at `debug` level under `label`.
#[derive(Clone, Debug)]
pub struct Inspect {
    label: String,
}

impl Inspect {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl<I> Stage<I> for Inspect
where
    I: DataFlow,
    I::Item: Debug,
{
    type Output = Inspected<I>;

    fn apply(self, input: I) -> Self::Output {
        Inspected {
            upstream: input,
            label: self.label,
            seen: 0,
        }
    }
}

/// Flow produced by [`Inspect`].
pub struct Inspected<I> {
    upstream: I,
    label: String,
    seen: usize,
}

impl<I> Iterator for Inspected<I>
where
    I: DataFlow,
    I::Item: Debug,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        let item = self.upstream.next()?;
        debug!(stage = %self.label, index = self.seen, item = ?item, "inspect");
        self.seen += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.upstream.size_hint()
    }
}

impl<I> DataFlow for Inspected<I>
where
    I: DataFlow,
    I::Item: Debug,
{
    fn take_error(&mut self) -> Option<Error> {
        self.upstream.take_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AsVector, Pipe, from_vec};
    use tracing_test::traced_test;

    #[test]
    fn filter_advances_only_to_next_match() {
        let mut pulled = 0;
        let mut flow = from_vec(vec![1, 3, 4, 5, 6])
            .pipe(Transform::new(|x: i32| {
                pulled += 1;
                x
            }))
            .pipe(Filter::new(|x: &i32| x % 2 == 0));
        assert_eq!(flow.next(), Some(4));
        drop(flow);
        assert_eq!(pulled, 3);
    }

    #[test]
    fn drop_none_keeps_order() {
        let out = from_vec(vec![None, Some('a'), None, Some('b'), Some('c'), None])
            .pipe(DropNone)
            .pipe(AsVector)
            .unwrap();
        assert_eq!(out, vec!['a', 'b', 'c']);
    }

    #[traced_test]
    #[test]
    fn inspect_logs_every_item() {
        let out = from_vec(vec![7, 8])
            .pipe(Inspect::new("after source"))
            .pipe(AsVector)
            .unwrap();
        assert_eq!(out, vec![7, 8]);
        assert!(logs_contain("after source"));
        assert!(logs_contain("item=8"));
    }
}
