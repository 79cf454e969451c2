//! The data flow contract, the stage contract, and the pipe operator.
//!
//! A [`DataFlow`] is a single-pass, pull-based, finite producer of items. It is an
//! [`Iterator`] plus one extra capability: if the flow stopped early because an
//! external collaborator failed (a directory could not be read, a file could not be
//! opened, a stream returned an I/O error), the failure is parked inside the flow and
//! handed out by [`DataFlow::take_error`]. Stages forward that call to their
//! upstream, so a terminal sink always sees the first collaborator failure of the
//! whole chain.
//!
//! A [`Stage`] is an immutable configuration (predicate, mapping, key function,
//! delimiter set, right-hand flow) that turns one flow into its output: another flow,
//! a pair of flows, or a terminal value.
//!
//! [`Pipe::pipe`] binds the two together, left to right:
//!
//! ```
//! use pipeflow::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! let evens = from_vec(vec![1, 2, 3, 4, 5])
//!     .pipe(Filter::new(|x: &i32| x % 2 == 0))
//!     .pipe(Transform::new(|x: i32| x * 10))
//!     .pipe(AsVector)?;
//! assert_eq!(evens, vec![20, 40]);
//! # Ok(())
//! # }
//! ```

use anyhow::Error;
use tracing::warn;

/// A single-pass, pull-based, finite sequence of items.
///
/// Once an item has been yielded it cannot be observed again through the same flow.
pub trait DataFlow: Iterator {
    /// Take the collaborator failure that ended this flow early, if any.
    ///
    /// Returns `Some` at most once per failure. Flows backed purely by memory never
    /// fail and return `None`.
    fn take_error(&mut self) -> Option<Error>;
}

impl<F: DataFlow + ?Sized> DataFlow for &mut F {
    fn take_error(&mut self) -> Option<Error> {
        (**self).take_error()
    }
}

impl<F: DataFlow + ?Sized> DataFlow for Box<F> {
    fn take_error(&mut self) -> Option<Error> {
        (**self).take_error()
    }
}

/// A configured transformation applied to a single input.
///
/// The input is usually a [`DataFlow`]; the output is whatever the stage produces.
pub trait Stage<I> {
    type Output;

    /// Consume the input and produce the stage's result.
    fn apply(self, input: I) -> Self::Output;
}

/// Left-to-right composition: `flow.pipe(stage)` is `stage.apply(flow)`.
pub trait Pipe: Sized {
    /// Hand `self` to `stage` and return its output.
    fn pipe<S>(self, stage: S) -> S::Output
    where
        S: Stage<Self>,
    {
        stage.apply(self)
    }
}

impl<T> Pipe for T {}

/// Free-function form of [`Pipe::pipe`].
pub fn pipe<I, S>(input: I, stage: S) -> S::Output
where
    S: Stage<I>,
{
    stage.apply(input)
}

/* ===================== in-memory sources ===================== */

/// Wrap any in-memory container or iterator as a [`DataFlow`].
///
/// Iterating by reference (`AsDataFlow::new(&mut files)`) lets a stage borrow the
/// caller's items instead of consuming them; this is how a set of in-memory streams
/// can be tokenized more than once.
#[derive(Clone, Debug)]
pub struct AsDataFlow<I> {
    iter: I,
}

impl<I: Iterator> AsDataFlow<I> {
    pub fn new<C>(source: C) -> Self
    where
        C: IntoIterator<IntoIter = I>,
    {
        Self {
            iter: source.into_iter(),
        }
    }
}

impl<I: Iterator> Iterator for AsDataFlow<I> {
    type Item = I::Item;

    #[inline]
    fn next(&mut self) -> Option<I::Item> {
        self.iter.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

impl<I: Iterator> DataFlow for AsDataFlow<I> {
    fn take_error(&mut self) -> Option<Error> {
        None
    }
}

/// Create a [`DataFlow`] that yields the elements of `data` in order.
///
/// ```
/// use pipeflow::*;
///
/// let v = from_vec(vec![10, 20, 30]).pipe(AsVector).unwrap();
/// assert_eq!(v, vec![10, 20, 30]);
/// ```
pub fn from_vec<T>(data: Vec<T>) -> AsDataFlow<std::vec::IntoIter<T>> {
    AsDataFlow::new(data)
}

/// Create a [`DataFlow`] from anything implementing [`IntoIterator`].
pub fn from_iter<C: IntoIterator>(source: C) -> AsDataFlow<C::IntoIter> {
    AsDataFlow::new(source)
}

/* ===================== materialized results ===================== */

/// The output of a stage that had to drain its upstream before yielding anything.
///
/// If the upstream failed while being drained, the flow is empty and carries that
/// failure forward to the next sink.
#[derive(Debug)]
pub struct Materialized<T> {
    items: std::vec::IntoIter<T>,
    fault: Fault,
}

impl<T> Materialized<T> {
    pub(crate) fn new(items: Vec<T>) -> Self {
        Self {
            items: items.into_iter(),
            fault: Fault::default(),
        }
    }

    pub(crate) fn failed(err: Error) -> Self {
        let mut fault = Fault::default();
        fault.park(err);
        Self {
            items: Vec::new().into_iter(),
            fault,
        }
    }

    /// Items not yet yielded.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.items.len()
    }
}

impl<T> Iterator for Materialized<T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        self.items.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.items.size_hint()
    }
}

impl<T> ExactSizeIterator for Materialized<T> {}

impl<T> DataFlow for Materialized<T> {
    fn take_error(&mut self) -> Option<Error> {
        self.fault.take()
    }
}

/// Drain `input` into a vector, returning the upstream failure instead if one was parked.
pub(crate) fn drain<I: DataFlow>(input: &mut I) -> anyhow::Result<Vec<I::Item>> {
    let items: Vec<I::Item> = input.by_ref().collect();
    match input.take_error() {
        Some(err) => Err(err),
        None => Ok(items),
    }
}

/// A parked collaborator failure, handed out once.
#[derive(Debug, Default)]
pub(crate) struct Fault(Option<Error>);

impl Fault {
    pub(crate) fn park(&mut self, err: Error) {
        warn!(error = %format!("{err:#}"), "flow stopped on collaborator failure");
        if self.0.is_none() {
            self.0 = Some(err);
        }
    }

    pub(crate) fn is_set(&self) -> bool {
        self.0.is_some()
    }

    pub(crate) fn take(&mut self) -> Option<Error> {
        self.0.take()
    }
}
