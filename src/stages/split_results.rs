//! Route a flow of `Result<T, E>` into two independent flows.
//!
//! [`SplitResults`] returns `(errors, successes)`. Both views share one upstream
//! behind a router: whichever view pulls next reads the upstream, keeps the item if it
//! belongs to it and queues the item for the other view otherwise. The upstream is
//! read exactly once and only as far as a view needs, so it does not have to be
//! restartable. Items a view has not consumed yet stay buffered until it does.
//! Dropping a view frees its queue, and items routed to it afterwards are discarded.
//!
//! ```
//! use pipeflow::*;
//! use std::io::Cursor;
//!
//! fn parse(token: String) -> Result<u32, String> {
//!     match token.parse::<i64>() {
//!         Ok(n) if n < 0 => Err("Negative number".to_string()),
//!         Ok(n) => Ok(n as u32),
//!         Err(_) => Err("Invalid integer".to_string()),
//!     }
//! }
//!
//! # fn main() -> anyhow::Result<()> {
//! let (errors, numbers) = from_vec(vec![Cursor::new("42|-5|100|abc|7")])
//!     .pipe(Split::new("|"))
//!     .pipe(Transform::new(parse))
//!     .pipe(SplitResults);
//!
//! let mut log = Vec::new();
//! errors.pipe(WriteTo::new(&mut log, "."))?;
//! assert_eq!(String::from_utf8(log)?, "Negative number.Invalid integer.");
//! assert_eq!(numbers.pipe(AsVector)?, vec![42, 100, 7]);
//! # Ok(())
//! # }
//! ```

use crate::flow::{DataFlow, Stage};
use anyhow::{Error, anyhow};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use tracing::trace;

/// Partition stage for fallible items. See the [module documentation](self).
#[derive(Clone, Copy, Debug, Default)]
pub struct SplitResults;

impl<I, T, E> Stage<I> for SplitResults
where
    I: DataFlow<Item = Result<T, E>>,
{
    type Output = (Errors<I, T, E>, Successes<I, T, E>);

    fn apply(self, input: I) -> Self::Output {
        let router = Rc::new(RefCell::new(Router {
            upstream: input,
            oks: VecDeque::new(),
            errs: VecDeque::new(),
            exhausted: false,
            oks_open: true,
            errs_open: true,
            fault: None,
            rendered_fault: None,
        }));
        (
            Errors {
                router: Rc::clone(&router),
                reported: false,
            },
            Successes {
                router,
                reported: false,
            },
        )
    }
}

struct Router<I, T, E> {
    upstream: I,
    oks: VecDeque<T>,
    errs: VecDeque<E>,
    exhausted: bool,
    /// A dropped view's items are discarded instead of queued.
    oks_open: bool,
    errs_open: bool,
    fault: Option<Error>,
    rendered_fault: Option<String>,
}

impl<I, T, E> Router<I, T, E>
where
    I: DataFlow<Item = Result<T, E>>,
{
    fn pull(&mut self) -> Option<Result<T, E>> {
        if self.exhausted {
            return None;
        }
        let item = self.upstream.next();
        if item.is_none() {
            self.exhausted = true;
            self.fault = self.upstream.take_error();
            trace!(
                buffered_ok = self.oks.len(),
                buffered_err = self.errs.len(),
                "split_results: upstream exhausted"
            );
        }
        item
    }

    fn next_ok(&mut self) -> Option<T> {
        if let Some(v) = self.oks.pop_front() {
            return Some(v);
        }
        loop {
            match self.pull()? {
                Ok(v) => return Some(v),
                Err(e) if self.errs_open => self.errs.push_back(e),
                Err(_) => {}
            }
        }
    }

    fn next_err(&mut self) -> Option<E> {
        if let Some(e) = self.errs.pop_front() {
            return Some(e);
        }
        loop {
            match self.pull()? {
                Ok(v) if self.oks_open => self.oks.push_back(v),
                Ok(_) => {}
                Err(e) => return Some(e),
            }
        }
    }

    /// The first view to ask gets the original failure; the other gets its rendering.
    fn take_fault(&mut self) -> Option<Error> {
        if let Some(err) = self.fault.take() {
            self.rendered_fault = Some(format!("{err:#}"));
            return Some(err);
        }
        self.rendered_fault.as_ref().map(|msg| anyhow!("{msg}"))
    }
}

/// The error view produced by [`SplitResults`].
pub struct Errors<I, T, E> {
    router: Rc<RefCell<Router<I, T, E>>>,
    reported: bool,
}

impl<I, T, E> Iterator for Errors<I, T, E>
where
    I: DataFlow<Item = Result<T, E>>,
{
    type Item = E;

    fn next(&mut self) -> Option<E> {
        self.router.borrow_mut().next_err()
    }
}

impl<I, T, E> DataFlow for Errors<I, T, E>
where
    I: DataFlow<Item = Result<T, E>>,
{
    fn take_error(&mut self) -> Option<Error> {
        if self.reported {
            return None;
        }
        let err = self.router.borrow_mut().take_fault();
        self.reported = err.is_some();
        err
    }
}

impl<I, T, E> Drop for Errors<I, T, E> {
    fn drop(&mut self) {
        let mut router = self.router.borrow_mut();
        router.errs_open = false;
        router.errs.clear();
    }
}

/// The success view produced by [`SplitResults`].
pub struct Successes<I, T, E> {
    router: Rc<RefCell<Router<I, T, E>>>,
    reported: bool,
}

impl<I, T, E> Iterator for Successes<I, T, E>
where
    I: DataFlow<Item = Result<T, E>>,
{
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.router.borrow_mut().next_ok()
    }
}

impl<I, T, E> DataFlow for Successes<I, T, E>
where
    I: DataFlow<Item = Result<T, E>>,
{
    fn take_error(&mut self) -> Option<Error> {
        if self.reported {
            return None;
        }
        let err = self.router.borrow_mut().take_fault();
        self.reported = err.is_some();
        err
    }
}

impl<I, T, E> Drop for Successes<I, T, E> {
    fn drop(&mut self) {
        let mut router = self.router.borrow_mut();
        router.oks_open = false;
        router.oks.clear();
    }
}
