//! Equality joins of two flows.
//!
//! Both variants are one-to-many nested-loop joins that keep every left item:
//!
//! - [`JoinOnKey`] joins two flows of [`KeyValue`] on their keys and pairs the values.
//! - [`JoinBy`] joins arbitrary items through a left and a right key function and
//!   pairs the whole items.
//!
//! For each left item, every right item with an equal key yields one
//! [`JoinResult`] with `joined: Some(..)`, in right-hand order. A left item without
//! any match yields exactly one result with `joined: None` (unless the join was made
//! [`inner`](JoinBy::inner)). Left order is preserved.
//!
//! The right-hand flow is drained once into memory when the join is applied, so it is
//! traversed in full for every left item without having to be re-readable. The left
//! flow is drained eagerly as well; the output is a [`Materialized`] flow.
//!
//! ## Chaining
//! A [`JoinResult`] is an ordinary item, so the output of one join can be the left side
//! of the next one by reaching into `.base`:
//!
//! ```
//! use pipeflow::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! let students = vec![(1, "Alice"), (2, "Bob")];
//! let courses = vec![(1, "Math"), (2, "Biology")];
//! let grades = vec![(1, 90), (2, 78)];
//!
//! let rows = from_vec(students)
//!     .pipe(JoinBy::new(from_vec(courses), |s: &(i32, &str)| s.0, |c: &(i32, &str)| c.0))
//!     .pipe(JoinBy::new(
//!         from_vec(grades),
//!         |sc: &JoinResult<(i32, &str), (i32, &str)>| sc.base.0,
//!         |g: &(i32, i32)| g.0,
//!     ))
//!     .pipe(AsVector)?;
//! assert_eq!(rows.len(), 2);
//! assert_eq!(rows[1].joined, Some((2, 78)));
//! # Ok(())
//! # }
//! ```

use crate::flow::{DataFlow, Materialized, Stage, drain};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A pair with a designated key and value; the item shape of [`JoinOnKey`].
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct KeyValue<K, V> {
    pub key: K,
    pub value: V,
}

impl<K, V> KeyValue<K, V> {
    pub fn new(key: K, value: V) -> Self {
        Self { key, value }
    }
}

impl<K, V> From<(K, V)> for KeyValue<K, V> {
    fn from((key, value): (K, V)) -> Self {
        Self { key, value }
    }
}

/// A base item paired with its match from the other side, if there was one.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JoinResult<B, J> {
    pub base: B,
    pub joined: Option<J>,
}

impl<B, J> JoinResult<B, J> {
    pub fn matched(base: B, joined: J) -> Self {
        Self {
            base,
            joined: Some(joined),
        }
    }

    pub fn unmatched(base: B) -> Self {
        Self { base, joined: None }
    }
}

/// Nested-loop join of `left` against the buffered right side.
///
/// `right_keys[i]` is the key of `right[i]`, computed once.
fn nested_loop<L, R, K, B, J>(
    left: impl Iterator<Item = L>,
    right: &[R],
    right_keys: &[K],
    mut left_key: impl FnMut(&L) -> K,
    base: impl Fn(L) -> B,
    joined: impl Fn(&R) -> J,
    inner: bool,
) -> Vec<JoinResult<B, J>>
where
    K: PartialEq,
    B: Clone,
{
    let mut out = Vec::new();
    for item in left {
        let key = left_key(&item);
        let base = base(item);
        let before = out.len();
        for (r, rk) in right.iter().zip(right_keys) {
            if *rk == key {
                out.push(JoinResult::matched(base.clone(), joined(r)));
            }
        }
        if out.len() == before && !inner {
            out.push(JoinResult::unmatched(base));
        }
    }
    out
}

/* ===================== JoinOnKey ===================== */

/// Join two flows of [`KeyValue`] on equal keys, yielding `JoinResult<V, W>`.
///
/// ```
/// use pipeflow::*;
///
/// # fn main() -> anyhow::Result<()> {
/// let left = vec![KeyValue::new(1, "a"), KeyValue::new(2, "b"), KeyValue::new(3, "c")];
/// let right = vec![KeyValue::new(1, "A"), KeyValue::new(2, "B"), KeyValue::new(4, "D")];
///
/// let joined = from_vec(left).pipe(JoinOnKey::new(from_vec(right))).pipe(AsVector)?;
/// assert_eq!(
///     joined,
///     vec![
///         JoinResult::matched("a", "A"),
///         JoinResult::matched("b", "B"),
///         JoinResult::unmatched("c"),
///     ]
/// );
/// # Ok(())
/// # }
/// ```
pub struct JoinOnKey<R> {
    right: R,
    inner: bool,
}

impl<R> JoinOnKey<R> {
    pub fn new(right: R) -> Self {
        Self {
            right,
            inner: false,
        }
    }

    /// Drop left items that have no match instead of pairing them with `None`.
    #[must_use]
    pub fn inner(mut self) -> Self {
        self.inner = true;
        self
    }
}

impl<I, R, K, V, W> Stage<I> for JoinOnKey<R>
where
    I: DataFlow<Item = KeyValue<K, V>>,
    R: DataFlow<Item = KeyValue<K, W>>,
    K: PartialEq + Clone,
    V: Clone,
    W: Clone,
{
    type Output = Materialized<JoinResult<V, W>>;

    fn apply(self, mut input: I) -> Self::Output {
        let Self { mut right, inner } = self;
        let right = match drain(&mut right) {
            Ok(right) => right,
            Err(err) => return Materialized::failed(err),
        };
        let right_keys: Vec<K> = right.iter().map(|kv| kv.key.clone()).collect();
        let rows = nested_loop(
            input.by_ref(),
            &right,
            &right_keys,
            |kv: &KeyValue<K, V>| kv.key.clone(),
            |kv| kv.value,
            |kv: &KeyValue<K, W>| kv.value.clone(),
            inner,
        );
        if let Some(err) = input.take_error() {
            return Materialized::failed(err);
        }
        debug!(right = right.len(), rows = rows.len(), "join_on_key: materialized");
        Materialized::new(rows)
    }
}

/* ===================== JoinBy ===================== */

/// Join arbitrary items through explicit key functions, yielding `JoinResult<L, R>`.
pub struct JoinBy<R, LK, RK> {
    right: R,
    left_key: LK,
    right_key: RK,
    inner: bool,
}

impl<R, LK, RK> JoinBy<R, LK, RK> {
    pub fn new(right: R, left_key: LK, right_key: RK) -> Self {
        Self {
            right,
            left_key,
            right_key,
            inner: false,
        }
    }

    /// Drop left items that have no match instead of pairing them with `None`.
    #[must_use]
    pub fn inner(mut self) -> Self {
        self.inner = true;
        self
    }
}

impl<I, R, LK, RK, K> Stage<I> for JoinBy<R, LK, RK>
where
    I: DataFlow,
    I::Item: Clone,
    R: DataFlow,
    R::Item: Clone,
    LK: FnMut(&I::Item) -> K,
    RK: FnMut(&R::Item) -> K,
    K: PartialEq,
{
    type Output = Materialized<JoinResult<I::Item, R::Item>>;

    fn apply(self, mut input: I) -> Self::Output {
        let Self {
            mut right,
            left_key,
            right_key,
            inner,
        } = self;
        let right = match drain(&mut right) {
            Ok(right) => right,
            Err(err) => return Materialized::failed(err),
        };
        let right_keys: Vec<K> = right.iter().map(right_key).collect();
        let rows = nested_loop(
            input.by_ref(),
            &right,
            &right_keys,
            left_key,
            |item| item,
            |r: &R::Item| r.clone(),
            inner,
        );
        if let Some(err) = input.take_error() {
            return Materialized::failed(err);
        }
        debug!(right = right.len(), rows = rows.len(), "join_by: materialized");
        Materialized::new(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AsVector, Pipe, from_vec};

    #[test]
    fn one_to_many_in_right_order_with_duplicate_left_keys() {
        let left = vec![
            KeyValue::new(0, "a"),
            KeyValue::new(1, "b"),
            KeyValue::new(2, "c"),
            KeyValue::new(1, "e"),
        ];
        let right = vec![
            KeyValue::new(1, "g"),
            KeyValue::new(0, "f"),
            KeyValue::new(1, "h"),
        ];
        let out = from_vec(left)
            .pipe(JoinOnKey::new(from_vec(right)))
            .pipe(AsVector)
            .unwrap();
        assert_eq!(
            out,
            vec![
                JoinResult::matched("a", "f"),
                JoinResult::matched("b", "g"),
                JoinResult::matched("b", "h"),
                JoinResult::unmatched("c"),
                JoinResult::matched("e", "g"),
                JoinResult::matched("e", "h"),
            ]
        );
    }

    #[test]
    fn inner_join_drops_unmatched() {
        let out = from_vec(vec![(1, 'x'), (5, 'y')])
            .pipe(JoinBy::new(from_vec(vec![1, 1]), |l: &(i32, char)| l.0, |r: &i32| *r).inner())
            .pipe(AsVector)
            .unwrap();
        assert_eq!(
            out,
            vec![JoinResult::matched((1, 'x'), 1), JoinResult::matched((1, 'x'), 1)]
        );
    }

    #[test]
    fn empty_right_side_leaves_every_left_item_unmatched() {
        let out = from_vec(vec!["p", "q"])
            .pipe(JoinBy::new(from_vec(Vec::<&str>::new()), |l: &&str| l.len(), |r: &&str| r.len()))
            .pipe(AsVector)
            .unwrap();
        assert_eq!(out, vec![JoinResult::unmatched("p"), JoinResult::unmatched("q")]);
    }
}
