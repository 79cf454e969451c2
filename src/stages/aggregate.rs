//! Grouped accumulation: [`AggregateByKey`] and [`CombineValues`].
//!
//! Both stages drain their upstream before yielding anything; an aggregate is not
//! known until the whole input has been seen. Groups come out in the order their keys
//! first appeared upstream, never in hash order.

use crate::combiners::CombineFn;
use crate::flow::{DataFlow, Materialized, Stage};
use std::collections::HashMap;
use std::hash::Hash;
use tracing::debug;

/// Fold `input` into one accumulator per key, preserving first-seen key order.
fn fold_in_first_seen_order<I, K, A>(
    input: &mut I,
    mut key_of: impl FnMut(&I::Item) -> K,
    mut create: impl FnMut() -> A,
    mut fold: impl FnMut(I::Item, &mut A),
) -> anyhow::Result<Vec<(K, A)>>
where
    I: DataFlow,
    K: Eq + Hash + Clone,
{
    let mut slots: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, A)> = Vec::new();
    for item in input.by_ref() {
        let key = key_of(&item);
        let slot = match slots.get(&key) {
            Some(&slot) => slot,
            None => {
                let slot = groups.len();
                slots.insert(key.clone(), slot);
                groups.push((key, create()));
                slot
            }
        };
        fold(item, &mut groups[slot].1);
    }
    if let Some(err) = input.take_error() {
        return Err(err);
    }
    Ok(groups)
}

/// Accumulate every item into a per-key accumulator.
///
/// - `init` seeds the accumulator the first time a key is seen.
/// - `fold(item, &mut acc)` updates it in place.
/// - `key(item)` picks the group.
///
/// Yields `(key, accumulator)` pairs in first-seen key order.
///
/// ```
/// use pipeflow::*;
///
/// # fn main() -> anyhow::Result<()> {
/// let counts = from_vec(vec!["x", "y", "x"])
///     .pipe(AggregateByKey::new(0usize, |_: &&str, n: &mut usize| *n += 1, |w: &&str| w.to_string()))
///     .pipe(AsVector)?;
/// assert_eq!(counts, vec![("x".to_string(), 2), ("y".to_string(), 1)]);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AggregateByKey<A, F, KF> {
    init: A,
    fold: F,
    key: KF,
}

impl<A, F, KF> AggregateByKey<A, F, KF> {
    pub fn new(init: A, fold: F, key: KF) -> Self {
        Self { init, fold, key }
    }
}

impl<I, A, F, KF, K> Stage<I> for AggregateByKey<A, F, KF>
where
    I: DataFlow,
    A: Clone,
    F: FnMut(&I::Item, &mut A),
    KF: FnMut(&I::Item) -> K,
    K: Eq + Hash + Clone,
{
    type Output = Materialized<(K, A)>;

    fn apply(self, mut input: I) -> Self::Output {
        let Self {
            init,
            mut fold,
            key,
        } = self;
        match fold_in_first_seen_order(&mut input, key, || init.clone(), |item, acc| {
            fold(&item, acc)
        }) {
            Ok(groups) => {
                debug!(keys = groups.len(), "aggregate_by_key: grouped upstream");
                Materialized::new(groups)
            }
            Err(err) => Materialized::failed(err),
        }
    }
}

/// Combine the values of a `(K, V)` flow per key with a [`CombineFn`].
///
/// ```
/// use pipeflow::*;
///
/// # fn main() -> anyhow::Result<()> {
/// let totals = from_vec(vec![("b", 1u64), ("a", 2), ("b", 3)])
///     .pipe(CombineValues::new(Sum::<u64>::new()))
///     .pipe(AsVector)?;
/// assert_eq!(totals, vec![("b", 4), ("a", 2)]);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct CombineValues<C> {
    comb: C,
}

impl<C> CombineValues<C> {
    pub fn new(comb: C) -> Self {
        Self { comb }
    }
}

impl<I, K, V, C> Stage<I> for CombineValues<C>
where
    I: DataFlow<Item = (K, V)>,
    K: Eq + Hash + Clone,
    C: CombineFn<V>,
{
    type Output = Materialized<(K, C::Out)>;

    fn apply(self, mut input: I) -> Self::Output {
        let comb = self.comb;
        match fold_in_first_seen_order(
            &mut input,
            |(k, _): &(K, V)| k.clone(),
            || comb.create(),
            |(_, v), acc| comb.add_input(acc, v),
        ) {
            Ok(groups) => {
                debug!(keys = groups.len(), "combine_values: grouped upstream");
                Materialized::new(
                    groups
                        .into_iter()
                        .map(|(k, acc)| (k, comb.finish(acc)))
                        .collect(),
                )
            }
            Err(err) => Materialized::failed(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combiners::{Count, ToList};
    use crate::{AsVector, Pipe, from_vec};

    #[test]
    fn groups_follow_first_appearance_not_key_order() {
        let out = from_vec(vec![5, 3, 5, 1, 3, 5])
            .pipe(AggregateByKey::new(
                Vec::new(),
                |x: &i32, seen: &mut Vec<i32>| seen.push(*x),
                |x: &i32| *x,
            ))
            .pipe(AsVector)
            .unwrap();
        assert_eq!(
            out,
            vec![(5, vec![5, 5, 5]), (3, vec![3, 3]), (1, vec![1])]
        );
    }

    #[test]
    fn empty_upstream_yields_no_groups() {
        let out = from_vec(Vec::<String>::new())
            .pipe(AggregateByKey::new(0u32, |_: &String, n: &mut u32| *n += 1, |s: &String| s.len()))
            .pipe(AsVector)
            .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn combine_values_with_count_and_to_list() {
        let pairs = vec![("k2", 'a'), ("k1", 'b'), ("k2", 'c')];
        let counts = from_vec(pairs.clone())
            .pipe(CombineValues::new(Count))
            .pipe(AsVector)
            .unwrap();
        assert_eq!(counts, vec![("k2", 2), ("k1", 1)]);

        let lists = from_vec(pairs)
            .pipe(CombineValues::new(ToList::new()))
            .pipe(AsVector)
            .unwrap();
        assert_eq!(lists, vec![("k2", vec!['a', 'c']), ("k1", vec!['b'])]);
    }
}
