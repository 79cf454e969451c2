//! Assertions over collected items and whole flows.

use crate::flow::DataFlow;
use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;

/// Assert that two collections are equal in order and content.
///
/// # Panics
///
/// Panics with both collections and the first differing index if they differ.
///
/// ```
/// use pipeflow::testing::assert_collections_equal;
///
/// assert_collections_equal(&[1, 2, 3], &[1, 2, 3]);
/// ```
pub fn assert_collections_equal<T: Debug + PartialEq>(actual: &[T], expected: &[T]) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "Collection length mismatch:\n  Expected length: {}\n  Actual length: {}\n  Expected: {expected:?}\n  Actual: {actual:?}",
        expected.len(),
        actual.len()
    );

    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert_eq!(
            a, e,
            "Collection mismatch at index {i}:\n  Expected: {e:?}\n  Actual: {a:?}\n  Full expected: {expected:?}\n  Full actual: {actual:?}"
        );
    }
}

/// Assert that two collections hold the same elements, ignoring order.
///
/// Useful for directory walks, whose order is up to the filesystem.
///
/// # Panics
///
/// Panics with the missing and extra elements if the collections differ.
pub fn assert_collections_unordered_equal<T: Debug + Eq + Hash>(actual: &[T], expected: &[T]) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "Collection length mismatch:\n  Expected length: {}\n  Actual length: {}\n  Expected: {expected:?}\n  Actual: {actual:?}",
        expected.len(),
        actual.len()
    );

    let actual_set: HashSet<_> = actual.iter().collect();
    let expected_set: HashSet<_> = expected.iter().collect();
    if actual_set != expected_set {
        let missing: Vec<_> = expected_set.difference(&actual_set).collect();
        let extra: Vec<_> = actual_set.difference(&expected_set).collect();
        panic!(
            "Collection content mismatch:\n  Missing elements: {missing:?}\n  Extra elements: {extra:?}\n  Expected: {expected:?}\n  Actual: {actual:?}"
        );
    }
}

/// Drain `flow` and assert it yields exactly `expected`, in order, without failing.
///
/// # Panics
///
/// Panics if the flow parks a failure or yields different items.
pub fn assert_flow_yields<F>(mut flow: F, expected: &[F::Item])
where
    F: DataFlow,
    F::Item: Debug + PartialEq,
{
    let actual: Vec<F::Item> = flow.by_ref().collect();
    if let Some(err) = flow.take_error() {
        panic!("Flow failed after {} items: {err:#}\n  Yielded: {actual:?}", actual.len());
    }
    assert_collections_equal(&actual, expected);
}

/// Drain `flow` and assert it ends with a failure whose rendered chain contains `needle`.
///
/// Returns the items yielded before the failure.
///
/// # Panics
///
/// Panics if the flow completes cleanly or fails with a different message.
pub fn assert_flow_fails_with<F>(mut flow: F, needle: &str) -> Vec<F::Item>
where
    F: DataFlow,
    F::Item: Debug,
{
    let actual: Vec<F::Item> = flow.by_ref().collect();
    match flow.take_error() {
        Some(err) => {
            let rendered = format!("{err:#}");
            assert!(
                rendered.contains(needle),
                "Flow failed with an unexpected error:\n  Expected to contain: {needle:?}\n  Actual: {rendered}"
            );
        }
        None => panic!("Flow completed without failing:\n  Yielded: {actual:?}"),
    }
    actual
}
