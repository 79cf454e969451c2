use pipeflow::*;

#[test]
fn word_count_in_first_seen_order() -> anyhow::Result<()> {
    let out = from_vec(vec!["x", "y", "x"])
        .pipe(AggregateByKey::new(0usize, |_: &&str, n: &mut usize| *n += 1, |w: &&'static str| *w))
        .pipe(AsVector)?;
    assert_eq!(out, vec![("x", 2), ("y", 1)]);
    Ok(())
}

#[test]
fn order_ignores_key_value_and_hash() -> anyhow::Result<()> {
    let keys: Vec<u64> = vec![900, 3, 900, 42, 3, 7, 1_000_000, 42];
    let out = from_vec(keys)
        .pipe(AggregateByKey::new(0u32, |_: &u64, n: &mut u32| *n += 1, |k: &u64| *k))
        .pipe(Transform::new(|(k, _): (u64, u32)| k))
        .pipe(AsVector)?;
    assert_eq!(out, vec![900, 3, 42, 7, 1_000_000]);
    Ok(())
}

#[test]
fn accumulator_can_be_any_type() -> anyhow::Result<()> {
    #[derive(Clone, Debug, PartialEq)]
    struct Span {
        first: usize,
        last: usize,
    }

    let words = vec!["b", "a", "b", "c", "a", "b"];
    let out = from_vec(words.into_iter().enumerate().collect::<Vec<_>>())
        .pipe(AggregateByKey::new(
            Span { first: usize::MAX, last: 0 },
            |(i, _): &(usize, &str), s: &mut Span| {
                s.first = s.first.min(*i);
                s.last = s.last.max(*i);
            },
            |(_, w): &(usize, &str)| w.to_string(),
        ))
        .pipe(AsVector)?;
    assert_eq!(
        out,
        vec![
            ("b".to_string(), Span { first: 0, last: 5 }),
            ("a".to_string(), Span { first: 1, last: 4 }),
            ("c".to_string(), Span { first: 3, last: 3 }),
        ]
    );
    Ok(())
}

#[test]
fn aggregate_output_feeds_further_stages() -> anyhow::Result<()> {
    let out = from_vec(text_lines())
        .pipe(Split::new(" "))
        .pipe(Transform::new(|t: String| t.to_lowercase()))
        .pipe(AggregateByKey::new(0usize, |_: &String, n: &mut usize| *n += 1, |t: &String| t.clone()))
        .pipe(Transform::new(|(w, n): (String, usize)| format!("{w} - {n}")))
        .pipe(Filter::new(|s: &String| s.ends_with(" - 2")))
        .pipe(AsVector)?;
    assert_eq!(out, vec!["the - 2", "cat - 2"]);
    Ok(())
}

fn text_lines() -> Vec<std::io::Cursor<&'static str>> {
    vec![
        std::io::Cursor::new("The cat sat"),
        std::io::Cursor::new("the CAT ran"),
    ]
}

#[test]
fn combiners_per_key() -> anyhow::Result<()> {
    let sales = vec![("pear", 4u64), ("fig", 10), ("pear", 1), ("fig", 10), ("kiwi", 2)];

    let totals = from_vec(sales.clone())
        .pipe(CombineValues::new(Sum::<u64>::new()))
        .pipe(AsVector)?;
    assert_eq!(totals, vec![("pear", 5), ("fig", 20), ("kiwi", 2)]);

    let lowest = from_vec(sales.clone())
        .pipe(CombineValues::new(Min::<u64>::new()))
        .pipe(AsVector)?;
    assert_eq!(lowest, vec![("pear", 1), ("fig", 10), ("kiwi", 2)]);

    let distinct = from_vec(sales)
        .pipe(CombineValues::new(DistinctCount::<u64>::new()))
        .pipe(AsVector)?;
    assert_eq!(distinct, vec![("pear", 2), ("fig", 1), ("kiwi", 1)]);
    Ok(())
}
