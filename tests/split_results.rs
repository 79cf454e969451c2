use pipeflow::*;
use std::io::Cursor;

fn parse_integer(token: String) -> Result<i32, String> {
    match token.parse::<i32>() {
        Ok(n) if n < 0 => Err("Negative number".into()),
        Ok(n) => Ok(n),
        Err(_) => Err("Invalid integer".into()),
    }
}

#[test]
fn valid_and_invalid_integers() -> anyhow::Result<()> {
    let (invalid, valid) = from_vec(vec![Cursor::new("42|-5|100|abc|7")])
        .pipe(Split::new("|"))
        .pipe(Transform::new(parse_integer))
        .pipe(SplitResults);

    let mut log = Vec::new();
    invalid.pipe(WriteTo::new(&mut log, "."))?;
    assert_eq!(String::from_utf8(log)?, "Negative number.Invalid integer.");
    assert_eq!(valid.pipe(AsVector)?, vec![42, 100, 7]);
    Ok(())
}

#[test]
fn success_view_can_be_drained_first() -> anyhow::Result<()> {
    let (invalid, valid) = from_vec(vec![Cursor::new("1|x|2"), Cursor::new("-1|3")])
        .pipe(Split::new("|"))
        .pipe(Transform::new(parse_integer))
        .pipe(SplitResults);

    assert_eq!(valid.pipe(AsVector)?, vec![1, 2, 3]);
    assert_eq!(
        invalid.pipe(AsVector)?,
        vec!["Invalid integer".to_string(), "Negative number".to_string()]
    );
    Ok(())
}

#[derive(Debug, PartialEq)]
struct Department {
    name: String,
}

fn parse_department(s: String) -> Result<Department, String> {
    if s.is_empty() {
        Err("Department name is empty".into())
    } else if s.contains(' ') {
        Err("Department name contains space".into())
    } else {
        Ok(Department { name: s })
    }
}

#[test]
fn empty_fields_reach_the_parser_when_kept() -> anyhow::Result<()> {
    let (bad, good) = from_vec(vec![Cursor::new(
        "good-department|bad department||another-good-department",
    )])
    .pipe(Split::new("|").keep_empty(true))
    .pipe(Transform::new(parse_department))
    .pipe(SplitResults);

    let mut log = Vec::new();
    bad.pipe(WriteTo::new(&mut log, "."))?;
    assert_eq!(
        String::from_utf8(log)?,
        "Department name contains space.Department name is empty."
    );
    assert_eq!(
        good.pipe(AsVector)?,
        vec![
            Department { name: "good-department".into() },
            Department { name: "another-good-department".into() },
        ]
    );
    Ok(())
}

#[test]
fn upstream_failure_reaches_both_views() {
    let (errors, values) = Dir::new("/no/such/root/for/routing", false)
        .pipe(Transform::new(|p: std::path::PathBuf| -> Result<std::path::PathBuf, String> { Ok(p) }))
        .pipe(SplitResults);

    let first = values.pipe(AsVector).unwrap_err();
    let second = errors.pipe(AsVector).unwrap_err();
    assert!(format!("{first:#}").contains("/no/such/root/for/routing"));
    assert_eq!(format!("{first:#}"), format!("{second:#}"));
}

#[test]
fn fail_fast_is_the_strict_alternative() {
    let err = from_vec(vec![Cursor::new("5 six 7")])
        .pipe(Split::new(" "))
        .pipe(Transform::new(|t: String| t.parse::<u8>()))
        .pipe(FailFast)
        .unwrap_err();
    assert!(err.to_string().starts_with("element failed: "));
}
