use pipeflow::testing::*;
use pipeflow::*;
use std::io::Cursor;
use std::path::PathBuf;

fn corpus() -> anyhow::Result<TempDirPath> {
    let tmp = TempDirPath::new()?;
    write_tree(
        tmp.path(),
        &[
            ("1.txt", "Через dfs, через\nАлгоритм"),
            ("nested/2.txt", "алгоритм через dfs."),
            ("nested/deeper/5.txt", "Работает;работает"),
            ("nested/notes.md", "через через через"),
        ],
    )?;
    Ok(tmp)
}

fn is_txt(p: &PathBuf) -> bool {
    p.extension().is_some_and(|e| e == "txt")
}

#[test]
fn word_count_over_a_directory_tree() -> anyhow::Result<()> {
    let tmp = corpus()?;
    let counts = Dir::new(tmp.path(), true)
        .pipe(Filter::new(is_txt))
        .pipe(OpenFiles::new())
        .pipe(Split::new("\n ,.;"))
        .pipe(Transform::new(|t: String| t.to_lowercase()))
        .pipe(AggregateByKey::new(0usize, |_: &String, n: &mut usize| *n += 1, |t: &String| t.clone()))
        .pipe(Transform::new(|(w, n): (String, usize)| format!("{w} - {n}")))
        .pipe(AsVector)?;

    assert_collections_unordered_equal(
        &counts,
        &[
            "через - 3".to_string(),
            "dfs - 2".into(),
            "алгоритм - 2".into(),
            "работает - 2".into(),
        ],
    );
    Ok(())
}

#[test]
fn flat_walk_ignores_subdirectories() -> anyhow::Result<()> {
    let tmp = corpus()?;
    let names = Dir::new(tmp.path(), false)
        .files_only()
        .pipe(Transform::new(|p: PathBuf| p.file_name().map(|n| n.to_string_lossy().into_owned())))
        .pipe(DropNone)
        .pipe(AsVector)?;
    assert_eq!(names, vec!["1.txt"]);
    Ok(())
}

#[test]
fn listing_written_with_delimiter_and_split_back() -> anyhow::Result<()> {
    let tmp = corpus()?;
    let mut listing = Vec::new();
    Dir::new(tmp.path(), true)
        .pipe(Filter::new(is_txt))
        .pipe(Transform::new(|p: PathBuf| p.display().to_string()))
        .pipe(WriteTo::new(&mut listing, "/"))?;

    let names = from_vec(vec![Cursor::new(listing)])
        .pipe(Split::new("/"))
        .pipe(Filter::new(|s: &String| s.ends_with(".txt")))
        .pipe(AsVector)?;
    assert_collections_unordered_equal(&names, &["1.txt".into(), "2.txt".into(), "5.txt".into()]);
    Ok(())
}

#[test]
fn opened_streams_can_be_tokenized_twice() -> anyhow::Result<()> {
    let tmp = corpus()?;
    let mut streams = vec![FileStream::open(tmp.file_path("nested/2.txt"), false)?];
    let first = AsDataFlow::new(&mut streams).pipe(Split::new(" .")).pipe(AsVector)?;
    let second = AsDataFlow::new(&mut streams).pipe(Split::new(" .")).pipe(AsVector)?;
    assert_eq!(first, vec!["алгоритм", "через", "dfs"]);
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn missing_root_aborts_the_pipeline() {
    let tmp = TempDirPath::default();
    let err = Dir::new(tmp.file_path("gone"), true)
        .pipe(OpenFiles::new())
        .pipe(Split::new(" "))
        .pipe(AsVector)
        .unwrap_err();
    assert!(format!("{err:#}").contains("gone"));
}

#[test]
fn unopenable_file_aborts_after_earlier_tokens() -> anyhow::Result<()> {
    let tmp = corpus()?;
    let paths = vec![tmp.file_path("1.txt"), tmp.file_path("nested/absent.txt")];
    let tokens = from_vec(paths).pipe(OpenFiles::new()).pipe(Split::new(" \n"));
    let before = assert_flow_fails_with(tokens, "absent.txt");
    assert_eq!(before.len(), 4);
    Ok(())
}
