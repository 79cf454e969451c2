//! Directory source.

use crate::flow::{DataFlow, Fault};
use anyhow::{Context, Error};
use std::fs::{self, DirEntry, ReadDir};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Traversal strategy, fixed when the [`Dir`] is built.
enum Walk {
    Flat(Option<ReadDir>),
    /// One open handle per directory level, innermost last.
    Recursive(Vec<ReadDir>),
}

impl Walk {
    fn push(&mut self, entries: ReadDir) {
        match self {
            Walk::Flat(slot) => *slot = Some(entries),
            Walk::Recursive(stack) => stack.push(entries),
        }
    }

    fn next_entry(&mut self) -> Option<io::Result<DirEntry>> {
        match self {
            Walk::Flat(entries) => entries.as_mut()?.next(),
            Walk::Recursive(stack) => loop {
                let top = stack.last_mut()?;
                match top.next() {
                    Some(entry) => return Some(entry),
                    None => {
                        stack.pop();
                    }
                }
            },
        }
    }

    fn descends(&self) -> bool {
        matches!(self, Walk::Recursive(_))
    }
}

/// A [`DataFlow`] of the entries below a root directory.
///
/// With `recursive` set, each subdirectory is yielded and then walked before its
/// siblings (pre-order). Symbolic links to directories are yielded but not followed.
/// Order within a directory is whatever the filesystem reports.
///
/// The root is opened on the first pull. A directory that cannot be read ends the
/// flow with a parked failure naming it.
///
/// ```no_run
/// use pipeflow::*;
///
/// # fn main() -> anyhow::Result<()> {
/// let sources = Dir::new("src", true)
///     .files_only()
///     .pipe(Filter::new(|p: &std::path::PathBuf| p.extension().is_some_and(|e| e == "rs")))
///     .pipe(AsVector)?;
/// # Ok(())
/// # }
/// ```
pub struct Dir {
    root: PathBuf,
    walk: Walk,
    opened: bool,
    files_only: bool,
    fault: Fault,
}

impl Dir {
    pub fn new(root: impl AsRef<Path>, recursive: bool) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            walk: if recursive {
                Walk::Recursive(Vec::new())
            } else {
                Walk::Flat(None)
            },
            opened: false,
            files_only: false,
            fault: Fault::default(),
        }
    }

    /// Skip directory entries; subdirectories are still walked when recursive.
    #[must_use]
    pub fn files_only(mut self) -> Self {
        self.files_only = true;
        self
    }

    fn open(&mut self, dir: &Path) -> bool {
        match fs::read_dir(dir).with_context(|| format!("read directory {}", dir.display())) {
            Ok(entries) => {
                trace!(dir = %dir.display(), "dir: descending");
                self.walk.push(entries);
                true
            }
            Err(err) => {
                self.fault.park(err);
                false
            }
        }
    }
}

impl Iterator for Dir {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        if self.fault.is_set() {
            return None;
        }
        if !self.opened {
            self.opened = true;
            debug!(root = %self.root.display(), recursive = self.walk.descends(), "dir: walking");
            let root = self.root.clone();
            if !self.open(&root) {
                return None;
            }
        }
        loop {
            let entry = match self.walk.next_entry()? {
                Ok(entry) => entry,
                Err(err) => {
                    let err = Error::new(err)
                        .context(format!("read entry below {}", self.root.display()));
                    self.fault.park(err);
                    return None;
                }
            };
            let path = entry.path();
            let is_dir = match entry.file_type() {
                Ok(kind) => kind.is_dir(),
                Err(err) => {
                    let err = Error::new(err).context(format!("stat {}", path.display()));
                    self.fault.park(err);
                    return None;
                }
            };
            if is_dir && self.walk.descends() && !self.open(&path) {
                return None;
            }
            if is_dir && self.files_only {
                continue;
            }
            return Some(path);
        }
    }
}

impl DataFlow for Dir {
    fn take_error(&mut self) -> Option<Error> {
        self.fault.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{TempDirPath, write_tree};

    fn names(paths: Vec<PathBuf>, root: &Path) -> Vec<String> {
        let mut out: Vec<String> = paths
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        out.sort();
        out
    }

    #[test]
    fn flat_walk_stays_at_top_level() {
        let tmp = TempDirPath::default();
        write_tree(tmp.path(), &[("a.txt", "a"), ("sub/b.txt", "b")]).unwrap();
        let got: Vec<PathBuf> = Dir::new(tmp.path(), false).collect();
        assert_eq!(names(got, tmp.path()), vec!["a.txt", "sub"]);
    }

    #[test]
    fn recursive_walk_visits_parent_before_children() {
        let tmp = TempDirPath::default();
        write_tree(tmp.path(), &[("a.txt", "a"), ("sub/b.txt", "b"), ("sub/deep/c.txt", "c")])
            .unwrap();
        let got: Vec<PathBuf> = Dir::new(tmp.path(), true).collect();
        let pos = |name: &str| got.iter().position(|p| p.ends_with(name)).unwrap();
        assert!(pos("sub") < pos("sub/b.txt"));
        assert!(pos("sub/deep") < pos("sub/deep/c.txt"));

        let files: Vec<PathBuf> = Dir::new(tmp.path(), true).files_only().collect();
        assert_eq!(
            names(files, tmp.path()),
            vec!["a.txt", "sub/b.txt", "sub/deep/c.txt"]
        );
    }

    #[test]
    fn missing_root_is_parked() {
        let tmp = TempDirPath::default();
        let mut flow = Dir::new(tmp.path().join("absent"), true);
        assert_eq!(flow.next(), None);
        let err = flow.take_error().unwrap();
        assert!(err.to_string().contains("absent"));
        assert_eq!(flow.next(), None);
    }
}
