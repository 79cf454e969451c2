//! Glob source: file paths matching a pattern, lazily.

use crate::flow::{DataFlow, Fault};
use ::glob::{Paths, glob};
use anyhow::{Context, Error};
use std::path::PathBuf;
use tracing::debug;

/// A [`DataFlow`] of the regular files matching a glob pattern.
///
/// The pattern is compiled on the first pull. An invalid pattern or an unreadable
/// directory ends the flow with a parked failure. Within a directory, matches come
/// out in the order the `glob` crate yields them (alphabetical).
///
/// Supported syntax: `*`, `?`, `**`, `[abc]` and `[!abc]`.
///
/// ```no_run
/// use pipeflow::*;
///
/// # fn main() -> anyhow::Result<()> {
/// let logs = Glob::new("logs/**/*.log").pipe(AsVector)?;
/// # Ok(())
/// # }
/// ```
pub struct Glob {
    pattern: String,
    paths: Option<Paths>,
    fault: Fault,
}

impl Glob {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            paths: None,
            fault: Fault::default(),
        }
    }
}

impl Iterator for Glob {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        if self.fault.is_set() {
            return None;
        }
        if self.paths.is_none() {
            match glob(&self.pattern) {
                Ok(paths) => {
                    debug!(pattern = %self.pattern, "glob: expanding");
                    self.paths = Some(paths);
                }
                Err(err) => {
                    let err = Error::new(err)
                        .context(format!("invalid glob pattern: {}", self.pattern));
                    self.fault.park(err);
                    return None;
                }
            }
        }
        let paths = self.paths.as_mut()?;
        loop {
            let entry = paths.next()?;
            match entry.with_context(|| format!("error reading glob entry for pattern: {}", self.pattern)) {
                Ok(path) if path.is_file() => return Some(path),
                Ok(_) => continue,
                Err(err) => {
                    self.fault.park(err);
                    return None;
                }
            }
        }
    }
}

impl DataFlow for Glob {
    fn take_error(&mut self) -> Option<Error> {
        self.fault.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_pattern_is_parked() {
        let mut flow = Glob::new("[");
        assert_eq!(flow.next(), None);
        let err = flow.take_error().unwrap();
        assert!(err.to_string().contains("invalid glob pattern"));
    }
}
