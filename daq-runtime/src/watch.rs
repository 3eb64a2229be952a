// SPDX-License-Identifier: Apache-2.0

//! Watch-input policy: if the request file's modification time
//! or its resolved-symlink target changes during a run, the
//! controller terminates the run cleanly.

use std::path::{Path, PathBuf};

use crossbeam_channel::{unbounded, Receiver};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};

pub struct RequestFileWatch {
    _watcher: RecommendedWatcher,
    events: Receiver<notify::Result<notify::Event>>,
    resolved_target: Option<PathBuf>,
}

impl RequestFileWatch {
    pub fn new(path: &Path) -> notify::Result<Self> {
        let (tx, rx) = unbounded();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })?;
        watcher.watch(path, RecursiveMode::NonRecursive)?;
        Ok(Self {
            _watcher: watcher,
            events: rx,
            resolved_target: std::fs::canonicalize(path).ok(),
        })
    }

    /// Drains queued filesystem events and re-resolves `path`'s
    /// symlink target, returning `true` if either indicates the
    /// request file changed since the last call.
    pub fn poll_changed(&mut self, path: &Path) -> bool {
        let mut changed = false;
        while let Ok(event) = self.events.try_recv() {
            if event.is_ok() {
                changed = true;
            }
        }

        let resolved = std::fs::canonicalize(path).ok();
        if resolved != self.resolved_target {
            self.resolved_target = resolved;
            changed = true;
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn symlink_retarget_is_detected() {
        let dir = tempdir().unwrap();
        let target_a = dir.path().join("a.req");
        let target_b = dir.path().join("b.req");
        fs::write(&target_a, b"a").unwrap();
        fs::write(&target_b, b"b").unwrap();

        let link = dir.path().join("current.req");
        #[cfg(unix)]
        std::os::unix::fs::symlink(&target_a, &link).unwrap();

        let mut watch = RequestFileWatch::new(&link).unwrap();
        assert!(!watch.poll_changed(&link));

        fs::remove_file(&link).unwrap();
        #[cfg(unix)]
        std::os::unix::fs::symlink(&target_b, &link).unwrap();

        assert!(watch.poll_changed(&link));
    }
}
