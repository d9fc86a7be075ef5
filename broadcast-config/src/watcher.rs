use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tracing::warn;

/// Watches the config directory for changes and flips a shared flag that
/// the supervisor's reload tick checks. `ConfigLoader::changed_on_disk` is
/// the source of truth (mtime comparison per tracked file); this watcher
/// only exists to avoid polling the filesystem every tick when nothing
/// changed, matching the "reload on file-mtime change" design note (§9)
/// without re-deriving it from a subprocess.
pub struct ConfigWatcher {
    _inner: RecommendedWatcher,
    dirty: Arc<AtomicBool>,
}

impl ConfigWatcher {
    pub fn watch(config_dir: &Path) -> notify::Result<Self> {
        let dirty = Arc::new(AtomicBool::new(false));
        let flag = dirty.clone();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            match res {
                Ok(_event) => flag.store(true, Ordering::Release),
                Err(err) => warn!(error = %err, "config watcher error"),
            }
        })?;
        watcher.watch(config_dir, RecursiveMode::NonRecursive)?;

        Ok(Self {
            _inner: watcher,
            dirty,
        })
    }

    /// Returns `true` and clears the flag if a change was observed since
    /// the last call.
    pub fn take_dirty(&self) -> bool {
        self.dirty.swap(false, Ordering::AcqRel)
    }
}
