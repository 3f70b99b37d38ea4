//! Watch mode.
//!
//! Watches every template and everything it includes, regenerating all
//! templates serially whenever one of them changes. Repeated events for
//! the same path inside a short window are dropped, and regeneration waits
//! briefly after a write so editors that save atomically finish replacing
//! the file first.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use poodle_codegen::Options;
use poodle_workspace::Workspace;

use crate::{generate_file, Cli};

const DEDUP_WINDOW: Duration = Duration::from_millis(100);
const SETTLE_DELAY: Duration = Duration::from_millis(50);

struct WatchState {
    watcher: RecommendedWatcher,
    watched_dirs: HashSet<PathBuf>,
    watched_files: HashSet<PathBuf>,
}

impl WatchState {
    /// Track a file and make sure its parent directory is watched.
    fn watch_path(&mut self, path: &Path) -> notify::Result<()> {
        let canonical = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        self.watched_files.insert(canonical);

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let dir = std::fs::canonicalize(&dir).unwrap_or(dir);
        if self.watched_dirs.insert(dir.clone()) {
            self.watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        }
        Ok(())
    }
}

pub(crate) fn watch_files(cli: &Cli, opts: &Options) -> Result<(), Box<dyn std::error::Error>> {
    let (tx, rx) = mpsc::channel();
    let watcher = notify::recommended_watcher(tx)?;

    let mut state = WatchState {
        watcher,
        watched_dirs: HashSet::new(),
        watched_files: HashSet::new(),
    };

    // map the include graph once so edits to included files retrigger too
    for file in &cli.files {
        state.watch_path(file)?;
        let mut ws = Workspace::new(std::env::current_dir()?);
        let _ = ws.load(&file.to_string_lossy());
        for req in ws.requested_files() {
            let _ = state.watch_path(Path::new(req));
        }
    }

    tracing::info!("watching files for changes");

    let mut last_seen: HashMap<PathBuf, Instant> = HashMap::new();
    for result in rx {
        let event = match result {
            Ok(event) => event,
            Err(err) => {
                tracing::error!(error = %err, "watch error");
                continue;
            }
        };
        if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
            continue;
        }

        for path in &event.paths {
            let canonical = std::fs::canonicalize(path).unwrap_or_else(|_| path.clone());
            if !state.watched_files.contains(&canonical) {
                continue;
            }

            let now = Instant::now();
            if last_seen
                .get(&canonical)
                .is_some_and(|seen| now.duration_since(*seen) < DEDUP_WINDOW)
            {
                continue;
            }
            last_seen.insert(canonical, now);

            // let atomic saves finish before reading the file back
            std::thread::sleep(SETTLE_DELAY);

            tracing::info!(file = %path.display(), "file modified, recompiling");
            let start = Instant::now();
            regenerate_all(&mut state, cli, opts);
            tracing::info!(elapsed = ?start.elapsed(), "done");

            // everything was just rebuilt; other paths in this event are moot
            break;
        }
    }

    Ok(())
}

/// Rebuild every template with a fresh workspace, folding any newly
/// discovered includes into the watch set.
fn regenerate_all(state: &mut WatchState, cli: &Cli, opts: &Options) {
    for file in &cli.files {
        let root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let mut ws = Workspace::new(root);
        if let Err(err) = generate_file(&mut ws, file, cli, opts) {
            tracing::error!(file = %file.display(), error = %err, "failed to generate file");
        }
        for req in ws.requested_files() {
            if let Err(err) = state.watch_path(Path::new(req)) {
                tracing::warn!(file = %req, error = %err, "cannot watch file");
            }
        }
    }
}
