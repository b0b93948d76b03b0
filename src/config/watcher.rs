//! Hot reload of the configuration file.
//!
//! The parent directory is watched rather than the file itself, so editors
//! that save by renaming a temporary file over the original still trigger a
//! reload. Each accepted event re-resolves the whole [`ConfigSource`],
//! including command-line overrides.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::ConfigSource;
use crate::config::schema::ServiceConfig;

/// Pushes a freshly resolved [`ServiceConfig`] whenever the file changes.
pub struct ConfigWatcher {
    source: ConfigSource,
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<ServiceConfig>,
}

impl ConfigWatcher {
    /// `None` when the source has no file to watch.
    pub fn new(source: ConfigSource) -> Option<(Self, mpsc::UnboundedReceiver<ServiceConfig>)> {
        let path = source.path()?.to_path_buf();
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        Some((
            Self {
                source,
                path,
                update_tx,
            },
            update_rx,
        ))
    }

    /// Start watching on notify's background thread.
    ///
    /// The returned watcher must be kept alive for updates to keep flowing.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let directory = watched_directory(&self.path);
        let file_name = self.path.file_name().map(|name| name.to_os_string());
        let Self { source, update_tx, .. } = self;

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if concerns_file(&event, file_name.as_deref()) {
                        reload(&source, &update_tx);
                    }
                }
                Err(e) => tracing::error!(error = %e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&directory, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

fn watched_directory(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Content changes (write, create, rename onto) of the watched file.
fn concerns_file(event: &Event, file_name: Option<&OsStr>) -> bool {
    if !(event.kind.is_modify() || event.kind.is_create()) {
        return false;
    }
    event.paths.iter().any(|p| p.file_name() == file_name)
}

/// Resolve the source again; an invalid file keeps the running config.
fn reload(source: &ConfigSource, update_tx: &mpsc::UnboundedSender<ServiceConfig>) -> bool {
    match source.resolve() {
        Ok(config) => {
            tracing::info!(origin = %config.origin.base_url, "Config file changed, reloading");
            update_tx.send(config).is_ok()
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to reload config, keeping current configuration");
            false
        }
    }
}
