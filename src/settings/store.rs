use super::JogSettings;
use color_eyre::{eyre::eyre, Result};
use std::path::{Path, PathBuf};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const CONFIG_DIR: &str = ".config/jogwheel";
const SETTINGS_FILE: &str = "settings.toml";

/// TOML-backed persistence for [`JogSettings`]
///
/// Loading never fails: a missing file yields defaults, an unreadable or
/// corrupt one yields defaults plus a warning. Saving reports errors to the
/// caller.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store located at `~/.config/jogwheel/settings.toml`
    pub fn in_home_dir() -> Self {
        let mut path = get_home_dir();
        path.push(CONFIG_DIR);
        path.push(SETTINGS_FILE);
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> JogSettings {
        match tokio::fs::try_exists(&self.path).await {
            Ok(true) => {}
            Ok(false) => {
                info!("No settings at {:?}, using defaults", self.path);
                return JogSettings::default();
            }
            Err(e) => {
                warn!("Could not check settings file {:?}: {}", self.path, e);
                return JogSettings::default();
            }
        }

        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read settings file {:?}: {}", self.path, e);
                return JogSettings::default();
            }
        };

        match toml::from_str::<JogSettings>(&content) {
            Ok(settings) => {
                debug!("Loaded settings from {:?}", self.path);
                settings.sanitized()
            }
            Err(e) => {
                warn!("Failed to parse settings file {:?}: {}", self.path, e);
                JogSettings::default()
            }
        }
    }

    pub async fn save(&self, settings: &JogSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !tokio::fs::try_exists(parent)
                .await
                .map_err(|e| eyre!("Failed to check if settings directory exists: {}", e))?
            {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| eyre!("Failed to create settings directory: {}", e))?;
            }
        }

        let content = toml::to_string_pretty(settings)
            .map_err(|e| eyre!("Failed to serialize settings: {}", e))?;

        tokio::fs::write(&self.path, content)
            .await
            .map_err(|e| eyre!("Failed to write settings file: {}", e))?;

        debug!("Saved settings to {:?}", self.path);
        Ok(())
    }

    /// Saves every value published on `settings` until `shutdown` fires
    ///
    /// The value pending at shutdown is flushed once more before the task
    /// exits.
    pub fn spawn_autosave(
        self,
        mut settings: watch::Receiver<JogSettings>,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!("Settings autosave started for {:?}", self.path);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    changed = settings.changed() => {
                        if changed.is_err() {
                            debug!("Settings channel closed, stopping autosave");
                            break;
                        }
                        let snapshot = settings.borrow_and_update().clone();
                        if let Err(e) = self.save(&snapshot).await {
                            error!("Autosave failed: {}", e);
                        }
                    }
                }
            }

            if settings.has_changed().unwrap_or(false) {
                let snapshot = settings.borrow_and_update().clone();
                if let Err(e) = self.save(&snapshot).await {
                    error!("Final settings save failed: {}", e);
                }
            }
            info!("Settings autosave stopped");
        })
    }
}

fn get_home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| {
        warn!("Home directory not found, storing settings in working directory");
        PathBuf::from(".")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::JogEncoding;

    #[tokio::test]
    async fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("nope.toml"));
        assert_eq!(store.load().await, JogSettings::default());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("nested/dir/settings.toml"));
        let settings = JogSettings {
            rotation_speed: 2.5,
            arc_color: [1, 2, 3, 4],
            inertia_decay_rate: 0.9,
            jog_encoding: JogEncoding::TwosComplement,
            ..JogSettings::default()
        };

        store.save(&settings).await.unwrap();
        assert_eq!(store.load().await, settings);
    }

    #[tokio::test]
    async fn test_load_corrupt_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        tokio::fs::write(&path, "rotation_speed = [[[").await.unwrap();

        let store = SettingsStore::new(path);
        assert_eq!(store.load().await, JogSettings::default());
    }

    #[tokio::test]
    async fn test_load_partial_file_fills_and_clamps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        tokio::fs::write(&path, "inertia_decay_rate = 1.5\nmarker_width = 7.0\n")
            .await
            .unwrap();

        let settings = SettingsStore::new(path).load().await;
        assert_eq!(settings.inertia_decay_rate, 0.99);
        assert_eq!(settings.marker_width, 7.0);
        assert_eq!(settings.arc_radius, JogSettings::default().arc_radius);
    }

    #[tokio::test]
    async fn test_autosave_persists_published_changes() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.toml"));
        let (tx, rx) = watch::channel(JogSettings::default());
        let shutdown = CancellationToken::new();
        let handle = store.clone().spawn_autosave(rx, shutdown.clone());

        tx.send_modify(|s| s.rotation_speed = 3.0);
        shutdown.cancel();
        handle.await.unwrap();

        assert_eq!(store.load().await.rotation_speed, 3.0);
    }
}
