use std::{
    io::Read,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use spotargos_shared::paths::{config_path, default_cache_dir, expand_path};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{cli::Args, mpris::PlaybackStatus};

const MPRIS_PREFIX: &str = "org.mpris.MediaPlayer2.";

#[derive(Error, Debug)]
pub enum ConfigReadError {
    #[error("Deserialization error, {0}")]
    Deserialization(#[from] serde_path_to_error::Error<ron::Error>),
    #[error("Failed to deserialize ron config file, {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("IO error, {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ConfigFile {
    /// Last component of the MPRIS bus name, `spotify` for `org.mpris.MediaPlayer2.spotify`
    pub player: String,
    pub player_name: String,
    pub launch_command: String,
    pub cache_dir: PathBuf,
    pub art_fallback_url: String,
    pub art_fallback_segment: usize,
    pub art_timeout_ms: u64,
    pub image_width: u32,
    pub unclickable_color: String,
    pub icons: Icons,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            player: "spotify".to_string(),
            player_name: "Spotify".to_string(),
            launch_command: "spotify".to_string(),
            cache_dir: PathBuf::from(default_cache_dir()),
            // The artUrl Spotify reports over MPRIS 404s, the same image id is served from here
            art_fallback_url: "https://i.scdn.co/image/".to_string(),
            art_fallback_segment: 4,
            art_timeout_ms: 10_000,
            image_width: 400,
            unclickable_color: "#888888".to_string(),
            icons: Icons::default(),
        }
    }
}

/// Icon names, either an application icon or any icon from the current GTK theme.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Icons {
    pub player: String,
    pub pause: String,
    pub play: String,
    pub stop: String,
    pub backward: String,
    pub forward: String,
    pub error: String,
}

impl Default for Icons {
    fn default() -> Self {
        Self {
            player: "spotify-client".to_string(),
            pause: "media-playback-pause".to_string(),
            play: "media-playback-start".to_string(),
            stop: "media-playback-stop".to_string(),
            backward: "media-skip-backward".to_string(),
            forward: "media-skip-forward".to_string(),
            error: "dialog-warning".to_string(),
        }
    }
}

impl Icons {
    pub fn for_status(&self, status: PlaybackStatus) -> &str {
        match status {
            PlaybackStatus::Playing => &self.play,
            PlaybackStatus::Paused => &self.pause,
            PlaybackStatus::Stopped => &self.stop,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerConfig {
    pub bus_name: String,
    pub name: String,
    pub launch_command: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtConfig {
    pub cache_dir: PathBuf,
    pub fallback_url: String,
    pub fallback_segment: usize,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub icons: Icons,
    pub unclickable_color: String,
    pub image_width: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub player: PlayerConfig,
    pub art: ArtConfig,
    pub theme: Theme,
}

impl Default for Config {
    fn default() -> Self {
        ConfigFile::default().into_config(None, None)
    }
}

impl ConfigFile {
    pub fn read(path: &Path) -> Result<Self, ConfigReadError> {
        let file = std::fs::File::open(path)?;
        let mut read = std::io::BufReader::new(file);
        let mut buf = Vec::new();
        read.read_to_end(&mut buf)?;

        Ok(serde_path_to_error::deserialize(&mut ron::de::Deserializer::from_bytes(&buf)?)?)
    }

    pub fn into_config(self, player_cli: Option<String>, cache_dir_cli: Option<PathBuf>) -> Config {
        let player = player_cli.unwrap_or(self.player);
        let bus_name = if player.starts_with(MPRIS_PREFIX) {
            player
        } else {
            format!("{MPRIS_PREFIX}{player}")
        };

        let cache_dir = cache_dir_cli.unwrap_or(self.cache_dir);
        let cache_dir = expand_path(&cache_dir).unwrap_or_else(|err| {
            warn!(err = %err, path = %cache_dir.display(), "Failed to expand cache_dir, using it relative to the working directory");
            cache_dir
        });

        Config {
            player: PlayerConfig {
                bus_name,
                name: self.player_name,
                launch_command: self.launch_command,
            },
            art: ArtConfig {
                cache_dir,
                fallback_url: self.art_fallback_url,
                fallback_segment: self.art_fallback_segment,
                timeout: Duration::from_millis(self.art_timeout_ms),
            },
            theme: Theme {
                icons: self.icons,
                unclickable_color: self.unclickable_color,
                image_width: self.image_width,
            },
        }
    }

    pub fn to_ron(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
    }
}

/// A missing config file is the common case and silently means defaults. A broken one is
/// reported, but the menu is still rendered with defaults.
pub fn load(args: &Args) -> Config {
    let file = match config_path(args.config.as_deref()) {
        Some(path) if path.exists() => ConfigFile::read(&path).unwrap_or_else(|err| {
            warn!(err = %err, path = %path.display(), "Failed to read config. Using default values");
            ConfigFile::default()
        }),
        Some(path) => {
            debug!(path = %path.display(), "No config file, using default values");
            ConfigFile::default()
        }
        None => ConfigFile::default(),
    };

    file.into_config(args.player.clone(), args.cache_dir.clone())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use rstest::rstest;
    use spotargos_shared::env::ENV;

    use super::*;
    use crate::tests::fixtures::ENV_LOCK;

    #[test]
    fn default_config_matches_the_argos_plugin() {
        let _guard = ENV_LOCK.blocking_lock();
        ENV.clear();
        ENV.set("HOME", "/home/listener");

        let config = Config::default();

        assert_eq!(config.player.bus_name, "org.mpris.MediaPlayer2.spotify");
        assert_eq!(config.player.launch_command, "spotify");
        assert_eq!(config.art.cache_dir, PathBuf::from("/home/listener/.config/argos/spotify"));
        assert_eq!(config.art.fallback_url, "https://i.scdn.co/image/");
        assert_eq!(config.art.fallback_segment, 4);
        assert_eq!(config.theme.image_width, 400);
        assert_eq!(config.theme.unclickable_color, "#888888");
    }

    #[rstest]
    #[case(PlaybackStatus::Playing, "media-playback-start")]
    #[case(PlaybackStatus::Paused, "media-playback-pause")]
    #[case(PlaybackStatus::Stopped, "media-playback-stop")]
    fn status_icons(#[case] status: PlaybackStatus, #[case] expected: &str) {
        assert_eq!(Icons::default().for_status(status), expected);
    }

    #[rstest]
    #[case(None, "org.mpris.MediaPlayer2.spotify")]
    #[case(Some("spotifyd"), "org.mpris.MediaPlayer2.spotifyd")]
    #[case(Some("org.mpris.MediaPlayer2.ncspot"), "org.mpris.MediaPlayer2.ncspot")]
    fn player_bus_name(#[case] cli: Option<&str>, #[case] expected: &str) {
        let config = ConfigFile::default().into_config(cli.map(str::to_owned), Some("/tmp".into()));

        assert_eq!(config.player.bus_name, expected);
    }

    #[test]
    fn cache_dir_override_is_expanded() {
        let _guard = ENV_LOCK.blocking_lock();
        ENV.clear();
        ENV.set("HOME", "/home/listener");
        ENV.set("XDG_CACHE_HOME", "/var/cache/listener");

        let config =
            ConfigFile::default().into_config(None, Some(PathBuf::from("$XDG_CACHE_HOME/art")));

        assert_eq!(config.art.cache_dir, PathBuf::from("/var/cache/listener/art"));
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let file: ConfigFile = ron::from_str(
            r#"(
                player: "spotifyd",
                image_width: 250,
                icons: (play: "media-playback-start-symbolic"),
            )"#,
        )
        .unwrap();

        assert_eq!(file.player, "spotifyd");
        assert_eq!(file.image_width, 250);
        assert_eq!(file.icons.play, "media-playback-start-symbolic");
        assert_eq!(file.icons.pause, "media-playback-pause");
        assert_eq!(file.player_name, "Spotify");
    }

    #[test]
    fn default_config_survives_a_ron_round_trip() {
        let printed = ConfigFile::default().to_ron().unwrap();

        let parsed: ConfigFile = ron::from_str(&printed).unwrap();

        assert_eq!(parsed, ConfigFile::default());
    }

    #[test]
    fn read_reports_invalid_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ron");
        std::fs::write(&path, "(image_width: \"wide\")").unwrap();

        let result = ConfigFile::read(&path);

        assert!(matches!(result, Err(ConfigReadError::Deserialization(_))));
    }
}
