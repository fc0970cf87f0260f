use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Prints the Argos menu for the current MPRIS player when invoked without a subcommand.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Args {
    #[arg(short, long, value_name = "FILE")]
    /// Config file to use instead of `$XDG_CONFIG_HOME/spotargos/config.ron`
    pub config: Option<PathBuf>,
    #[arg(short, long, value_name = "NAME")]
    /// Override the player, either the last part of its bus name or the full
    /// `org.mpris.MediaPlayer2.*` name
    pub player: Option<String>,
    #[arg(long, value_name = "DIR")]
    /// Override the album art cache directory
    pub cache_dir: Option<PathBuf>,
    #[arg(long, value_name = "FILE")]
    /// Write logs to this file instead of stderr
    pub log_file: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Clone, Debug, PartialEq)]
#[clap(rename_all = "lower")]
pub enum Command {
    /// Prints the default config. Can be used to bootstrap your config file.
    Config,
    /// Sends a playback command to the player
    Control { action: ControlAction },
    /// Prints the spotargos version
    Version,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlAction {
    /// Toggles between play and pause
    PlayPause,
    /// Plays the previous track
    Previous,
    /// Plays the next track
    Next,
}
