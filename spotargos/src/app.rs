use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::{debug, warn};
use zbus::Connection;

use crate::{
    argos::Menu,
    art::{ArtCache, ArtFetcher, HttpFetcher},
    cli::ControlAction,
    config::{Config, ConfigFile},
    mpris::{MprisBus, PlayerBus, PlayerState, fetch_current_track},
    render::Renderer,
};

/// One plugin refresh. Everything that goes wrong after startup ends up in the menu,
/// the exit code is only non-zero when the session bus or the HTTP client is missing.
pub async fn run(config: &Config) -> ExitCode {
    let renderer = Renderer::new(config);

    let (connection, fetcher) = match startup(config).await {
        Ok(services) => services,
        Err(err) => {
            warn!(err = ?err, "Failed to start");
            print!("{}", renderer.startup_failure(&err));
            return ExitCode::FAILURE;
        }
    };

    let state = match MprisBus::new(&connection, &config.player.bus_name).await {
        Ok(bus) => PlayerState::from(fetch_current_track(&bus).await),
        Err(err) => PlayerState::from(Err(err)),
    };

    print!("{}", menu(config, &state, &fetcher).await);
    ExitCode::SUCCESS
}

async fn startup(config: &Config) -> Result<(Connection, HttpFetcher)> {
    let connection = Connection::session().await.context("Failed to connect to the session bus")?;
    let fetcher =
        HttpFetcher::new(config.art.timeout).context("Failed to create the HTTP client")?;
    Ok((connection, fetcher))
}

/// Art is best effort, a track without it still gets the full menu.
pub async fn menu(config: &Config, state: &PlayerState, fetcher: &impl ArtFetcher) -> Menu {
    let art = match state {
        PlayerState::Track(track) => match track.art_url() {
            Some(url) => match ArtCache::new(&config.art).get_art_base64(fetcher, url).await {
                Ok(art) => Some(art),
                Err(err) => {
                    warn!(err = ?err, url, "Failed to get album art");
                    None
                }
            },
            None => {
                debug!("Track has no album art");
                None
            }
        },
        PlayerState::Failed(err) => {
            debug!(err = ?err, "Failed to read player state");
            None
        }
        PlayerState::Absent | PlayerState::Unavailable => None,
    };

    Renderer::new(config).render(state, art.as_deref())
}

pub async fn control(config: &Config, action: ControlAction) -> Result<()> {
    let connection = Connection::session().await.context("Failed to connect to the session bus")?;
    let bus = MprisBus::new(&connection, &config.player.bus_name).await?;

    bus.control(action)
        .await
        .with_context(|| format!("Failed to send {} to '{}'", action.method(), bus.name()))
}

pub fn print_default_config() -> Result<()> {
    println!("{}", ConfigFile::default().to_ron()?);
    Ok(())
}
