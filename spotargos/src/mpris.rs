use std::collections::{BTreeMap, HashMap};

use spotargos_shared::env::ENV;
use strum::EnumString;
use thiserror::Error;
use tracing::debug;
use zbus::{
    Connection,
    fdo::{self, DBusProxy},
    names::BusName,
    proxy,
    proxy::CacheProperties,
    zvariant::{OwnedValue, Value},
};

use crate::cli::ControlAction;

pub const OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";
pub const PLAYER_INTERFACE: &str = "org.mpris.MediaPlayer2.Player";

const TITLE: &str = "xesam:title";
const ARTIST: &str = "xesam:artist";
const ALBUM: &str = "xesam:album";
const ART_URL: &str = "mpris:artUrl";

pub type Metadata = HashMap<String, OwnedValue>;

#[proxy(
    interface = "org.mpris.MediaPlayer2.Player",
    default_path = "/org/mpris/MediaPlayer2",
    gen_blocking = false
)]
trait Player {
    fn play_pause(&self) -> zbus::Result<()>;

    fn next(&self) -> zbus::Result<()>;

    fn previous(&self) -> zbus::Result<()>;

    #[zbus(property)]
    fn metadata(&self) -> zbus::Result<Metadata>;

    #[zbus(property)]
    fn playback_status(&self) -> zbus::Result<String>;
}

#[derive(Error, Debug)]
pub enum PlayerError {
    #[error("'{0}' is not running")]
    Unavailable(String),
    #[error("Player returned unexpected state: {0}")]
    UnexpectedState(String),
    #[error("D-Bus error, {0}")]
    Bus(#[from] zbus::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
pub enum PlaybackStatus {
    Playing,
    Paused,
    Stopped,
}

/// The track the player reports right now. Only exists when the player reported at
/// least a title, an album and one artist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackSnapshot {
    title: String,
    artists: Vec<String>,
    album: String,
    status: PlaybackStatus,
    art_url: Option<String>,
}

impl TrackSnapshot {
    pub fn new(
        title: impl Into<String>,
        artists: Vec<String>,
        album: impl Into<String>,
        status: PlaybackStatus,
        art_url: Option<String>,
    ) -> Option<Self> {
        if artists.is_empty() {
            return None;
        }
        Some(Self { title: title.into(), artists, album: album.into(), status, art_url })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn primary_artist(&self) -> &str {
        self.artists.first().map_or("", String::as_str)
    }

    pub fn artists(&self) -> &[String] {
        &self.artists
    }

    pub fn album(&self) -> &str {
        &self.album
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn art_url(&self) -> Option<&str> {
        self.art_url.as_deref()
    }
}

/// Everything a single invocation can learn about the player.
#[derive(Debug)]
pub enum PlayerState {
    Track(TrackSnapshot),
    /// Player is running but has nothing loaded.
    Absent,
    Unavailable,
    Failed(anyhow::Error),
}

impl From<Result<Option<TrackSnapshot>, PlayerError>> for PlayerState {
    fn from(value: Result<Option<TrackSnapshot>, PlayerError>) -> Self {
        match value {
            Ok(Some(track)) => PlayerState::Track(track),
            Ok(None) => PlayerState::Absent,
            Err(PlayerError::Unavailable(_)) => PlayerState::Unavailable,
            Err(err) => PlayerState::Failed(err.into()),
        }
    }
}

/// Reads of the player state, separated from zbus so the reader logic can run without a
/// session bus.
pub trait PlayerBus {
    fn name(&self) -> &str;

    async fn is_running(&self) -> Result<bool, PlayerError>;

    async fn metadata(&self) -> Result<Metadata, PlayerError>;

    async fn playback_status(&self) -> Result<String, PlayerError>;
}

pub struct MprisBus<'a> {
    name: &'a str,
    dbus: DBusProxy<'a>,
    player: PlayerProxy<'a>,
}

impl<'a> MprisBus<'a> {
    pub async fn new(connection: &Connection, name: &'a str) -> Result<Self, PlayerError> {
        let dbus = DBusProxy::new(connection).await?;
        let player = PlayerProxy::builder(connection)
            .destination(name)?
            .cache_properties(CacheProperties::No)
            .build()
            .await?;

        Ok(Self { name, dbus, player })
    }

    pub async fn control(&self, action: ControlAction) -> Result<(), PlayerError> {
        if !self.is_running().await? {
            return Err(PlayerError::Unavailable(self.name.to_owned()));
        }

        let result = match action {
            ControlAction::PlayPause => self.player.play_pause().await,
            ControlAction::Previous => self.player.previous().await,
            ControlAction::Next => self.player.next().await,
        };
        result.map_err(|err| classify(err, self.name))
    }
}

impl PlayerBus for MprisBus<'_> {
    fn name(&self) -> &str {
        self.name
    }

    async fn is_running(&self) -> Result<bool, PlayerError> {
        let name = BusName::try_from(self.name).map_err(zbus::Error::from)?;
        Ok(self.dbus.name_has_owner(name).await.map_err(zbus::Error::from)?)
    }

    async fn metadata(&self) -> Result<Metadata, PlayerError> {
        self.player.metadata().await.map_err(|err| classify(err, self.name))
    }

    async fn playback_status(&self) -> Result<String, PlayerError> {
        self.player.playback_status().await.map_err(|err| classify(err, self.name))
    }
}

/// The player can quit between the ownership check and the actual call.
fn classify(err: zbus::Error, name: &str) -> PlayerError {
    const GONE: [&str; 2] =
        ["org.freedesktop.DBus.Error.ServiceUnknown", "org.freedesktop.DBus.Error.NameHasNoOwner"];

    let gone = match &err {
        zbus::Error::MethodError(error_name, _, _) => GONE.contains(&error_name.as_str()),
        zbus::Error::FDO(fdo_err) => {
            matches!(**fdo_err, fdo::Error::ServiceUnknown(_) | fdo::Error::NameHasNoOwner(_))
        }
        _ => false,
    };

    if gone { PlayerError::Unavailable(name.to_owned()) } else { PlayerError::Bus(err) }
}

pub async fn fetch_current_track(
    bus: &impl PlayerBus,
) -> Result<Option<TrackSnapshot>, PlayerError> {
    if !bus.is_running().await? {
        debug!(player = bus.name(), "Player is not on the bus");
        return Err(PlayerError::Unavailable(bus.name().to_owned()));
    }

    let metadata = bus.metadata().await?;
    if let Some(dump) = debug_dump(&metadata) {
        println!("{dump}");
    }

    let Some(title) = text(&metadata, TITLE)? else {
        return Ok(None);
    };
    let Some(album) = text(&metadata, ALBUM)? else {
        return Ok(None);
    };
    let artists = artists(&metadata)?;
    if artists.is_empty() {
        return Ok(None);
    }
    let art_url = text(&metadata, ART_URL)?.filter(|url| !url.is_empty()).map(str::to_owned);

    let raw_status = bus.playback_status().await?;
    let status = raw_status
        .parse::<PlaybackStatus>()
        .map_err(|_| PlayerError::UnexpectedState(format!("unknown playback status '{raw_status}'")))?;

    Ok(TrackSnapshot::new(title, artists, album, status, art_url))
}

/// Raw metadata as the player reported it, printed ahead of the menu when `DEBUG=1`.
fn debug_dump(metadata: &Metadata) -> Option<String> {
    ENV.is("DEBUG", "1").then(|| format!("{:?}", metadata.iter().collect::<BTreeMap<_, _>>()))
}

/// Metadata entries are variants, some players wrap them once more.
fn peel<'v, 'a>(value: &'v Value<'a>) -> &'v Value<'a> {
    match value {
        Value::Value(inner) => peel(inner),
        other => other,
    }
}

fn text<'m>(metadata: &'m Metadata, key: &str) -> Result<Option<&'m str>, PlayerError> {
    let Some(value) = metadata.get(key) else {
        return Ok(None);
    };

    match peel(value) {
        Value::Str(s) => Ok(Some(s.as_str())),
        other => Err(PlayerError::UnexpectedState(format!("'{key}' is not a string: {other:?}"))),
    }
}

fn artists(metadata: &Metadata) -> Result<Vec<String>, PlayerError> {
    let Some(value) = metadata.get(ARTIST) else {
        return Ok(Vec::new());
    };

    let unexpected = |v: &Value<'_>| {
        PlayerError::UnexpectedState(format!("'{ARTIST}' is not a list of strings: {v:?}"))
    };

    match peel(value) {
        Value::Array(list) => list
            .iter()
            .map(|item| match peel(item) {
                Value::Str(s) => Ok(s.as_str().to_owned()),
                other => Err(unexpected(other)),
            })
            .collect(),
        // MPRIS defines a list, some players send a single string
        Value::Str(s) => Ok(vec![s.as_str().to_owned()]),
        other => Err(unexpected(other)),
    }
}

impl ControlAction {
    pub fn method(self) -> &'static str {
        match self {
            ControlAction::PlayPause => "PlayPause",
            ControlAction::Previous => "Previous",
            ControlAction::Next => "Next",
        }
    }

    /// Shell command performing the action, for menu entries the host executes on click.
    pub fn dbus_send(self, bus_name: &str) -> String {
        format!(
            "dbus-send --print-reply --dest={bus_name} {OBJECT_PATH} {PLAYER_INTERFACE}.{}",
            self.method()
        )
    }
}
