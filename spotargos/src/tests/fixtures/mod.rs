use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    io::Write,
    path::PathBuf,
    sync::{Arc, LazyLock},
};

use rstest::fixture;
use tokio::sync::Mutex;
use tracing::{Level, Subscriber};
use zbus::zvariant::{OwnedValue, Value};

use crate::{
    art::{ArtError, ArtFetcher, Fetched},
    config::{Config, ConfigFile},
    mpris::{Metadata, PlaybackStatus, PlayerBus, PlayerError, TrackSnapshot},
};

/// Every test that touches `ENV` has to hold this.
pub static ENV_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

#[fixture]
pub fn config() -> Config {
    ConfigFile {
        cache_dir: PathBuf::from("/tmp/spotargos-test-cache"),
        ..ConfigFile::default()
    }
    .into_config(None, None)
}

pub fn track(title: &str, artists: &[&str], album: &str, status: PlaybackStatus) -> TrackSnapshot {
    TrackSnapshot::new(title, artists.iter().map(|a| (*a).to_owned()).collect(), album, status, None)
        .expect("Test track to have an artist")
}

/// Metadata shaped the way Spotify reports it.
pub fn metadata(title: &str, artists: &[&str], album: &str, art_url: Option<&str>) -> Metadata {
    let mut metadata = Metadata::new();
    let mut insert = |key: &str, value: Value<'_>| {
        metadata.insert(
            key.to_owned(),
            OwnedValue::try_from(value).expect("Test value to be convertible"),
        );
    };

    insert("mpris:trackid", Value::from("spotify:track:4uLU6hMCjMI75M1A2tKUQC"));
    insert("xesam:title", Value::from(title));
    insert("xesam:album", Value::from(album));
    insert(
        "xesam:artist",
        Value::from(artists.iter().map(|a| (*a).to_owned()).collect::<Vec<String>>()),
    );
    if let Some(url) = art_url {
        insert("mpris:artUrl", Value::from(url));
    }

    metadata
}

pub struct FakeBus {
    name: String,
    running: bool,
    metadata: Metadata,
    status: String,
    metadata_reads: Cell<usize>,
    status_reads: Cell<usize>,
}

impl FakeBus {
    pub fn running(metadata: Metadata, status: &str) -> Self {
        Self {
            name: "org.mpris.MediaPlayer2.spotify".to_owned(),
            running: true,
            metadata,
            status: status.to_owned(),
            metadata_reads: Cell::new(0),
            status_reads: Cell::new(0),
        }
    }

    pub fn stopped() -> Self {
        Self { running: false, ..Self::running(Metadata::new(), "Stopped") }
    }

    pub fn metadata_reads(&self) -> usize {
        self.metadata_reads.get()
    }

    pub fn status_reads(&self) -> usize {
        self.status_reads.get()
    }
}

impl PlayerBus for FakeBus {
    fn name(&self) -> &str {
        &self.name
    }

    async fn is_running(&self) -> Result<bool, PlayerError> {
        Ok(self.running)
    }

    async fn metadata(&self) -> Result<Metadata, PlayerError> {
        self.metadata_reads.set(self.metadata_reads.get() + 1);
        self.metadata
            .iter()
            .map(|(k, v)| {
                v.try_clone()
                    .map(|v| (k.clone(), v))
                    .map_err(|err| PlayerError::Bus(err.into()))
            })
            .collect()
    }

    async fn playback_status(&self) -> Result<String, PlayerError> {
        self.status_reads.set(self.status_reads.get() + 1);
        Ok(self.status.clone())
    }
}

/// Answers registered urls, any other url fails like an unreachable host.
#[derive(Default)]
pub struct FakeFetcher {
    responses: HashMap<String, Fetched>,
    requests: RefCell<Vec<String>>,
}

impl FakeFetcher {
    pub fn body(mut self, url: &str, body: &[u8]) -> Self {
        self.responses.insert(url.to_owned(), Fetched::Body(body.to_vec()));
        self
    }

    pub fn status(mut self, url: &str, status: u16) -> Self {
        self.responses.insert(url.to_owned(), Fetched::Status(status));
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl ArtFetcher for FakeFetcher {
    async fn get(&self, url: &str) -> Result<Fetched, ArtError> {
        self.requests.borrow_mut().push(url.to_owned());
        self.responses.get(url).cloned().ok_or_else(|| ArtError::FetchFailed(url.to_owned()))
    }
}

/// Collects formatted log output of a test, install it with
/// `tracing::subscriber::set_default(logs.subscriber())`.
#[derive(Clone, Default)]
pub struct LogCapture {
    buf: Arc<std::sync::Mutex<Vec<u8>>>,
}

impl LogCapture {
    pub fn subscriber(&self) -> impl Subscriber + Send + Sync + 'static {
        let writer = self.clone();
        tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(Level::TRACE)
            .finish()
    }

    pub fn contents(&self) -> String {
        let buf = self.buf.lock().expect("Log buffer not to be poisoned");
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buf.lock().expect("Log buffer not to be poisoned").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
