use crate::{
    argos::{Key, Line, Menu, escape_newlines},
    cli::ControlAction,
    config::{Config, PlayerConfig, Theme},
    mpris::{PlaybackStatus, PlayerState, TrackSnapshot},
};

/// Turns whatever the player reported into the menu Argos displays. Rendering can not
/// fail, every state has a menu.
#[derive(Debug, Clone, Copy)]
pub struct Renderer<'a> {
    player: &'a PlayerConfig,
    theme: &'a Theme,
}

impl<'a> Renderer<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { player: &config.player, theme: &config.theme }
    }

    /// `art` is the base64 encoded cover of the current track, if it could be fetched.
    pub fn render(&self, state: &PlayerState, art: Option<&str>) -> Menu {
        match state {
            PlayerState::Track(track) => self.track(track, art),
            PlayerState::Absent => self.nothing_playing(),
            PlayerState::Unavailable => self.player_closed(),
            PlayerState::Failed(err) => self.failure(err),
        }
    }

    fn track(&self, track: &TrackSnapshot, art: Option<&str>) -> Menu {
        let icons = &self.theme.icons;
        let mut menu = Menu::new();

        menu.line(
            Line::new(format!("{} - {}", track.primary_artist(), track.title()))
                .icon(icons.for_status(track.status()))
                .markup(false)
                .with(Key::Unescape, true),
        )
        .separator()
        .line(self.detail(format!("Song Title: {}", track.title())))
        .line(self.detail(format!("Album: {}", track.album())));

        let artists = track.artists();
        if artists.len() > 1 {
            menu.line(self.detail(format!("Artists: {}", artists.join(", "))));
        } else {
            menu.line(self.detail(format!("Artist: {}", track.primary_artist())));
        }

        self.controls(&mut menu, track.status());
        menu.separator();

        if let Some(art) = art {
            menu.line(
                Line::new("")
                    .with(Key::Image, art)
                    .with(Key::ImageWidth, self.theme.image_width),
            );
        }

        menu
    }

    /// Greyed out, non-clickable information line
    fn detail(&self, text: String) -> Line {
        Line::new(text).with(Key::Color, self.theme.unclickable_color.as_str()).markup(false)
    }

    fn controls(&self, menu: &mut Menu, status: PlaybackStatus) {
        let icons = &self.theme.icons;
        let bus_name = &self.player.bus_name;

        let toggle = match status {
            PlaybackStatus::Playing => Line::new("Play/<b>Pause</b>").icon(&icons.pause),
            PlaybackStatus::Paused | PlaybackStatus::Stopped => {
                Line::new("<b>Play</b>/Pause").icon(&icons.play)
            }
        };

        menu.line(toggle.bash(ControlAction::PlayPause.dbus_send(bus_name)))
            .line(
                Line::new("Previous")
                    .icon(&icons.backward)
                    .bash(ControlAction::Previous.dbus_send(bus_name)),
            )
            .line(
                Line::new("Next")
                    .icon(&icons.forward)
                    .bash(ControlAction::Next.dbus_send(bus_name)),
            );
    }

    fn nothing_playing(&self) -> Menu {
        let mut menu = Menu::new();
        menu.line(Line::new("Nothing Playing").icon(&self.theme.icons.stop));
        menu
    }

    fn player_closed(&self) -> Menu {
        let mut menu = Menu::new();
        menu.line(Line::new(self.player.name.as_str()).icon(&self.theme.icons.player))
            .separator()
            .line(
                Line::new(format!("Open {}", self.player.name))
                    .bash(self.player.launch_command.as_str()),
            );
        menu
    }

    fn failure(&self, err: &anyhow::Error) -> Menu {
        let mut menu = Menu::new();
        menu.line(Line::new("Something went wrong!").icon(&self.theme.icons.error))
            .separator()
            .line(Line::new("<b>Exception Details:</b>"))
            .line(self.monospace(&format!("{err:?}")));
        menu
    }

    /// Shown when the program can not do its job at all, e.g. without a session bus.
    pub fn startup_failure(&self, err: &anyhow::Error) -> Menu {
        let mut menu = Menu::new();
        menu.line(
            Line::new(format!("{} Error!", self.player.name)).icon(&self.theme.icons.error),
        )
        .separator()
        .line(Line::new("Required system services are not available."))
        .line(self.monospace(&format!("{err:?}")));
        menu
    }

    fn monospace(&self, text: &str) -> Line {
        Line::new(escape_newlines(text))
            .with(Key::Font, "monospace")
            .markup(false)
            .with(Key::Unescape, true)
    }
}
