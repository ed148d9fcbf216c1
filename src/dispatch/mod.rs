// src/dispatch/mod.rs  —  Mode-based routing of completed barcodes
pub mod actions;
pub mod foreground;
pub mod url;

pub use actions::{Actions, NullActions, SystemActions};
pub use foreground::{ForegroundWindow, SystemForeground};

use crate::config::{AppConfig, AutoModeRule, OperatingMode};
use crate::state::Controller;
use anyhow::Result;
use std::sync::Arc;

/// What a dispatch did (for logging and tests)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatched {
    /// Command barcode — mode set, no visible action
    ModeCommand(OperatingMode),
    OpenedUrl(String),
    Typed(String),
}

pub struct Dispatcher {
    controller:       Arc<Controller>,
    actions:          Box<dyn Actions>,
    foreground:       Box<dyn ForegroundWindow>,
    url_template:     String,
    encode_barcode:   bool,
    keyboard_command: String,
    url_command:      String,
    auto_modes:       Vec<AutoModeRule>,
}

impl Dispatcher {
    pub fn new(
        cfg:        &AppConfig,
        controller: Arc<Controller>,
        actions:    Box<dyn Actions>,
        foreground: Box<dyn ForegroundWindow>,
    ) -> Self {
        Self {
            controller,
            actions,
            foreground,
            url_template:     cfg.url_template.clone(),
            encode_barcode:   cfg.encode_barcode,
            keyboard_command: cfg.keyboard_command.clone(),
            url_command:      cfg.url_command.clone(),
            auto_modes:       cfg.auto_modes.clone(),
        }
    }

    fn command_mode(&self, barcode: &str) -> Option<OperatingMode> {
        if barcode == self.keyboard_command {
            Some(OperatingMode::KeyboardPassthrough)
        } else if barcode == self.url_command {
            Some(OperatingMode::OpenUrl)
        } else {
            None
        }
    }

    /// Mode forced by the focused window, if its title is in the table
    fn auto_mode(&self) -> Option<OperatingMode> {
        let title = self.foreground.title()?;
        log::debug!("[dispatch] foreground window {title:?}");
        self.auto_modes.iter().find(|r| r.title == title).map(|r| r.mode)
    }

    pub fn dispatch(&mut self, barcode: &str) -> Result<Dispatched> {
        if let Some(mode) = self.command_mode(barcode) {
            log::info!("[dispatch] command barcode → {mode} mode");
            self.controller.set_mode(mode);
            return Ok(Dispatched::ModeCommand(mode));
        }

        if let Some(mode) = self.auto_mode() {
            if self.controller.set_mode(mode) {
                log::info!("[dispatch] foreground window forces {mode} mode");
            }
        }

        match self.controller.mode() {
            OperatingMode::OpenUrl => {
                let url = url::build_url(&self.url_template, barcode, self.encode_barcode);
                self.actions.open_url(&url)?;
                log::info!("[dispatch] opened {url}");
                Ok(Dispatched::OpenedUrl(url))
            }
            OperatingMode::KeyboardPassthrough => {
                self.actions.type_text(barcode)?;
                log::info!("[dispatch] typed {barcode:?}");
                Ok(Dispatched::Typed(barcode.to_string()))
            }
        }
    }
}

/// Recording fakes shared with the scan loop tests
#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct Recorded {
        pub urls:  Vec<String>,
        pub typed: Vec<String>,
        /// Number of upcoming calls that fail instead of recording
        pub fail_next: usize,
    }

    impl Recorded {
        fn take_failure(&mut self) -> Result<()> {
            if self.fail_next > 0 {
                self.fail_next -= 1;
                anyhow::bail!("action unavailable");
            }
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    pub struct RecordingActions(pub Arc<Mutex<Recorded>>);

    impl Actions for RecordingActions {
        fn open_url(&mut self, url: &str) -> Result<()> {
            let mut rec = self.0.lock().unwrap();
            rec.take_failure()?;
            rec.urls.push(url.to_string());
            Ok(())
        }
        fn type_text(&mut self, text: &str) -> Result<()> {
            let mut rec = self.0.lock().unwrap();
            rec.take_failure()?;
            rec.typed.push(text.to_string());
            Ok(())
        }
    }

    /// Foreground title the test can change between dispatches
    #[derive(Clone, Default)]
    pub struct FixedForeground(pub Arc<Mutex<Option<String>>>);

    impl ForegroundWindow for FixedForeground {
        fn title(&self) -> Option<String> { self.0.lock().unwrap().clone() }
    }
}
