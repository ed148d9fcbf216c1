// src/state.rs  —  Shared controller: operating mode + connection status
//
// One `Arc<Controller>` is shared by the scan loop (dispatch path) and the
// presentation side (main thread).  Reads are lock-free atomics; the settings
// mutex serialises mode writes so a change is persisted exactly once.
use crate::config::OperatingMode;
use crate::settings::{Settings, SettingsStore};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Mutex;

/// Everything observers get told about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    Status { connected: bool },
    Barcode(String),
    ModeChanged(OperatingMode),
}

const STATUS_UNKNOWN:      u8 = 0;
const STATUS_DISCONNECTED: u8 = 1;
const STATUS_CONNECTED:    u8 = 2;

pub struct Controller {
    mode:     AtomicU8,
    status:   AtomicU8,
    settings: Mutex<SettingsStore>,
    events:   Sender<ScanEvent>,
}

impl Controller {
    pub fn new(mode: OperatingMode, settings: SettingsStore, events: Sender<ScanEvent>) -> Self {
        Self {
            mode:     AtomicU8::new(mode.as_u8()),
            status:   AtomicU8::new(STATUS_UNKNOWN),
            settings: Mutex::new(settings),
            events,
        }
    }

    pub fn mode(&self) -> OperatingMode {
        OperatingMode::from_u8(self.mode.load(Ordering::Acquire))
    }

    /// Switch mode, persist it and notify.  Returns false (and does nothing)
    /// when `mode` is already current.  A failed write is logged; the
    /// in-memory mode is still switched.
    pub fn set_mode(&self, mode: OperatingMode) -> bool {
        let settings = match self.settings.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        if self.mode.swap(mode.as_u8(), Ordering::AcqRel) == mode.as_u8() {
            return false;
        }
        log::info!("[mode] → {mode}");
        if let Err(e) = settings.save(&Settings { mode }) {
            log::warn!("[settings] {e} — mode {mode} kept in memory only");
        }
        drop(settings);
        self.publish(ScanEvent::ModeChanged(mode));
        true
    }

    /// Record connection status; observers hear about changes only.
    pub fn set_connected(&self, connected: bool) -> bool {
        let new = if connected { STATUS_CONNECTED } else { STATUS_DISCONNECTED };
        if self.status.swap(new, Ordering::AcqRel) == new {
            return false;
        }
        self.publish(ScanEvent::Status { connected });
        true
    }

    /// Fire-and-forget: a vanished observer is not an error.
    pub fn publish(&self, event: ScanEvent) {
        let _ = self.events.send(event);
    }
}
