// src/scan/session.rs  —  Device session: connect / bounded read / disconnect
use crate::error::ScanError;
use crate::hid::HidReport;
use super::usb::{InterruptLink, UsbBackend};
use std::time::Duration;

/// Large enough for any full-speed interrupt packet
const READ_BUF_LEN: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connected,
}

/// Result of one bounded read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A report arrived
    Report(HidReport),
    /// Timeout — nothing scanned this cycle
    NoData,
}

/// Owns the device handle and its interrupt IN endpoint.  Only the scan loop
/// holds one, so nothing else can read the endpoint concurrently.
pub struct DeviceSession {
    backend: Box<dyn UsbBackend>,
    link:    Option<Box<dyn InterruptLink>>,
    buf:     [u8; READ_BUF_LEN],
}

impl DeviceSession {
    pub fn new(backend: Box<dyn UsbBackend>) -> Self {
        Self { backend, link: None, buf: [0; READ_BUF_LEN] }
    }

    pub fn state(&self) -> SessionState {
        if self.link.is_some() { SessionState::Connected } else { SessionState::Disconnected }
    }

    pub fn describe(&self) -> String { self.backend.describe() }

    /// Open the scanner.  A no-op when already connected.
    pub fn connect(&mut self) -> Result<(), ScanError> {
        if self.link.is_some() {
            return Ok(());
        }
        let link = self.backend.open()?;
        log::info!("[usb] scanner {} connected  ep=0x{:02X}", self.backend.describe(), link.endpoint());
        self.link = Some(link);
        Ok(())
    }

    /// One bounded transfer.  Timeouts come back as `NoData`; any other
    /// failure drops the session to Disconnected and is returned.
    pub fn read(&mut self, timeout: Duration) -> Result<ReadOutcome, ScanError> {
        let link = self.link.as_mut().ok_or(ScanError::NotConnected)?;
        match link.read(&mut self.buf, timeout) {
            Ok(0) => Ok(ReadOutcome::NoData),
            Ok(n) => {
                log::trace!("[usb] n={n} report={:02X?}", &self.buf[..n.min(8)]);
                Ok(ReadOutcome::Report(HidReport::parse(&self.buf[..n])))
            }
            Err(e) if e.is_benign() => Ok(ReadOutcome::NoData),
            Err(e) => {
                log::debug!("[usb] scanner read error: {e}");
                self.disconnect();
                Err(e)
            }
        }
    }

    /// Release the device.  Safe to call when already disconnected.
    pub fn disconnect(&mut self) {
        if self.link.take().is_some() {
            log::info!("[usb] scanner {} released", self.backend.describe());
        }
    }
}

impl Drop for DeviceSession {
    fn drop(&mut self) { self.disconnect(); }
}
