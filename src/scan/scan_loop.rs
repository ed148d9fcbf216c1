// src/scan/scan_loop.rs  —  Poll cycle: session → debouncer → decoder → assembler → dispatcher
//
// The loop is the only place device failures are absorbed: it reconnects with
// a fixed backoff and reports every status change before sleeping.  Stop is
// checked once per iteration, so shutdown latency is bounded by the read
// timeout (or one backoff slice).
use super::assembler::Assembler;
use super::session::{DeviceSession, ReadOutcome, SessionState};
use crate::config::AppConfig;
use crate::dispatch::Dispatcher;
use crate::hid::{decode, Debouncer, HidReport};
use crate::state::{Controller, ScanEvent};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Backoff sleeps in slices this long so a stop request is seen promptly
const STOP_SLICE: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy)]
pub struct ScanTiming {
    pub read_timeout:      Duration,
    pub reconnect_backoff: Duration,
    pub idle_timeout:      Duration,
}

impl ScanTiming {
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self {
            read_timeout:      cfg.read_timeout,
            reconnect_backoff: cfg.reconnect_backoff,
            idle_timeout:      cfg.idle_timeout,
        }
    }
}

pub struct ScanLoop {
    session:    DeviceSession,
    debouncer:  Debouncer,
    assembler:  Assembler,
    dispatcher: Dispatcher,
    controller: Arc<Controller>,
    timing:     ScanTiming,
    stop:       Arc<AtomicBool>,
}

impl ScanLoop {
    pub fn new(
        session:    DeviceSession,
        dispatcher: Dispatcher,
        controller: Arc<Controller>,
        timing:     ScanTiming,
        stop:       Arc<AtomicBool>,
    ) -> Self {
        Self {
            session,
            debouncer: Debouncer::new(),
            assembler: Assembler::new(timing.idle_timeout),
            dispatcher,
            controller,
            timing,
            stop,
        }
    }

    /// Run until the stop flag is set, then release the device.
    pub fn run(mut self) {
        log::info!("[scan] watching for scanner {}", self.session.describe());
        while !self.stop.load(Ordering::Relaxed) {
            self.step();
        }
        self.session.disconnect();
        self.controller.set_connected(false);
        log::info!("[scan] stopped");
    }

    /// One iteration: a connect attempt or one bounded read.
    pub fn step(&mut self) {
        match self.session.state() {
            SessionState::Disconnected => self.try_connect(),
            SessionState::Connected    => self.poll_once(),
        }
    }

    fn try_connect(&mut self) {
        match self.session.connect() {
            Ok(()) => {
                self.debouncer.reset();
                self.assembler.reset();
                self.controller.set_connected(true);
            }
            Err(e) => {
                if self.controller.set_connected(false) {
                    log::warn!("[scan] scanner unavailable: {e} — retrying every {:?}",
                        self.timing.reconnect_backoff);
                } else {
                    log::debug!("[scan] connect failed: {e}");
                }
                self.backoff();
            }
        }
    }

    fn poll_once(&mut self) {
        match self.session.read(self.timing.read_timeout) {
            Ok(ReadOutcome::NoData) => {}
            Ok(ReadOutcome::Report(report)) => self.handle_report(report, Instant::now()),
            Err(e) => {
                log::warn!("[scan] scanner disconnected: {e}");
                if !self.assembler.buffer().is_empty() {
                    log::debug!("[scan] dropping partial buffer '{}'", self.assembler.buffer());
                }
                self.assembler.reset();
                self.debouncer.reset();
                self.controller.set_connected(false);
                self.backoff();
            }
        }
    }

    /// Feed one report through debouncer → decoder → assembler and dispatch
    /// any barcode it completes.
    pub fn handle_report(&mut self, report: HidReport, now: Instant) {
        let shift = report.shift();
        for code in self.debouncer.push(report.keys) {
            let Some(key) = decode(code, shift) else {
                log::trace!("[scan] unmapped usage 0x{code:02X}");
                continue;
            };
            if let Some(barcode) = self.assembler.feed(key, now) {
                log::info!("[scan] barcode scanned: {barcode}");
                self.controller.publish(ScanEvent::Barcode(barcode.clone()));
                if let Err(e) = self.dispatcher.dispatch(&barcode) {
                    log::warn!("[dispatch] {barcode:?} failed: {e:#}");
                }
            }
        }
    }

    fn backoff(&self) {
        let deadline = Instant::now() + self.timing.reconnect_backoff;
        loop {
            if self.stop.load(Ordering::Relaxed) {
                return;
            }
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                return;
            }
            thread::sleep(left.min(STOP_SLICE));
        }
    }
}

/// Open the scanner and wait for one complete barcode (nothing is dispatched).
/// `Ok(None)` when the deadline passes without a scan.
pub fn wait_for_barcode(
    session: &mut DeviceSession,
    timing:  ScanTiming,
    timeout: Duration,
) -> Result<Option<String>, crate::error::ScanError> {
    session.connect()?;
    let mut debouncer = Debouncer::new();
    let mut assembler = Assembler::new(timing.idle_timeout);
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        let ReadOutcome::Report(report) = session.read(timing.read_timeout)? else { continue; };
        let shift = report.shift();
        let now = Instant::now();
        for code in debouncer.push(report.keys) {
            if let Some(barcode) = decode(code, shift).and_then(|k| assembler.feed(k, now)) {
                return Ok(Some(barcode));
            }
        }
    }
    Ok(None)
}
