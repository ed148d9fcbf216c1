// src/main.rs  —  barcode-bridge  entry point
mod config;
mod devices;
mod dispatch;
mod error;
mod hid;
mod scan;
mod settings;
mod state;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use config::{AppConfig, Cli, OperatingMode};
use dispatch::{Actions, Dispatcher, NullActions, SystemActions, SystemForeground};
use scan::{DeviceSession, RusbBackend, ScanLoop, ScanTiming};
use settings::{Settings, SettingsStore};
use state::{Controller, ScanEvent};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // ── --print-config  ───────────────────────────────────────────────────────
    if cli.print_config {
        print!("{}", config::DEFAULT_CONFIG_TOML);
        return Ok(());
    }

    // ── --write-config  ───────────────────────────────────────────────────────
    if cli.write_config {
        let path = AppConfig::write_default_config(&cli)?;
        println!("Config written to: {}", path.display());
        println!("Edit it to set the scanner ids, URL template and auto-mode titles.");
        return Ok(());
    }

    // ── Load config ───────────────────────────────────────────────────────────
    let cfg = AppConfig::load(&cli)?;

    // ── --list-devices  ───────────────────────────────────────────────────────
    if cli.list_devices {
        println!("=== Connected USB HID devices ===");
        for line in devices::list_devices(cfg.vid, cfg.pid) {
            println!("  {line}");
        }
        return Ok(());
    }

    let settings = SettingsStore::new(cfg.settings_path.clone());

    // ── --set-mode  ───────────────────────────────────────────────────────────
    if let Some(mode) = cli.set_mode {
        settings.save(&Settings { mode })
            .with_context(|| format!("Persisting mode {mode}"))?;
        println!("Mode set to {mode}");
        return Ok(());
    }

    let timing = ScanTiming::from_config(&cfg);

    // ── --check-scanner  ──────────────────────────────────────────────────────
    if cli.check_scanner {
        let ok = check_scanner(&cfg, timing)?;
        std::process::exit(if ok { 0 } else { 1 });
    }

    // ── Controller: mode + status + event channel ────────────────────────────
    let initial = settings.load_mode_or(cfg.default_mode);
    let (tx_events, rx_events) = mpsc::channel::<ScanEvent>();
    let controller = Arc::new(Controller::new(initial, settings, tx_events));
    if let Some(mode) = cfg.start_mode {
        controller.set_mode(mode);
    }

    // ── Stop signal ───────────────────────────────────────────────────────────
    let stop = Arc::new(AtomicBool::new(false));
    let stop_handler = Arc::clone(&stop);
    ctrlc::set_handler(move || {
        stop_handler.store(true, Ordering::SeqCst);
    })
    .context("Installing Ctrl-C handler")?;

    // ── Scan loop thread ──────────────────────────────────────────────────────
    // Owns the device session exclusively; the main thread only observes.
    let actions: Box<dyn Actions> = if cli.dry_run {
        Box::new(NullActions)
    } else {
        Box::new(SystemActions)
    };
    let dispatcher = Dispatcher::new(&cfg, Arc::clone(&controller), actions, Box::new(SystemForeground));
    let session = DeviceSession::new(Box::new(RusbBackend::new(cfg.vid, cfg.pid)));
    let scan_loop = ScanLoop::new(session, dispatcher, Arc::clone(&controller), timing, Arc::clone(&stop));
    let scan_thread = thread::Builder::new()
        .name("scan-loop".into())
        .spawn(move || scan_loop.run())
        .context("Spawning scan thread")?;

    // ── Console toggle: type "keyboard" / "url" + Enter ──────────────────────
    // Detached; it stays blocked on stdin until the process exits.
    let console_ctl = Arc::clone(&controller);
    thread::Builder::new()
        .name("console".into())
        .spawn(move || {
            for line in std::io::stdin().lines() {
                let Ok(line) = line else { break };
                let cmd = line.trim();
                if cmd.is_empty() {
                    continue;
                }
                match <OperatingMode as clap::ValueEnum>::from_str(cmd, true) {
                    Ok(mode) => {
                        if !console_ctl.set_mode(mode) {
                            println!("Already in {mode} mode");
                        }
                    }
                    Err(_) => println!("Type \"keyboard\" or \"url\" to switch mode"),
                }
            }
        })
        .context("Spawning console thread")?;

    println!("Barcode bridge started — scanner {:04x}:{:04x}, mode {}", cfg.vid, cfg.pid, controller.mode());
    println!("Type \"keyboard\" or \"url\" + Enter to switch mode, Ctrl-C to quit");

    // ── Observer loop ─────────────────────────────────────────────────────────
    observe(&rx_events, &scan_thread, print_event);

    scan_thread.join().map_err(|_| anyhow!("scan thread panicked"))?;
    println!("Shutting down…");
    Ok(())
}

/// Hand every event to `on_event` until the scan thread ends (Ctrl-C or
/// panic).  The controller keeps a sender alive, so the channel itself never
/// disconnects.
fn observe(rx: &Receiver<ScanEvent>, scan_thread: &JoinHandle<()>, mut on_event: impl FnMut(&ScanEvent)) {
    loop {
        match rx.recv_timeout(Duration::from_millis(200)) {
            Ok(event) => on_event(&event),
            Err(RecvTimeoutError::Timeout) => {
                if scan_thread.is_finished() {
                    break;
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    rx.try_iter().for_each(|event| on_event(&event));
}

fn print_event(event: &ScanEvent) {
    match event {
        ScanEvent::Status { connected: true }  => println!("✓ Scanner connected"),
        ScanEvent::Status { connected: false } => println!("✗ Scanner disconnected or not found"),
        ScanEvent::Barcode(code)               => println!("Barcode: {code}"),
        ScanEvent::ModeChanged(mode)           => println!("Mode: {mode}"),
    }
}

/// Open the scanner and wait for one scan; nothing is dispatched.
fn check_scanner(cfg: &AppConfig, timing: ScanTiming) -> Result<bool> {
    let timeout = Duration::from_secs(10);
    let mut session = DeviceSession::new(Box::new(RusbBackend::new(cfg.vid, cfg.pid)));
    println!("Scanner : {:04x}:{:04x}", cfg.vid, cfg.pid);
    println!("Scan any barcode within {}s …", timeout.as_secs());

    let ok = match scan::scan_loop::wait_for_barcode(&mut session, timing, timeout) {
        Ok(Some(code)) => {
            println!("✓ Received: {code}");
            true
        }
        Ok(None) => {
            println!("✗ Timeout — scanner opened but no barcode arrived");
            false
        }
        Err(e) => {
            println!("✗ {e}");
            false
        }
    };
    session.disconnect();
    Ok(ok)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observer_ends_when_scan_thread_panics() {
        let (tx, rx) = mpsc::channel();
        let keep_alive = tx.clone();
        let handle = thread::spawn(move || {
            let _ = tx.send(ScanEvent::Status { connected: false });
            panic!("scan thread died");
        });
        let mut seen = Vec::new();
        observe(&rx, &handle, |e| seen.push(e.clone()));
        assert_eq!(seen, vec![ScanEvent::Status { connected: false }]);
        assert!(handle.join().is_err());
        drop(keep_alive);
    }
}
