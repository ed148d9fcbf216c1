// src/scan/usb.rs  —  libusb backend for the scanner  (default VID 0x05e0 / PID 0x1200)
//
// The Symbol scanner enumerates as a boot-protocol USB keyboard.  We talk to
// its interrupt IN endpoint directly through rusb, so the scan never reaches
// the focused window as keystrokes.
//
// ── Linux permissions ─────────────────────────────────────────────────────────
// /dev/bus/usb/* is root-only by default, and usbhid owns the interface.
// The backend asks libusb to detach the kernel driver while it holds the
// interface.  Create a udev rule once:
//
//   echo 'SUBSYSTEM=="usb", ATTRS{idVendor}=="05e0", \
//         ATTRS{idProduct}=="1200", GROUP="plugdev", MODE="0660"' \
//     | sudo tee /etc/udev/rules.d/99-barcode-bridge.rules
//   sudo udevadm control --reload-rules && sudo udevadm trigger
//
// ── Windows ───────────────────────────────────────────────────────────────────
// kbdhid.sys owns keyboard interfaces exclusively.  Install a WinUSB driver
// for the scanner with Zadig so libusb can open it.

use crate::error::ScanError;
use rusb::{Device, DeviceHandle, Direction, GlobalContext, TransferType, UsbContext};
use std::time::Duration;

/// Open-by-identifier seam.  Production: [`RusbBackend`]; tests: scripted fakes.
pub trait UsbBackend: Send {
    /// Open the device, configure it and return a link to its interrupt IN endpoint.
    fn open(&mut self) -> Result<Box<dyn InterruptLink>, ScanError>;
    /// Human-readable label for log output
    fn describe(&self) -> String;
}

/// An opened device with a claimed interrupt IN endpoint.
/// Dropping the link releases the device.
pub trait InterruptLink: Send {
    /// One bounded transfer.  A timeout is `Err(ScanError::TransferTimeout)`.
    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, ScanError>;
    fn endpoint(&self) -> u8;
}

// ── rusb backend ──────────────────────────────────────────────────────────────

pub struct RusbBackend {
    vid: u16,
    pid: u16,
}

impl RusbBackend {
    pub fn new(vid: u16, pid: u16) -> Self { Self { vid, pid } }

    fn find_device(&self) -> Result<Device<GlobalContext>, ScanError> {
        let devices = rusb::devices()
            .map_err(|e| ScanError::Open(format!("USB enumeration failed: {e}")))?;
        devices.iter()
            .find(|d| d.device_descriptor()
                .map(|desc| desc.vendor_id() == self.vid && desc.product_id() == self.pid)
                .unwrap_or(false))
            .ok_or(ScanError::DeviceNotFound { vid: self.vid, pid: self.pid })
    }
}

impl UsbBackend for RusbBackend {
    fn open(&mut self) -> Result<Box<dyn InterruptLink>, ScanError> {
        let device = self.find_device()?;
        let mut handle = device.open()
            .map_err(|e| ScanError::Open(format!("{e}{}", build_open_hint())))?;

        // Already-configured devices answer Busy here; that's fine.
        match device.config_descriptor(0) {
            Ok(cfg) => {
                if let Err(e) = handle.set_active_configuration(cfg.number()) {
                    log::debug!("[usb] set_active_configuration({}) failed: {e} (not fatal)", cfg.number());
                }
            }
            Err(e) => log::debug!("[usb] no config descriptor 0: {e}"),
        }

        let (interface, endpoint) = find_interrupt_in_ep(&device)?;

        if let Err(e) = handle.set_auto_detach_kernel_driver(true) {
            log::debug!("[usb] auto-detach kernel driver unavailable: {e}");
        }
        handle.claim_interface(interface)
            .map_err(|e| ScanError::Open(format!("cannot claim interface {interface}: {e}{}", build_open_hint())))?;

        log::debug!("[usb] claimed interface {interface}, interrupt IN ep=0x{endpoint:02X}");
        Ok(Box::new(RusbLink { handle, interface, endpoint }))
    }

    fn describe(&self) -> String {
        format!("{:04x}:{:04x}", self.vid, self.pid)
    }
}

/// Scan the active configuration for the first interrupt IN endpoint.
/// Returns `(interface number, endpoint address)`.
fn find_interrupt_in_ep<T: UsbContext>(device: &Device<T>) -> Result<(u8, u8), ScanError> {
    let cfg = device.active_config_descriptor()
        .map_err(|e| ScanError::Open(format!("USB config descriptor: {e}")))?;
    for iface in cfg.interfaces() {
        for desc in iface.descriptors() {
            for ep in desc.endpoint_descriptors() {
                if ep.direction()     == Direction::In
                && ep.transfer_type() == TransferType::Interrupt {
                    return Ok((desc.interface_number(), ep.address()));
                }
            }
        }
    }
    Err(ScanError::EndpointNotFound)
}

fn build_open_hint() -> &'static str {
    if cfg!(target_os = "linux") {
        "\n  Hint: /dev/bus/usb/* may lack permissions.\
         \n  Permanent:  install udev rule 99-barcode-bridge.rules (see top of usb.rs)"
    } else if cfg!(target_os = "windows") {
        "\n  Hint: the scanner must use a WinUSB driver (install it with Zadig).\
         \n  ‣ If another scanner application is running, close it first."
    } else {
        ""
    }
}

struct RusbLink {
    handle:    DeviceHandle<GlobalContext>,
    interface: u8,
    endpoint:  u8,
}

impl InterruptLink for RusbLink {
    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, ScanError> {
        match self.handle.read_interrupt(self.endpoint, buf, timeout) {
            Ok(n)                     => Ok(n),
            Err(rusb::Error::Timeout) => Err(ScanError::TransferTimeout),
            Err(e)                    => Err(ScanError::TransferError(e.to_string())),
        }
    }

    fn endpoint(&self) -> u8 { self.endpoint }
}

impl Drop for RusbLink {
    fn drop(&mut self) {
        // The device may already be gone; nothing useful to do on failure.
        if let Err(e) = self.handle.release_interface(self.interface) {
            log::debug!("[usb] release_interface({}) failed: {e}", self.interface);
        }
    }
}

/// Check if the scanner is plugged in (no open, no permissions needed).
pub fn is_present(vid: u16, pid: u16) -> bool {
    rusb::devices()
        .map(|list| list.iter().any(|d| d.device_descriptor()
            .map(|desc| desc.vendor_id() == vid && desc.product_id() == pid)
            .unwrap_or(false)))
        .unwrap_or(false)
}
