// src/devices.rs  —  --list-devices output
#[cfg(feature = "list-hid")]
use hidapi::HidApi;

/// One line per connected HID device; the configured scanner is marked.
#[cfg(feature = "list-hid")]
pub fn list_devices(vid: u16, pid: u16) -> Vec<String> {
    let mut out = Vec::new();
    match HidApi::new() {
        Ok(api) => {
            for d in api.device_list() {
                let mark = if d.vendor_id() == vid && d.product_id() == pid { "  ← scanner" } else { "" };
                out.push(format!(
                    "{:04x}:{:04x}  {}  ({}){mark}",
                    d.vendor_id(),
                    d.product_id(),
                    d.product_string().unwrap_or("Unknown"),
                    d.manufacturer_string().unwrap_or("Unknown"),
                ));
            }
        }
        Err(e) => log::warn!("[devices] hidapi init failed: {e}"),
    }
    out.sort();
    out.dedup();
    append_scanner_hint(&mut out, vid, pid);
    out
}

/// Without hidapi: bare USB enumeration (no product strings).
#[cfg(not(feature = "list-hid"))]
pub fn list_devices(vid: u16, pid: u16) -> Vec<String> {
    let mut out = Vec::new();
    if let Ok(list) = rusb::devices() {
        for d in list.iter() {
            if let Ok(desc) = d.device_descriptor() {
                let mark = if desc.vendor_id() == vid && desc.product_id() == pid { "  ← scanner" } else { "" };
                out.push(format!(
                    "{:04x}:{:04x}  bus={} addr={}{mark}",
                    desc.vendor_id(), desc.product_id(), d.bus_number(), d.address()
                ));
            }
        }
    }
    append_scanner_hint(&mut out, vid, pid);
    out
}

fn append_scanner_hint(out: &mut Vec<String>, vid: u16, pid: u16) {
    let listed = out.iter().any(|l| l.ends_with("← scanner"));
    if !listed {
        if crate::scan::usb::is_present(vid, pid) {
            out.push(format!(
                "Scanner {vid:04x}:{pid:04x} is on the bus but not accessible — check permissions."
            ));
        } else {
            out.push(format!("No scanner found (VID {vid:04x}:PID {pid:04x}). Is it plugged in?"));
        }
    }
}
