// src/dispatch/url.rs  —  Barcode → URL
use crate::config::BARCODE_PLACEHOLDER;

/// Substitute `barcode` into `template`.  With `encode`, everything outside
/// the RFC 3986 unreserved set is percent-encoded so symbol characters can't
/// break out of the query parameter.
pub fn build_url(template: &str, barcode: &str, encode: bool) -> String {
    if encode {
        template.replace(BARCODE_PLACEHOLDER, &percent_encode(barcode))
    } else {
        template.replace(BARCODE_PLACEHOLDER, barcode)
    }
}

fn percent_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => out.push(b as char),
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}
