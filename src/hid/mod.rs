// src/hid/mod.rs  —  Boot-keyboard report parsing, usage decoder, debouncer
pub mod debounce;
pub mod decoder;
pub mod report;

pub use debounce::Debouncer;
pub use decoder::{decode, Key};
pub use report::HidReport;
