// src/scan/mod.rs  —  Device session, barcode assembly, scan loop
pub mod assembler;
pub mod scan_loop;
pub mod session;
pub mod usb;

pub use scan_loop::{ScanLoop, ScanTiming};
pub use session::DeviceSession;
pub use usb::RusbBackend;

/// Scripted USB backend for tests — no hardware needed.
#[cfg(test)]
pub mod testing {
    use super::usb::{InterruptLink, UsbBackend};
    use crate::error::ScanError;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// What the next read on an open link does.
    #[derive(Debug, Clone)]
    pub enum Step {
        /// Deliver a boot report: (modifier byte, key codes)
        Keys(u8, Vec<u8>),
        Timeout,
        /// Non-benign transfer error
        Fail,
    }

    #[derive(Default)]
    struct Shared {
        steps:    VecDeque<Step>,
        /// Remaining open attempts that fail with DeviceNotFound
        absent:   usize,
        opens:    usize,
        reads:    usize,
        releases: usize,
    }

    /// Counters shared with the test body.
    #[derive(Clone)]
    pub struct Probe(Arc<Mutex<Shared>>);

    impl Probe {
        pub fn opens(&self)    -> usize { self.0.lock().unwrap().opens }
        pub fn reads(&self)    -> usize { self.0.lock().unwrap().reads }
        pub fn releases(&self) -> usize { self.0.lock().unwrap().releases }
        pub fn remaining(&self) -> usize { self.0.lock().unwrap().steps.len() }
    }

    pub struct ScriptedBackend(Arc<Mutex<Shared>>);

    impl ScriptedBackend {
        pub fn new(steps: Vec<Step>) -> (Self, Probe) {
            Self::with_absent(0, steps)
        }

        /// Device never appears
        pub fn absent() -> (Self, Probe) {
            Self::with_absent(usize::MAX, vec![])
        }

        /// Device missing for the first `absent` open attempts
        pub fn with_absent(absent: usize, steps: Vec<Step>) -> (Self, Probe) {
            let shared = Arc::new(Mutex::new(Shared {
                steps: steps.into(),
                absent,
                ..Default::default()
            }));
            (Self(Arc::clone(&shared)), Probe(shared))
        }
    }

    impl UsbBackend for ScriptedBackend {
        fn open(&mut self) -> Result<Box<dyn InterruptLink>, ScanError> {
            let mut s = self.0.lock().unwrap();
            s.opens += 1;
            if s.absent > 0 {
                s.absent -= 1;
                return Err(ScanError::DeviceNotFound { vid: 0x05e0, pid: 0x1200 });
            }
            Ok(Box::new(ScriptedLink(Arc::clone(&self.0))))
        }

        fn describe(&self) -> String { "scripted".into() }
    }

    struct ScriptedLink(Arc<Mutex<Shared>>);

    impl InterruptLink for ScriptedLink {
        fn read(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<usize, ScanError> {
            let mut s = self.0.lock().unwrap();
            s.reads += 1;
            match s.steps.pop_front() {
                Some(Step::Keys(modifier, keys)) => {
                    let mut report = [0u8; 8];
                    report[0] = modifier;
                    for (slot, k) in report[2..].iter_mut().zip(keys) { *slot = k; }
                    buf[..8].copy_from_slice(&report);
                    Ok(8)
                }
                Some(Step::Fail) => Err(ScanError::TransferError("pipe error".into())),
                Some(Step::Timeout) | None => Err(ScanError::TransferTimeout),
            }
        }

        fn endpoint(&self) -> u8 { 0x81 }
    }

    impl Drop for ScriptedLink {
        fn drop(&mut self) {
            if let Ok(mut s) = self.0.lock() { s.releases += 1; }
        }
    }
}
