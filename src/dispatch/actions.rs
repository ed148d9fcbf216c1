// src/dispatch/actions.rs  —  Actions trait + system backend (browser, keystrokes)
use anyhow::{Context, Result};

/// Outward-facing effects of a dispatched barcode
pub trait Actions: Send {
    /// Open a URL in the default browser
    fn open_url(&mut self, url: &str) -> Result<()>;
    /// Type `text` into the focused window, followed by Enter
    fn type_text(&mut self, text: &str) -> Result<()>;
}

/// Default browser via `open`, keystrokes via `enigo` (feature "keystrokes").
///
/// The enigo handle wraps a display connection that must not cross threads,
/// so one is opened per typed barcode on the scan thread.
pub struct SystemActions;

impl Actions for SystemActions {
    fn open_url(&mut self, url: &str) -> Result<()> {
        open::that(url).with_context(|| format!("Opening {url} in the browser"))
    }

    #[cfg(feature = "keystrokes")]
    fn type_text(&mut self, text: &str) -> Result<()> {
        use enigo::{Enigo, Key, KeyboardControllable};
        let mut enigo = Enigo::new();
        enigo.key_sequence(text);
        enigo.key_click(Key::Return);
        Ok(())
    }

    #[cfg(not(feature = "keystrokes"))]
    fn type_text(&mut self, text: &str) -> Result<()> {
        anyhow::bail!("keyboard mode needs the \"keystrokes\" feature — cannot type {text:?}")
    }
}

/// Null backend for --dry-run: logs what would happen
pub struct NullActions;

impl Actions for NullActions {
    fn open_url(&mut self, url: &str) -> Result<()> {
        log::info!("[dispatch] (null) would open {url}");
        Ok(())
    }
    fn type_text(&mut self, text: &str) -> Result<()> {
        log::info!("[dispatch] (null) would type {text:?}");
        Ok(())
    }
}
