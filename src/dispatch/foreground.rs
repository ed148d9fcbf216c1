// src/dispatch/foreground.rs  —  Title of the focused window
//
// Windows: GetForegroundWindow + GetWindowTextW.
// Elsewhere there is no portable query; the title is reported as unknown and
// the auto-mode table simply never matches.

pub trait ForegroundWindow: Send {
    /// `None` when no window has focus or the platform can't tell.
    fn title(&self) -> Option<String>;
}

pub struct SystemForeground;

#[cfg(target_os = "windows")]
impl ForegroundWindow for SystemForeground {
    fn title(&self) -> Option<String> {
        use windows::Win32::UI::WindowsAndMessaging::{GetForegroundWindow, GetWindowTextW};

        let mut buffer = vec![0u16; 512];
        // SAFETY: plain Win32 queries; the buffer outlives the call.
        let len = unsafe {
            let hwnd = GetForegroundWindow();
            if hwnd.0.is_null() {
                return None;
            }
            GetWindowTextW(hwnd, &mut buffer)
        };
        if len <= 0 {
            return None;
        }
        Some(String::from_utf16_lossy(&buffer[..len as usize]))
    }
}

#[cfg(not(target_os = "windows"))]
impl ForegroundWindow for SystemForeground {
    fn title(&self) -> Option<String> { None }
}
