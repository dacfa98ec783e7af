//! OS clipboard change counter
//!
//! macOS bumps `NSPasteboard.changeCount` and Windows bumps the clipboard
//! sequence number on every write, including a write of identical content.
//! X11 and Wayland expose no such counter, so identical re-copies there stay
//! invisible.

/// Current change counter, or `None` when the platform has none
#[cfg(target_os = "macos")]
pub fn clipboard_change_count() -> Option<u64> {
    use cocoa::base::{id, nil};
    use objc::{class, msg_send, sel, sel_impl};

    #[link(name = "AppKit", kind = "framework")]
    extern "C" {}

    unsafe {
        let pasteboard: id = msg_send![class!(NSPasteboard), generalPasteboard];
        if pasteboard == nil {
            return None;
        }
        let count: isize = msg_send![pasteboard, changeCount];
        u64::try_from(count).ok()
    }
}

/// Current change counter, or `None` when the platform has none
#[cfg(windows)]
pub fn clipboard_change_count() -> Option<u64> {
    #[link(name = "user32")]
    extern "system" {
        fn GetClipboardSequenceNumber() -> u32;
    }

    // 0 means the window station has no clipboard access
    match unsafe { GetClipboardSequenceNumber() } {
        0 => None,
        count => Some(u64::from(count)),
    }
}

/// Current change counter, or `None` when the platform has none
#[cfg(not(any(target_os = "macos", windows)))]
pub fn clipboard_change_count() -> Option<u64> {
    None
}
