//! User32.dll bindings for window lookup

use crate::windows::utils::string_to_wide;
use std::ptr;
use winapi::shared::windef::HWND;
use winapi::um::winuser::{FindWindowW, GetWindowThreadProcessId};

/// Top-level window whose title is exactly `title`, any class
pub fn find_window(title: &str) -> Option<HWND> {
    let title = string_to_wide(title);
    let window = unsafe { FindWindowW(ptr::null(), title.as_ptr()) };
    (!window.is_null()).then_some(window)
}

/// Process that created `window`, `None` if the window is gone
pub fn window_process_id(window: HWND) -> Option<u32> {
    let mut pid = 0;
    let thread = unsafe { GetWindowThreadProcessId(window, &mut pid) };
    (thread != 0 && pid != 0).then_some(pid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_missing_window() {
        assert!(find_window("procmem: no window has this title").is_none());
    }
}
