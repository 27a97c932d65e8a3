//! Windows error code handling utilities

use std::fmt;

/// Win32 error codes seen at the process/memory boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Success,
    AccessDenied,
    InvalidHandle,
    NoMoreFiles,
    InvalidParameter,
    InsufficientBuffer,
    PartialCopy,
    InvalidAddress,
    NoAccess,
    Other(u32),
}

impl From<u32> for ErrorCode {
    fn from(code: u32) -> Self {
        match code {
            0 => ErrorCode::Success,
            5 => ErrorCode::AccessDenied,
            6 => ErrorCode::InvalidHandle,
            18 => ErrorCode::NoMoreFiles,
            87 => ErrorCode::InvalidParameter,
            122 => ErrorCode::InsufficientBuffer,
            299 => ErrorCode::PartialCopy,
            487 => ErrorCode::InvalidAddress,
            998 => ErrorCode::NoAccess,
            _ => ErrorCode::Other(code),
        }
    }
}

impl From<ErrorCode> for u32 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

impl ErrorCode {
    /// Raw Win32 error value
    pub fn code(&self) -> u32 {
        match self {
            ErrorCode::Success => 0,
            ErrorCode::AccessDenied => 5,
            ErrorCode::InvalidHandle => 6,
            ErrorCode::NoMoreFiles => 18,
            ErrorCode::InvalidParameter => 87,
            ErrorCode::InsufficientBuffer => 122,
            ErrorCode::PartialCopy => 299,
            ErrorCode::InvalidAddress => 487,
            ErrorCode::NoAccess => 998,
            ErrorCode::Other(code) => *code,
        }
    }

    /// Get the calling thread's last Windows error
    #[cfg(windows)]
    pub fn last_error() -> Self {
        unsafe { ErrorCode::from(winapi::um::errhandlingapi::GetLastError()) }
    }

    /// Message text the system associates with this code
    #[cfg(windows)]
    pub fn system_message(&self) -> String {
        ::windows::core::HRESULT::from_win32(self.code())
            .message()
            .to_string_lossy()
            .trim_end()
            .to_string()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCode::Success => "Success",
            ErrorCode::AccessDenied => "Access denied",
            ErrorCode::InvalidHandle => "Invalid handle",
            ErrorCode::NoMoreFiles => "No more files",
            ErrorCode::InvalidParameter => "Invalid parameter",
            ErrorCode::InsufficientBuffer => "Insufficient buffer",
            ErrorCode::PartialCopy => "Partial copy",
            ErrorCode::InvalidAddress => "Invalid address",
            ErrorCode::NoAccess => "Invalid access to memory location",
            ErrorCode::Other(_) => "OS error",
        };
        write!(f, "{} ({})", name, self.code())
    }
}
