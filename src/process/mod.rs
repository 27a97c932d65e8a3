//! Process discovery, module resolution and handle ownership

pub mod handle;
pub mod locator;
pub mod modules;

pub use handle::{ProcessAccess, ProcessHandle};
pub use locator::{
    enumerate_processes, find_pid_by_name, find_pid_by_window, find_process_by_name,
};
pub use modules::{enumerate_modules, find_module, resolve_base_address, resolve_module_info};
