#[cfg(target_os = "windows")]
pub mod windows;

use std::io;
use std::path::PathBuf;

/// Lists the filesystem roots available on this machine, in the order the OS
/// reports them. An error here is fatal to a scan: with no roots there is
/// nothing meaningful to traverse.
#[cfg(target_os = "windows")]
pub fn enumerate_roots() -> io::Result<Vec<PathBuf>> {
    windows::enumerate_drive_roots()
}

#[cfg(not(target_os = "windows"))]
pub fn enumerate_roots() -> io::Result<Vec<PathBuf>> {
    Ok(vec![PathBuf::from("/")])
}
