use std::ffi::OsString;
use std::io;
use std::os::windows::ffi::OsStringExt;
use std::path::PathBuf;
use winapi::um::fileapi::GetLogicalDriveStringsW;

/// Queries the logical drive roots ("C:\", "D:\", ...) via the Win32 API.
/// The buffer holds the double-null-terminated list of drive strings; 26
/// drives fit comfortably in 512 UTF-16 units.
pub fn enumerate_drive_roots() -> io::Result<Vec<PathBuf>> {
    let mut buffer = [0u16; 512];
    let len = unsafe { GetLogicalDriveStringsW(buffer.len() as u32, buffer.as_mut_ptr()) };
    if len == 0 || len as usize > buffer.len() {
        return Err(io::Error::last_os_error());
    }

    let mut roots = Vec::new();
    for drive in buffer[..len as usize].split(|&unit| unit == 0) {
        if !drive.is_empty() {
            roots.push(PathBuf::from(OsString::from_wide(drive)));
        }
    }
    Ok(roots)
}
