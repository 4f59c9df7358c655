//! Bundled resource lookup
//!
//! The installer places `sticker.png` and `sticker.ico` beside the
//! executable. During development they live in `assets/` or the working
//! directory, so those are searched too.

use std::path::{Path, PathBuf};

use log::debug;

pub const STICKER_IMAGE: &str = "sticker.png";
pub const APP_ICON: &str = "sticker.ico";

/// Directories searched for bundled resources, most specific first
pub fn search_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        dirs.push(exe_dir.join("assets"));
        dirs.push(exe_dir);
    }
    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd.join("assets"));
        dirs.push(cwd);
    }
    dirs
}

/// First existing file called `name` in `dirs`
pub fn find_in(dirs: &[PathBuf], name: &str) -> Option<PathBuf> {
    dirs.iter().map(|dir| dir.join(name)).find(|path| {
        debug!("Looking for {} at {}", name, path.display());
        path.is_file()
    })
}

/// Path of the bundled sticker image, if it is installed
pub fn bundled_image_path() -> Option<PathBuf> {
    find_in(&search_dirs(), STICKER_IMAGE)
}

/// Path of the application icon, if it is installed
pub fn bundled_icon_path() -> Option<PathBuf> {
    find_in(&search_dirs(), APP_ICON)
}
