//! Output locations and hand-off to the operating system

use std::path::{Path, PathBuf};
use std::process::Command;

use glob::glob;
use log::{info, warn};

use crate::error::{Error, Result};

pub const APP_DIR_NAME: &str = "Sticker Generator";
pub const OUTPUT_DIR_NAME: &str = "Output";
pub const LOG_FILE_NAME: &str = "sticker_generator.log";

/// Per-user application directory: `<Documents>/Sticker Generator`
///
/// Falls back to the home directory, then the working directory, when no
/// documents folder is known.
pub fn app_data_dir() -> PathBuf {
    let base = directories::UserDirs::new().map(|dirs| {
        dirs.document_dir()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| dirs.home_dir().join("Documents"))
    });
    base.unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

/// Where generated documents go unless the user picks a path
pub fn default_output_dir() -> PathBuf {
    app_data_dir().join(OUTPUT_DIR_NAME)
}

pub fn log_file_path() -> PathBuf {
    app_data_dir().join(LOG_FILE_NAME)
}

/// Replace characters that are not allowed in Windows or Unix filenames
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// Result of deleting generated documents
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PurgeReport {
    pub deleted: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

/// Delete every `.docx` file directly inside `dir`
pub fn purge_documents(dir: &Path) -> Result<PurgeReport> {
    let mut report = PurgeReport::default();
    if !dir.is_dir() {
        return Ok(report);
    }

    let escaped = glob::Pattern::escape(&dir.to_string_lossy());
    let pattern = format!("{}/*.docx", escaped);
    let entries = glob(&pattern).map_err(|e| Error::InvalidInput(e.to_string()))?;

    for entry in entries {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        match std::fs::remove_file(&path) {
            Ok(()) => {
                info!("Deleted: {}", path.display());
                report.deleted.push(path);
            }
            Err(e) => {
                warn!("Failed to delete {}: {}", path.display(), e);
                report.failed.push((path, e.to_string()));
            }
        }
    }

    Ok(report)
}

/// Open a file with the system default application
pub fn open_file(path: &Path) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        Command::new("open").arg(path).spawn()?;
    }
    #[cfg(all(unix, not(target_os = "macos")))]
    {
        Command::new("xdg-open").arg(path).spawn()?;
    }
    #[cfg(target_os = "windows")]
    {
        Command::new("cmd")
            .args(["/C", "start", "", &path.display().to_string()])
            .spawn()?;
    }
    info!("Opened {}", path.display());
    Ok(())
}

/// Send a file to the default printer
pub fn print_file(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        Command::new("lp").arg(path).spawn()?;
    }
    #[cfg(target_os = "windows")]
    {
        Command::new("powershell")
            .args([
                "-NoProfile",
                "-Command",
                "Start-Process",
                "-FilePath",
                &format!("'{}'", path.display().to_string().replace('\'', "''")),
                "-Verb",
                "Print",
            ])
            .spawn()?;
    }
    info!("Sent {} to the default printer", path.display());
    Ok(())
}
