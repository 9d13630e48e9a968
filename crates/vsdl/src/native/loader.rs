//! Locating and loading the native SDL2 library.

use super::sdl2::Sdl2;
use crate::error::VsdlError;
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Names tried, in order, when no library is configured.
#[cfg(target_os = "windows")]
pub const DEFAULT_LIBRARY_NAMES: &[&str] = &["SDL2.dll"];
#[cfg(target_os = "macos")]
pub const DEFAULT_LIBRARY_NAMES: &[&str] = &["libSDL2-2.0.0.dylib", "libSDL2.dylib"];
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
pub const DEFAULT_LIBRARY_NAMES: &[&str] = &["libSDL2-2.0.so.0", "libSDL2.so"];

/// A library binary shipped inside the application.
#[derive(Clone, Copy)]
pub struct EmbeddedLibrary {
    /// Architecture the binary was built for, as in `std::env::consts::ARCH`.
    pub arch: &'static str,
    pub file_name: &'static str,
    pub bytes: &'static [u8],
}

impl std::fmt::Debug for EmbeddedLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddedLibrary")
            .field("arch", &self.arch)
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Where the native library comes from.
#[derive(Clone, Debug, Default)]
pub enum LibrarySource {
    Path(PathBuf),
    /// Written to a private temporary directory, removed on unload.
    Embedded(EmbeddedLibrary),
    /// First of [`DEFAULT_LIBRARY_NAMES`] the system loader finds.
    #[default]
    Default,
}

/// Load the library and resolve every proc the session uses.
pub fn load(source: &LibrarySource) -> Result<Sdl2, VsdlError> {
    match source {
        LibrarySource::Path(path) => Sdl2::open(path, None),
        LibrarySource::Embedded(library) => {
            let (dir, path) = extract(library)?;
            Sdl2::open(&path, Some(dir))
        }
        LibrarySource::Default => load_default(),
    }
}

fn load_default() -> Result<Sdl2, VsdlError> {
    let mut last_err = None;
    for name in DEFAULT_LIBRARY_NAMES {
        match Sdl2::open(Path::new(name), None) {
            Ok(sdl) => return Ok(sdl),
            Err(e) => {
                debug!("{} not loadable: {}", name, e);
                last_err = Some(e);
            }
        }
    }
    Err(last_err.unwrap_or_else(|| VsdlError::Config("no default library names".to_string())))
}

/// Write an embedded payload into a fresh temporary directory.
pub(crate) fn extract(library: &EmbeddedLibrary) -> Result<(TempDir, PathBuf), VsdlError> {
    if library.arch != std::env::consts::ARCH {
        return Err(VsdlError::Unsupported(format!(
            "embedded library is built for {}, this CPU is {}",
            library.arch,
            std::env::consts::ARCH
        )));
    }

    let file_name = Path::new(library.file_name);
    if library.file_name.is_empty() || file_name.file_name() != Some(file_name.as_os_str()) {
        return Err(VsdlError::Config(format!(
            "embedded library name {:?} is not a plain file name",
            library.file_name
        )));
    }

    let dir = tempfile::Builder::new().prefix("vsdl-").tempdir()?;
    let path = dir.path().join(file_name);
    fs::write(&path, library.bytes)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(e) = fs::set_permissions(&path, fs::Permissions::from_mode(0o755)) {
            warn!("could not mark {} executable: {}", path.display(), e);
        }
    }

    debug!(
        "extracted {} ({} bytes) to {}",
        library.file_name,
        library.bytes.len(),
        path.display()
    );
    Ok((dir, path))
}
