//! Session configuration

use crate::error::VsdlError;
use crate::native::{EmbeddedLibrary, LibrarySource, Size};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Receives session diagnostics instead of the `log` facade.
pub type LogSink = Arc<dyn Fn(log::Level, &str) + Send + Sync>;

pub const DEFAULT_WINDOW_SIZE: Size = Size::new(640, 480);

/// Options for [`Session::initialize`](crate::Session::initialize).
#[derive(Clone)]
pub struct Config {
    library: LibrarySource,
    logger: Option<LogSink>,
    window_size: Size,
    logical_size: Option<Size>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            library: LibrarySource::Default,
            logger: None,
            window_size: DEFAULT_WINDOW_SIZE,
            logical_size: None,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the native library from this path.
    pub fn with_library(mut self, path: impl Into<PathBuf>) -> Self {
        self.library = LibrarySource::Path(path.into());
        self
    }

    /// Load the native library from an in-memory payload.
    pub fn with_embedded_library(mut self, library: EmbeddedLibrary) -> Self {
        self.library = LibrarySource::Embedded(library);
        self
    }

    pub fn with_logger<F>(mut self, sink: F) -> Self
    where
        F: Fn(log::Level, &str) + Send + Sync + 'static,
    {
        self.logger = Some(Arc::new(sink));
        self
    }

    pub fn with_window_size(mut self, size: impl Into<Size>) -> Self {
        self.window_size = size.into();
        self
    }

    /// Render at this resolution and let the renderer scale it to the window.
    pub fn with_logical_size(mut self, size: impl Into<Size>) -> Self {
        self.logical_size = Some(size.into());
        self
    }

    /// Apply persisted settings on top of this config.
    pub fn from_settings(settings: &Settings) -> Self {
        let mut config = Config::new().with_window_size(settings.window_size);
        if let Some(path) = &settings.library_path {
            config = config.with_library(path);
        }
        if let Some(size) = settings.logical_size {
            config = config.with_logical_size(size);
        }
        config
    }

    pub fn library(&self) -> &LibrarySource {
        &self.library
    }

    pub fn logger(&self) -> Option<&LogSink> {
        self.logger.as_ref()
    }

    pub fn window_size(&self) -> Size {
        self.window_size
    }

    pub fn logical_size(&self) -> Option<Size> {
        self.logical_size
    }

    /// Size of presented frames: the logical size when set, else the window size.
    pub fn back_buffer_size(&self) -> Size {
        self.logical_size.unwrap_or(self.window_size)
    }

    pub fn validate(&self) -> Result<(), VsdlError> {
        check_size("window size", self.window_size)?;
        if let Some(size) = self.logical_size {
            check_size("logical size", size)?;
        }
        Ok(())
    }
}

fn check_size(what: &str, size: Size) -> Result<(), VsdlError> {
    let limit = i32::MAX as u32;
    if size.is_empty() || size.width > limit || size.height > limit {
        return Err(VsdlError::Config(format!("invalid {} {}", what, size)));
    }
    Ok(())
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("library", &self.library)
            .field("logger", &self.logger.is_some())
            .field("window_size", &self.window_size)
            .field("logical_size", &self.logical_size)
            .finish()
    }
}

/// Persisted viewer settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Native library to load instead of the platform default.
    pub library_path: Option<PathBuf>,
    pub window_size: Size,
    pub logical_size: Option<Size>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            library_path: None,
            window_size: DEFAULT_WINDOW_SIZE,
            logical_size: None,
        }
    }
}

impl Settings {
    /// Load from config file, or return default if missing or unreadable
    pub fn load(path: &Path) -> Self {
        fs::read_to_string(path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Save to config file
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::new();
        assert_eq!(config.window_size(), Size::new(640, 480));
        assert_eq!(config.back_buffer_size(), Size::new(640, 480));
        assert!(matches!(config.library(), LibrarySource::Default));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_logical_size_sets_back_buffer() {
        let config = Config::new()
            .with_window_size((1280, 720))
            .with_logical_size((320, 180));
        assert_eq!(config.window_size(), Size::new(1280, 720));
        assert_eq!(config.back_buffer_size(), Size::new(320, 180));
    }

    #[test]
    fn test_validate_rejects_bad_sizes() {
        let zero = Config::new().with_window_size((0, 480));
        assert!(matches!(zero.validate(), Err(VsdlError::Config(_))));

        let huge = Config::new().with_logical_size((u32::MAX, 10));
        let err = huge.validate().unwrap_err();
        assert!(err.to_string().contains("logical size"));
    }

    #[test]
    fn test_settings_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vsdl").join("viewer.json");

        let settings = Settings {
            library_path: Some(PathBuf::from("/opt/sdl/libSDL2.so")),
            window_size: Size::new(800, 600),
            logical_size: Some(Size::new(400, 300)),
        };
        settings.save(&path).unwrap();
        assert_eq!(Settings::load(&path), settings);

        let config = Config::from_settings(&settings);
        assert_eq!(config.back_buffer_size(), Size::new(400, 300));
        assert!(matches!(config.library(), LibrarySource::Path(p) if p.ends_with("libSDL2.so")));
    }

    #[test]
    fn test_settings_fall_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Settings::load(&dir.path().join("missing.json")), Settings::default());

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{ not json").unwrap();
        assert_eq!(Settings::load(&broken), Settings::default());

        let partial = dir.path().join("partial.json");
        fs::write(&partial, r#"{ "logical_size": { "width": 160, "height": 120 } }"#).unwrap();
        let settings = Settings::load(&partial);
        assert_eq!(settings.window_size, DEFAULT_WINDOW_SIZE);
        assert_eq!(settings.logical_size, Some(Size::new(160, 120)));
    }
}
