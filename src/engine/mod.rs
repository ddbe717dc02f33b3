//! Recognition Engine Layer
//!
//! The external plate recognition engine is reached only through the
//! [`AlprEngine`] trait. Backends:
//! - Simulated engine with scripted readings (always available)
//! - OpenALPR via its C API (`openalpr` feature)

mod error;
pub mod mock;
#[cfg(feature = "openalpr")]
pub mod openalpr;

pub use error::EngineError;
pub use mock::{MockCandidate, MockEngine, MockPlate, MockSettings};
#[cfg(feature = "openalpr")]
pub use openalpr::OpenAlprEngine;

use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::{Path, PathBuf};

use crate::results::AlprResults;

/// Construction parameters shared by every backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Region profile, e.g. "us" or "eu"
    pub region: String,
    /// Engine configuration file
    pub config_file: PathBuf,
    /// Directory holding the engine's runtime data
    pub runtime_dir: PathBuf,
}

impl EngineOptions {
    pub fn new(
        region: impl Into<String>,
        config_file: impl Into<PathBuf>,
        runtime_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            region: region.into(),
            config_file: config_file.into(),
            runtime_dir: runtime_dir.into(),
        }
    }
}

/// Width and height of an encoded image, read from its header only
pub fn image_dimensions(bytes: &[u8]) -> Result<(u32, u32), EngineError> {
    let decode_error = |message: String| EngineError::Decode {
        len: bytes.len(),
        message,
    };

    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| decode_error(e.to_string()))?
        .into_dimensions()
        .map_err(|e| decode_error(e.to_string()))
}

/// A live recognition engine instance.
///
/// Calls are serialized by the facade, so implementations only need to be
/// `Send`.
pub trait AlprEngine: Send {
    fn name(&self) -> &'static str;

    /// Whether the instance finished loading its configuration and runtime data
    fn is_loaded(&self) -> bool;

    /// Recognize plates in an encoded image (JPEG, PNG, ...)
    fn recognize_bytes(&mut self, bytes: &[u8]) -> Result<AlprResults, EngineError>;

    /// Recognize plates in an image file
    fn recognize_file(&mut self, path: &Path) -> Result<AlprResults, EngineError> {
        let bytes = std::fs::read(path).map_err(|source| EngineError::ReadImage {
            path: path.to_path_buf(),
            source,
        })?;
        self.recognize_bytes(&bytes)
    }

    fn set_default_region(&mut self, region: &str) -> Result<(), EngineError>;

    fn set_detect_region(&mut self, detect: bool) -> Result<(), EngineError>;

    fn set_top_n(&mut self, top_n: u32) -> Result<(), EngineError>;

    fn version(&self) -> Result<String, EngineError>;
}

/// Builds engine instances for the facade
pub trait EngineFactory: Send + Sync {
    fn create(&self, options: &EngineOptions) -> Result<Box<dyn AlprEngine>, EngineError>;
}

impl<F> EngineFactory for F
where
    F: Fn(&EngineOptions) -> Result<Box<dyn AlprEngine>, EngineError> + Send + Sync,
{
    fn create(&self, options: &EngineOptions) -> Result<Box<dyn AlprEngine>, EngineError> {
        self(options)
    }
}

/// Engine backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineBackend {
    /// Simulated engine with scripted readings
    #[default]
    Mock,
    /// System libopenalpr
    #[serde(rename = "openalpr")]
    OpenAlpr,
}

/// Factory for the configured backend
#[derive(Debug, Clone, Default)]
pub struct BackendFactory {
    backend: EngineBackend,
    mock: MockSettings,
}

impl BackendFactory {
    pub fn new(backend: EngineBackend, mock: MockSettings) -> Self {
        Self { backend, mock }
    }

}

impl EngineFactory for BackendFactory {
    fn create(&self, options: &EngineOptions) -> Result<Box<dyn AlprEngine>, EngineError> {
        match self.backend {
            EngineBackend::Mock => Ok(Box::new(MockEngine::new(options, self.mock.clone())?)),
            #[cfg(feature = "openalpr")]
            EngineBackend::OpenAlpr => Ok(Box::new(OpenAlprEngine::new(options)?)),
            #[cfg(not(feature = "openalpr"))]
            EngineBackend::OpenAlpr => Err(EngineError::construction(
                "the openalpr backend was not compiled in (enable the `openalpr` feature)",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_serde_names() {
        #[derive(Deserialize)]
        struct Wrapper {
            backend: EngineBackend,
        }

        let mock: Wrapper = toml::from_str("backend = \"mock\"").unwrap();
        assert_eq!(mock.backend, EngineBackend::Mock);

        let native: Wrapper = toml::from_str("backend = \"openalpr\"").unwrap();
        assert_eq!(native.backend, EngineBackend::OpenAlpr);
    }

    #[test]
    fn test_image_dimensions_from_header() {
        let bytes = mock::tests::png_bytes(640, 360);
        assert_eq!(image_dimensions(&bytes).unwrap(), (640, 360));
    }

    #[test]
    fn test_image_dimensions_rejects_unknown_format() {
        let result = image_dimensions(b"GIF? no, just text");
        assert!(matches!(result, Err(EngineError::Decode { len: 18, .. })));

        let result = image_dimensions(&[]);
        assert!(matches!(result, Err(EngineError::Decode { len: 0, .. })));
    }

    #[test]
    fn test_closure_factory() {
        let factory = |_: &EngineOptions| -> Result<Box<dyn AlprEngine>, EngineError> {
            Err(EngineError::construction("no engine today"))
        };
        let options = EngineOptions::new("us", "/nonexistent.conf", "/nonexistent");

        let err = factory.create(&options).err().unwrap();
        assert!(err.to_string().contains("no engine today"));
    }

    #[cfg(not(feature = "openalpr"))]
    #[test]
    fn test_openalpr_backend_requires_feature() {
        let factory = BackendFactory::new(EngineBackend::OpenAlpr, MockSettings::default());
        let options = EngineOptions::new("us", "/etc/openalpr/openalpr.conf", "/usr/share/openalpr");

        let result = factory.create(&options);
        assert!(matches!(result, Err(EngineError::Construction { .. })));
    }
}
