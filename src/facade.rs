//! Engine facade
//!
//! Owns at most one engine instance and forwards every call to it. The
//! instance lives behind a mutex, so lifecycle changes and recognition calls
//! from different threads are serialized.

use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::engine::{AlprEngine, BackendFactory, EngineError, EngineFactory, EngineOptions};
use crate::results::AlprResults;

/// Errors returned by [`AlprFacade`] operations
#[derive(Debug, Error)]
pub enum FacadeError {
    #[error("ALPR engine is not initialized")]
    NotInitialized,
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Single-instance front for a recognition engine
pub struct AlprFacade {
    factory: Arc<dyn EngineFactory>,
    engine: Mutex<Option<Box<dyn AlprEngine>>>,
}

impl AlprFacade {
    /// Create an uninitialized facade that builds engines with `factory`
    pub fn new(factory: impl EngineFactory + 'static) -> Self {
        Self::with_shared_factory(Arc::new(factory))
    }

    pub fn with_shared_factory(factory: Arc<dyn EngineFactory>) -> Self {
        Self {
            factory,
            engine: Mutex::new(None),
        }
    }

    /// Create an uninitialized facade for the configured backend
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(BackendFactory::new(config.engine.backend, config.mock.clone()))
    }

    /// Initialize from `[engine]` and apply the `[recognition]` knobs
    pub fn initialize_from_config(&self, config: &AppConfig) -> Result<(), FacadeError> {
        self.initialize(&config.engine.options())?;

        if !self.is_loaded() {
            warn!(
                config_file = ?config.engine.config_file,
                runtime_dir = ?config.engine.runtime_dir,
                "Engine did not finish loading"
            );
        }

        let knobs = &config.recognition;
        if let Some(region) = &knobs.default_region {
            self.set_default_region(region)?;
        }
        if knobs.detect_region {
            self.set_detect_region(true)?;
        }
        if let Some(top_n) = knobs.top_n {
            self.set_top_n(top_n)?;
        }

        Ok(())
    }

    /// Construct the engine. A previous instance is released first, so a
    /// failed construction leaves the facade uninitialized.
    pub fn initialize(&self, options: &EngineOptions) -> Result<(), FacadeError> {
        let mut slot = self.engine.lock();

        if let Some(previous) = slot.take() {
            warn!(backend = previous.name(), "Re-initializing; releasing previous engine instance");
            drop(previous);
        }

        let engine = self.factory.create(options)?;
        info!(
            backend = engine.name(),
            region = %options.region,
            config_file = ?options.config_file,
            runtime_dir = ?options.runtime_dir,
            loaded = engine.is_loaded(),
            "ALPR engine initialized"
        );
        *slot = Some(engine);

        Ok(())
    }

    /// Release the engine. Does nothing when no instance exists.
    pub fn dispose(&self) {
        if let Some(engine) = self.engine.lock().take() {
            info!(backend = engine.name(), "ALPR engine disposed");
        }
    }

    /// Whether an instance exists and reports itself ready
    pub fn is_loaded(&self) -> bool {
        self.engine
            .lock()
            .as_ref()
            .map(|engine| engine.is_loaded())
            .unwrap_or(false)
    }

    pub fn recognize_file(&self, path: &Path) -> Result<AlprResults, FacadeError> {
        let results = self.with_engine(|engine| engine.recognize_file(path))?;
        debug!(
            ?path,
            plates = results.results.len(),
            width = results.img_width,
            height = results.img_height,
            "Recognized image file"
        );
        Ok(results)
    }

    /// Recognize an encoded image. The buffer is only borrowed for the call.
    pub fn recognize_bytes(&self, bytes: &[u8]) -> Result<AlprResults, FacadeError> {
        let results = self.with_engine(|engine| engine.recognize_bytes(bytes))?;
        debug!(
            len = bytes.len(),
            plates = results.results.len(),
            width = results.img_width,
            height = results.img_height,
            "Recognized image buffer"
        );
        Ok(results)
    }

    pub fn set_default_region(&self, region: &str) -> Result<(), FacadeError> {
        self.with_engine(|engine| engine.set_default_region(region))?;
        debug!(region, "Default region set");
        Ok(())
    }

    pub fn set_detect_region(&self, detect: bool) -> Result<(), FacadeError> {
        self.with_engine(|engine| engine.set_detect_region(detect))?;
        debug!(detect, "Region detection toggled");
        Ok(())
    }

    pub fn set_top_n(&self, top_n: u32) -> Result<(), FacadeError> {
        self.with_engine(|engine| engine.set_top_n(top_n))?;
        debug!(top_n, "Top-N set");
        Ok(())
    }

    pub fn version(&self) -> Result<String, FacadeError> {
        self.with_engine(|engine| engine.version())
    }

    fn with_engine<T>(
        &self,
        f: impl FnOnce(&mut dyn AlprEngine) -> Result<T, EngineError>,
    ) -> Result<T, FacadeError> {
        let mut slot = self.engine.lock();
        let engine = slot.as_deref_mut().ok_or(FacadeError::NotInitialized)?;
        Ok(f(engine)?)
    }
}

impl Drop for AlprFacade {
    fn drop(&mut self) {
        self.dispose();
    }
}
