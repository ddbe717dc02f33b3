//! Simulated recognition engine
//!
//! Reads the incoming image header to learn its dimensions and replays a scripted
//! list of plate readings. It follows the same loading rules and knob
//! semantics as the native engine, which makes it usable for tests and for
//! exercising scripts on machines without libopenalpr.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{image_dimensions, AlprEngine, EngineError, EngineOptions};
use crate::results::{AlprResults, PlateCandidate, PlatePoint, PlateResult, RegionOfInterest};

/// Top-N used until the caller sets one
pub const DEFAULT_TOP_N: u32 = 10;

/// Scripted behaviour of the simulated engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MockSettings {
    /// Value reported as `epoch_time` in every result
    pub epoch_time: u64,
    /// Plates "detected" in every image
    pub plates: Vec<MockPlate>,
}

/// A plate the simulated engine reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockPlate {
    /// Region the plate would be classified as when region detection is on
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub region_confidence: f64,
    /// Plate corners; the whole image when empty
    #[serde(default)]
    pub coordinates: Vec<(i32, i32)>,
    pub candidates: Vec<MockCandidate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockCandidate {
    pub plate: String,
    pub confidence: f64,
    #[serde(default)]
    pub matches_template: bool,
}

impl MockCandidate {
    pub fn new(plate: impl Into<String>, confidence: f64) -> Self {
        Self {
            plate: plate.into(),
            confidence,
            matches_template: false,
        }
    }
}

/// Simulated engine instance
#[derive(Debug)]
pub struct MockEngine {
    settings: MockSettings,
    loaded: bool,
    default_region: String,
    detect_region: bool,
    top_n: u32,
}

impl MockEngine {
    /// Create an instance. Like the native engine, a missing configuration
    /// file or runtime directory does not fail construction; the instance
    /// simply reports itself as not loaded.
    pub fn new(options: &EngineOptions, settings: MockSettings) -> Result<Self, EngineError> {
        if options.region.trim().is_empty() {
            return Err(EngineError::construction("region must not be empty"));
        }

        let loaded = options.config_file.is_file() && options.runtime_dir.is_dir();
        debug!(
            region = %options.region,
            loaded,
            plates = settings.plates.len(),
            "Simulated engine created"
        );

        Ok(Self {
            settings,
            loaded,
            default_region: String::new(),
            detect_region: false,
            top_n: DEFAULT_TOP_N,
        })
    }

    pub fn default_region(&self) -> &str {
        &self.default_region
    }

    pub fn detect_region(&self) -> bool {
        self.detect_region
    }

    pub fn top_n(&self) -> u32 {
        self.top_n
    }

    /// Best reading and candidate list for one plate, `None` when it has no candidates
    fn plate_result(&self, plate: &MockPlate, width: u32, height: u32) -> Option<PlateResult> {
        let mut candidates: Vec<PlateCandidate> = plate
            .candidates
            .iter()
            .map(|c| PlateCandidate {
                plate: c.plate.clone(),
                confidence: c.confidence,
                matches_template: c.matches_template,
            })
            .collect();
        candidates.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        candidates.truncate(self.top_n as usize);

        let best = candidates.first()?.clone();

        let (region, region_confidence) = if self.detect_region {
            (plate.region.clone(), plate.region_confidence)
        } else {
            (self.default_region.clone(), 0.0)
        };

        let coordinates = if plate.coordinates.is_empty() {
            let (w, h) = (width as i32, height as i32);
            vec![(0, 0), (w, 0), (w, h), (0, h)]
        } else {
            plate.coordinates.clone()
        };

        Some(PlateResult {
            plate: best.plate,
            confidence: best.confidence,
            matches_template: best.matches_template,
            plate_index: 0,
            region,
            region_confidence,
            processing_time_ms: 0.0,
            requested_topn: self.top_n,
            coordinates: coordinates
                .into_iter()
                .map(|(x, y)| PlatePoint { x, y })
                .collect(),
            candidates,
            extra: Default::default(),
        })
    }
}

impl AlprEngine for MockEngine {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn recognize_bytes(&mut self, bytes: &[u8]) -> Result<AlprResults, EngineError> {
        if !self.loaded {
            return Err(EngineError::NotLoaded);
        }

        let (width, height) = image_dimensions(bytes)?;

        let mut results = AlprResults::empty(width, height);
        results.epoch_time = self.settings.epoch_time;
        results.regions_of_interest.push(RegionOfInterest::full(width, height));
        results.results = self
            .settings
            .plates
            .iter()
            .filter_map(|plate| self.plate_result(plate, width, height))
            .enumerate()
            .map(|(index, mut result)| {
                result.plate_index = index as u32;
                result
            })
            .collect();

        Ok(results)
    }

    fn set_default_region(&mut self, region: &str) -> Result<(), EngineError> {
        self.default_region = region.to_string();
        Ok(())
    }

    fn set_detect_region(&mut self, detect: bool) -> Result<(), EngineError> {
        self.detect_region = detect;
        Ok(())
    }

    fn set_top_n(&mut self, top_n: u32) -> Result<(), EngineError> {
        self.top_n = top_n;
        Ok(())
    }

    fn version(&self) -> Result<String, EngineError> {
        Ok(format!("mock-{}", env!("CARGO_PKG_VERSION")))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, RgbImage};
    use std::io::Cursor;
    use tempfile::TempDir;

    /// Encode a blank PNG of the given size
    pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = DynamicImage::ImageRgb8(RgbImage::new(width, height));
        let mut buffer = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        buffer
    }

    /// Config file and runtime dir that satisfy the loading rules
    pub(crate) fn runtime_fixture() -> (TempDir, EngineOptions) {
        let dir = TempDir::new().unwrap();
        let config_file = dir.path().join("openalpr.conf");
        std::fs::write(&config_file, "[common]\n").unwrap();
        let runtime_dir = dir.path().join("runtime_data");
        std::fs::create_dir(&runtime_dir).unwrap();

        let options = EngineOptions::new("us", config_file, runtime_dir);
        (dir, options)
    }

    pub(crate) fn sample_settings() -> MockSettings {
        MockSettings {
            epoch_time: 1_700_000_000_000,
            plates: vec![MockPlate {
                region: "ca".to_string(),
                region_confidence: 87.5,
                coordinates: vec![(10, 20), (90, 20), (90, 45), (10, 45)],
                candidates: vec![
                    MockCandidate::new("7ABC12", 71.0),
                    MockCandidate {
                        plate: "7ABC123".to_string(),
                        confidence: 93.25,
                        matches_template: true,
                    },
                    MockCandidate::new("7A8C123", 64.5),
                ],
            }],
        }
    }

    #[test]
    fn test_empty_region_fails_construction() {
        let (_dir, mut options) = runtime_fixture();
        options.region = "  ".to_string();

        let result = MockEngine::new(&options, MockSettings::default());
        assert!(matches!(result, Err(EngineError::Construction { .. })));
    }

    #[test]
    fn test_missing_runtime_data_is_not_loaded() {
        let options = EngineOptions::new("us", "/nonexistent/openalpr.conf", "/nonexistent/runtime");
        let mut engine = MockEngine::new(&options, MockSettings::default()).unwrap();

        assert!(!engine.is_loaded());
        let result = engine.recognize_bytes(&png_bytes(8, 8));
        assert!(matches!(result, Err(EngineError::NotLoaded)));
    }

    #[test]
    fn test_recognize_reports_image_size() {
        let (_dir, options) = runtime_fixture();
        let mut engine = MockEngine::new(&options, MockSettings::default()).unwrap();

        let results = engine.recognize_bytes(&png_bytes(64, 32)).unwrap();
        assert_eq!((results.img_width, results.img_height), (64, 32));
        assert_eq!(results.regions_of_interest, vec![RegionOfInterest::full(64, 32)]);
        assert!(results.results.is_empty());
    }

    #[test]
    fn test_candidates_sorted_and_truncated() {
        let (_dir, options) = runtime_fixture();
        let mut engine = MockEngine::new(&options, sample_settings()).unwrap();
        assert_eq!(engine.top_n(), DEFAULT_TOP_N);
        engine.set_top_n(2).unwrap();
        assert_eq!(engine.top_n(), 2);

        let results = engine.recognize_bytes(&png_bytes(100, 50)).unwrap();
        let plate = &results.results[0];

        assert_eq!(plate.plate, "7ABC123");
        assert!(plate.matches_template);
        assert_eq!(plate.requested_topn, 2);
        let texts: Vec<_> = plate.candidates.iter().map(|c| c.plate.as_str()).collect();
        assert_eq!(texts, vec!["7ABC123", "7ABC12"]);
    }

    #[test]
    fn test_region_follows_detect_flag() {
        let (_dir, options) = runtime_fixture();
        let mut engine = MockEngine::new(&options, sample_settings()).unwrap();
        assert_eq!(engine.default_region(), "");
        assert!(!engine.detect_region());
        engine.set_default_region("md").unwrap();
        assert_eq!(engine.default_region(), "md");

        let results = engine.recognize_bytes(&png_bytes(100, 50)).unwrap();
        assert_eq!(results.results[0].region, "md");
        assert_eq!(results.results[0].region_confidence, 0.0);

        engine.set_detect_region(true).unwrap();
        assert!(engine.detect_region());
        let results = engine.recognize_bytes(&png_bytes(100, 50)).unwrap();
        assert_eq!(results.results[0].region, "ca");
        assert_eq!(results.results[0].region_confidence, 87.5);
    }

    #[test]
    fn test_plate_without_candidates_is_skipped() {
        let (_dir, options) = runtime_fixture();
        let settings = MockSettings {
            epoch_time: 0,
            plates: vec![MockPlate {
                region: String::new(),
                region_confidence: 0.0,
                coordinates: Vec::new(),
                candidates: Vec::new(),
            }],
        };
        let mut engine = MockEngine::new(&options, settings).unwrap();

        let results = engine.recognize_bytes(&png_bytes(10, 10)).unwrap();
        assert!(results.results.is_empty());
    }

    #[test]
    fn test_plate_index_counts_reported_plates() {
        let (_dir, options) = runtime_fixture();
        let mut settings = sample_settings();
        settings.plates.insert(
            0,
            MockPlate {
                region: String::new(),
                region_confidence: 0.0,
                coordinates: Vec::new(),
                candidates: Vec::new(),
            },
        );
        settings.plates.push(MockPlate {
            region: "ny".to_string(),
            region_confidence: 60.0,
            coordinates: Vec::new(),
            candidates: vec![MockCandidate::new("HXK4021", 88.0)],
        });
        let mut engine = MockEngine::new(&options, settings).unwrap();

        let results = engine.recognize_bytes(&png_bytes(100, 50)).unwrap();
        let indexed: Vec<_> = results
            .results
            .iter()
            .map(|r| (r.plate_index, r.plate.as_str()))
            .collect();
        assert_eq!(indexed, vec![(0, "7ABC123"), (1, "HXK4021")]);
    }

    #[test]
    fn test_undecodable_bytes() {
        let (_dir, options) = runtime_fixture();
        let mut engine = MockEngine::new(&options, MockSettings::default()).unwrap();

        let result = engine.recognize_bytes(b"definitely not an image");
        assert!(matches!(result, Err(EngineError::Decode { len: 23, .. })));
    }

    #[test]
    fn test_recognize_file_matches_bytes() {
        let (dir, options) = runtime_fixture();
        let mut engine = MockEngine::new(&options, sample_settings()).unwrap();
        let bytes = png_bytes(120, 80);
        let path = dir.path().join("car.png");
        std::fs::write(&path, &bytes).unwrap();

        let from_file = engine.recognize_file(&path).unwrap();
        let from_bytes = engine.recognize_bytes(&bytes).unwrap();
        assert_eq!(from_file, from_bytes);
    }

    #[test]
    fn test_recognize_missing_file() {
        let (dir, options) = runtime_fixture();
        let mut engine = MockEngine::new(&options, MockSettings::default()).unwrap();

        let result = engine.recognize_file(&dir.path().join("missing.jpg"));
        assert!(matches!(result, Err(EngineError::ReadImage { .. })));
    }
}
