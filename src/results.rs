//! Recognition results
//!
//! Typed view of the OpenALPR JSON result record. Fields the crate does not
//! know about are preserved in `extra` maps so results pass through unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Result record format version emitted by the engine
pub const RESULTS_VERSION: u32 = 2;

/// Value of the `data_type` field for plate recognition results
pub const RESULTS_DATA_TYPE: &str = "alpr_results";

/// Full result of one recognition call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlprResults {
    /// Result format version
    pub version: u32,
    /// Record type tag
    pub data_type: String,
    /// Time of recognition in milliseconds since the Unix epoch
    pub epoch_time: u64,
    /// Source image width in pixels
    pub img_width: u32,
    /// Source image height in pixels
    pub img_height: u32,
    /// Total processing time
    pub processing_time_ms: f64,
    /// Areas of the image that were searched
    #[serde(default)]
    pub regions_of_interest: Vec<RegionOfInterest>,
    /// One entry per detected plate
    #[serde(default)]
    pub results: Vec<PlateResult>,
    /// Fields not modelled above
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AlprResults {
    /// Empty result for an image of the given size
    pub fn empty(img_width: u32, img_height: u32) -> Self {
        Self {
            version: RESULTS_VERSION,
            data_type: RESULTS_DATA_TYPE.to_string(),
            epoch_time: 0,
            img_width,
            img_height,
            processing_time_ms: 0.0,
            regions_of_interest: Vec::new(),
            results: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Parse a JSON result string produced by the engine
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Serialize to compact JSON text
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Rectangle searched for plates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionOfInterest {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl RegionOfInterest {
    /// Region covering a whole image
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }
}

/// One detected plate with its candidate readings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateResult {
    /// Best candidate text
    pub plate: String,
    /// Confidence of the best candidate (0 - 100)
    pub confidence: f64,
    /// Whether the best candidate matches a regional plate pattern
    #[serde(with = "int_bool")]
    pub matches_template: bool,
    /// Index of this plate within the image
    pub plate_index: u32,
    /// Region guess (empty when region detection is off and no default is set)
    pub region: String,
    /// Confidence of the region guess (0 - 100)
    pub region_confidence: f64,
    /// Time spent on this plate
    pub processing_time_ms: f64,
    /// Top-N value in effect for this call
    pub requested_topn: u32,
    /// Plate corners, clockwise from top-left
    #[serde(default)]
    pub coordinates: Vec<PlatePoint>,
    /// Alternative readings, best first
    #[serde(default)]
    pub candidates: Vec<PlateCandidate>,
    /// Fields not modelled above
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Pixel coordinate of a plate corner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatePoint {
    pub x: i32,
    pub y: i32,
}

/// Alternative plate reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateCandidate {
    pub plate: String,
    pub confidence: f64,
    #[serde(with = "int_bool")]
    pub matches_template: bool,
}

/// The engine writes booleans as 0/1 integers
mod int_bool {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Int(i64),
            Bool(bool),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Bool(b) => Ok(b),
            Repr::Int(0) => Ok(false),
            Repr::Int(1) => Ok(true),
            Repr::Int(other) => Err(de::Error::custom(format!(
                "expected 0 or 1 for matches_template, got {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENGINE_OUTPUT: &str = r#"{
        "version": 2,
        "data_type": "alpr_results",
        "epoch_time": 1488823587012,
        "img_width": 640,
        "img_height": 480,
        "processing_time_ms": 41.27,
        "regions_of_interest": [{"x": 0, "y": 0, "width": 640, "height": 480}],
        "results": [{
            "plate": "5XJD381",
            "confidence": 91.45,
            "matches_template": 1,
            "plate_index": 0,
            "region": "ca",
            "region_confidence": 88,
            "processing_time_ms": 12.5,
            "requested_topn": 7,
            "coordinates": [
                {"x": 210, "y": 300}, {"x": 330, "y": 298},
                {"x": 331, "y": 352}, {"x": 211, "y": 355}
            ],
            "candidates": [
                {"plate": "5XJD381", "confidence": 91.45, "matches_template": 1},
                {"plate": "5XJD38I", "confidence": 80.1, "matches_template": 0}
            ],
            "vehicle_region": {"x": 100, "y": 120, "width": 400, "height": 360}
        }],
        "camera_id": 3
    }"#;

    #[test]
    fn test_parse_engine_output() {
        let results = AlprResults::from_json(ENGINE_OUTPUT).unwrap();

        assert_eq!(results.version, 2);
        assert_eq!(results.data_type, "alpr_results");
        assert_eq!(results.img_width, 640);
        assert_eq!(results.regions_of_interest, vec![RegionOfInterest::full(640, 480)]);
        assert_eq!(results.results.len(), 1);

        let plate = &results.results[0];
        assert_eq!(plate.plate, "5XJD381");
        assert!(plate.matches_template);
        assert_eq!(plate.requested_topn, 7);
        assert_eq!(plate.coordinates.len(), 4);
        assert!(!plate.candidates[1].matches_template);
    }

    #[test]
    fn test_unknown_fields_are_transported() {
        let results = AlprResults::from_json(ENGINE_OUTPUT).unwrap();
        assert_eq!(results.extra.get("camera_id"), Some(&Value::from(3)));
        assert!(results.results[0].extra.contains_key("vehicle_region"));

        let reparsed: Value = serde_json::from_str(&results.to_json().unwrap()).unwrap();
        let original: Value = serde_json::from_str(ENGINE_OUTPUT).unwrap();
        assert_eq!(reparsed["camera_id"], original["camera_id"]);
        assert_eq!(
            reparsed["results"][0]["vehicle_region"],
            original["results"][0]["vehicle_region"]
        );
    }

    #[test]
    fn test_matches_template_written_as_integer() {
        let results = AlprResults::from_json(ENGINE_OUTPUT).unwrap();
        let value: Value = serde_json::to_value(&results).unwrap();

        assert_eq!(value["results"][0]["matches_template"], Value::from(1));
        assert_eq!(value["results"][0]["candidates"][1]["matches_template"], Value::from(0));
    }

    #[test]
    fn test_matches_template_rejects_other_integers() {
        let json = r#"{"plate": "ABC", "confidence": 1.0, "matches_template": 2}"#;
        assert!(serde_json::from_str::<PlateCandidate>(json).is_err());
    }

    #[test]
    fn test_empty_results() {
        let results = AlprResults::empty(320, 240);
        let json = results.to_json().unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["data_type"], "alpr_results");
        assert_eq!(value["img_width"], 320);
        assert_eq!(value["results"], Value::Array(Vec::new()));
    }
}
