use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{BridgeError, BridgeResult};

pub const POINT_OR_RECT_REQUIRED: &str =
    "queryRenderedFeatures(): one of 'point' or 'rect' is required.";

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct ScreenPoint {
    #[serde(rename = "screenCoordX")]
    pub x: f32,
    #[serde(rename = "screenCoordY")]
    pub y: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct ScreenRect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl ScreenRect {
    pub fn contains(&self, point: ScreenPoint) -> bool {
        point.x >= self.left
            && point.x <= self.right
            && point.y >= self.top
            && point.y <= self.bottom
    }

    pub fn intersects(&self, other: &ScreenRect) -> bool {
        self.left <= other.right
            && other.left <= self.right
            && self.top <= other.bottom
            && other.top <= self.bottom
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum QueryGeometry {
    Point(ScreenPoint),
    Rect(ScreenRect),
}

/// Decoded `queryRenderedFeatures` options. `geometry` is `None` when the
/// caller gave both or neither of `point` and `rect`; that is reported back
/// through the callback, not as a protocol failure.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureQuery {
    pub geometry: Option<QueryGeometry>,
    pub layers: Option<Vec<String>>,
}

impl FeatureQuery {
    pub fn from_options(options: &Map<String, Value>) -> BridgeResult<Self> {
        const COMMAND: &str = "queryRenderedFeatures";

        let geometry = match (options.get("point"), options.get("rect")) {
            (Some(point), None) => Some(QueryGeometry::Point(
                ScreenPoint::deserialize(point)
                    .map_err(|err| BridgeError::malformed(COMMAND, format!("point: {err}")))?,
            )),
            (None, Some(rect)) => Some(QueryGeometry::Rect(
                ScreenRect::deserialize(rect)
                    .map_err(|err| BridgeError::malformed(COMMAND, format!("rect: {err}")))?,
            )),
            _ => None,
        };

        let layers = match options.get("layers") {
            None | Some(Value::Null) => None,
            Some(layers) => Some(
                Vec::<String>::deserialize(layers)
                    .map_err(|err| BridgeError::malformed(COMMAND, format!("layers: {err}")))?,
            ),
        };

        Ok(Self { geometry, layers })
    }
}

/// `[null, [featureJson...]]`
pub fn encode_features(features: &[Value]) -> Vec<Value> {
    let encoded = features
        .iter()
        .map(|feature| Value::String(feature.to_string()))
        .collect();
    vec![Value::Null, Value::Array(encoded)]
}

/// `[message, null]`
pub fn encode_query_error(message: &str) -> Vec<Value> {
    vec![Value::String(message.to_string()), Value::Null]
}
