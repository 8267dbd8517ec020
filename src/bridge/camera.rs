use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Full camera state as reported by the surface.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct CameraState {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: f64,
    pub bearing: f64,
    pub pitch: f64,
}

/// Partial camera change sent by the host with `easeTo`.
#[derive(Clone, Copy, Debug, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraUpdate {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub zoom_level: Option<f64>,
    pub direction: Option<f64>,
    pub pitch: Option<f64>,
}

impl CameraState {
    /// Apply `update` on top of this state. Absent fields keep their current
    /// value; the target only moves when both coordinates are given.
    pub fn merged(&self, update: &CameraUpdate) -> CameraState {
        let mut next = *self;
        if let (Some(latitude), Some(longitude)) = (update.latitude, update.longitude) {
            next.latitude = latitude;
            next.longitude = longitude;
        }
        if let Some(zoom) = update.zoom_level {
            next.zoom = zoom;
        }
        if let Some(bearing) = update.direction {
            next.bearing = bearing;
        }
        if let Some(pitch) = update.pitch {
            next.pitch = pitch;
        }
        next
    }

    pub fn center_zoom_json(&self) -> Value {
        json!({
            "latitude": self.latitude,
            "longitude": self.longitude,
            "zoomLevel": self.zoom,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct CoordinateBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl CoordinateBounds {
    /// `[south, west, north, east]`
    pub fn to_json(&self) -> Value {
        json!([self.south, self.west, self.north, self.east])
    }
}

/// Padding in screen pixels around a fitted region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EdgeInsets {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> CameraState {
        CameraState {
            latitude: 1.0,
            longitude: 2.0,
            zoom: 5.0,
            bearing: 7.0,
            pitch: 3.0,
        }
    }

    #[test]
    fn zoom_only_update_keeps_everything_else() {
        let update = CameraUpdate {
            zoom_level: Some(10.0),
            ..CameraUpdate::default()
        };
        assert_eq!(
            camera().merged(&update),
            CameraState {
                zoom: 10.0,
                ..camera()
            }
        );
    }

    #[test]
    fn lone_latitude_does_not_move_target() {
        let update: CameraUpdate = serde_json::from_value(json!({ "latitude": 40.0 })).unwrap();
        assert_eq!(camera().merged(&update), camera());
    }

    #[test]
    fn full_update_replaces_every_field() {
        let update: CameraUpdate = serde_json::from_value(json!({
            "latitude": 10.0,
            "longitude": 20.0,
            "zoomLevel": 3.0,
            "direction": 90.0,
            "pitch": 45.0,
        }))
        .unwrap();
        assert_eq!(
            camera().merged(&update),
            CameraState {
                latitude: 10.0,
                longitude: 20.0,
                zoom: 3.0,
                bearing: 90.0,
                pitch: 45.0,
            }
        );
    }

    #[test]
    fn bounds_serialize_south_west_north_east() {
        let bounds = CoordinateBounds {
            south: -1.0,
            west: -2.0,
            north: 3.0,
            east: 4.0,
        };
        assert_eq!(bounds.to_json(), json!([-1.0, -2.0, 3.0, 4.0]));
    }
}
