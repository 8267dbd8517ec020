use std::time::Duration;

use serde_json::Value;

use super::camera::{CameraState, CoordinateBounds, EdgeInsets};
use super::command::AnnotationSpec;
use super::query::QueryGeometry;

/// Runs once a camera change has settled. May be invoked from a different
/// thread than the one that dispatched the command.
pub type Completion = Box<dyn FnOnce() + Send + 'static>;

/// The rendering engine behind one map surface.
pub trait MapSurface {
    fn camera(&self) -> CameraState;

    fn visible_bounds(&self) -> CoordinateBounds;

    /// Move the camera over `duration`. A zero duration may call
    /// `on_settled` before returning.
    fn set_camera(
        &mut self,
        camera: CameraState,
        duration: Duration,
        on_settled: Option<Completion>,
    );

    fn fit_bounds(&mut self, bounds: CoordinateBounds, padding: EdgeInsets, duration: Duration);

    fn select_annotation(&mut self, id: &str, animated: bool);

    fn deselect_annotation(&mut self);

    fn remove_all_annotations(&mut self);

    fn remove_annotation(&mut self, id: &str);

    fn set_annotation(&mut self, annotation: &AnnotationSpec);

    /// GeoJSON features rendered under `geometry`, optionally restricted to
    /// `layers`.
    fn query_rendered_features(
        &self,
        geometry: &QueryGeometry,
        layers: Option<&[String]>,
    ) -> Vec<Value>;
}
