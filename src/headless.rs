//! In-memory collaborators for running the bridge without a rendering
//! engine: a recording scene graph and a map surface whose animations only
//! finish when told to.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::bridge::{
    AnnotationSpec, CameraState, Completion, CoordinateBounds, EdgeInsets, MapSurface,
    QueryGeometry, ScreenRect,
};
use crate::composer::{SceneGraph, SurfaceId};

/// Scene graph that keeps each surface's structural children in order.
#[derive(Debug)]
pub struct HeadlessSceneGraph<E> {
    views: HashMap<SurfaceId, Vec<E>>,
}

impl<E> Default for HeadlessSceneGraph<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> HeadlessSceneGraph<E> {
    pub fn new() -> Self {
        Self {
            views: HashMap::new(),
        }
    }

    pub fn children(&self, surface: SurfaceId) -> &[E] {
        self.views.get(&surface).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl<E: Clone> SceneGraph<E> for HeadlessSceneGraph<E> {
    fn insert_child(&mut self, surface: SurfaceId, element: &E, index: usize) {
        let views = self.views.entry(surface).or_default();
        let index = index.min(views.len());
        views.insert(index, element.clone());
    }

    fn remove_child_at(&mut self, surface: SurfaceId, index: usize) {
        if let Some(views) = self.views.get_mut(&surface) {
            if index < views.len() {
                views.remove(index);
            }
            if views.is_empty() {
                self.views.remove(&surface);
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RenderedFeature {
    pub layer: String,
    pub bounds: ScreenRect,
    pub geojson: Value,
}

/// Map surface state without any rendering. Camera changes take effect at
/// once; their completions run immediately for zero durations and otherwise
/// wait for [`HeadlessMap::settle`].
#[derive(Default)]
pub struct HeadlessMap {
    pub camera: CameraState,
    pub bounds: CoordinateBounds,
    pub padding: EdgeInsets,
    pub annotations: BTreeMap<String, Map<String, Value>>,
    pub selected: Option<String>,
    pub features: Vec<RenderedFeature>,
    in_flight: Vec<Completion>,
}

impl HeadlessMap {
    pub fn new(camera: CameraState) -> Self {
        Self {
            camera,
            ..Self::default()
        }
    }

    pub fn with_features(mut self, features: Vec<RenderedFeature>) -> Self {
        self.features = features;
        self
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Finish every running animation, returning how many completed.
    pub fn settle(&mut self) -> usize {
        let completions = self.take_in_flight();
        let count = completions.len();
        for completion in completions {
            completion();
        }
        count
    }

    /// Abandon running animations without calling their completions.
    pub fn interrupt(&mut self) -> usize {
        let count = self.in_flight.len();
        self.in_flight.clear();
        count
    }

    /// Hand the pending completions to the caller, e.g. to run them from a
    /// timer thread.
    pub fn take_in_flight(&mut self) -> Vec<Completion> {
        std::mem::take(&mut self.in_flight)
    }
}

impl MapSurface for HeadlessMap {
    fn camera(&self) -> CameraState {
        self.camera
    }

    fn visible_bounds(&self) -> CoordinateBounds {
        self.bounds
    }

    fn set_camera(
        &mut self,
        camera: CameraState,
        duration: Duration,
        on_settled: Option<Completion>,
    ) {
        self.camera = camera;
        match on_settled {
            Some(completion) if duration.is_zero() => completion(),
            Some(completion) => self.in_flight.push(completion),
            None => {}
        }
    }

    fn fit_bounds(&mut self, bounds: CoordinateBounds, padding: EdgeInsets, _duration: Duration) {
        self.bounds = bounds;
        self.padding = padding;
        self.camera.latitude = (bounds.south + bounds.north) / 2.0;
        self.camera.longitude = (bounds.west + bounds.east) / 2.0;
    }

    fn select_annotation(&mut self, id: &str, _animated: bool) {
        if self.annotations.contains_key(id) {
            self.selected = Some(id.to_string());
        }
    }

    fn deselect_annotation(&mut self) {
        self.selected = None;
    }

    fn remove_all_annotations(&mut self) {
        self.annotations.clear();
        self.selected = None;
    }

    fn remove_annotation(&mut self, id: &str) {
        self.annotations.remove(id);
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
    }

    fn set_annotation(&mut self, annotation: &AnnotationSpec) {
        self.annotations
            .insert(annotation.id.clone(), annotation.options.clone());
    }

    fn query_rendered_features(
        &self,
        geometry: &QueryGeometry,
        layers: Option<&[String]>,
    ) -> Vec<Value> {
        self.features
            .iter()
            .filter(|feature| layers.map_or(true, |layers| layers.contains(&feature.layer)))
            .filter(|feature| match geometry {
                QueryGeometry::Point(point) => feature.bounds.contains(*point),
                QueryGeometry::Rect(rect) => feature.bounds.intersects(rect),
            })
            .map(|feature| feature.geojson.clone())
            .collect()
    }
}
