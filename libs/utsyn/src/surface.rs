//! The seam between this crate and the actual rendering engine. The viewer
//! only ever needs the operations below; a scripted implementation stands in
//! for the real engine in tests.

use failure::Fail;
use geojson::FeatureCollection;
use serde_json::Value;

use crate::layers::{ArchiveSource, ClusterOptions, LayerSpec};

#[derive(Debug, Fail)]
#[fail(display = "map surface error: {}", _0)]
pub struct SurfaceError(pub String);

impl SurfaceError {
    pub fn new(msg: impl Into<String>) -> SurfaceError {
        SurfaceError(msg.into())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cursor {
    Default,
    Pointer,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InteractionKind {
    Click,
    MouseEnter,
    MouseLeave,
}

/// One interaction registration: `id` must be unique per surface so the
/// registration can be torn down again.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InteractionSpec {
    pub id: String,
    pub layer: String,
    pub kind: InteractionKind,
}

/// Where a popup is mounted. The overlay container sits above the
/// pixel-space cluster labels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PopupPlacement {
    Map,
    OverlayContainer,
}

/// A feature as currently rendered, the way the engine reports it back from
/// a render-tree query.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedFeature {
    pub geometry: Option<geojson::Geometry>,
    pub properties: serde_json::Map<String, Value>,
}

impl RenderedFeature {
    pub fn point(&self) -> Option<LngLat> {
        match self.geometry.as_ref().map(|g| &g.value) {
            Some(geojson::Value::Point(coords)) if coords.len() >= 2 => Some(LngLat {
                lng: coords[0],
                lat: coords[1],
            }),
            _ => None,
        }
    }

    /// Aggregate point count carried by cluster features; absent on single
    /// points.
    pub fn point_count(&self) -> Option<u64> {
        self.properties.get("point_count").and_then(Value::as_u64)
    }

    pub fn cluster_id(&self) -> Option<u64> {
        self.properties.get("cluster_id").and_then(Value::as_u64)
    }
}

/// What the viewer consumes from the rendering engine: sources, layers,
/// render-tree queries, projection, camera moves, interactions, popups.
pub trait MapSurface {
    fn add_vector_source(&mut self, id: &str, archive: &ArchiveSource)
        -> Result<(), SurfaceError>;
    fn add_cluster_source(
        &mut self,
        id: &str,
        data: &FeatureCollection,
        options: &ClusterOptions,
    ) -> Result<(), SurfaceError>;
    /// Replace a GeoJSON source's data in place, without re-creating it.
    fn set_source_data(&mut self, id: &str, data: &FeatureCollection) -> Result<(), SurfaceError>;
    fn remove_source(&mut self, id: &str) -> Result<(), SurfaceError>;
    fn has_source(&self, id: &str) -> bool;

    fn add_layer(&mut self, spec: &LayerSpec) -> Result<(), SurfaceError>;
    fn remove_layer(&mut self, id: &str) -> Result<(), SurfaceError>;
    fn has_layer(&self, id: &str) -> bool;
    fn set_layer_visible(&mut self, id: &str, visible: bool) -> Result<(), SurfaceError>;

    fn add_interaction(&mut self, spec: &InteractionSpec) -> Result<(), SurfaceError>;
    fn remove_interaction(&mut self, id: &str) -> Result<(), SurfaceError>;

    fn query_rendered_features(&self, layer_id: &str)
        -> Result<Vec<RenderedFeature>, SurfaceError>;
    /// Zoom at which a cluster of the given clustered source splits up.
    fn cluster_expansion_zoom(&self, source_id: &str, cluster_id: u64)
        -> Result<f64, SurfaceError>;

    fn project(&self, at: LngLat) -> ScreenPoint;
    fn zoom(&self) -> f64;
    fn ease_to(&mut self, center: Option<LngLat>, zoom: f64, duration_ms: u64);
    fn set_cursor(&mut self, cursor: Cursor);
    fn show_popup(&mut self, at: LngLat, html: &str, placement: PopupPlacement);
}
