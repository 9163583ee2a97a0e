//! Pixel-space labels for cluster circles, derived from the render tree on
//! every recomputation and replaced wholesale.

use std::collections::HashSet;

use serde::Serialize;

use crate::surface::MapSurface;

/// One label per distinct clustered location currently on screen. The host
/// positions its overlay DOM from these records.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClusterLabel {
    pub lng: f64,
    pub lat: f64,
    pub x: f64,
    pub y: f64,
    pub count: u64,
}

/// Query the rendered features of `layer_id` and derive labels for every
/// cluster (count > 1). Coordinates are deduplicated at five decimals
/// (~1.1 m) because features repeat across tile boundaries. Any query
/// failure, including the layer not existing yet, yields an empty set.
pub fn compute_cluster_labels<S: MapSurface + ?Sized>(
    surface: &S,
    layer_id: &str,
) -> Vec<ClusterLabel> {
    if !surface.has_layer(layer_id) {
        return Vec::new();
    }
    let features = match surface.query_rendered_features(layer_id) {
        Ok(features) => features,
        Err(_) => return Vec::new(),
    };

    let mut seen = HashSet::new();
    let mut labels = Vec::new();
    for feature in features {
        let count = match feature.point_count() {
            Some(count) if count > 1 => count,
            _ => continue,
        };
        let at = match feature.point() {
            Some(at) => at,
            None => continue,
        };
        let key = format!("{:.5},{:.5}", at.lng, at.lat);
        if !seen.insert(key) {
            continue;
        }
        let px = surface.project(at);
        labels.push(ClusterLabel {
            lng: at.lng,
            lat: at.lat,
            x: px.x,
            y: px.y,
            count,
        });
    }
    labels
}
