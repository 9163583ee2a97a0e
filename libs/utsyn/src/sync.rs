//! Keeps exactly one point layer active: the pre-built static tile layer or
//! the dynamic filtered layer. Transitions are driven by filter-store
//! snapshots; interaction wiring lives in per-layer binding objects that
//! register handlers on construction and deregister them on teardown.

use std::rc::Rc;

use geojson::FeatureCollection;
use slog_scope::{debug, warn};

use crate::layers::{
    clusters_layer, filtered_clusters_layer, filtered_unclustered_layer, unclustered_layer,
    ArchiveSource, ClusterOptions, CLUSTERS_LAYER_ID, FILTERED_CLUSTERS_LAYER_ID,
    FILTERED_SOURCE_ID, FILTERED_UNCLUSTERED_LAYER_ID, MAP_EASE_DURATION_MS, MAP_MAX_ZOOM,
    PMTILES_SOURCE_ID, UNCLUSTERED_LAYER_ID,
};
use crate::popup::popup_html;
use crate::store::FilterState;
use crate::surface::{
    Cursor, InteractionKind, InteractionSpec, MapSurface, PopupPlacement, RenderedFeature,
    SurfaceError,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActiveLayer {
    Static,
    Filtered,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncOutcome {
    Unchanged,
    /// Filtered stayed active; its source data was replaced in place.
    DataRefreshed,
    EnteredFiltered,
    EnteredStatic,
}

fn interaction_set(layers: &[&str]) -> Vec<InteractionSpec> {
    let mut specs = Vec::new();
    for layer in layers {
        specs.push(InteractionSpec {
            id: format!("{}-click", layer),
            layer: layer.to_string(),
            kind: InteractionKind::Click,
        });
        specs.push(InteractionSpec {
            id: format!("{}-mouseenter", layer),
            layer: layer.to_string(),
            kind: InteractionKind::MouseEnter,
        });
        specs.push(InteractionSpec {
            id: format!("{}-mouseleave", layer),
            layer: layer.to_string(),
            kind: InteractionKind::MouseLeave,
        });
    }
    specs
}

/// The static archive layers plus their interactions; installed once the
/// map has loaded, toggled while the filtered layer is shown.
struct StaticBinding {
    interactions: Vec<String>,
}

impl StaticBinding {
    fn install<S: MapSurface + ?Sized>(
        surface: &mut S,
        archive: &ArchiveSource,
    ) -> Result<StaticBinding, SurfaceError> {
        surface.add_vector_source(PMTILES_SOURCE_ID, archive)?;
        let source_layer = archive.header.source_layer();
        surface.add_layer(&clusters_layer(source_layer))?;
        surface.add_layer(&unclustered_layer(source_layer))?;
        let specs = interaction_set(&[CLUSTERS_LAYER_ID, UNCLUSTERED_LAYER_ID]);
        for spec in &specs {
            surface.add_interaction(spec)?;
        }
        Ok(StaticBinding {
            interactions: specs.into_iter().map(|s| s.id).collect(),
        })
    }

    fn set_visible<S: MapSurface + ?Sized>(
        &self,
        surface: &mut S,
        visible: bool,
    ) -> Result<(), SurfaceError> {
        surface.set_layer_visible(CLUSTERS_LAYER_ID, visible)?;
        surface.set_layer_visible(UNCLUSTERED_LAYER_ID, visible)
    }
}

/// The clustered GeoJSON source, the filtered layers and their interactions.
/// Construction registers everything exactly once; teardown removes the
/// interactions, the layers, then the source — the static case should not
/// pay for an unused clustered source.
struct FilteredBinding {
    interactions: Vec<String>,
}

impl FilteredBinding {
    fn install<S: MapSurface + ?Sized>(
        surface: &mut S,
        data: &FeatureCollection,
    ) -> Result<FilteredBinding, SurfaceError> {
        if surface.has_source(FILTERED_SOURCE_ID) {
            surface.set_source_data(FILTERED_SOURCE_ID, data)?;
        } else {
            surface.add_cluster_source(FILTERED_SOURCE_ID, data, &ClusterOptions::default())?;
        }
        surface.add_layer(&filtered_clusters_layer())?;
        surface.add_layer(&filtered_unclustered_layer())?;
        let specs = interaction_set(&[FILTERED_CLUSTERS_LAYER_ID, FILTERED_UNCLUSTERED_LAYER_ID]);
        for spec in &specs {
            surface.add_interaction(spec)?;
        }
        Ok(FilteredBinding {
            interactions: specs.into_iter().map(|s| s.id).collect(),
        })
    }

    fn refresh<S: MapSurface + ?Sized>(
        &self,
        surface: &mut S,
        data: &FeatureCollection,
    ) -> Result<(), SurfaceError> {
        surface.set_source_data(FILTERED_SOURCE_ID, data)
    }

    fn teardown<S: MapSurface + ?Sized>(self, surface: &mut S) {
        for id in &self.interactions {
            if let Err(e) = surface.remove_interaction(id) {
                debug!("interaction {} already gone: {}", id, e);
            }
        }
        for layer in &[FILTERED_CLUSTERS_LAYER_ID, FILTERED_UNCLUSTERED_LAYER_ID] {
            if let Err(e) = surface.remove_layer(layer) {
                debug!("layer {} already gone: {}", layer, e);
            }
        }
        if let Err(e) = surface.remove_source(FILTERED_SOURCE_ID) {
            debug!("source {} already gone: {}", FILTERED_SOURCE_ID, e);
        }
    }
}

pub struct LayerSynchronizer {
    state: ActiveLayer,
    static_binding: Option<StaticBinding>,
    filtered: Option<FilteredBinding>,
    last_filtered: Option<Rc<FeatureCollection>>,
}

impl Default for LayerSynchronizer {
    fn default() -> LayerSynchronizer {
        LayerSynchronizer::new()
    }
}

impl LayerSynchronizer {
    pub fn new() -> LayerSynchronizer {
        LayerSynchronizer {
            state: ActiveLayer::Static,
            static_binding: None,
            filtered: None,
            last_filtered: None,
        }
    }

    pub fn active(&self) -> ActiveLayer {
        self.state
    }

    /// The cluster layer the label overlay should read from.
    pub fn active_cluster_layer(&self) -> &'static str {
        match self.state {
            ActiveLayer::Static => CLUSTERS_LAYER_ID,
            ActiveLayer::Filtered => FILTERED_CLUSTERS_LAYER_ID,
        }
    }

    pub fn install_static<S: MapSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        archive: &ArchiveSource,
    ) -> Result<(), SurfaceError> {
        if self.static_binding.is_none() {
            self.static_binding = Some(StaticBinding::install(surface, archive)?);
        }
        Ok(())
    }

    /// Bring the rendered layer set in line with a store snapshot. The map
    /// is considered filtered only when the snapshot both has the active
    /// flag set and carries a collection.
    pub fn sync<S: MapSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        state: &FilterState,
    ) -> Result<SyncOutcome, SurfaceError> {
        let target = match state.filtered {
            Some(ref data) if state.is_filter_active => Some(Rc::clone(data)),
            _ => None,
        };

        match (self.state, target) {
            (ActiveLayer::Static, Some(data)) => {
                match self.filtered {
                    Some(ref binding) => binding.refresh(surface, &data)?,
                    None => self.filtered = Some(FilteredBinding::install(surface, &data)?),
                }
                if let Some(ref binding) = self.static_binding {
                    binding.set_visible(surface, false)?;
                }
                self.last_filtered = Some(data);
                self.state = ActiveLayer::Filtered;
                Ok(SyncOutcome::EnteredFiltered)
            }
            (ActiveLayer::Filtered, None) => {
                if let Some(binding) = self.filtered.take() {
                    binding.teardown(surface);
                }
                self.last_filtered = None;
                if let Some(ref binding) = self.static_binding {
                    binding.set_visible(surface, true)?;
                }
                self.state = ActiveLayer::Static;
                Ok(SyncOutcome::EnteredStatic)
            }
            (ActiveLayer::Filtered, Some(data)) => {
                let replaced = self
                    .last_filtered
                    .as_ref()
                    .map_or(true, |last| !Rc::ptr_eq(last, &data));
                if !replaced {
                    return Ok(SyncOutcome::Unchanged);
                }
                if let Some(ref binding) = self.filtered {
                    binding.refresh(surface, &data)?;
                }
                self.last_filtered = Some(data);
                Ok(SyncOutcome::DataRefreshed)
            }
            (ActiveLayer::Static, None) => Ok(SyncOutcome::Unchanged),
        }
    }

    fn is_cluster_layer(layer: &str) -> bool {
        layer == CLUSTERS_LAYER_ID || layer == FILTERED_CLUSTERS_LAYER_ID
    }

    fn is_point_layer(layer: &str) -> bool {
        layer == UNCLUSTERED_LAYER_ID || layer == FILTERED_UNCLUSTERED_LAYER_ID
    }

    /// Click on a cluster zooms toward its expansion zoom; click on a single
    /// point opens a popup above the label overlay. Failures degrade to a
    /// no-op, never to a crash of the rendering surface.
    pub fn handle_click<S: MapSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        layer: &str,
        feature: Option<&RenderedFeature>,
    ) {
        let feature = match feature {
            Some(feature) => feature,
            None => return,
        };
        let at = match feature.point() {
            Some(at) => at,
            None => return,
        };

        if Self::is_cluster_layer(layer) {
            let zoom = match (layer, feature.cluster_id()) {
                (FILTERED_CLUSTERS_LAYER_ID, Some(cluster_id)) => {
                    match surface.cluster_expansion_zoom(FILTERED_SOURCE_ID, cluster_id) {
                        Ok(zoom) => zoom,
                        Err(e) => {
                            warn!("cluster expansion zoom lookup failed: {}", e);
                            return;
                        }
                    }
                }
                // Archive clusters are pre-baked; there is no expansion
                // query, step one zoom level instead.
                _ => surface.zoom() + 1.0,
            };
            surface.ease_to(Some(at), zoom.min(MAP_MAX_ZOOM), MAP_EASE_DURATION_MS);
        } else if Self::is_point_layer(layer) {
            let html = popup_html(&feature.properties);
            surface.show_popup(at, &html, PopupPlacement::OverlayContainer);
        }
    }

    pub fn handle_mouse_enter<S: MapSurface + ?Sized>(&mut self, surface: &mut S, layer: &str) {
        if Self::is_cluster_layer(layer) || Self::is_point_layer(layer) {
            surface.set_cursor(Cursor::Pointer);
        }
    }

    pub fn handle_mouse_leave<S: MapSurface + ?Sized>(&mut self, surface: &mut S, layer: &str) {
        if Self::is_cluster_layer(layer) || Self::is_point_layer(layer) {
            surface.set_cursor(Cursor::Default);
        }
    }
}
