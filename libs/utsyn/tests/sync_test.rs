//! Behavioral tests for the layer synchronizer, the label overlay and the
//! viewer wiring, driven through a scripted map surface.

use std::collections::HashMap;
use std::time::Instant;

use geojson::FeatureCollection;
use serde_json::json;

use utsyn::labels::compute_cluster_labels;
use utsyn::layers::{
    ArchiveHeader, ArchiveSource, ClusterOptions, LayerSpec, CLUSTERS_LAYER_ID,
    FILTERED_CLUSTERS_LAYER_ID, FILTERED_SOURCE_ID, FILTERED_UNCLUSTERED_LAYER_ID, MAP_MAX_ZOOM,
    UNCLUSTERED_LAYER_ID,
};
use utsyn::store::Field;
use utsyn::surface::{
    Cursor, InteractionKind, InteractionSpec, LngLat, MapSurface, PopupPlacement, RenderedFeature,
    ScreenPoint, SurfaceError,
};
use utsyn::sync::ActiveLayer;
use utsyn::viewer::{MapEvent, Viewer, ViewerConfig, ViewerStatus};
use fasteign::{PropertyFeature, PropertyType};

#[derive(Clone, Debug, PartialEq)]
enum SourceKind {
    Vector,
    Cluster {
        options: ClusterOptions,
        features: usize,
    },
}

struct MockSurface {
    sources: HashMap<String, SourceKind>,
    layers: HashMap<String, bool>,
    interactions: Vec<InteractionSpec>,
    rendered: HashMap<String, Vec<RenderedFeature>>,
    fail_rendered_queries: bool,
    expansion_zoom: Option<f64>,
    zoom: f64,
    popups: Vec<(LngLat, String, PopupPlacement)>,
    cursor: Cursor,
    eases: Vec<(Option<LngLat>, f64)>,
    cluster_source_adds: usize,
    source_data_sets: usize,
}

impl Default for MockSurface {
    fn default() -> MockSurface {
        MockSurface {
            sources: HashMap::new(),
            layers: HashMap::new(),
            interactions: Vec::new(),
            rendered: HashMap::new(),
            fail_rendered_queries: false,
            expansion_zoom: None,
            zoom: 6.0,
            popups: Vec::new(),
            cursor: Cursor::Default,
            eases: Vec::new(),
            cluster_source_adds: 0,
            source_data_sets: 0,
        }
    }
}

impl MockSurface {
    fn click_registrations(&self, layer: &str) -> usize {
        self.interactions
            .iter()
            .filter(|i| i.layer == layer && i.kind == InteractionKind::Click)
            .count()
    }
}

impl MapSurface for MockSurface {
    fn add_vector_source(
        &mut self,
        id: &str,
        _archive: &ArchiveSource,
    ) -> Result<(), SurfaceError> {
        if self.sources.contains_key(id) {
            return Err(SurfaceError::new(format!("source {} already exists", id)));
        }
        self.sources.insert(id.to_string(), SourceKind::Vector);
        Ok(())
    }

    fn add_cluster_source(
        &mut self,
        id: &str,
        data: &FeatureCollection,
        options: &ClusterOptions,
    ) -> Result<(), SurfaceError> {
        if self.sources.contains_key(id) {
            return Err(SurfaceError::new(format!("source {} already exists", id)));
        }
        self.cluster_source_adds += 1;
        self.sources.insert(
            id.to_string(),
            SourceKind::Cluster {
                options: *options,
                features: data.features.len(),
            },
        );
        Ok(())
    }

    fn set_source_data(
        &mut self,
        id: &str,
        data: &FeatureCollection,
    ) -> Result<(), SurfaceError> {
        match self.sources.get_mut(id) {
            Some(SourceKind::Cluster { features, .. }) => {
                self.source_data_sets += 1;
                *features = data.features.len();
                Ok(())
            }
            _ => Err(SurfaceError::new(format!("no geojson source {}", id))),
        }
    }

    fn remove_source(&mut self, id: &str) -> Result<(), SurfaceError> {
        self.sources
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| SurfaceError::new(format!("no source {}", id)))
    }

    fn has_source(&self, id: &str) -> bool {
        self.sources.contains_key(id)
    }

    fn add_layer(&mut self, spec: &LayerSpec) -> Result<(), SurfaceError> {
        if self.layers.contains_key(&spec.id) {
            return Err(SurfaceError::new(format!("layer {} already exists", spec.id)));
        }
        self.layers.insert(spec.id.clone(), true);
        Ok(())
    }

    fn remove_layer(&mut self, id: &str) -> Result<(), SurfaceError> {
        self.layers
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| SurfaceError::new(format!("no layer {}", id)))
    }

    fn has_layer(&self, id: &str) -> bool {
        self.layers.contains_key(id)
    }

    fn set_layer_visible(&mut self, id: &str, visible: bool) -> Result<(), SurfaceError> {
        match self.layers.get_mut(id) {
            Some(v) => {
                *v = visible;
                Ok(())
            }
            None => Err(SurfaceError::new(format!("no layer {}", id))),
        }
    }

    fn add_interaction(&mut self, spec: &InteractionSpec) -> Result<(), SurfaceError> {
        if self.interactions.iter().any(|i| i.id == spec.id) {
            return Err(SurfaceError::new(format!(
                "interaction {} already registered",
                spec.id
            )));
        }
        self.interactions.push(spec.clone());
        Ok(())
    }

    fn remove_interaction(&mut self, id: &str) -> Result<(), SurfaceError> {
        let before = self.interactions.len();
        self.interactions.retain(|i| i.id != id);
        if self.interactions.len() == before {
            Err(SurfaceError::new(format!("no interaction {}", id)))
        } else {
            Ok(())
        }
    }

    fn query_rendered_features(
        &self,
        layer_id: &str,
    ) -> Result<Vec<RenderedFeature>, SurfaceError> {
        if self.fail_rendered_queries {
            return Err(SurfaceError::new("render tree unavailable"));
        }
        if !self.layers.contains_key(layer_id) {
            return Err(SurfaceError::new(format!("no layer {}", layer_id)));
        }
        Ok(self.rendered.get(layer_id).cloned().unwrap_or_default())
    }

    fn cluster_expansion_zoom(
        &self,
        _source_id: &str,
        _cluster_id: u64,
    ) -> Result<f64, SurfaceError> {
        self.expansion_zoom
            .ok_or_else(|| SurfaceError::new("expansion zoom unavailable"))
    }

    fn project(&self, at: LngLat) -> ScreenPoint {
        ScreenPoint {
            x: at.lng * 100.0,
            y: at.lat * 100.0,
        }
    }

    fn zoom(&self) -> f64 {
        self.zoom
    }

    fn ease_to(&mut self, center: Option<LngLat>, zoom: f64, _duration_ms: u64) {
        self.eases.push((center, zoom));
        self.zoom = zoom;
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        self.cursor = cursor;
    }

    fn show_popup(&mut self, at: LngLat, html: &str, placement: PopupPlacement) {
        self.popups.push((at, html.to_string(), placement));
    }
}

fn condo_collection(count: usize) -> FeatureCollection {
    let features = (0..count)
        .map(|i| {
            geojson::Feature::from(PropertyFeature {
                id: format!("p-{}", i),
                property_type: PropertyType::Condo,
                price: 1_200_000.0 + i as f64,
                bedrooms: 2,
                bathrooms: 1,
                usable_area_sqm: 45.0,
                coord: geo_types::Point::new(100.5 + i as f64 * 0.01, 13.7),
            })
        })
        .collect();
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

fn rendered_cluster(lng: f64, lat: f64, count: u64, cluster_id: u64) -> RenderedFeature {
    RenderedFeature {
        geometry: Some(geojson::Geometry::new(geojson::Value::Point(vec![
            lng, lat,
        ]))),
        properties: json!({"point_count": count, "cluster_id": cluster_id})
            .as_object()
            .cloned()
            .unwrap(),
    }
}

fn rendered_point(lng: f64, lat: f64, props: serde_json::Value) -> RenderedFeature {
    RenderedFeature {
        geometry: Some(geojson::Geometry::new(geojson::Value::Point(vec![
            lng, lat,
        ]))),
        properties: props.as_object().cloned().unwrap(),
    }
}

fn ready_viewer() -> Viewer {
    Viewer::new(ViewerConfig {
        access_token: Some("pk.test-token".to_string()),
    })
}

fn archive() -> ArchiveSource {
    ArchiveSource {
        url: "http://localhost:3000/api/pmtiles".to_string(),
        header: ArchiveHeader {
            min_lon: 97.0,
            min_lat: 5.0,
            max_lon: 106.0,
            max_lat: 21.0,
            min_zoom: 0,
            max_zoom: 14,
            vector_layers: vec!["real_estate_1M".to_string()],
        },
    }
}

fn load_map(viewer: &mut Viewer, surface: &mut MockSurface) {
    viewer.attach_archive(archive());
    viewer.handle_event(surface, MapEvent::Load, Instant::now());
}

fn submit(viewer: &mut Viewer, surface: &mut MockSurface, collection: FeatureCollection) {
    let (tag, _criteria) = viewer.begin_submit();
    viewer.finish_submit(surface, tag, Ok(collection));
}

#[test]
fn applying_a_filter_switches_to_the_filtered_layer() {
    let mut surface = MockSurface::default();
    let mut viewer = ready_viewer();
    load_map(&mut viewer, &mut surface);

    submit(&mut viewer, &mut surface, condo_collection(3));

    assert_eq!(viewer.synchronizer().active(), ActiveLayer::Filtered);
    match surface.sources.get(FILTERED_SOURCE_ID) {
        Some(SourceKind::Cluster { options, features }) => {
            assert_eq!(*options, ClusterOptions::default());
            assert_eq!(*features, 3);
        }
        other => panic!("expected a clustered source, got {:?}", other),
    }
    assert!(surface.has_layer(FILTERED_CLUSTERS_LAYER_ID));
    assert!(surface.has_layer(FILTERED_UNCLUSTERED_LAYER_ID));
    // The static layers stay installed but hidden.
    assert_eq!(surface.layers[CLUSTERS_LAYER_ID], false);
    assert_eq!(surface.layers[UNCLUSTERED_LAYER_ID], false);
}

#[test]
fn resubmitting_replaces_data_in_place_without_recreating_the_source() {
    let mut surface = MockSurface::default();
    let mut viewer = ready_viewer();
    load_map(&mut viewer, &mut surface);

    submit(&mut viewer, &mut surface, condo_collection(3));
    submit(&mut viewer, &mut surface, condo_collection(7));

    assert_eq!(surface.cluster_source_adds, 1);
    assert_eq!(surface.source_data_sets, 1);
    match surface.sources.get(FILTERED_SOURCE_ID) {
        Some(SourceKind::Cluster { features, .. }) => assert_eq!(*features, 7),
        other => panic!("expected a clustered source, got {:?}", other),
    }
}

#[test]
fn clearing_removes_the_dynamic_source_and_restores_the_static_layers() {
    let mut surface = MockSurface::default();
    let mut viewer = ready_viewer();
    load_map(&mut viewer, &mut surface);
    submit(&mut viewer, &mut surface, condo_collection(3));

    viewer.clear_filters(&mut surface);

    assert_eq!(viewer.synchronizer().active(), ActiveLayer::Static);
    assert!(!surface.has_source(FILTERED_SOURCE_ID));
    assert!(!surface.has_layer(FILTERED_CLUSTERS_LAYER_ID));
    assert!(!surface.has_layer(FILTERED_UNCLUSTERED_LAYER_ID));
    assert_eq!(surface.click_registrations(FILTERED_CLUSTERS_LAYER_ID), 0);
    assert_eq!(surface.layers[CLUSTERS_LAYER_ID], true);
    assert_eq!(surface.layers[UNCLUSTERED_LAYER_ID], true);
    assert!(!viewer.store().state().is_expanded);
    assert!(!viewer.store().state().is_filter_active);
}

#[test]
fn activation_without_a_collection_keeps_the_static_layer() {
    let mut surface = MockSurface::default();
    let mut viewer = ready_viewer();
    load_map(&mut viewer, &mut surface);

    // The active flag alone is not enough; the synchronizer also requires
    // a collection before it treats the map as filtered.
    viewer.update_store(&mut surface, |store| store.set_active(true));

    assert_eq!(viewer.synchronizer().active(), ActiveLayer::Static);
    assert!(!surface.has_source(FILTERED_SOURCE_ID));
    assert_eq!(surface.layers[CLUSTERS_LAYER_ID], true);
}

#[test]
fn redundant_activations_never_double_register_handlers() {
    let mut surface = MockSurface::default();
    let mut viewer = ready_viewer();
    load_map(&mut viewer, &mut surface);
    submit(&mut viewer, &mut surface, condo_collection(2));

    for _ in 0..5 {
        viewer.update_store(&mut surface, |store| store.set_active(true));
    }
    assert_eq!(
        surface.click_registrations(FILTERED_UNCLUSTERED_LAYER_ID),
        1
    );

    // One click dispatched per registered handler must open exactly one
    // popup.
    let feature = rendered_point(
        100.5,
        13.7,
        json!({"property_type": "Condo", "price": 1_500_000.0}),
    );
    let clicks = surface.click_registrations(FILTERED_UNCLUSTERED_LAYER_ID);
    for _ in 0..clicks {
        viewer.handle_event(
            &mut surface,
            MapEvent::Click {
                layer: FILTERED_UNCLUSTERED_LAYER_ID.to_string(),
                feature: Some(feature.clone()),
            },
            Instant::now(),
        );
    }
    assert_eq!(surface.popups.len(), 1);
    assert_eq!(surface.popups[0].2, PopupPlacement::OverlayContainer);
    assert!(surface.popups[0].1.contains("฿1.5M"));
}

#[test]
fn filtered_cluster_click_zooms_to_expansion_zoom_capped_at_max() {
    let mut surface = MockSurface::default();
    let mut viewer = ready_viewer();
    load_map(&mut viewer, &mut surface);
    submit(&mut viewer, &mut surface, condo_collection(10));

    surface.expansion_zoom = Some(25.0);
    viewer.handle_event(
        &mut surface,
        MapEvent::Click {
            layer: FILTERED_CLUSTERS_LAYER_ID.to_string(),
            feature: Some(rendered_cluster(100.5, 13.7, 12, 9)),
        },
        Instant::now(),
    );

    let (center, zoom) = surface.eases.last().cloned().expect("an ease");
    assert_eq!(center, Some(LngLat { lng: 100.5, lat: 13.7 }));
    assert_eq!(zoom, MAP_MAX_ZOOM);
}

#[test]
fn static_cluster_click_steps_one_zoom_level() {
    let mut surface = MockSurface::default();
    let mut viewer = ready_viewer();
    load_map(&mut viewer, &mut surface);
    surface.zoom = 6.0;

    viewer.handle_event(
        &mut surface,
        MapEvent::Click {
            layer: CLUSTERS_LAYER_ID.to_string(),
            feature: Some(rendered_cluster(100.0, 13.0, 40, 1)),
        },
        Instant::now(),
    );

    let (_, zoom) = surface.eases.last().cloned().expect("an ease");
    assert_eq!(zoom, 7.0);
}

#[test]
fn expansion_zoom_failure_degrades_to_a_no_op() {
    let mut surface = MockSurface::default();
    let mut viewer = ready_viewer();
    load_map(&mut viewer, &mut surface);
    submit(&mut viewer, &mut surface, condo_collection(4));

    surface.expansion_zoom = None;
    viewer.handle_event(
        &mut surface,
        MapEvent::Click {
            layer: FILTERED_CLUSTERS_LAYER_ID.to_string(),
            feature: Some(rendered_cluster(100.5, 13.7, 12, 9)),
        },
        Instant::now(),
    );
    assert!(surface.eases.is_empty());
}

#[test]
fn hover_toggles_the_pointer_cursor_for_both_layer_sets() {
    let mut surface = MockSurface::default();
    let mut viewer = ready_viewer();
    load_map(&mut viewer, &mut surface);

    for layer in &[CLUSTERS_LAYER_ID, FILTERED_UNCLUSTERED_LAYER_ID] {
        viewer.handle_event(
            &mut surface,
            MapEvent::MouseEnter {
                layer: layer.to_string(),
            },
            Instant::now(),
        );
        assert_eq!(surface.cursor, Cursor::Pointer);
        viewer.handle_event(
            &mut surface,
            MapEvent::MouseLeave {
                layer: layer.to_string(),
            },
            Instant::now(),
        );
        assert_eq!(surface.cursor, Cursor::Default);
    }
}

#[test]
fn labels_are_recomputed_at_idle_after_a_transition() {
    let mut surface = MockSurface::default();
    let mut viewer = ready_viewer();
    load_map(&mut viewer, &mut surface);
    submit(&mut viewer, &mut surface, condo_collection(5));

    surface.rendered.insert(
        FILTERED_CLUSTERS_LAYER_ID.to_string(),
        vec![
            rendered_cluster(100.5, 13.7, 12, 1),
            rendered_cluster(101.0, 14.0, 3, 2),
        ],
    );
    assert!(viewer.labels().is_empty());
    viewer.handle_event(&mut surface, MapEvent::Idle, Instant::now());

    let labels = viewer.labels();
    assert_eq!(labels.len(), 2);
    assert_eq!(labels[0].count, 12);
    assert_eq!(labels[0].x, 100.5 * 100.0);
}

#[test]
fn nearby_cluster_coordinates_produce_one_label() {
    let mut surface = MockSurface::default();
    surface.layers.insert(CLUSTERS_LAYER_ID.to_string(), true);
    surface.rendered.insert(
        CLUSTERS_LAYER_ID.to_string(),
        vec![
            rendered_cluster(100.500001, 13.700001, 10, 1),
            rendered_cluster(100.500002, 13.700003, 10, 1),
            rendered_cluster(100.6, 13.7, 4, 2),
        ],
    );

    let labels = compute_cluster_labels(&surface, CLUSTERS_LAYER_ID);
    assert_eq!(labels.len(), 2);
}

#[test]
fn single_points_get_no_label() {
    let mut surface = MockSurface::default();
    surface.layers.insert(CLUSTERS_LAYER_ID.to_string(), true);
    surface.rendered.insert(
        CLUSTERS_LAYER_ID.to_string(),
        vec![
            rendered_cluster(100.5, 13.7, 1, 1),
            rendered_point(100.6, 13.8, json!({"price": 1.0})),
        ],
    );
    assert!(compute_cluster_labels(&surface, CLUSTERS_LAYER_ID).is_empty());
}

#[test]
fn render_query_failures_yield_an_empty_label_set() {
    let mut surface = MockSurface::default();
    surface.layers.insert(CLUSTERS_LAYER_ID.to_string(), true);
    surface.fail_rendered_queries = true;
    assert!(compute_cluster_labels(&surface, CLUSTERS_LAYER_ID).is_empty());

    // Missing layer behaves the same.
    let surface = MockSurface::default();
    assert!(compute_cluster_labels(&surface, CLUSTERS_LAYER_ID).is_empty());
}

#[test]
fn stale_filter_responses_are_dropped() {
    let mut surface = MockSurface::default();
    let mut viewer = ready_viewer();
    load_map(&mut viewer, &mut surface);

    let (stale, _) = viewer.begin_submit();
    let (fresh, _) = viewer.begin_submit();
    viewer.finish_submit(&mut surface, fresh, Ok(condo_collection(7)));
    viewer.finish_submit(&mut surface, stale, Ok(condo_collection(2)));

    let state = viewer.store().state();
    let filtered = state.filtered.as_ref().expect("a collection");
    assert_eq!(filtered.features.len(), 7);
}

#[test]
fn fetch_failures_leave_previous_results_untouched() {
    let mut surface = MockSurface::default();
    let mut viewer = ready_viewer();
    load_map(&mut viewer, &mut surface);
    submit(&mut viewer, &mut surface, condo_collection(3));

    let (tag, _) = viewer.begin_submit();
    viewer.finish_submit(&mut surface, tag, Err("boom".to_string()));

    assert_eq!(viewer.panel_error(), Some("boom"));
    assert_eq!(viewer.synchronizer().active(), ActiveLayer::Filtered);
    let state = viewer.store().state();
    assert_eq!(state.filtered.as_ref().unwrap().features.len(), 3);
    assert!(state.is_filter_active);
}

#[test]
fn missing_access_token_is_an_inert_state() {
    let mut surface = MockSurface::default();
    let mut viewer = Viewer::new(ViewerConfig { access_token: None });
    assert_eq!(viewer.status(), ViewerStatus::NeedsAccessToken);

    viewer.attach_archive(archive());
    viewer.handle_event(&mut surface, MapEvent::Load, Instant::now());
    viewer.handle_event(&mut surface, MapEvent::Idle, Instant::now());

    assert!(surface.sources.is_empty());
    assert!(surface.layers.is_empty());
}

#[test]
fn fractional_zoom_snaps_after_movement_ends() {
    let mut surface = MockSurface::default();
    let mut viewer = ready_viewer();
    load_map(&mut viewer, &mut surface);

    surface.zoom = 6.4;
    viewer.handle_event(&mut surface, MapEvent::MoveEnd, Instant::now());
    assert_eq!(surface.eases.last().cloned(), Some((None, 6.0)));

    surface.eases.clear();
    viewer.handle_event(&mut surface, MapEvent::MoveEnd, Instant::now());
    assert!(surface.eases.is_empty());
}

#[test]
fn submit_and_clear_drive_the_store_end_to_end() {
    let mut surface = MockSurface::default();
    let mut viewer = ready_viewer();
    load_map(&mut viewer, &mut surface);

    viewer.update_store(&mut surface, |store| {
        store.toggle_expanded();
        store.set_fields(vec![
            Field::PropertyType(Some(PropertyType::Condo)),
            Field::PriceMin(Some(1_000_000.0)),
        ]);
    });

    let (tag, criteria) = viewer.begin_submit();
    assert_eq!(criteria.property_type, Some(PropertyType::Condo));
    assert_eq!(criteria.price_min, Some(1_000_000.0));
    assert_eq!(criteria.price_max, None);

    viewer.finish_submit(&mut surface, tag, Ok(condo_collection(4)));
    let state = viewer.store().state();
    assert!(state.is_filter_active);
    assert!(state.is_applied);
    assert_eq!(state.filtered.as_ref().unwrap().features.len(), 4);

    viewer.clear_filters(&mut surface);
    let state = viewer.store().state();
    assert!(!state.is_filter_active);
    assert!(!state.is_expanded);
    assert!(state.filtered.is_none());
}
