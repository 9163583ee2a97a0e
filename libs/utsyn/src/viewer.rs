//! Wiring of store, synchronizer and label overlay into one viewer driven by
//! map events. A missing access token is a reported state, not a failure:
//! the viewer stays inert and the host renders a hint instead of a map.

use std::cell::Cell;
use std::env;
use std::rc::Rc;
use std::time::Instant;

use fasteign::FilterCriteria;
use geojson::FeatureCollection;
use slog_scope::{debug, error};

use crate::fetch::{FetchSequencer, FetchTag};
use crate::labels::{compute_cluster_labels, ClusterLabel};
use crate::layers::{ArchiveSource, MAP_EASE_DURATION_MS};
use crate::store::{FilterFields, FilterStore};
use crate::surface::{MapSurface, RenderedFeature};
use crate::sync::{LayerSynchronizer, SyncOutcome};
use crate::throttle::{Refresh, RefreshScheduler, LABEL_REFRESH_INTERVAL};

pub const ACCESS_TOKEN_ENV: &str = "MAPBOX_ACCESS_TOKEN";

#[derive(Clone, Debug, Default)]
pub struct ViewerConfig {
    pub access_token: Option<String>,
}

impl ViewerConfig {
    pub fn from_env() -> ViewerConfig {
        ViewerConfig {
            access_token: env::var(ACCESS_TOKEN_ENV).ok().filter(|t| !t.is_empty()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewerStatus {
    /// No access token: render a hint, attempt no map operation.
    NeedsAccessToken,
    Ready,
}

/// Events forwarded from the rendering engine's event loop.
#[derive(Clone, Debug)]
pub enum MapEvent {
    Load,
    Idle,
    /// One animation frame; carries deferred label refreshes.
    Frame,
    Move,
    MoveEnd,
    Click {
        layer: String,
        feature: Option<RenderedFeature>,
    },
    MouseEnter {
        layer: String,
    },
    MouseLeave {
        layer: String,
    },
}

pub struct Viewer {
    status: ViewerStatus,
    store: FilterStore,
    store_dirty: Rc<Cell<bool>>,
    synchronizer: LayerSynchronizer,
    scheduler: RefreshScheduler,
    sequencer: FetchSequencer,
    labels: Vec<ClusterLabel>,
    pending_idle_refresh: bool,
    panel_error: Option<String>,
    archive: Option<ArchiveSource>,
}

impl Viewer {
    pub fn new(config: ViewerConfig) -> Viewer {
        let status = if config.access_token.is_some() {
            ViewerStatus::Ready
        } else {
            ViewerStatus::NeedsAccessToken
        };
        let mut store = FilterStore::new();
        let store_dirty = Rc::new(Cell::new(false));
        let dirty = Rc::clone(&store_dirty);
        store.subscribe(move |_| dirty.set(true));

        Viewer {
            status,
            store,
            store_dirty,
            synchronizer: LayerSynchronizer::new(),
            scheduler: RefreshScheduler::new(LABEL_REFRESH_INTERVAL),
            sequencer: FetchSequencer::new(),
            labels: Vec::new(),
            pending_idle_refresh: false,
            panel_error: None,
            archive: None,
        }
    }

    pub fn status(&self) -> ViewerStatus {
        self.status
    }

    pub fn store(&self) -> &FilterStore {
        &self.store
    }

    pub fn labels(&self) -> &[ClusterLabel] {
        &self.labels
    }

    pub fn panel_error(&self) -> Option<&str> {
        self.panel_error.as_deref()
    }

    /// Header metadata of the tile archive, fetched by the host before the
    /// map loads.
    pub fn attach_archive(&mut self, archive: ArchiveSource) {
        self.archive = Some(archive);
    }

    /// Run one store operation, then reconcile the rendered layers with the
    /// resulting snapshot (observed through the store subscription).
    pub fn update_store<S: MapSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        op: impl FnOnce(&mut FilterStore),
    ) {
        op(&mut self.store);
        self.flush_store(surface);
    }

    /// Start a filter submission: tag the request and snapshot the criteria
    /// built from the current draft fields.
    pub fn begin_submit(&mut self) -> (FetchTag, FilterCriteria) {
        let tag = self.sequencer.begin();
        (tag, criteria_from_fields(&self.store.state().fields))
    }

    /// Apply the outcome of a filter fetch. Responses that lost the race to
    /// a newer submission are dropped; failures leave map and previous
    /// results untouched and only surface a panel message.
    pub fn finish_submit<S: MapSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        tag: FetchTag,
        result: Result<FeatureCollection, String>,
    ) {
        if !self.sequencer.is_current(tag) {
            debug!("dropping stale filter response");
            return;
        }
        match result {
            Ok(collection) => {
                self.panel_error = None;
                self.store.set_filtered(Some(Rc::new(collection)));
                self.store.apply();
                self.flush_store(surface);
            }
            Err(message) => {
                self.panel_error = Some(message);
            }
        }
    }

    pub fn clear_filters<S: MapSurface + ?Sized>(&mut self, surface: &mut S) {
        self.panel_error = None;
        self.store.clear();
        self.flush_store(surface);
    }

    pub fn handle_event<S: MapSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        event: MapEvent,
        now: Instant,
    ) {
        if self.status == ViewerStatus::NeedsAccessToken {
            return;
        }
        match event {
            MapEvent::Load => {
                if let Some(archive) = self.archive.clone() {
                    if let Err(e) = self.synchronizer.install_static(surface, &archive) {
                        error!("failed to install archive layers: {}", e);
                        return;
                    }
                }
                self.pending_idle_refresh = true;
            }
            MapEvent::Idle => {
                if std::mem::take(&mut self.pending_idle_refresh) {
                    self.refresh_labels(surface);
                }
            }
            MapEvent::Move => {
                if self.scheduler.request(now) == Refresh::Now {
                    self.refresh_labels(surface);
                }
            }
            MapEvent::Frame => {
                if self.scheduler.on_frame(now) {
                    self.refresh_labels(surface);
                }
            }
            MapEvent::MoveEnd => {
                let zoom = surface.zoom();
                let snapped = zoom.round();
                if (zoom - snapped).abs() > f64::EPSILON {
                    surface.ease_to(None, snapped, MAP_EASE_DURATION_MS);
                }
            }
            MapEvent::Click { layer, feature } => {
                self.synchronizer
                    .handle_click(surface, &layer, feature.as_ref());
            }
            MapEvent::MouseEnter { layer } => {
                self.synchronizer.handle_mouse_enter(surface, &layer);
            }
            MapEvent::MouseLeave { layer } => {
                self.synchronizer.handle_mouse_leave(surface, &layer);
            }
        }
    }

    pub fn synchronizer(&self) -> &LayerSynchronizer {
        &self.synchronizer
    }

    /// Reconcile layers with the store if a mutation was observed. The layer
    /// operations are issued before the label refresh is scheduled, so the
    /// labels are computed against the post-transition layer set.
    fn flush_store<S: MapSurface + ?Sized>(&mut self, surface: &mut S) {
        if !self.store_dirty.replace(false) {
            return;
        }
        match self.synchronizer.sync(surface, self.store.state()) {
            Ok(SyncOutcome::Unchanged) => {}
            Ok(_) => self.pending_idle_refresh = true,
            Err(e) => error!("layer synchronization failed: {}", e),
        }
    }

    fn refresh_labels<S: MapSurface + ?Sized>(&mut self, surface: &mut S) {
        self.labels =
            compute_cluster_labels(surface, self.synchronizer.active_cluster_layer());
    }
}

fn criteria_from_fields(fields: &FilterFields) -> FilterCriteria {
    let finite = |n: Option<f64>| n.filter(|v| v.is_finite());
    FilterCriteria {
        property_type: fields.property_type,
        price_min: finite(fields.price_min),
        price_max: finite(fields.price_max),
        bedrooms_min: finite(fields.bedrooms),
        bathrooms_min: finite(fields.bathrooms),
        area_min: finite(fields.area_min),
        area_max: finite(fields.area_max),
    }
}
