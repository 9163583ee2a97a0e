//! Source/layer identifiers and the circle styling shared by the static tile
//! layer and the dynamic filtered layer. The step thresholds mirror the
//! pre-clustering baked into the tile archive so the switch between the two
//! layers does not change the visual density.

pub const MAP_MAX_ZOOM: f64 = 18.0;
pub const MAP_EASE_DURATION_MS: u64 = 400;

/// GeoJSON clustering parameters, matching the archive's own pre-clustering.
pub const CLUSTER_RADIUS: u32 = 50;
pub const CLUSTER_MAX_ZOOM: u32 = 14;

pub const PMTILES_SOURCE_ID: &str = "pmtiles-realestate";
pub const CLUSTERS_LAYER_ID: &str = "clusters";
pub const UNCLUSTERED_LAYER_ID: &str = "unclustered-point";
pub const SOURCE_LAYER_FALLBACK: &str = "real_estate_1M";

pub const FILTERED_SOURCE_ID: &str = "filtered-points";
pub const FILTERED_CLUSTERS_LAYER_ID: &str = "filtered-clusters";
pub const FILTERED_UNCLUSTERED_LAYER_ID: &str = "filtered-unclustered-point";

const CLUSTER_THRESHOLD_SMALL: u64 = 100;
const CLUSTER_THRESHOLD_LARGE: u64 = 750;
const CLUSTER_COLOR_SMALL: &str = "#51bbd6";
const CLUSTER_COLOR_MEDIUM: &str = "#F57927";
const CLUSTER_COLOR_LARGE: &str = "#f28cb1";
const CLUSTER_RADIUS_SMALL: f64 = 20.0;
const CLUSTER_RADIUS_MEDIUM: f64 = 30.0;
const CLUSTER_RADIUS_LARGE: f64 = 40.0;

/// Header metadata of the tile archive, as reported by the archive reader.
#[derive(Clone, Debug, PartialEq)]
pub struct ArchiveHeader {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
    pub min_zoom: u8,
    pub max_zoom: u8,
    pub vector_layers: Vec<String>,
}

impl ArchiveHeader {
    /// The source layer to render: the archive's first vector layer, falling
    /// back to the dataset name the pipeline uses.
    pub fn source_layer(&self) -> &str {
        self.vector_layers
            .first()
            .map(String::as_str)
            .unwrap_or(SOURCE_LAYER_FALLBACK)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ArchiveSource {
    pub url: String,
    pub header: ArchiveHeader,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClusterOptions {
    pub radius: u32,
    pub max_zoom: u32,
}

impl Default for ClusterOptions {
    fn default() -> ClusterOptions {
        ClusterOptions {
            radius: CLUSTER_RADIUS,
            max_zoom: CLUSTER_MAX_ZOOM,
        }
    }
}

/// Step expression over `point_count`: two thresholds, three buckets.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClusterSteps {
    pub thresholds: [u64; 2],
    pub colors: [&'static str; 3],
    pub radii: [f64; 3],
}

pub fn cluster_steps() -> ClusterSteps {
    ClusterSteps {
        thresholds: [CLUSTER_THRESHOLD_SMALL, CLUSTER_THRESHOLD_LARGE],
        colors: [
            CLUSTER_COLOR_SMALL,
            CLUSTER_COLOR_MEDIUM,
            CLUSTER_COLOR_LARGE,
        ],
        radii: [
            CLUSTER_RADIUS_SMALL,
            CLUSTER_RADIUS_MEDIUM,
            CLUSTER_RADIUS_LARGE,
        ],
    }
}

impl ClusterSteps {
    pub fn color_for(&self, count: u64) -> &'static str {
        if count >= self.thresholds[1] {
            self.colors[2]
        } else if count >= self.thresholds[0] {
            self.colors[1]
        } else {
            self.colors[0]
        }
    }

    pub fn radius_for(&self, count: u64) -> f64 {
        if count >= self.thresholds[1] {
            self.radii[2]
        } else if count >= self.thresholds[0] {
            self.radii[1]
        } else {
            self.radii[0]
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClusterFilter {
    /// Only features carrying a `point_count` (clusters).
    OnlyClusters,
    /// Only features without a `point_count` (single points).
    OnlyUnclustered,
}

#[derive(Clone, Debug, PartialEq)]
pub enum CirclePaint {
    Steps(ClusterSteps),
    Uniform {
        color: &'static str,
        radius: f64,
        stroke_color: &'static str,
        stroke_width: f64,
    },
}

fn unclustered_paint() -> CirclePaint {
    CirclePaint::Uniform {
        color: "#11b4da",
        radius: 4.0,
        stroke_color: "#fff",
        stroke_width: 1.0,
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LayerSpec {
    pub id: String,
    pub source: String,
    pub source_layer: Option<String>,
    pub filter: ClusterFilter,
    pub paint: CirclePaint,
}

pub fn clusters_layer(source_layer: &str) -> LayerSpec {
    LayerSpec {
        id: CLUSTERS_LAYER_ID.to_string(),
        source: PMTILES_SOURCE_ID.to_string(),
        source_layer: Some(source_layer.to_string()),
        filter: ClusterFilter::OnlyClusters,
        paint: CirclePaint::Steps(cluster_steps()),
    }
}

pub fn unclustered_layer(source_layer: &str) -> LayerSpec {
    LayerSpec {
        id: UNCLUSTERED_LAYER_ID.to_string(),
        source: PMTILES_SOURCE_ID.to_string(),
        source_layer: Some(source_layer.to_string()),
        filter: ClusterFilter::OnlyUnclustered,
        paint: unclustered_paint(),
    }
}

pub fn filtered_clusters_layer() -> LayerSpec {
    LayerSpec {
        id: FILTERED_CLUSTERS_LAYER_ID.to_string(),
        source: FILTERED_SOURCE_ID.to_string(),
        source_layer: None,
        filter: ClusterFilter::OnlyClusters,
        paint: CirclePaint::Steps(cluster_steps()),
    }
}

pub fn filtered_unclustered_layer() -> LayerSpec {
    LayerSpec {
        id: FILTERED_UNCLUSTERED_LAYER_ID.to_string(),
        source: FILTERED_SOURCE_ID.to_string(),
        source_layer: None,
        filter: ClusterFilter::OnlyUnclustered,
        paint: unclustered_paint(),
    }
}
