//! Client-side logic of the map viewer: the filter state store, the layer
//! synchronizer keeping the static tile layer and the dynamic filtered layer
//! in lockstep, and the cluster label overlay. The rendering engine itself
//! stays behind the [`surface::MapSurface`] trait.

pub mod fetch;
pub mod labels;
pub mod layers;
pub mod popup;
pub mod store;
pub mod surface;
pub mod sync;
pub mod throttle;
pub mod viewer;

pub use crate::fetch::{FetchSequencer, FetchTag};
pub use crate::labels::{compute_cluster_labels, ClusterLabel};
pub use crate::store::{Field, FilterState, FilterStore};
pub use crate::surface::{LngLat, MapSurface, RenderedFeature, ScreenPoint, SurfaceError};
pub use crate::sync::{ActiveLayer, LayerSynchronizer, SyncOutcome};
pub use crate::viewer::{MapEvent, Viewer, ViewerConfig, ViewerStatus};
