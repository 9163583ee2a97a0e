use serde::{Deserialize, Serialize};
use warp::{Filter, Rejection, Reply};

use crate::routes::with_context;
use crate::Context;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Serialize, Deserialize, Debug)]
pub struct EndPoint {
    pub description: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Status {
    pub version: String,
    pub status: String,
    /// Whether the processed dataset and the tile archive are in place.
    pub dataset: bool,
    pub archive: bool,
}

pub fn root() -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::get().and(warp::path::end()).map(|| {
        warp::reply::json(&EndPoint {
            description: "real-estate map viewer".to_string(),
        })
    })
}

pub fn status(ctx: Context) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::get()
        .and(warp::path("status"))
        .and(warp::path::end())
        .and(with_context(ctx))
        .map(|ctx: Context| {
            warp::reply::json(&Status {
                version: VERSION.to_string(),
                status: "good".to_string(),
                dataset: ctx.dataset_path().exists(),
                archive: ctx.archive_path().exists(),
            })
        })
}
