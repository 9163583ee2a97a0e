use std::convert::Infallible;

use warp::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use warp::http::{Response, StatusCode};
use warp::hyper::Body;
use warp::{Filter, Rejection, Reply};

use crate::error::json_error;
use crate::routes::with_context;
use crate::Context;

/// Valid iff `z` is an integer in `[0, max_zoom]` and both `x` and `y` fall
/// inside the `2^z` tile grid. Zoom levels past 30 overflow tile counts and
/// are rejected regardless of the configured maximum.
pub fn is_valid_tile(z: i64, x: i64, y: i64, max_zoom: i64) -> bool {
    if z < 0 || z > max_zoom || z > 30 {
        return false;
    }
    let bound = 1i64 << z;
    x >= 0 && x < bound && y >= 0 && y < bound
}

pub fn route(ctx: Context) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::get()
        .and(warp::path!("api" / "tiles" / String / String / String))
        .and(with_context(ctx))
        .and_then(handler)
}

/// Coordinates come in as raw path segments so non-integer input gets a 400
/// instead of falling through to a generic route mismatch.
async fn handler(
    z: String,
    x: String,
    y: String,
    ctx: Context,
) -> Result<Response<Body>, Infallible> {
    let parsed = (
        z.parse::<i64>().ok(),
        x.parse::<i64>().ok(),
        y.parse::<i64>().ok(),
    );
    let valid = match parsed {
        (Some(z), Some(x), Some(y)) => is_valid_tile(z, x, y, ctx.settings.tiles_max_zoom),
        _ => false,
    };
    if !valid {
        return Ok(json_error(
            StatusCode::BAD_REQUEST,
            "Invalid tile coordinates",
        ));
    }

    // Empty vector tile: renderers accept it as "no data" for this tile.
    let response = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "application/vnd.mapbox-vector-tile")
        .header(CACHE_CONTROL, "public, max-age=60")
        .body(Body::empty())
        .expect("static tile response");
    Ok(response)
}
