mod archive;
mod entry_point;
mod filter;
mod properties;
mod tiles;

use std::convert::Infallible;

use slog_scope::error;
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use crate::error::ErrorBody;
use crate::Context;

pub use archive::parse_range;
pub use properties::{PropertiesResponse, PropertyItem};
pub use tiles::is_valid_tile;

pub(crate) fn with_context(
    ctx: Context,
) -> impl Filter<Extract = (Context,), Error = Infallible> + Clone {
    warp::any().map(move || ctx.clone())
}

/// All API routes. The caller adds rejection handling and request logging.
pub fn api(ctx: Context) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    entry_point::root()
        .or(entry_point::status(ctx.clone()))
        .or(filter::route(ctx.clone()))
        .or(archive::route(ctx.clone()))
        .or(tiles::route(ctx.clone()))
        .or(properties::route(ctx))
}

pub async fn report_rejection(rejection: Rejection) -> Result<impl Reply, Infallible> {
    let (status, message) = if rejection.is_not_found() {
        (StatusCode::NOT_FOUND, "not found")
    } else if rejection.find::<warp::reject::InvalidQuery>().is_some() {
        (StatusCode::BAD_REQUEST, "invalid query string")
    } else if rejection
        .find::<warp::reject::MethodNotAllowed>()
        .is_some()
    {
        (StatusCode::METHOD_NOT_ALLOWED, "method not allowed")
    } else if rejection
        .find::<warp::filters::cors::CorsForbidden>()
        .is_some()
    {
        (StatusCode::FORBIDDEN, "cross-origin request forbidden")
    } else {
        error!("unhandled rejection: {:?}", rejection);
        (StatusCode::INTERNAL_SERVER_ERROR, "internal error")
    };
    Ok(warp::reply::with_status(
        warp::reply::json(&ErrorBody {
            error: message.to_string(),
        }),
        status,
    ))
}
