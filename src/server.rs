use std::convert::Infallible;
use std::net::SocketAddr;

use slog_scope::info;
use warp::{Filter, Reply};

use crate::routes;
use crate::Context;

/// The full application: API routes, rejection handling, CORS, request
/// logging.
pub fn app(ctx: Context) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    routes::api(ctx)
        .with(warp::cors().allow_any_origin().allow_methods(vec!["GET"]))
        .recover(routes::report_rejection)
        .with(warp::log("heimskra"))
}

pub async fn runserver(ctx: Context) -> Result<(), failure::Error> {
    let addr: SocketAddr = ctx
        .settings
        .bind
        .parse()
        .map_err(|e| failure::err_msg(format!("invalid bind address '{}': {}", ctx.settings.bind, e)))?;
    info!("listening on {}", addr);
    warp::serve(app(ctx)).run(addr).await;
    Ok(())
}
