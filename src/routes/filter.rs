use serde::Deserialize;
use serde_json::json;
use slog_scope::error;
use warp::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use warp::http::{Response, StatusCode};
use warp::hyper::Body;
use warp::{Filter, Rejection, Reply};

use fasteign::FilterCriteria;

use crate::query::{run_filter, FilterError};
use crate::routes::with_context;
use crate::Context;

/// Raw query parameters. Everything arrives as an optional string; numeric
/// parsing is deliberately lenient so a malformed bound degrades to "unset"
/// instead of failing the request.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct Params {
    property_type: Option<String>,
    #[serde(rename = "priceMin")]
    price_min: Option<String>,
    #[serde(rename = "priceMax")]
    price_max: Option<String>,
    bedrooms: Option<String>,
    bathrooms: Option<String>,
    #[serde(rename = "areaMin")]
    area_min: Option<String>,
    #[serde(rename = "areaMax")]
    area_max: Option<String>,
}

impl Params {
    fn criteria(&self) -> FilterCriteria {
        FilterCriteria::from_params(
            self.property_type.as_deref(),
            self.price_min.as_deref(),
            self.price_max.as_deref(),
            self.bedrooms.as_deref(),
            self.bathrooms.as_deref(),
            self.area_min.as_deref(),
            self.area_max.as_deref(),
        )
    }
}

pub fn route(ctx: Context) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::get()
        .and(warp::path!("api" / "filter"))
        .and(warp::query::<Params>())
        .and(with_context(ctx))
        .and_then(handler)
}

/// Filter results change with the dataset; the response is never cached.
fn reply(status: StatusCode, body: Vec<u8>) -> Response<Body> {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .header(CACHE_CONTROL, "no-store")
        .body(Body::from(body))
        .expect("static filter response")
}

async fn handler(params: Params, ctx: Context) -> Result<Response<Body>, Rejection> {
    let criteria = params.criteria();
    let dataset = ctx.dataset_path();
    let limit = ctx.settings.filter_limit;

    let result =
        tokio::task::spawn_blocking(move || run_filter(&dataset, &criteria, limit)).await;

    let response = match result {
        Ok(Ok(collection)) => match serde_json::to_vec(&collection) {
            Ok(body) => reply(StatusCode::OK, body),
            Err(e) => {
                error!("failed to serialize filter response: {}", e);
                internal()
            }
        },
        Ok(Err(FilterError::DatasetMissing(path))) => {
            let message = format!(
                "Dataset not found at {}. Run the data pipeline to generate it.",
                path.display()
            );
            reply(
                StatusCode::NOT_FOUND,
                json!({ "error": message }).to_string().into_bytes(),
            )
        }
        Ok(Err(e)) => {
            error!("filter query failed: {}", e);
            internal()
        }
        Err(e) => {
            error!("filter task panicked: {}", e);
            internal()
        }
    };
    Ok(response)
}

fn internal() -> Response<Body> {
    reply(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "error": "Failed to filter properties" })
            .to_string()
            .into_bytes(),
    )
}
