use serde::{Deserialize, Serialize};
use warp::http::header::CONTENT_TYPE;
use warp::http::{Response, StatusCode};
use warp::hyper::Body;

/// Wire shape of every error response.
#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorBody {
    pub error: String,
}

/// A JSON error response. Messages are what the caller is allowed to see;
/// internal detail stays in the server log.
pub fn json_error(status: StatusCode, message: &str) -> Response<Body> {
    let body = serde_json::to_vec(&ErrorBody {
        error: message.to_string(),
    })
    .unwrap_or_else(|_| br#"{"error":"internal error"}"#.to_vec());
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .expect("static error response")
}
