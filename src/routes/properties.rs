//! Listing for the sidebar: forward-only cursor pagination over a fixed
//! mock set, a stand-in until listings get their own store.

use serde::{Deserialize, Serialize};
use warp::{Filter, Rejection, Reply};

use crate::routes::with_context;
use crate::Context;

const LISTING: [(&str, &str); 20] = [
    ("1", "Apartment Central Station"),
    ("2", "House with Garden - North"),
    ("3", "Studio Downtown"),
    ("4", "Villa by the Lake"),
    ("5", "Loft Industrial District"),
    ("6", "Family Home Westside"),
    ("7", "Penthouse Skyline View"),
    ("8", "Cottage Countryside"),
    ("9", "Duplex East End"),
    ("10", "Condominium Riverside"),
    ("11", "Townhouse Historic District"),
    ("12", "Bungalow Quiet Street"),
    ("13", "Apartment Near Park"),
    ("14", "House with Pool"),
    ("15", "Studio Harbor View"),
    ("16", "Villa Mountain View"),
    ("17", "Loft City Center"),
    ("18", "Family Home Suburbs"),
    ("19", "Penthouse Top Floor"),
    ("20", "Cottage Seaside"),
];

#[derive(Debug, Default, Clone, Deserialize)]
pub struct Params {
    cursor: Option<String>,
    limit: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PropertyItem {
    pub id: String,
    pub title: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct PropertiesResponse {
    pub items: Vec<PropertyItem>,
    #[serde(rename = "nextCursor", skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// Cursor is the last-seen item id; an unknown cursor yields an empty page
/// rather than restarting from the top.
pub fn paginate(cursor: Option<&str>, limit: usize) -> PropertiesResponse {
    let start = match cursor {
        Some(cursor) => match LISTING.iter().position(|(id, _)| *id == cursor) {
            Some(pos) => pos + 1,
            None => {
                return PropertiesResponse {
                    items: vec![],
                    next_cursor: None,
                }
            }
        },
        None => 0,
    };

    let items: Vec<PropertyItem> = LISTING
        .iter()
        .skip(start)
        .take(limit)
        .map(|(id, title)| PropertyItem {
            id: (*id).to_string(),
            title: (*title).to_string(),
        })
        .collect();
    let next_cursor = if start + items.len() < LISTING.len() {
        items.last().map(|item| item.id.clone())
    } else {
        None
    };
    PropertiesResponse { items, next_cursor }
}

pub fn route(ctx: Context) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::get()
        .and(warp::path!("api" / "properties"))
        .and(warp::query::<Params>())
        .and(with_context(ctx))
        .map(|params: Params, ctx: Context| {
            let settings = &ctx.settings.properties;
            let limit = params
                .limit
                .as_deref()
                .and_then(|raw| raw.trim().parse::<usize>().ok())
                .map(|limit| limit.max(1).min(settings.max_limit))
                .unwrap_or(settings.default_limit);
            warp::reply::json(&paginate(params.cursor.as_deref(), limit))
        })
}
