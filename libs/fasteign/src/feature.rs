use serde_json::Value;
use slog_scope::debug;

/// Turn one query-engine row into a GeoJSON feature.
///
/// Depending on how the engine serializes its JSON column, the row value may
/// arrive as an embedded object or as a string that still needs a parse; the
/// nested geometry has the same two shapes. A feature whose geometry cannot
/// be parsed is dropped (`None`), never fatal to the whole response.
pub fn feature_from_json(raw: Value) -> Option<geojson::Feature> {
    let mut value = match raw {
        Value::String(s) => serde_json::from_str::<Value>(&s).ok()?,
        v @ Value::Object(_) => v,
        other => {
            debug!("dropping non-object feature row: {}", other);
            return None;
        }
    };

    if let Some(obj) = value.as_object_mut() {
        if let Some(Value::String(geom)) = obj.get("geometry").cloned() {
            let parsed = serde_json::from_str::<Value>(&geom).ok()?;
            obj.insert("geometry".to_string(), parsed);
        }
    }

    serde_json::from_value::<geojson::Feature>(value).ok()
}

pub fn collection(features: Vec<geojson::Feature>) -> geojson::FeatureCollection {
    geojson::FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}
