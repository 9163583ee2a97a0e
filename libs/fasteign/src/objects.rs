use geojson::feature::Id;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map};

/// The fixed set of property types present in the dataset, with their wire
/// spelling. Anything else coming from a client is treated as "no constraint".
pub const PROPERTY_TYPES: [PropertyType; 4] = [
    PropertyType::Condo,
    PropertyType::Land,
    PropertyType::DetachedHouse,
    PropertyType::Townhouse,
];

#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum PropertyType {
    #[serde(rename = "Condo")]
    Condo,
    #[serde(rename = "Land")]
    Land,
    #[serde(rename = "Detached House")]
    DetachedHouse,
    #[serde(rename = "Townhouse")]
    Townhouse,
}

impl PropertyType {
    pub fn as_str(&self) -> &'static str {
        match *self {
            PropertyType::Condo => "Condo",
            PropertyType::Land => "Land",
            PropertyType::DetachedHouse => "Detached House",
            PropertyType::Townhouse => "Townhouse",
        }
    }

    /// Case-sensitive lookup; unknown spellings yield `None` rather than an
    /// error so that malformed client input degrades to "unset".
    pub fn parse(raw: &str) -> Option<PropertyType> {
        PROPERTY_TYPES.iter().find(|t| t.as_str() == raw).copied()
    }
}

/// One real-estate record as rendered on the map. The source of truth is the
/// columnar dataset; this shape only exists between a query row and the
/// GeoJSON response.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyFeature {
    pub id: String,
    pub property_type: PropertyType,
    pub price: f64,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub usable_area_sqm: f64,
    /// WGS84 degrees, longitude/latitude order.
    pub coord: geo_types::Point<f64>,
}

trait ToGeom {
    fn to_geom(&self) -> geojson::Geometry;
}

impl ToGeom for geo_types::Point<f64> {
    fn to_geom(&self) -> geojson::Geometry {
        geojson::Geometry::new(geojson::Value::Point(vec![self.x(), self.y()]))
    }
}

impl From<PropertyFeature> for geojson::Feature {
    fn from(other: PropertyFeature) -> geojson::Feature {
        let geom = other.coord.to_geom();
        let mut properties = Map::new();
        properties.insert("id".to_string(), json!(other.id));
        properties.insert(
            "property_type".to_string(),
            json!(other.property_type.as_str()),
        );
        properties.insert("price".to_string(), json!(other.price));
        properties.insert("bedrooms".to_string(), json!(other.bedrooms));
        properties.insert("bathrooms".to_string(), json!(other.bathrooms));
        properties.insert(
            "usable_area_sqm".to_string(),
            json!(other.usable_area_sqm),
        );
        geojson::Feature {
            bbox: None,
            geometry: Some(geom),
            id: Some(Id::String(other.id)),
            properties: Some(properties),
            foreign_members: None,
        }
    }
}
