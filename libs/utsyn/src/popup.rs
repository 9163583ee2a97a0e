//! Popup content for single-point clicks, built from whatever properties the
//! rendered feature carries.

use serde_json::{Map, Value};

/// Short price form: `1.5M`, `500K`, plain below a thousand.
pub fn format_price(price: f64) -> String {
    if price >= 1_000_000.0 {
        format!("{:.1}M", price / 1_000_000.0)
    } else if price >= 1_000.0 {
        format!("{:.0}K", price / 1_000.0)
    } else {
        format!("{}", price)
    }
}

fn num(props: &Map<String, Value>, key: &str) -> Option<f64> {
    props.get(key).and_then(Value::as_f64)
}

/// Lines for the property popup; absent fields are omitted, an empty set
/// renders as a dash.
pub fn popup_html(props: &Map<String, Value>) -> String {
    let property_type = props
        .get("property_type")
        .and_then(Value::as_str)
        .unwrap_or("—");

    let mut lines = vec![format!("<strong>{}</strong>", property_type)];
    match num(props, "price") {
        Some(price) if price > 0.0 => lines.push(format!("Price: ฿{}", format_price(price))),
        _ => {}
    }
    if let Some(bedrooms) = num(props, "bedrooms") {
        lines.push(format!("Bedrooms: {}", bedrooms));
    }
    if let Some(bathrooms) = num(props, "bathrooms") {
        lines.push(format!("Bathrooms: {}", bathrooms));
    }
    match num(props, "usable_area_sqm") {
        Some(area) if area > 0.0 => lines.push(format!("Area: {} m²", area)),
        _ => {}
    }

    lines.join("<br>")
}
