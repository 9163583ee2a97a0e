use crate::objects::PropertyType;

/// A value bound into the filter predicate. Kept engine-agnostic so the
/// query layer decides how to hand it to its driver.
#[derive(Clone, Debug, PartialEq)]
pub enum BindValue {
    Text(String),
    Number(f64),
}

/// The validated, optional constraint set built from client input at submit
/// time. Absent means "no constraint on this dimension"; every present bound
/// is finite.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterCriteria {
    pub property_type: Option<PropertyType>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub bedrooms_min: Option<f64>,
    pub bathrooms_min: Option<f64>,
    pub area_min: Option<f64>,
    pub area_max: Option<f64>,
}

/// Lenient numeric parsing for untrusted query parameters: empty, malformed
/// and non-finite input all degrade to `None`, never an error.
pub fn parse_num(raw: Option<&str>) -> Option<f64> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse::<f64>().ok().filter(|n| n.is_finite())
}

impl FilterCriteria {
    pub fn from_params(
        property_type: Option<&str>,
        price_min: Option<&str>,
        price_max: Option<&str>,
        bedrooms: Option<&str>,
        bathrooms: Option<&str>,
        area_min: Option<&str>,
        area_max: Option<&str>,
    ) -> FilterCriteria {
        FilterCriteria {
            property_type: property_type
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .and_then(PropertyType::parse),
            price_min: parse_num(price_min),
            price_max: parse_num(price_max),
            bedrooms_min: parse_num(bedrooms),
            bathrooms_min: parse_num(bathrooms),
            area_min: parse_num(area_min),
            area_max: parse_num(area_max),
        }
    }

    pub fn is_unrestricted(&self) -> bool {
        let (conditions, _) = self.conditions();
        conditions.is_empty()
    }

    /// The conjunctive predicate over the present bounds: SQL fragments with
    /// one `?` placeholder each, and the bound values in the same order.
    pub fn conditions(&self) -> (Vec<&'static str>, Vec<BindValue>) {
        let mut conditions = Vec::new();
        let mut values = Vec::new();

        if let Some(t) = self.property_type {
            conditions.push("property_type = ?");
            values.push(BindValue::Text(t.as_str().to_string()));
        }
        if let Some(n) = self.price_min {
            conditions.push("price >= ?");
            values.push(BindValue::Number(n));
        }
        if let Some(n) = self.price_max {
            conditions.push("price <= ?");
            values.push(BindValue::Number(n));
        }
        if let Some(n) = self.bedrooms_min {
            conditions.push("bedrooms >= ?");
            values.push(BindValue::Number(n));
        }
        if let Some(n) = self.bathrooms_min {
            conditions.push("bathrooms >= ?");
            values.push(BindValue::Number(n));
        }
        if let Some(n) = self.area_min {
            conditions.push("usable_area_sqm >= ?");
            values.push(BindValue::Number(n));
        }
        if let Some(n) = self.area_max {
            conditions.push("usable_area_sqm <= ?");
            values.push(BindValue::Number(n));
        }

        (conditions, values)
    }
}
