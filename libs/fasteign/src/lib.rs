pub mod criteria;
pub mod feature;
pub mod objects;

pub use crate::criteria::{parse_num, BindValue, FilterCriteria};
pub use crate::feature::{collection, feature_from_json};
pub use crate::objects::{PropertyFeature, PropertyType, PROPERTY_TYPES};
