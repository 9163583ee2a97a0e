//! The filter query builder: translate a [`FilterCriteria`] into one
//! parameterized scan of the columnar dataset and shape the rows into a
//! GeoJSON feature collection.
//!
//! Every predicate value travels as a bound parameter. The predicate is
//! assembled from a variable subset of fields, which is exactly the setup
//! where string interpolation turns into an injection hole.

use std::path::{Path, PathBuf};

use duckdb::types::Value;
use duckdb::{params_from_iter, Connection};
use failure::Fail;
use fasteign::{collection, feature_from_json, BindValue, FilterCriteria};
use geojson::FeatureCollection;
use slog_scope::debug;

#[derive(Debug, Fail)]
pub enum FilterError {
    #[fail(display = "dataset not found: {:?}", _0)]
    DatasetMissing(PathBuf),
    #[fail(display = "query engine failure: {}", _0)]
    Engine(#[cause] duckdb::Error),
}

impl From<duckdb::Error> for FilterError {
    fn from(e: duckdb::Error) -> FilterError {
        FilterError::Engine(e)
    }
}

/// The SQL text plus its bound values, in predicate order. Only the dataset
/// path and the numeric limit are spliced into the text; both are
/// server-controlled.
pub fn build_query(
    dataset: &Path,
    criteria: &FilterCriteria,
    limit: u64,
) -> (String, Vec<BindValue>) {
    let (conditions, values) = criteria.conditions();
    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };
    let quoted = dataset.to_string_lossy().replace('\'', "''");
    let sql = format!(
        "SELECT json_object(\
            'type', 'Feature', \
            'properties', json_object(\
                'id', id, \
                'property_type', property_type, \
                'price', price, \
                'bedrooms', bedrooms, \
                'bathrooms', bathrooms, \
                'usable_area_sqm', usable_area_sqm), \
            'geometry', ST_AsGeoJSON(geometry)) AS feature \
         FROM read_parquet('{}'){} LIMIT {}",
        quoted, where_clause, limit
    );
    (sql, values)
}

fn bind_values(values: Vec<BindValue>) -> Vec<Value> {
    values
        .into_iter()
        .map(|v| match v {
            BindValue::Text(s) => Value::Text(s),
            BindValue::Number(n) => Value::Double(n),
        })
        .collect()
}

/// Run one filter query against the dataset. The connection is scoped to
/// this call and released on every exit path, including errors.
pub fn run_filter(
    dataset: &Path,
    criteria: &FilterCriteria,
    limit: u64,
) -> Result<FeatureCollection, FilterError> {
    if !dataset.exists() {
        return Err(FilterError::DatasetMissing(dataset.to_path_buf()));
    }

    let conn = Connection::open_in_memory()?;
    conn.execute_batch("INSTALL spatial; LOAD spatial;")?;

    let (sql, values) = build_query(dataset, criteria, limit);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(bind_values(values)), |row| {
        row.get::<_, Value>(0)
    })?;

    let mut features = Vec::new();
    let mut dropped = 0usize;
    for row in rows {
        let json = match row? {
            Value::Text(s) => serde_json::Value::String(s),
            other => {
                debug!("unexpected feature cell: {:?}", other);
                dropped += 1;
                continue;
            }
        };
        match feature_from_json(json) {
            Some(feature) => features.push(feature),
            None => dropped += 1,
        }
    }
    if dropped > 0 {
        debug!("dropped {} rows with unparsable geometry", dropped);
    }
    Ok(collection(features))
}
