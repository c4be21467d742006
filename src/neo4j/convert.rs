//! Numeric normalization for values coming out of Neo4j.
//!
//! Counts and legacy `id(n)` identifiers arrive as Bolt integers, but
//! depending on the query and the server version the same column can also
//! come back as a float or a string. All of that is funneled through
//! [`to_plain_number`] while rows are decoded, so nothing downstream ever
//! sees a driver type.

use thiserror::Error;

/// A numeric-ish value as read from a result row.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphNumber {
    Integer(i64),
    Float(f64),
    Text(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum ConversionError {
    #[error("value {0} is not an integral number")]
    NotIntegral(f64),
    #[error("value '{0}' is not numeric")]
    NotNumeric(String),
    #[error("column '{0}' holds no numeric value")]
    MissingColumn(String),
}

/// Normalize a graph-store numeric to a plain `i64`.
///
/// Integers pass through, floats must be finite and integral, strings must
/// parse as one of the two. Anything else is an error.
pub fn to_plain_number(value: GraphNumber) -> Result<i64, ConversionError> {
    match value {
        GraphNumber::Integer(i) => Ok(i),
        GraphNumber::Float(f) => {
            // `i64::MAX as f64` rounds up to 2^63, which is already out of range.
            if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
                Ok(f as i64)
            } else {
                Err(ConversionError::NotIntegral(f))
            }
        }
        GraphNumber::Text(s) => {
            let trimmed = s.trim();
            if let Ok(i) = trimmed.parse::<i64>() {
                return Ok(i);
            }
            match trimmed.parse::<f64>() {
                Ok(f) => to_plain_number(GraphNumber::Float(f)),
                Err(_) => Err(ConversionError::NotNumeric(s)),
            }
        }
    }
}

/// Read a nullable numeric column from a row.
pub fn row_number(row: &neo4rs::Row, key: &str) -> Result<Option<i64>, ConversionError> {
    if let Ok(value) = row.get::<Option<i64>>(key) {
        return Ok(value);
    }
    if let Ok(Some(f)) = row.get::<Option<f64>>(key) {
        return to_plain_number(GraphNumber::Float(f)).map(Some);
    }
    if let Ok(Some(s)) = row.get::<Option<String>>(key) {
        return to_plain_number(GraphNumber::Text(s)).map(Some);
    }
    Err(ConversionError::MissingColumn(key.to_string()))
}

/// Read a node identifier: `elementId()` strings pass through, legacy
/// integer ids are normalized and rendered as strings.
pub fn row_id(row: &neo4rs::Row, key: &str) -> Result<Option<String>, ConversionError> {
    if let Ok(value) = row.get::<Option<String>>(key) {
        return Ok(value);
    }
    Ok(row_number(row, key)?.map(|n| n.to_string()))
}
