use crate::core::GeoPoint;
use crate::validation::error::ValidationError;
use serde_json::Value;

/// Parse a GeoJSON `[lon, lat, ...]` coordinate array.
///
/// A third member (altitude) is allowed and ignored.
pub fn parse_coordinates(value: &Value) -> Result<GeoPoint, ValidationError> {
    let members = value.as_array().ok_or_else(|| ValidationError::NotAnArray {
        found: value_kind(value).to_string(),
    })?;

    if members.len() < 2 {
        return Err(ValidationError::TooShort { len: members.len() });
    }

    let lon = finite_member(members, 0)?;
    let lat = finite_member(members, 1)?;

    if !(-90.0..=90.0).contains(&lat) {
        return Err(ValidationError::LatitudeOutOfRange { lat });
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(ValidationError::LongitudeOutOfRange { lon });
    }

    Ok(GeoPoint::new(lat, lon))
}

fn finite_member(members: &[Value], index: usize) -> Result<f64, ValidationError> {
    members[index]
        .as_f64()
        .filter(|v| v.is_finite())
        .ok_or(ValidationError::NonNumeric { index })
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Read a numeric property that may be stored as a number or as text
/// using `.` or `,` as decimal separator.
pub fn numeric_property(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => crate::utils::settings::parse_decimal_input(s),
        _ => None,
    }
}
