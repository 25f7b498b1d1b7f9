use crate::error::{ConvertError, Result};

/// Parse KML coordinate text into 2D coordinates.
///
/// Tuples are separated by whitespace and hold `lon,lat` or `lon,lat,alt`. The
/// altitude is dropped. A tuple that is not 2 or 3 finite numbers is an error for
/// the whole geometry.
pub fn parse_coordinates(text: &str) -> Result<Vec<geo::Coord>> {
    text.split_whitespace().map(parse_tuple).collect()
}

fn parse_tuple(tuple: &str) -> Result<geo::Coord> {
    let components = tuple
        .split(',')
        .map(|component| component.parse::<f64>().ok().filter(|value| value.is_finite()))
        .collect::<Option<Vec<f64>>>();
    match components.as_deref() {
        Some([x, y]) | Some([x, y, _]) => Ok(geo::Coord { x: *x, y: *y }),
        _ => Err(ConvertError::Geometry(format!(
            "Invalid coordinate tuple '{}', expected lon,lat[,alt]",
            tuple
        ))),
    }
}
