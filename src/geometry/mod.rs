pub mod coordinates;

use crate::error::Result;
use crate::kml::vocabulary::Element;
use coordinates::parse_coordinates;

/// The kind of geometry a Shapefile can hold; one file set is written per family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryFamily {
    Point,
    Line,
    Polygon,
}

impl GeometryFamily {
    pub fn of(geometry: &geo::Geometry) -> Option<Self> {
        match geometry {
            geo::Geometry::Point(_) => Some(GeometryFamily::Point),
            geo::Geometry::LineString(_) => Some(GeometryFamily::Line),
            geo::Geometry::Polygon(_) => Some(GeometryFamily::Polygon),
            _ => None,
        }
    }

    /// Suffix used in output file names, e.g. `roads_line.shp`.
    pub fn file_suffix(&self) -> &'static str {
        match self {
            GeometryFamily::Point => "point",
            GeometryFamily::Line => "line",
            GeometryFamily::Polygon => "polygon",
        }
    }
}

/// A single 2D geometry taken from a placemark.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedGeometry {
    pub geometry: geo::Geometry,
    pub family: GeometryFamily,
    /// True when the geometry was a member of a `MultiGeometry`.
    pub expanded: bool,
}

/// Turn a KML geometry element into flat, 2D, single-family geometries.
///
/// `MultiGeometry` is expanded recursively, so the result never holds a
/// collection. Elements with no coordinates produce nothing. Unparseable
/// coordinates are an error.
pub fn normalize_geometry(element: Option<&Element>) -> Result<Vec<NormalizedGeometry>> {
    let mut geometries = Vec::new();
    if let Some(element) = element {
        collect_geometries(element, false, &mut geometries)?;
    }
    Ok(geometries)
}

fn collect_geometries(
    element: &Element,
    expanded: bool,
    geometries: &mut Vec<NormalizedGeometry>,
) -> Result<()> {
    let converted = match element.local_name() {
        "Point" => read_coordinates(element)?
            .and_then(|coords| coords.first().copied())
            .map(|coord| (geo::Geometry::Point(coord.into()), GeometryFamily::Point)),
        // A ring outside a polygon is just a closed line.
        "LineString" | "LinearRing" => read_coordinates(element)?.map(|coords| {
            (
                geo::Geometry::LineString(coords.into()),
                GeometryFamily::Line,
            )
        }),
        "Polygon" => read_polygon(element)?
            .map(|polygon| (geo::Geometry::Polygon(polygon), GeometryFamily::Polygon)),
        "MultiGeometry" => {
            for child in element.element_children() {
                collect_geometries(&child, true, geometries)?;
            }
            None
        }
        other => {
            log::debug!("Ignoring unsupported geometry element {}", other);
            None
        }
    };
    if let Some((geometry, family)) = converted {
        geometries.push(NormalizedGeometry {
            geometry,
            family,
            expanded,
        });
    }
    Ok(())
}

/// Coordinates of the element's `coordinates` child, `None` when absent or empty.
fn read_coordinates(element: &Element) -> Result<Option<Vec<geo::Coord>>> {
    let text = match element.child_text("coordinates") {
        Some(text) => text,
        None => return Ok(None),
    };
    let coords = parse_coordinates(&text)?;
    if coords.is_empty() {
        return Ok(None);
    }
    Ok(Some(coords))
}

fn read_ring(boundary: &Element) -> Result<Option<geo::LineString>> {
    match boundary.child("LinearRing") {
        Some(ring) => Ok(read_coordinates(&ring)?.map(geo::LineString::from)),
        None => Ok(None),
    }
}

fn read_polygon(element: &Element) -> Result<Option<geo::Polygon>> {
    let exterior = match element.child("outerBoundaryIs") {
        Some(boundary) => read_ring(&boundary)?,
        None => None,
    };
    let exterior = match exterior {
        Some(exterior) => exterior,
        None => {
            log::debug!("Polygon without outer boundary coordinates");
            return Ok(None);
        }
    };
    let mut interiors = Vec::new();
    for boundary in element.children_named("innerBoundaryIs") {
        match read_ring(&boundary)? {
            Some(interior) => interiors.push(interior),
            None => log::debug!("Skipping inner boundary without coordinates"),
        }
    }
    // geo::Polygon::new closes any ring that is not already closed.
    Ok(Some(geo::Polygon::new(exterior, interiors)))
}
