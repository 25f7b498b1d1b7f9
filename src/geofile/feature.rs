use crate::attributes::value::AttributeMap;
use crate::geometry::GeometryFamily;

/// One row handed to the writer: an optional 2D geometry, its attributes and the
/// placemark's display name.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub geometry: Option<geo::Geometry>,
    pub attributes: AttributeMap,
    pub name: String,
}

/// Features of one output group end up in one file set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputGroup {
    Geometry(GeometryFamily),
    /// Features kept without geometry, written as an attribute table only.
    NoGeometry,
}

impl OutputGroup {
    /// Groups in the order they are written.
    pub const ALL: [OutputGroup; 4] = [
        OutputGroup::Geometry(GeometryFamily::Point),
        OutputGroup::Geometry(GeometryFamily::Line),
        OutputGroup::Geometry(GeometryFamily::Polygon),
        OutputGroup::NoGeometry,
    ];

    pub fn file_suffix(&self) -> &'static str {
        match self {
            OutputGroup::Geometry(family) => family.file_suffix(),
            OutputGroup::NoGeometry => "nogeom",
        }
    }

    pub fn layer_type(&self) -> gdal::vector::OGRwkbGeometryType::Type {
        use gdal::vector::OGRwkbGeometryType::*;
        match self {
            OutputGroup::Geometry(GeometryFamily::Point) => wkbPoint,
            OutputGroup::Geometry(GeometryFamily::Line) => wkbLineString,
            OutputGroup::Geometry(GeometryFamily::Polygon) => wkbPolygon,
            OutputGroup::NoGeometry => wkbNone,
        }
    }
}
