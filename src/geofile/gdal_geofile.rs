use gdal::vector::{FieldValue, LayerAccess, OGRFieldType};
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};

use super::feature::{Feature, OutputGroup};
use super::field_names::FieldNameMapping;
use crate::attributes::value::AttributeValue;
use crate::error::{ConvertError, Result};

/// Name of the field holding the placemark name. Always the first field.
pub const NAME_FIELD: &str = "name";

/// DBF character fields cannot be wider than this.
const MAX_STRING_WIDTH: usize = 254;
const STRING_WIDTH_PADDING: usize = 10;

/// Extensions of every file that makes up one Shapefile file set.
const SHAPEFILE_EXTENSIONS: [&str; 5] = ["shp", "shx", "dbf", "prj", "cpg"];

pub enum GdalDriverType {
    Shapefile,
}

impl GdalDriverType {
    pub fn name(&self) -> &'static str {
        match self {
            GdalDriverType::Shapefile => "ESRI Shapefile",
        }
    }
}

#[derive(Debug, Clone)]
pub struct WriterOptions {
    /// Character fields are at least this wide before padding.
    pub min_string_width: usize,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            min_string_width: 80,
        }
    }
}

/// DBF type chosen for one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Integer,
    Real,
    String { width: usize },
}

impl FieldKind {
    fn gdal_type(&self) -> OGRFieldType::Type {
        match self {
            FieldKind::Integer => OGRFieldType::OFTInteger64,
            FieldKind::Real => OGRFieldType::OFTReal,
            FieldKind::String { .. } => OGRFieldType::OFTString,
        }
    }
}

/// Path of the main file for `group`, e.g. `out/roads_line.shp`.
pub fn output_path_for_group(output_base: &Path, group: OutputGroup) -> PathBuf {
    let base_name = output_base
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = match group {
        OutputGroup::Geometry(_) => "shp",
        OutputGroup::NoGeometry => "dbf",
    };
    output_base.with_file_name(format!(
        "{}_{}.{}",
        base_name,
        group.file_suffix(),
        extension
    ))
}

/// Write the features of one output group as a Shapefile file set.
///
/// Field names are mapped for this group alone. Nothing is written for an empty
/// group. Returns the files of the set that exist after the dataset is closed.
pub fn write_features_to_geofile(
    features: &[Feature],
    group: OutputGroup,
    output_base: &Path,
    crs: Option<&gdal::spatial_ref::SpatialRef>,
    options: &WriterOptions,
) -> Result<Vec<PathBuf>> {
    if features.is_empty() {
        return Ok(Vec::new());
    }
    let output_filepath = output_path_for_group(output_base, group);
    if let Some(parent) = output_filepath.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    remove_file_set(&output_filepath)?;

    let driver = gdal::DriverManager::get_driver_by_name(GdalDriverType::Shapefile.name())?;

    let crs = match (group, crs) {
        (OutputGroup::NoGeometry, _) => None,
        (_, Some(crs)) => Some(crs.clone()),
        (_, None) => Some(gdal::spatial_ref::SpatialRef::from_epsg(4326)?),
    };
    if let Some(crs) = &crs {
        log::debug!("Using spatial ref {} for writing geofile", crs.name()?);
    }

    let field_names = get_field_names(features);
    let mapping = FieldNameMapping::from_names(&field_names);
    let field_kinds: Vec<FieldKind> = field_names
        .iter()
        .map(|field_name| infer_field_kind(features, field_name, options))
        .collect();

    {
        let mut dataset = driver.create_vector_only(&output_filepath)?;
        let layer_name = output_filepath
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let creation_options: &[&str] = &["ENCODING=UTF-8"];
        let layer_options = gdal::LayerOptions {
            name: &layer_name,
            srs: crs.as_ref(),
            ty: group.layer_type(),
            options: Some(creation_options),
        };
        let layer = dataset.create_layer(layer_options)?;

        log::info!("Setting up {} fields", mapping.len());
        for ((_, short_name), kind) in mapping.iter().zip(field_kinds.iter()) {
            let field_defn = gdal::vector::FieldDefn::new(short_name, kind.gdal_type())?;
            if let FieldKind::String { width } = kind {
                field_defn.set_width(*width as i32);
            }
            field_defn.add_to_layer(&layer)?;
        }

        log::info!(
            "Writing {} features to {:?}",
            features.len(),
            output_filepath
        );
        let bar = ProgressBar::new(features.len() as u64);
        for feature in features {
            let mut gdal_feature = gdal::vector::Feature::new(layer.defn())?;
            if let Some(geometry) = &feature.geometry {
                gdal_feature.set_geometry(to_gdal_geometry(geometry)?)?;
            }
            for ((original, short_name), kind) in mapping.iter().zip(field_kinds.iter()) {
                if let Some(value) = field_value(feature, original, *kind) {
                    gdal_feature.set_field(short_name, &value)?;
                }
            }
            gdal_feature.create(&layer)?;
            bar.inc(1);
        }
        bar.finish_and_clear();
    }

    Ok(existing_file_set(&output_filepath))
}

fn to_gdal_geometry(geometry: &geo::Geometry) -> Result<gdal::vector::Geometry> {
    let wkb = wkb::geom_to_wkb(geometry).map_err(|err| {
        ConvertError::Write(format!("Could not write geometry to WKB, {:?}", err))
    })?;
    Ok(gdal::vector::Geometry::from_wkb(&wkb)?)
}

/// The name field followed by every attribute name in first-seen order.
pub fn get_field_names(features: &[Feature]) -> Vec<String> {
    let mut field_names = vec![NAME_FIELD.to_string()];
    for feature in features {
        for key in feature.attributes.keys() {
            if !field_names.iter().any(|field_name| field_name == key) {
                field_names.push(key.to_string());
            }
        }
    }
    field_names
}

fn attribute_value(feature: &Feature, field_name: &str) -> AttributeValue {
    if field_name == NAME_FIELD {
        return AttributeValue::Text(feature.name.clone());
    }
    feature
        .attributes
        .get(field_name)
        .cloned()
        .unwrap_or(AttributeValue::Null)
}

/// Strings win over floats, floats over integers; a field with only nulls is a string.
fn infer_field_kind(features: &[Feature], field_name: &str, options: &WriterOptions) -> FieldKind {
    let values: Vec<AttributeValue> = features
        .iter()
        .map(|feature| attribute_value(feature, field_name))
        .filter(|value| !value.is_null())
        .collect();
    let has_text = values
        .iter()
        .any(|value| matches!(value, AttributeValue::Text(_)));
    let has_float = values
        .iter()
        .any(|value| matches!(value, AttributeValue::Float(_)));

    if has_text || values.is_empty() {
        let longest = values
            .iter()
            .filter_map(value_as_string)
            .map(|text| text.len())
            .max()
            .unwrap_or(0);
        let width = if values.is_empty() {
            options.min_string_width
        } else {
            longest.max(options.min_string_width) + STRING_WIDTH_PADDING
        };
        FieldKind::String {
            width: width.min(MAX_STRING_WIDTH),
        }
    } else if has_float {
        FieldKind::Real
    } else {
        FieldKind::Integer
    }
}

fn value_as_string(value: &AttributeValue) -> Option<String> {
    match value {
        AttributeValue::Integer(value) => Some(value.to_string()),
        // Debug keeps the exponent for very large or small magnitudes.
        AttributeValue::Float(value) => Some(format!("{value:?}")),
        AttributeValue::Text(value) => Some(value.clone()),
        AttributeValue::Null => None,
    }
}

fn field_value(feature: &Feature, field_name: &str, kind: FieldKind) -> Option<FieldValue> {
    let value = attribute_value(feature, field_name);
    match (kind, value) {
        (_, AttributeValue::Null) => None,
        (FieldKind::String { .. }, value) => value_as_string(&value).map(FieldValue::StringValue),
        (FieldKind::Real, AttributeValue::Float(value)) => Some(FieldValue::RealValue(value)),
        (FieldKind::Real, AttributeValue::Integer(value)) => {
            Some(FieldValue::RealValue(value as f64))
        }
        (FieldKind::Integer, AttributeValue::Integer(value)) => {
            Some(FieldValue::Integer64Value(value))
        }
        _ => None,
    }
}

fn file_set(main_filepath: &Path) -> Vec<PathBuf> {
    SHAPEFILE_EXTENSIONS
        .iter()
        .map(|extension| main_filepath.with_extension(extension))
        .collect()
}

/// Delete a previous file set so the driver can create the new one.
fn remove_file_set(main_filepath: &Path) -> Result<()> {
    for filepath in file_set(main_filepath) {
        if filepath.exists() {
            log::debug!("Removing existing file {:?}", filepath);
            std::fs::remove_file(&filepath)?;
        }
    }
    Ok(())
}

fn existing_file_set(main_filepath: &Path) -> Vec<PathBuf> {
    file_set(main_filepath)
        .into_iter()
        .filter(|filepath| filepath.exists())
        .collect()
}

#[cfg(test)]
mod tests {
    use gdal::vector::{FieldValue, LayerAccess};
    use rstest::rstest;
    use testdir::testdir;

    use super::{
        get_field_names, infer_field_kind, output_path_for_group, value_as_string,
        write_features_to_geofile, FieldKind, WriterOptions,
    };
    use crate::attributes::value::{AttributeMap, AttributeValue};
    use crate::geofile::feature::{Feature, OutputGroup};
    use crate::geometry::GeometryFamily;

    fn feature(name: &str, attributes: Vec<(&str, AttributeValue)>) -> Feature {
        Feature {
            geometry: Some(geo::Geometry::Point(geo::Point::new(80.0, 45.0))),
            attributes: attributes.into_iter().collect::<AttributeMap>(),
            name: name.to_string(),
        }
    }

    #[rstest]
    #[case(OutputGroup::Geometry(GeometryFamily::Point), "out/roads_point.shp")]
    #[case(OutputGroup::Geometry(GeometryFamily::Line), "out/roads_line.shp")]
    #[case(OutputGroup::Geometry(GeometryFamily::Polygon), "out/roads_polygon.shp")]
    #[case(OutputGroup::NoGeometry, "out/roads_nogeom.dbf")]
    fn test_output_path_for_group(#[case] group: OutputGroup, #[case] expected: &str) {
        assert_eq!(
            std::path::PathBuf::from(expected),
            output_path_for_group(std::path::Path::new("out/roads"), group)
        );
    }

    #[test]
    fn test_field_names_in_first_seen_order() {
        let features = vec![
            feature("a", vec![("z", AttributeValue::Null), ("y", AttributeValue::Null)]),
            feature("b", vec![("x", AttributeValue::Null), ("z", AttributeValue::Null)]),
            feature("c", vec![("name", AttributeValue::Null)]),
        ];
        assert_eq!(vec!["name", "z", "y", "x"], get_field_names(&features));
    }

    #[test]
    fn test_infer_field_kind() {
        let features = vec![
            feature(
                "a",
                vec![
                    ("int", AttributeValue::Integer(1)),
                    ("mixed_num", AttributeValue::Integer(1)),
                    ("mixed_text", AttributeValue::Integer(5)),
                    ("nulls", AttributeValue::Null),
                ],
            ),
            feature(
                "b",
                vec![
                    ("int", AttributeValue::Null),
                    ("mixed_num", AttributeValue::Float(2.5)),
                    ("mixed_text", AttributeValue::Text("x".repeat(200))),
                ],
            ),
        ];
        let options = WriterOptions::default();
        assert_eq!(FieldKind::Integer, infer_field_kind(&features, "int", &options));
        assert_eq!(FieldKind::Real, infer_field_kind(&features, "mixed_num", &options));
        assert_eq!(
            FieldKind::String { width: 210 },
            infer_field_kind(&features, "mixed_text", &options)
        );
        assert_eq!(
            FieldKind::String { width: 80 },
            infer_field_kind(&features, "nulls", &options)
        );
        assert_eq!(
            FieldKind::String { width: 90 },
            infer_field_kind(&features, "name", &options)
        );
    }

    #[test]
    fn test_write_point_shapefile() {
        let features = vec![
            feature(
                "Tower",
                vec![
                    ("verylongfieldname", AttributeValue::Integer(12)),
                    ("verylongfieldother", AttributeValue::Text("steel".to_string())),
                    ("height_m", AttributeValue::Float(30.5)),
                ],
            ),
            feature(
                "Mast",
                vec![("verylongfieldname", AttributeValue::Null)],
            ),
        ];
        let test_dir = testdir!();
        let output_base = test_dir.join("towers");
        let spatial_ref = gdal::spatial_ref::SpatialRef::from_epsg(4326).unwrap();

        let created = write_features_to_geofile(
            &features,
            OutputGroup::Geometry(GeometryFamily::Point),
            &output_base,
            Some(&spatial_ref),
            &WriterOptions::default(),
        )
        .unwrap();

        let shp_path = test_dir.join("towers_point.shp");
        assert!(created.contains(&shp_path));
        assert!(created.contains(&test_dir.join("towers_point.dbf")));
        assert!(created.contains(&test_dir.join("towers_point.prj")));

        let dataset = gdal::Dataset::open(&shp_path).unwrap();
        let mut layer = dataset.layer(0).unwrap();
        let field_names: Vec<String> = layer.defn().fields().map(|field| field.name()).collect();
        assert_eq!(
            vec!["name", "verylongfi", "verylong_1", "height_m"],
            field_names
        );
        assert_eq!(2, layer.feature_count());

        let features: Vec<gdal::vector::Feature> = layer.features().collect();
        assert_eq!(
            Some(FieldValue::StringValue("Tower".to_string())),
            features[0].field("name").unwrap()
        );
        assert_eq!(
            Some(FieldValue::Integer64Value(12)),
            features[0].field("verylongfi").unwrap()
        );
        assert_eq!(None, features[1].field("verylongfi").unwrap());
    }

    #[test]
    fn test_empty_group_writes_nothing() {
        let test_dir = testdir!();
        let created = write_features_to_geofile(
            &[],
            OutputGroup::Geometry(GeometryFamily::Line),
            &test_dir.join("empty"),
            None,
            &WriterOptions::default(),
        )
        .unwrap();
        assert!(created.is_empty());
        assert!(!test_dir.join("empty_line.shp").exists());
    }

    #[rstest]
    #[case(AttributeValue::Integer(42), Some("42"))]
    #[case(AttributeValue::Float(12.5), Some("12.5"))]
    #[case(AttributeValue::Float(1e300), Some("1e300"))]
    #[case(AttributeValue::Float(-2.5e-7), Some("-2.5e-7"))]
    #[case(AttributeValue::Text("steel".to_string()), Some("steel"))]
    #[case(AttributeValue::Null, None)]
    fn test_value_as_string(#[case] value: AttributeValue, #[case] expected: Option<&str>) {
        assert_eq!(expected.map(str::to_string), value_as_string(&value));
    }

    #[test]
    fn test_huge_float_fits_string_width() {
        let features = vec![
            feature("a", vec![("mixed", AttributeValue::Float(1e300))]),
            feature("b", vec![("mixed", AttributeValue::Text("x".to_string()))]),
        ];
        assert_eq!(
            FieldKind::String { width: 80 + 10 },
            infer_field_kind(&features, "mixed", &WriterOptions::default())
        );
    }

    #[test]
    fn test_rewrite_replaces_existing_file_set() {
        let test_dir = testdir!();
        let output_base = test_dir.join("sites");
        let group = OutputGroup::Geometry(GeometryFamily::Point);
        let first_run = vec![
            feature("a", vec![("kind", AttributeValue::Text("old".to_string()))]),
            feature("b", vec![("kind", AttributeValue::Text("old".to_string()))]),
            feature("c", vec![("kind", AttributeValue::Text("old".to_string()))]),
        ];
        write_features_to_geofile(&first_run, group, &output_base, None, &WriterOptions::default())
            .unwrap();

        let second_run = vec![feature("d", vec![("depth", AttributeValue::Integer(3))])];
        write_features_to_geofile(&second_run, group, &output_base, None, &WriterOptions::default())
            .unwrap();

        let dataset = gdal::Dataset::open(test_dir.join("sites_point.shp")).unwrap();
        let mut layer = dataset.layer(0).unwrap();
        let field_names: Vec<String> = layer.defn().fields().map(|field| field.name()).collect();
        assert_eq!(vec!["name", "depth"], field_names);
        assert_eq!(1, layer.feature_count());
        let features: Vec<gdal::vector::Feature> = layer.features().collect();
        assert_eq!(
            Some(FieldValue::StringValue("d".to_string())),
            features[0].field("name").unwrap()
        );
    }
}
