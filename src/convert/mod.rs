pub mod assemble;

use std::path::{Path, PathBuf};

use crate::attributes::extract_attributes;
use crate::error::Result;
use crate::geofile::feature::{Feature, OutputGroup};
use crate::geofile::gdal_geofile::{
    output_path_for_group, write_features_to_geofile, WriterOptions,
};
use crate::geometry::normalize_geometry;
use crate::kml::{archive::read_document, placemark::KmlDocument};
use assemble::{apply_null_geometry_policy, assemble_features, group_features, NullGeometryPolicy};

pub struct ConversionOptions {
    pub input_path: PathBuf,
    /// Output files are named `<output_base>_<group>.<ext>`.
    pub output_base: PathBuf,
    pub null_geometry: NullGeometryPolicy,
    pub writer: WriterOptions,
}

/// Features extracted from one KML document, before grouping.
#[derive(Debug, Default)]
pub struct ExtractedFeatures {
    pub features: Vec<Feature>,
    pub placemark_count: usize,
    /// Features that came out of a `MultiGeometry`.
    pub expanded_count: usize,
    pub dropped_count: usize,
}

#[derive(Debug)]
pub struct WrittenGroup {
    pub group: OutputGroup,
    pub main_file: PathBuf,
    pub feature_count: usize,
    /// Every file of the set, sidecars included.
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Default)]
pub struct ConversionReport {
    pub placemark_count: usize,
    pub feature_count: usize,
    pub written: Vec<WrittenGroup>,
}

/// Convert a KMZ or KML file into one Shapefile file set per output group.
///
/// Any fatal error stops the conversion. Groups written before the error stay on disk.
pub fn convert(options: &ConversionOptions) -> Result<ConversionReport> {
    log::info!("Reading {:?}", options.input_path);
    let kml_text = read_document(&options.input_path)?;
    let extracted = extract_features(&kml_text, options.null_geometry)?;
    log::info!(
        "Found {} placemarks, assembled {} features ({} from multi-geometries)",
        extracted.placemark_count,
        extracted.features.len(),
        extracted.expanded_count
    );
    if extracted.dropped_count > 0 {
        log::info!(
            "Skipped {} features with null geometry",
            extracted.dropped_count
        );
    }

    let mut report = ConversionReport {
        placemark_count: extracted.placemark_count,
        feature_count: extracted.features.len(),
        written: Vec::new(),
    };
    for (group, features) in group_features(extracted.features) {
        report
            .written
            .push(write_group(group, &features, &options.output_base, &options.writer)?);
    }
    if report.written.is_empty() {
        log::warn!("No features to write");
    }
    Ok(report)
}

fn write_group(
    group: OutputGroup,
    features: &[Feature],
    output_base: &Path,
    writer_options: &WriterOptions,
) -> Result<WrittenGroup> {
    let files = write_features_to_geofile(features, group, output_base, None, writer_options)?;
    Ok(WrittenGroup {
        group,
        main_file: output_path_for_group(output_base, group),
        feature_count: features.len(),
        files,
    })
}

/// Parse KML text and turn each placemark into features, in document order.
pub fn extract_features(kml_text: &str, policy: NullGeometryPolicy) -> Result<ExtractedFeatures> {
    let document = KmlDocument::parse(kml_text)?;
    let placemarks = document.placemarks();
    let mut extracted = ExtractedFeatures {
        placemark_count: placemarks.len(),
        ..ExtractedFeatures::default()
    };

    for placemark in &placemarks {
        let geometries = normalize_geometry(placemark.geometry.as_ref())?;
        extracted.expanded_count += geometries.iter().filter(|geometry| geometry.expanded).count();
        let attributes = extract_attributes(placemark);
        log::debug!(
            "Placemark '{}' (style {:?}): geometries {:?}, {} attributes",
            placemark.name,
            placemark.style_url,
            geometries
                .iter()
                .map(|geometry| geometry.family)
                .collect::<Vec<_>>(),
            attributes.len()
        );

        let mut features = assemble_features(&placemark.name, attributes, geometries);
        let dropped = apply_null_geometry_policy(&mut features, policy);
        if dropped > 0 {
            log::debug!("Dropping placemark '{}' without geometry", placemark.name);
        }
        extracted.dropped_count += dropped;
        extracted.features.extend(features);
    }
    Ok(extracted)
}
