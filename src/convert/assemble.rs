use crate::attributes::value::AttributeMap;
use crate::geofile::feature::{Feature, OutputGroup};
use crate::geometry::{GeometryFamily, NormalizedGeometry};

/// Whether features without geometry reach the writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullGeometryPolicy {
    Keep,
    Drop,
}

/// One feature per geometry, all sharing the placemark's attributes and name.
/// A placemark without geometry becomes a single feature with no geometry.
pub fn assemble_features(
    name: &str,
    attributes: AttributeMap,
    geometries: Vec<NormalizedGeometry>,
) -> Vec<Feature> {
    if geometries.is_empty() {
        return vec![Feature {
            geometry: None,
            attributes,
            name: name.to_string(),
        }];
    }
    geometries
        .into_iter()
        .map(|normalized| Feature {
            geometry: Some(normalized.geometry),
            attributes: attributes.clone(),
            name: name.to_string(),
        })
        .collect()
}

/// Features with no geometry are removed under [`NullGeometryPolicy::Drop`].
/// Returns how many were dropped.
pub fn apply_null_geometry_policy(features: &mut Vec<Feature>, policy: NullGeometryPolicy) -> usize {
    if policy == NullGeometryPolicy::Keep {
        return 0;
    }
    let before = features.len();
    features.retain(|feature| feature.geometry.is_some());
    before - features.len()
}

/// Output group a feature belongs to, `None` for geometry a Shapefile group cannot hold.
pub fn output_group(feature: &Feature) -> Option<OutputGroup> {
    match &feature.geometry {
        Some(geometry) => GeometryFamily::of(geometry).map(OutputGroup::Geometry),
        None => Some(OutputGroup::NoGeometry),
    }
}

/// Split features into output groups, keeping document order inside each group.
/// Empty groups are left out.
pub fn group_features(features: Vec<Feature>) -> Vec<(OutputGroup, Vec<Feature>)> {
    let mut groups: Vec<(OutputGroup, Vec<Feature>)> = OutputGroup::ALL
        .iter()
        .map(|group| (*group, Vec::new()))
        .collect();
    for feature in features {
        let group = match output_group(&feature) {
            Some(group) => group,
            None => {
                log::warn!("Skipping feature '{}' with unsupported geometry", feature.name);
                continue;
            }
        };
        if let Some((_, members)) = groups.iter_mut().find(|(existing, _)| *existing == group) {
            members.push(feature);
        }
    }
    groups.retain(|(_, members)| !members.is_empty());
    groups
}

#[cfg(test)]
mod tests {
    use super::{
        apply_null_geometry_policy, assemble_features, group_features, NullGeometryPolicy,
    };
    use crate::attributes::value::{AttributeMap, AttributeValue};
    use crate::geofile::feature::OutputGroup;
    use crate::geometry::{GeometryFamily, NormalizedGeometry};

    fn attributes() -> AttributeMap {
        vec![("kind", AttributeValue::Text("tree".to_string()))]
            .into_iter()
            .collect()
    }

    fn point(x: f64) -> NormalizedGeometry {
        NormalizedGeometry {
            geometry: geo::Geometry::Point(geo::Point::new(x, 0.0)),
            family: GeometryFamily::Point,
            expanded: true,
        }
    }

    fn line() -> NormalizedGeometry {
        NormalizedGeometry {
            geometry: geo::Geometry::LineString(vec![(0.0, 0.0), (1.0, 1.0)].into()),
            family: GeometryFamily::Line,
            expanded: true,
        }
    }

    #[test]
    fn test_one_feature_per_geometry_sharing_attributes() {
        let features = assemble_features("grove", attributes(), vec![point(1.0), line(), point(2.0)]);
        assert_eq!(3, features.len());
        for feature in &features {
            assert_eq!("grove", feature.name);
            assert_eq!(attributes(), feature.attributes);
            assert!(feature.geometry.is_some());
        }
    }

    #[test]
    fn test_no_geometry_gives_single_feature() {
        let features = assemble_features("lonely", attributes(), Vec::new());
        assert_eq!(1, features.len());
        assert!(features[0].geometry.is_none());
        assert_eq!(attributes(), features[0].attributes);
    }

    #[test]
    fn test_drop_policy_removes_null_geometry() {
        let mut features = assemble_features("lonely", attributes(), Vec::new());
        assert_eq!(1, apply_null_geometry_policy(&mut features, NullGeometryPolicy::Drop));
        assert!(features.is_empty());

        let mut features = assemble_features("lonely", attributes(), Vec::new());
        assert_eq!(0, apply_null_geometry_policy(&mut features, NullGeometryPolicy::Keep));
        assert_eq!(1, features.len());
    }

    #[test]
    fn test_group_features_keeps_order_and_skips_empty_groups() {
        let mut features = assemble_features("a", AttributeMap::new(), vec![point(1.0), line()]);
        features.extend(assemble_features("b", AttributeMap::new(), vec![point(2.0)]));
        features.extend(assemble_features("c", AttributeMap::new(), Vec::new()));

        let groups = group_features(features);
        let group_keys: Vec<OutputGroup> = groups.iter().map(|(group, _)| *group).collect();
        assert_eq!(
            vec![
                OutputGroup::Geometry(GeometryFamily::Point),
                OutputGroup::Geometry(GeometryFamily::Line),
                OutputGroup::NoGeometry
            ],
            group_keys
        );
        let point_names: Vec<&str> = groups[0].1.iter().map(|feature| feature.name.as_str()).collect();
        assert_eq!(vec!["a", "b"], point_names);
    }
}
