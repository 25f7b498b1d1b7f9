pub mod description;
pub mod extended_data;
pub mod value;

use crate::kml::placemark::PlacemarkRecord;
use value::AttributeMap;

/// All attributes of a placemark: the description table merged with `ExtendedData`.
///
/// `ExtendedData` is schema-declared, so it wins when both define the same key.
pub fn extract_attributes(placemark: &PlacemarkRecord) -> AttributeMap {
    let mut attributes = description::parse_description_table(placemark.description.as_deref());
    attributes.extend(extended_data::parse_extended_data(
        placemark.extended_data.as_ref(),
    ));
    attributes
}
