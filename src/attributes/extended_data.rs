use crate::kml::vocabulary::Element;

use super::value::{coerce_value, AttributeMap};

/// Read attributes from a placemark's `ExtendedData` element.
///
/// Both forms KML allows are read, in document order:
/// - `<Data name="k"><value>v</value></Data>`
/// - `<SchemaData><SimpleData name="k">v</SimpleData></SchemaData>`
///
/// Entries without a name or without text are skipped.
pub fn parse_extended_data(extended_data: Option<&Element>) -> AttributeMap {
    let mut attributes = AttributeMap::new();
    let extended_data = match extended_data {
        Some(extended_data) => extended_data,
        None => return attributes,
    };

    for entry in extended_data.descendants() {
        let text = match entry.local_name() {
            "Data" => entry.child_text("value"),
            "SimpleData" => Some(entry.text()),
            _ => continue,
        };
        let (name, text) = match (entry.attribute("name"), text) {
            (Some(name), Some(text)) if !name.is_empty() && !text.trim().is_empty() => {
                (name, text)
            }
            _ => {
                log::debug!("Skipping ExtendedData entry without name or value");
                continue;
            }
        };
        attributes.insert(name.to_string(), coerce_value(text.trim()));
    }
    attributes
}
