use crate::error::{ConvertError, Result};

use super::vocabulary::{Element, Vocabulary};

/// Geometry elements a placemark may hold directly, in lookup priority.
const GEOMETRY_ELEMENTS: [&str; 5] = [
    "MultiGeometry",
    "LineString",
    "Polygon",
    "Point",
    "LinearRing",
];

/// One `Placemark` as found in the document, nothing interpreted yet.
#[derive(Debug, Clone)]
pub struct PlacemarkRecord<'a, 'input> {
    pub name: String,
    pub description: Option<String>,
    pub geometry: Option<Element<'a, 'input>>,
    pub style_url: Option<String>,
    pub extended_data: Option<Element<'a, 'input>>,
}

/// A parsed KML document.
pub struct KmlDocument<'input> {
    document: roxmltree::Document<'input>,
    vocabulary: Option<Vocabulary>,
}

impl<'input> KmlDocument<'input> {
    /// Parse KML text. Malformed XML fails the whole document.
    pub fn parse(text: &'input str) -> Result<Self> {
        let options = roxmltree::ParsingOptions {
            allow_dtd: true,
            ..roxmltree::ParsingOptions::default()
        };
        let document = roxmltree::Document::parse_with_options(text, options)
            .map_err(|err| ConvertError::MarkupParse(format!("Invalid KML XML: {}", err)))?;
        let vocabulary = Vocabulary::probe(document.root(), "Placemark");
        match vocabulary {
            Some(vocabulary) => log::debug!("Reading placemarks as {:?}", vocabulary),
            None => log::warn!("Document contains no Placemark elements"),
        }
        Ok(Self {
            document,
            vocabulary,
        })
    }

    /// All placemarks at any depth, in document order.
    pub fn placemarks(&self) -> Vec<PlacemarkRecord<'_, 'input>> {
        let vocabulary = match self.vocabulary {
            Some(vocabulary) => vocabulary,
            None => return Vec::new(),
        };
        Element::new(self.document.root(), vocabulary)
            .descendants_named("Placemark")
            .map(|placemark| read_placemark(&placemark))
            .collect()
    }
}

fn read_placemark<'a, 'input>(placemark: &Element<'a, 'input>) -> PlacemarkRecord<'a, 'input> {
    let name = placemark
        .child_text("name")
        .map(|name| name.trim().to_string())
        .unwrap_or_default();
    let description = placemark
        .child("description")
        .map(|description| description.inner_markup());
    let style_url = placemark
        .child_text("styleUrl")
        .map(|style_url| style_url.trim().to_string());
    let geometry = GEOMETRY_ELEMENTS
        .iter()
        .find_map(|local_name| placemark.child(local_name));

    PlacemarkRecord {
        name,
        description,
        geometry,
        style_url,
        extended_data: placemark.child("ExtendedData"),
    }
}
