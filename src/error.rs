use std::io;
use thiserror::Error;

/// Errors that abort a conversion.
///
/// Problems inside a single placemark's description table or extended data never
/// show up here; they degrade to missing attributes instead.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The archive is corrupt, has no KML entry, or the entry is not UTF-8.
    #[error("KMZ extraction error: {0}")]
    Extraction(String),

    #[error("KML parse error: {0}")]
    MarkupParse(String),

    /// A coordinate tuple could not be read as 2 or 3 numbers.
    #[error("Geometry error: {0}")]
    Geometry(String),

    #[error("Shapefile write error: {0}")]
    Write(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl From<gdal::errors::GdalError> for ConvertError {
    fn from(value: gdal::errors::GdalError) -> Self {
        ConvertError::Write(value.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;
