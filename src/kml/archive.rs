use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use crate::error::{ConvertError, Result};

const ZIP_SIGNATURE: &[u8; 2] = b"PK";

/// Return the KML text of `path`, unzipping it first when it is a KMZ archive.
pub fn read_document(path: &Path) -> Result<String> {
    if is_kmz(path)? {
        log::debug!("Reading {:?} as KMZ archive", path);
        extract_kml(File::open(path)?)
    } else {
        log::debug!("Reading {:?} as KML document", path);
        let bytes = std::fs::read(path)?;
        String::from_utf8(bytes).map_err(|err| {
            ConvertError::MarkupParse(format!("{:?} is not valid UTF-8: {}", path, err))
        })
    }
}

/// Decide by extension, falling back to the ZIP magic bytes for unknown extensions.
fn is_kmz(path: &Path) -> Result<bool> {
    let extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("kmz") => Ok(true),
        Some("kml") => Ok(false),
        _ => {
            let mut signature = [0u8; 2];
            let mut file = File::open(path)?;
            match file.read_exact(&mut signature) {
                Ok(()) => Ok(&signature == ZIP_SIGNATURE),
                Err(err) if err.kind() == std::io::ErrorKind::UnexpectedEof => Ok(false),
                Err(err) => Err(err.into()),
            }
        }
    }
}

/// Read the KML entry out of a KMZ archive: `doc.kml` if present, else the first `.kml` entry.
pub fn extract_kml<R: Read + Seek>(reader: R) -> Result<String> {
    let mut archive = zip::ZipArchive::new(reader)
        .map_err(|err| ConvertError::Extraction(format!("Not a valid KMZ archive: {}", err)))?;

    let entry_names: Vec<String> = archive.file_names().map(str::to_string).collect();
    let entry_name = find_kml_entry(&entry_names).ok_or_else(|| {
        ConvertError::Extraction(format!(
            "No KML file found in archive. Available files: {}",
            entry_names.join(", ")
        ))
    })?;
    log::debug!("Extracting {} from archive", entry_name);

    let mut entry = archive
        .by_name(&entry_name)
        .map_err(|err| ConvertError::Extraction(format!("Reading {}: {}", entry_name, err)))?;
    let mut bytes = Vec::new();
    entry.read_to_end(&mut bytes)?;
    String::from_utf8(bytes).map_err(|err| {
        ConvertError::Extraction(format!("{} is not valid UTF-8: {}", entry_name, err))
    })
}

fn find_kml_entry(entry_names: &[String]) -> Option<String> {
    entry_names
        .iter()
        .find(|name| name.eq_ignore_ascii_case("doc.kml"))
        .or_else(|| {
            entry_names
                .iter()
                .find(|name| name.to_ascii_lowercase().ends_with(".kml"))
        })
        .cloned()
}
