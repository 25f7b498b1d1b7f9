pub mod feature;
pub mod field_names;
pub mod gdal_geofile;
