pub mod archive;
pub mod placemark;
pub mod vocabulary;
