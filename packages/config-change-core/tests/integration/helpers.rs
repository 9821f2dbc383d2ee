//! Shared helpers for integration tests.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use config_change_core::backend::{properties_format, xml_format};

/// Reads a flat properties file into a map.
pub fn read_properties(path: &Path) -> BTreeMap<String, String> {
    properties_format::decode(&fs::read_to_string(path).unwrap()).unwrap()
}

/// Reads an XML properties file into a map.
pub fn read_xml(path: &Path) -> BTreeMap<String, String> {
    xml_format::decode(&fs::read_to_string(path).unwrap()).unwrap()
}

pub fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub fn path_str(path: &Path) -> String {
    path.display().to_string()
}
