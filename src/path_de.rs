use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// Deserialize with JSON-path context in error messages, so a bad node deep
/// inside a side document points at its location.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str, origin: &str) -> Result<T> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(|err| {
        let path = err.path().to_string();
        Error::SideDocument {
            origin: origin.to_string(),
            message: format!("at JSON path {path} → {}", err.into_inner()),
        }
    })
}
