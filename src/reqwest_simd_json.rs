use reqwest::RequestBuilder;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// Extension trait to send request bodies serialized with simd-json
pub trait ReqwestSimdJsonExt: Sized {
    /// Set the request body as JSON using simd-json for serialization
    fn simd_json<T>(self, json: &T) -> Result<Self>
    where
        T: Serialize + ?Sized;
}

impl ReqwestSimdJsonExt for RequestBuilder {
    fn simd_json<T>(self, json: &T) -> Result<Self>
    where
        T: Serialize + ?Sized,
    {
        let body = simd_json::to_vec(json).map_err(|e| Error::Serialization(e.to_string()))?;

        Ok(self
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body))
    }
}

/// simd-json parses in place, so the body is copied into a mutable buffer.
pub fn parse_json_slice<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut buf = bytes.to_vec();
    simd_json::from_slice(&mut buf).map_err(|e| Error::malformed(e.to_string()))
}
