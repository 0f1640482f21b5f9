//! Document codec seam.
//!
//! The model core is codec-agnostic; [`JsonCodec`] is the stock
//! implementation. Decode failures surface as [`Error::Parse`] with the
//! underlying message attached.

use crate::device::{Device, ParamDescriptor};
use crate::error::Error;

/// Decodes and encodes device documents and import resources.
pub trait DocumentCodec {
    fn decode_device(&self, bytes: &[u8]) -> Result<Device, Error>;
    fn encode_device(&self, device: &Device) -> Result<Vec<u8>, Error>;
    /// Decode a single descriptor, the shape import resources carry.
    fn decode_descriptor(&self, bytes: &[u8]) -> Result<ParamDescriptor, Error>;
}

/// `serde_json`-backed codec.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec;

impl DocumentCodec for JsonCodec {
    fn decode_device(&self, bytes: &[u8]) -> Result<Device, Error> {
        serde_json::from_slice(bytes).map_err(|e| Error::Parse(format!("device document: {}", e)))
    }

    fn encode_device(&self, device: &Device) -> Result<Vec<u8>, Error> {
        serde_json::to_vec_pretty(device)
            .map_err(|e| Error::Parse(format!("device document: {}", e)))
    }

    fn decode_descriptor(&self, bytes: &[u8]) -> Result<ParamDescriptor, Error> {
        serde_json::from_slice(bytes).map_err(|e| Error::Parse(format!("import resource: {}", e)))
    }
}
