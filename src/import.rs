//! Load-time import resolution.
//!
//! Runs exactly once, synchronously, during model construction, after the
//! root document is decoded. A directive with a url fails
//! [`Error::NotImplemented`]; a directive without one resolves to the
//! sibling `params` directory using the `param.<oid>.json` filename
//! convention. The oid is used verbatim when the filename is derived; an
//! oid containing a path separator escapes the params directory.

use crate::codec::DocumentCodec;
use crate::device::Device;
use crate::error::Error;
use crate::fetch::ContentFetcher;
use std::path::PathBuf;
use tracing::debug;

/// Resolves import directives into materialized values.
pub struct Importer<'a> {
    codec: &'a dyn DocumentCodec,
    fetcher: &'a dyn ContentFetcher,
    params_dir: PathBuf,
}

impl<'a> Importer<'a> {
    pub fn new(
        codec: &'a dyn DocumentCodec,
        fetcher: &'a dyn ContentFetcher,
        params_dir: PathBuf,
    ) -> Self {
        Importer {
            codec,
            fetcher,
            params_dir,
        }
    }

    /// Resolve every import directive in `device`: fetch and decode the
    /// resource, splice its value into the host descriptor, and clear the
    /// directive. The host's own type and constraint stay authoritative.
    pub fn resolve(&self, device: &mut Device) -> Result<(), Error> {
        for (oid, descriptor) in device.params.iter_mut() {
            let Some(directive) = descriptor.import.as_ref() else {
                continue;
            };
            if !directive.is_local() {
                return Err(Error::NotImplemented(format!(
                    "cannot import param {:?} from a url",
                    oid
                )));
            }
            let locator = self.params_dir.join(format!("param.{}.json", oid));
            debug!(oid = %oid, resource = %locator.display(), "resolving local import");
            let bytes = self.fetcher.fetch(&locator)?;
            let imported = self.codec.decode_descriptor(&bytes)?;
            descriptor.value = imported.value;
            descriptor.import = None;
        }
        Ok(())
    }
}
