//! Content fetcher seam.
//!
//! The loader and importer retrieve raw bytes through this trait; the
//! model never touches the filesystem directly. Missing resources are
//! [`Error::NotFound`], anything else an [`Error::Io`].

use crate::error::Error;
use std::io::ErrorKind;
use std::path::Path;

/// Retrieves the raw bytes behind a locator.
pub trait ContentFetcher {
    fn fetch(&self, locator: &Path) -> Result<Vec<u8>, Error>;
}

/// Reads locators straight from the filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileFetcher;

impl ContentFetcher for FileFetcher {
    fn fetch(&self, locator: &Path) -> Result<Vec<u8>, Error> {
        std::fs::read(locator).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                Error::NotFound(locator.display().to_string())
            } else {
                Error::Io(e)
            }
        })
    }
}
