//! Read access to the parts of a PPTX zip package.

use crate::rels::{rels_path, Relationships};
use std::collections::HashMap;
use std::io::{Read, Seek};
use xtract_core::{Error, Result};
use zip::result::ZipError;
use zip::ZipArchive;

/// An opened package with cached relationship parts.
pub(crate) struct Package<R> {
    archive: ZipArchive<R>,
    rels_cache: HashMap<String, Relationships>,
}

impl<R: Read + Seek> Package<R> {
    /// Open a package from a reader.
    pub fn open(reader: R) -> Result<Self> {
        let archive = ZipArchive::new(reader)
            .map_err(|e| Error::invalid(format!("Failed to open ZIP: {}", e)))?;

        Ok(Self {
            archive,
            rels_cache: HashMap::new(),
        })
    }

    /// Read a part that must exist.
    pub fn read_part(&mut self, path: &str) -> Result<String> {
        self.read_optional_part(path)?
            .ok_or_else(|| Error::invalid(format!("Part not found in archive: '{}'", path)))
    }

    /// Read a part, returning `None` when the package does not contain it.
    pub fn read_optional_part(&mut self, path: &str) -> Result<Option<String>> {
        let mut file = match self.archive.by_name(path) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => {
                return Err(Error::invalid(format!(
                    "Failed to open '{}' in archive: {}",
                    path, e
                )))
            }
        };

        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| Error::invalid(format!("Failed to read '{}': {}", path, e)))?;

        if content.starts_with('\u{feff}') {
            content.drain(..'\u{feff}'.len_utf8());
        }

        Ok(Some(content))
    }

    /// Relationships of a part; empty if the part has none.
    pub fn rels(&mut self, part: &str) -> Result<Relationships> {
        if let Some(cached) = self.rels_cache.get(part) {
            return Ok(cached.clone());
        }

        let rels = match self.read_optional_part(&rels_path(part))? {
            Some(xml) => Relationships::parse(&xml, part)?,
            None => Relationships::default(),
        };

        self.rels_cache.insert(part.to_string(), rels.clone());
        Ok(rels)
    }
}
