//! Pull-based decoding of `.osm.pbf` extracts into the entity stream.
//!
//! The reader walks the file blob by blob, converting each primitive block
//! into owned [`RawEntity`] values. Blocks are decoded lazily, one at a
//! time, so the stream stays forward-only and memory stays bounded by a
//! single block regardless of extract size. The source format guarantees
//! that nodes referenced by a way appear in an earlier or the same block,
//! which is exactly the ordering the position cache relies on.

use std::collections::VecDeque;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use osmpbf::{Blob, BlobDecode, BlobReader, Element};
use thiserror::Error;

use placemill_core::Tags;

use crate::entity::{AreaEntity, PointEntity, RawEntity};

/// Errors returned when reading an extract file.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The extract could not be opened.
    #[error("failed to open extract at {path:?}")]
    Open {
        /// Underlying decoder error.
        #[source]
        source: osmpbf::Error,
        /// Path of the extract.
        path: PathBuf,
    },
    /// A blob could not be read or decoded.
    #[error("failed to decode extract data at {path:?}")]
    Decode {
        /// Underlying decoder error.
        #[source]
        source: osmpbf::Error,
        /// Path of the extract.
        path: PathBuf,
    },
}

/// Ordered entity stream over a PBF extract.
pub struct ExtractReader {
    blobs: BlobReader<BufReader<File>>,
    pending: VecDeque<RawEntity>,
    path: PathBuf,
}

impl ExtractReader {
    /// Open an extract for streaming.
    ///
    /// # Errors
    /// Returns [`ExtractError::Open`] when the file cannot be opened.
    pub fn from_path(path: &Path) -> Result<Self, ExtractError> {
        let blobs = BlobReader::from_path(path).map_err(|source| ExtractError::Open {
            source,
            path: path.to_path_buf(),
        })?;
        Ok(Self {
            blobs,
            pending: VecDeque::new(),
            path: path.to_path_buf(),
        })
    }

    fn decode_error(&self, source: osmpbf::Error) -> ExtractError {
        ExtractError::Decode {
            source,
            path: self.path.clone(),
        }
    }

    fn enqueue_blob(&mut self, blob: &Blob) -> Result<(), ExtractError> {
        match blob.decode().map_err(|source| self.decode_error(source))? {
            BlobDecode::OsmData(block) => {
                for element in block.elements() {
                    self.pending.push_back(convert(element));
                }
                Ok(())
            }
            // Header blobs carry no entities; unknown blob types are skipped.
            BlobDecode::OsmHeader(_) | BlobDecode::Unknown(_) => Ok(()),
        }
    }
}

impl Iterator for ExtractReader {
    type Item = Result<RawEntity, ExtractError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entity) = self.pending.pop_front() {
                return Some(Ok(entity));
            }
            let blob = match self.blobs.next()? {
                Ok(blob) => blob,
                Err(source) => return Some(Err(self.decode_error(source))),
            };
            if let Err(err) = self.enqueue_blob(&blob) {
                return Some(Err(err));
            }
        }
    }
}

fn convert(element: Element<'_>) -> RawEntity {
    match element {
        Element::Node(node) => RawEntity::Point(PointEntity {
            id: node.id(),
            lon: node.lon(),
            lat: node.lat(),
            tags: collect_tags(node.tags()),
        }),
        Element::DenseNode(node) => RawEntity::Point(PointEntity {
            id: node.id(),
            lon: node.lon(),
            lat: node.lat(),
            tags: collect_tags(node.tags()),
        }),
        Element::Way(way) => RawEntity::Area(AreaEntity {
            id: way.id(),
            boundary: way.refs().collect(),
            tags: collect_tags(way.tags()),
        }),
        Element::Relation(relation) => RawEntity::Relation { id: relation.id() },
    }
}

fn collect_tags<'a, T>(tags: T) -> Tags
where
    T: IntoIterator<Item = (&'a str, &'a str)>,
{
    tags.into_iter()
        .map(|(key, value)| (key.to_owned(), value.to_owned()))
        .collect()
}
