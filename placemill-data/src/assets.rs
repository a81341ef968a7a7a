//! Loading of taxonomy vocabulary assets from disk.
//!
//! The asset layout mirrors the published vocabulary dumps: one
//! `tags/<key>.json` per primary key (plus the three controlled sets) and a
//! single `enrich/assoc.json` with the cross-tag association rules. A
//! missing or malformed asset aborts startup; the pipeline cannot classify
//! anything without its tables.

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use thiserror::Error;

use placemill_core::taxonomy::{primary_keys, AssociationRule, Taxonomy};

use std::collections::HashMap;
use std::fs;

/// One vocabulary entry; the observation count is informational only.
#[derive(Debug, Deserialize)]
struct VocabularyEntry {
    value: String,
}

#[derive(Debug, Deserialize)]
struct AssociationEntry {
    values: Vec<String>,
    enrich: Vec<String>,
}

/// Errors raised while loading taxonomy assets.
#[derive(Debug, Error)]
pub enum TaxonomyAssetError {
    /// An asset file could not be read.
    #[error("failed to read taxonomy asset {path}")]
    Read {
        /// Path of the asset.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// An asset file did not parse as the expected JSON shape.
    #[error("failed to parse taxonomy asset {path}")]
    Parse {
        /// Path of the asset.
        path: Utf8PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

/// Load the full taxonomy from an asset directory.
///
/// # Errors
/// Returns a [`TaxonomyAssetError`] when any required asset is missing or
/// malformed; startup must not continue in that case.
pub fn load_taxonomy(dir: &Utf8Path) -> Result<Taxonomy, TaxonomyAssetError> {
    let mut builder = Taxonomy::builder();

    for key in primary_keys() {
        let values = read_vocabulary(&tags_path(dir, key))?;
        builder = builder.allow(key, values);
    }

    builder = builder.clothes(read_vocabulary(&tags_path(dir, "clothes"))?);
    builder = builder.cuisine(read_vocabulary(&tags_path(dir, "cuisine"))?);
    builder = builder.rental(read_vocabulary(&tags_path(dir, "rental"))?);

    let assoc_path = dir.join("enrich").join("assoc.json");
    let associations: HashMap<String, Vec<AssociationEntry>> = read_json(&assoc_path)?;
    for (key, rules) in associations {
        for rule in rules {
            builder = builder.associate(&key, AssociationRule::new(rule.values, rule.enrich));
        }
    }

    Ok(builder.build())
}

fn tags_path(dir: &Utf8Path, name: &str) -> Utf8PathBuf {
    dir.join("tags").join(format!("{name}.json"))
}

fn read_vocabulary(path: &Utf8Path) -> Result<Vec<String>, TaxonomyAssetError> {
    let entries: Vec<VocabularyEntry> = read_json(path)?;
    Ok(entries.into_iter().map(|entry| entry.value).collect())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Utf8Path) -> Result<T, TaxonomyAssetError> {
    let text = fs::read_to_string(path).map_err(|source| TaxonomyAssetError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| TaxonomyAssetError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
