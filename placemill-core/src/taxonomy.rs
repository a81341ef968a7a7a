//! Controlled vocabulary tables driving keyword classification.
//!
//! A [`Taxonomy`] is built once at startup and stays immutable for the rest
//! of the run, so classifiers and normalizers can share it freely. Tests
//! construct small synthetic taxonomies through [`Taxonomy::builder`]; the
//! ingestion crate loads the production tables from JSON assets.

use std::collections::{BTreeSet, HashMap};

/// Primary tag keys whose key becomes a keyword alongside a matched value.
pub const SCOPED_PRIMARY_KEYS: [&str; 8] = [
    "aerialway",
    "aeroway",
    "club",
    "craft",
    "hazard",
    "healthcare",
    "historic",
    "tourism",
];

/// Primary tag keys where only the matched value becomes a keyword.
pub const UNSCOPED_PRIMARY_KEYS: [&str; 12] = [
    "amenity",
    "artwork_type",
    "attraction",
    "building",
    "business",
    "emergency",
    "leisure",
    "natural",
    "office",
    "public_transport",
    "shop",
    "sport",
];

/// All primary tag keys, scoped first.
pub fn primary_keys() -> impl Iterator<Item = &'static str> {
    SCOPED_PRIMARY_KEYS
        .into_iter()
        .chain(UNSCOPED_PRIMARY_KEYS)
}

/// Whether matching a value under `key` also turns the key into a keyword.
#[must_use]
pub fn is_scoped(key: &str) -> bool {
    SCOPED_PRIMARY_KEYS.contains(&key)
}

/// A cross-tag enrichment rule.
///
/// When a tag value under the rule's key appears in `values`, every token in
/// `enrich` is added to the keyword set in addition to normal matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationRule {
    /// Values that trigger the rule.
    pub values: BTreeSet<String>,
    /// Keywords added when the rule fires.
    pub enrich: BTreeSet<String>,
}

impl AssociationRule {
    /// Build a rule from any pair of string collections.
    pub fn new<V, E>(values: V, enrich: E) -> Self
    where
        V: IntoIterator,
        V::Item: Into<String>,
        E: IntoIterator,
        E::Item: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
            enrich: enrich.into_iter().map(Into::into).collect(),
        }
    }
}

/// How association rules relate to the allow-list of the same key.
///
/// Older revisions of the rule tables required a triggering value to also be
/// a member of the key's allow-list; the current default treats value-set
/// membership as sufficient on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssociationPolicy {
    /// Membership in the rule's value set is enough to fire the rule.
    #[default]
    ValueSetOnly,
    /// The value must additionally appear in the key's allow-list.
    RequireAllowList,
}

/// Immutable vocabulary tables: per-key allow-lists, association rules and
/// the three controlled sets used by attribute normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Taxonomy {
    allow: HashMap<String, BTreeSet<String>>,
    associations: HashMap<String, Vec<AssociationRule>>,
    clothes: BTreeSet<String>,
    cuisine: BTreeSet<String>,
    rental: BTreeSet<String>,
}

impl Taxonomy {
    /// Start building a taxonomy.
    #[must_use]
    pub fn builder() -> TaxonomyBuilder {
        TaxonomyBuilder::default()
    }

    /// Allow-list for a primary key, if one was supplied.
    #[must_use]
    pub fn allow_list(&self, key: &str) -> Option<&BTreeSet<String>> {
        self.allow.get(key)
    }

    /// Association rules for a primary key; empty when none were supplied.
    #[must_use]
    pub fn associations(&self, key: &str) -> &[AssociationRule] {
        self.associations.get(key).map_or(&[], Vec::as_slice)
    }

    /// Controlled vocabulary for the `clothes` attribute.
    #[must_use]
    pub fn clothes(&self) -> &BTreeSet<String> {
        &self.clothes
    }

    /// Controlled vocabulary for the `cuisine` attribute.
    #[must_use]
    pub fn cuisine(&self) -> &BTreeSet<String> {
        &self.cuisine
    }

    /// Controlled vocabulary for the `rental` attribute.
    #[must_use]
    pub fn rental(&self) -> &BTreeSet<String> {
        &self.rental
    }
}

/// Incremental [`Taxonomy`] construction.
#[derive(Debug, Default)]
pub struct TaxonomyBuilder {
    taxonomy: Taxonomy,
}

impl TaxonomyBuilder {
    /// Set the allow-list for a primary key, replacing any previous one.
    #[must_use]
    pub fn allow<V>(mut self, key: &str, values: V) -> Self
    where
        V: IntoIterator,
        V::Item: Into<String>,
    {
        self.taxonomy
            .allow
            .insert(key.to_owned(), values.into_iter().map(Into::into).collect());
        self
    }

    /// Append an association rule for a primary key.
    #[must_use]
    pub fn associate(mut self, key: &str, rule: AssociationRule) -> Self {
        self.taxonomy
            .associations
            .entry(key.to_owned())
            .or_default()
            .push(rule);
        self
    }

    /// Set the controlled vocabulary for the `clothes` attribute.
    #[must_use]
    pub fn clothes<V>(mut self, values: V) -> Self
    where
        V: IntoIterator,
        V::Item: Into<String>,
    {
        self.taxonomy.clothes = values.into_iter().map(Into::into).collect();
        self
    }

    /// Set the controlled vocabulary for the `cuisine` attribute.
    #[must_use]
    pub fn cuisine<V>(mut self, values: V) -> Self
    where
        V: IntoIterator,
        V::Item: Into<String>,
    {
        self.taxonomy.cuisine = values.into_iter().map(Into::into).collect();
        self
    }

    /// Set the controlled vocabulary for the `rental` attribute.
    #[must_use]
    pub fn rental<V>(mut self, values: V) -> Self
    where
        V: IntoIterator,
        V::Item: Into<String>,
    {
        self.taxonomy.rental = values.into_iter().map(Into::into).collect();
        self
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> Taxonomy {
        self.taxonomy
    }
}
