//! Taxonomy-driven keyword classification.
//!
//! The classifier decides whether an entity is a recognizable place at all:
//! an empty keyword set means "not interesting", and the inspector drops the
//! entity without building a record.

use std::collections::BTreeSet;

use crate::Tags;
use crate::taxonomy::{
    AssociationPolicy, SCOPED_PRIMARY_KEYS, Taxonomy, UNSCOPED_PRIMARY_KEYS,
};

/// A set of controlled-vocabulary keywords in deterministic order.
pub type KeywordSet = BTreeSet<String>;

/// Extracts keywords from raw tags using an injected [`Taxonomy`].
#[derive(Debug, Clone)]
pub struct KeywordClassifier<'a> {
    taxonomy: &'a Taxonomy,
    policy: AssociationPolicy,
}

impl<'a> KeywordClassifier<'a> {
    /// Classifier with the default association policy.
    #[must_use]
    pub fn new(taxonomy: &'a Taxonomy) -> Self {
        Self::with_policy(taxonomy, AssociationPolicy::default())
    }

    /// Classifier with an explicit association policy.
    #[must_use]
    pub fn with_policy(taxonomy: &'a Taxonomy, policy: AssociationPolicy) -> Self {
        Self { taxonomy, policy }
    }

    /// Derive the keyword set for an entity's tags.
    ///
    /// Tag values are split on `;` and trimmed; values are expected to be
    /// lowercase snake_case already (upstream normalization). Each token is
    /// checked against the key's allow-list and, independently, against every
    /// association rule of that key.
    ///
    /// # Examples
    /// ```
    /// use placemill_core::{KeywordClassifier, Tags, Taxonomy};
    ///
    /// let taxonomy = Taxonomy::builder()
    ///     .allow("tourism", ["museum"])
    ///     .build();
    /// let classifier = KeywordClassifier::new(&taxonomy);
    ///
    /// let tags = Tags::from([("tourism".into(), "museum".into())]);
    /// let keywords = classifier.classify(&tags);
    /// // tourism is a scoped key, so the key itself is kept too.
    /// assert!(keywords.contains("museum") && keywords.contains("tourism"));
    /// ```
    #[must_use]
    pub fn classify(&self, tags: &Tags) -> KeywordSet {
        let mut keywords = KeywordSet::new();
        for key in SCOPED_PRIMARY_KEYS {
            self.extract(key, true, tags, &mut keywords);
        }
        for key in UNSCOPED_PRIMARY_KEYS {
            self.extract(key, false, tags, &mut keywords);
        }
        keywords
    }

    fn extract(&self, key: &str, scoped: bool, tags: &Tags, keywords: &mut KeywordSet) {
        let Some(value) = tags.get(key) else {
            return;
        };
        let allow = self.taxonomy.allow_list(key);
        let rules = self.taxonomy.associations(key);

        for token in value.split(';').map(str::trim).filter(|t| !t.is_empty()) {
            let allowed = allow.is_some_and(|set| set.contains(token));

            if allowed {
                keywords.insert(token.to_owned());
                if scoped {
                    keywords.insert(key.to_owned());
                }
            }

            for rule in rules {
                if !rule.values.contains(token) {
                    continue;
                }
                if self.policy == AssociationPolicy::RequireAllowList && !allowed {
                    continue;
                }
                keywords.insert(token.to_owned());
                if scoped {
                    keywords.insert(key.to_owned());
                }
                keywords.extend(rule.enrich.iter().cloned());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::AssociationRule;
    use rstest::{fixture, rstest};

    fn tags(entries: &[(&str, &str)]) -> Tags {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[fixture]
    fn taxonomy() -> Taxonomy {
        Taxonomy::builder()
            .allow("amenity", ["restaurant", "cafe"])
            .allow("tourism", ["museum", "viewpoint"])
            .allow("shop", ["bakery"])
            .associate(
                "amenity",
                AssociationRule::new(["biergarten"], ["beer", "garden"]),
            )
            .build()
    }

    #[rstest]
    fn unscoped_match_keeps_only_the_value(taxonomy: Taxonomy) {
        let classifier = KeywordClassifier::new(&taxonomy);
        let keywords = classifier.classify(&tags(&[("amenity", "restaurant")]));
        assert_eq!(keywords, KeywordSet::from(["restaurant".to_owned()]));
    }

    #[rstest]
    fn scoped_match_keeps_value_and_key(taxonomy: Taxonomy) {
        let classifier = KeywordClassifier::new(&taxonomy);
        let keywords = classifier.classify(&tags(&[("tourism", "museum")]));
        assert_eq!(
            keywords,
            KeywordSet::from(["museum".to_owned(), "tourism".to_owned()])
        );
    }

    #[rstest]
    fn semicolon_values_are_split_and_trimmed(taxonomy: Taxonomy) {
        let classifier = KeywordClassifier::new(&taxonomy);
        let keywords = classifier.classify(&tags(&[("amenity", "restaurant; cafe ;bar")]));
        assert_eq!(
            keywords,
            KeywordSet::from(["cafe".to_owned(), "restaurant".to_owned()])
        );
    }

    #[rstest]
    fn association_fires_without_allow_list_membership(taxonomy: Taxonomy) {
        let classifier = KeywordClassifier::new(&taxonomy);
        let keywords = classifier.classify(&tags(&[("amenity", "biergarten")]));
        assert_eq!(
            keywords,
            KeywordSet::from([
                "beer".to_owned(),
                "biergarten".to_owned(),
                "garden".to_owned()
            ])
        );
    }

    #[rstest]
    fn legacy_policy_requires_allow_list_membership(taxonomy: Taxonomy) {
        let classifier =
            KeywordClassifier::with_policy(&taxonomy, AssociationPolicy::RequireAllowList);
        let keywords = classifier.classify(&tags(&[("amenity", "biergarten")]));
        assert!(keywords.is_empty());
    }

    #[rstest]
    fn association_on_allowed_value_adds_enrichment() {
        let taxonomy = Taxonomy::builder()
            .allow("amenity", ["biergarten"])
            .associate(
                "amenity",
                AssociationRule::new(["biergarten"], ["beer"]),
            )
            .build();
        let classifier =
            KeywordClassifier::with_policy(&taxonomy, AssociationPolicy::RequireAllowList);
        let keywords = classifier.classify(&tags(&[("amenity", "biergarten")]));
        assert_eq!(
            keywords,
            KeywordSet::from(["beer".to_owned(), "biergarten".to_owned()])
        );
    }

    #[rstest]
    fn unrelated_tags_yield_nothing(taxonomy: Taxonomy) {
        let classifier = KeywordClassifier::new(&taxonomy);
        let keywords = classifier.classify(&tags(&[
            ("name", "Corner House"),
            ("amenity", "warehouse"),
            ("height", "12"),
        ]));
        assert!(keywords.is_empty());
    }
}
