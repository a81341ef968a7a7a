//! Normalization of free-form tags into a typed attribute bundle.
//!
//! Every field is resolved by an independent first-match-wins rule over an
//! ordered list of candidate tag keys. A value that fails its rule's
//! validation is not an error; the field is simply left unresolved.

use std::collections::BTreeSet;

use regex::Regex;
use serde::Serialize;
use url::Url;

use crate::Tags;
use crate::taxonomy::Taxonomy;

const YES_ONLY: [&str; 2] = ["yes", "only"];

/// Resolved postal address sub-fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Address {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settlement: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub house: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
}

/// Accepted payment methods; `None` means the tag never appeared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Payment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cash: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amex: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jcb: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mastercard: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visa: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crypto: Option<bool>,
}

/// Typed attributes of a place; every field is optional and independent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AttributeBundle {
    // info
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<Payment>,

    // contact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    // boolean
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drinking_water: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internet_access: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shower: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smoking: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub takeaway: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toilets: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wheelchair: Option<bool>,

    // measurable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u64>,
    #[serde(rename = "min_age", skip_serializing_if = "Option::is_none")]
    pub minimum_age: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<u64>,

    // specific
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charge: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opening_hours: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clothes: Option<BTreeSet<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cuisine: Option<BTreeSet<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rental: Option<BTreeSet<String>>,
}

/// Turns raw tags into an [`AttributeBundle`] using an injected [`Taxonomy`]
/// for the three vocabulary-filtered set fields.
#[derive(Debug)]
pub struct AttributeNormalizer<'a> {
    taxonomy: &'a Taxonomy,
    wikipedia: Regex,
    phone_digits: Regex,
    email: Regex,
}

impl<'a> AttributeNormalizer<'a> {
    /// Build a normalizer over the given taxonomy.
    #[must_use]
    pub fn new(taxonomy: &'a Taxonomy) -> Self {
        Self {
            taxonomy,
            wikipedia: Regex::new(r"^[a-z]{2}:[A-Za-z0-9].*$").expect("pattern is valid"),
            phone_digits: Regex::new(r"^\+?\d{4,20}$").expect("pattern is valid"),
            email: Regex::new(r"^[^@\s]+@[^@\s]+$").expect("pattern is valid"),
        }
    }

    /// Resolve every attribute rule against the given tags.
    ///
    /// Rules are independent; a failed validation leaves the corresponding
    /// field unresolved and never affects another field.
    #[must_use]
    pub fn normalize(&self, tags: &Tags) -> AttributeBundle {
        let mut bundle = AttributeBundle::default();

        self.name(tags, &mut bundle);
        self.image(tags, &mut bundle);
        self.website(tags, &mut bundle);
        self.address(tags, &mut bundle);
        self.payment(tags, &mut bundle);
        self.email(tags, &mut bundle);
        self.phone(tags, &mut bundle);
        self.booleans(tags, &mut bundle);
        self.capacity(tags, &mut bundle);
        self.minimum_age(tags, &mut bundle);
        self.rank(tags, &mut bundle);
        self.fee(tags, &mut bundle);
        self.charge(tags, &mut bundle);
        self.opening_hours(tags, &mut bundle);
        self.clothes(tags, &mut bundle);
        self.cuisine(tags, &mut bundle);
        self.rental(tags, &mut bundle);

        bundle
    }

    fn name(&self, tags: &Tags, bundle: &mut AttributeBundle) {
        let keys = ["name:en", "name", "alt_name", "brand", "operator"];
        bundle.name = first_non_trivial(tags, &keys).map(ToOwned::to_owned);
    }

    fn image(&self, tags: &Tags, bundle: &mut AttributeBundle) {
        if let Some(value) = tags.get("image") {
            let uri = coerce_http(value);
            if is_http_uri(&uri) {
                bundle.image = Some(uri);
            }
        }
    }

    fn website(&self, tags: &Tags, bundle: &mut AttributeBundle) {
        for key in ["contact:website", "website", "url"] {
            if let Some(value) = tags.get(key) {
                let uri = coerce_http(value);
                if is_http_uri(&uri) {
                    bundle.website = Some(uri);
                    return;
                }
            }
        }

        if let Some(value) = tags.get("wikipedia") {
            bundle.website = self.wikipedia_uri(value);
        }
    }

    fn address(&self, tags: &Tags, bundle: &mut AttributeBundle) {
        let field = |keys: &[&str]| first_non_trivial(tags, keys).map(ToOwned::to_owned);

        let address = Address {
            country: field(&["addr:country"]),
            settlement: field(&["addr:city", "addr:province", "addr:county", "addr:hamlet"]),
            district: field(&["addr:district", "addr:subdistrict", "addr:suburb"]),
            place: field(&["addr:street", "addr:place"]),
            house: field(&["addr:housenumber", "addr:conscriptionnumber"]),
            postal_code: field(&["addr:postcode", "addr:postbox"]),
        };

        if address != Address::default() {
            bundle.address = Some(address);
        }
    }

    fn payment(&self, tags: &Tags, bundle: &mut AttributeBundle) {
        let method = |keys: &[&str]| {
            first_present(tags, keys).map(|value| YES_ONLY.contains(&value))
        };

        let payment = Payment {
            cash: method(&["payment:cash", "payment:coins"]),
            card: method(&["payment:credit_cards", "payment:debit_cards", "payment:cards"]),
            amex: method(&["payment:american_express"]),
            jcb: method(&["payment:jcb"]),
            mastercard: method(&["payment:mastercard", "payment:maestro"]),
            visa: method(&["payment:visa", "payment:visa_electron"]),
            crypto: method(&["payment:cryptocurrencies", "payment:bitcoin"]),
        };

        if payment != Payment::default() {
            bundle.payment = Some(payment);
        }
    }

    fn email(&self, tags: &Tags, bundle: &mut AttributeBundle) {
        for key in ["contact:email", "email"] {
            if let Some(value) = tags.get(key) {
                if self.email.is_match(value) {
                    bundle.email = Some(value.clone());
                    return;
                }
            }
        }
    }

    fn phone(&self, tags: &Tags, bundle: &mut AttributeBundle) {
        for key in ["contact:phone", "phone", "contact:mobile"] {
            if let Some(value) = tags.get(key) {
                if self.is_phone(value) {
                    bundle.phone = Some(value.clone());
                    return;
                }
            }
        }
    }

    fn booleans(&self, tags: &Tags, bundle: &mut AttributeBundle) {
        if let Some(value) = tags.get("delivery") {
            bundle.delivery = Some(YES_ONLY.contains(&value.as_str()));
        }
        if let Some(value) = tags.get("takeaway") {
            bundle.takeaway = Some(YES_ONLY.contains(&value.as_str()));
        }
        if let Some(value) = first_present(
            tags,
            &["drinking_water", "drinking_water:legal", "drinking_water:refill"],
        ) {
            bundle.drinking_water = Some(value == "yes");
        }
        if let Some(value) = tags.get("internet_access") {
            let allowed = ["wlan", "yes", "terminal", "wired", "wifi"];
            bundle.internet_access = Some(allowed.contains(&value.as_str()));
        }
        if let Some(value) = tags.get("shower") {
            let allowed = ["yes", "hot", "outdoor"];
            bundle.shower = Some(allowed.contains(&value.as_str()));
        }
        if let Some(value) = first_present(tags, &["smoking", "smoking:outside"]) {
            let allowed = [
                "yes",
                "outside",
                "isolated",
                "separated",
                "outdoor",
                "dedicated",
                "designated",
            ];
            bundle.smoking = Some(allowed.contains(&value));
        }
        if let Some(value) = tags.get("toilets") {
            bundle.toilets = Some(value == "yes");
        }
        if let Some(value) = tags.get("wheelchair") {
            bundle.wheelchair = Some(value == "yes");
        }
    }

    fn capacity(&self, tags: &Tags, bundle: &mut AttributeBundle) {
        for key in ["capacity", "seats"] {
            if let Some(count) = tags.get(key).and_then(|v| v.trim().parse::<u64>().ok()) {
                bundle.capacity = Some(count);
                return;
            }
        }

        // Free-text values like "approx. 40 seats" still carry a usable count.
        bundle.capacity = tags.get("capacity:persons").and_then(|v| last_digit_run(v));
    }

    fn minimum_age(&self, tags: &Tags, bundle: &mut AttributeBundle) {
        bundle.minimum_age = tags.get("min_age").and_then(|v| v.trim().parse().ok());
    }

    fn rank(&self, tags: &Tags, bundle: &mut AttributeBundle) {
        bundle.rank = tags.get("stars").and_then(|v| v.trim().parse().ok());
    }

    fn fee(&self, tags: &Tags, bundle: &mut AttributeBundle) {
        if let Some(value) = first_present(tags, &["fee", "toll"]) {
            bundle.fee = Some(value != "no");
        }
    }

    fn charge(&self, tags: &Tags, bundle: &mut AttributeBundle) {
        if let Some(value) = tags.get("charge") {
            let parts = divide(value);
            if all_non_trivial(&parts) {
                bundle.charge = Some(parts);
            }
        }
    }

    fn opening_hours(&self, tags: &Tags, bundle: &mut AttributeBundle) {
        for key in ["opening_hours", "service_times"] {
            if let Some(value) = tags.get(key) {
                let parts = divide(value);
                if all_non_trivial(&parts) {
                    bundle.opening_hours = Some(parts);
                    return;
                }
            }
        }
    }

    fn clothes(&self, tags: &Tags, bundle: &mut AttributeBundle) {
        if let Some(value) = tags.get("clothes") {
            bundle.clothes = vocabulary_subset(value, self.taxonomy.clothes());
        }
    }

    fn cuisine(&self, tags: &Tags, bundle: &mut AttributeBundle) {
        let diet_values = ["yes", "only", "limited"];
        let mut result = BTreeSet::new();

        if let Some(value) = tags.get("cuisine") {
            result.extend(
                divide(value)
                    .into_iter()
                    .filter(|item| self.taxonomy.cuisine().contains(item)),
            );
        }
        if tags
            .get("diet:vegan")
            .is_some_and(|v| diet_values.contains(&v.as_str()))
        {
            result.insert("vegan".to_owned());
        }
        if tags
            .get("diet:vegetarian")
            .is_some_and(|v| diet_values.contains(&v.as_str()))
        {
            result.insert("vegetarian".to_owned());
        }

        if !result.is_empty() {
            bundle.cuisine = Some(result);
        }
    }

    fn rental(&self, tags: &Tags, bundle: &mut AttributeBundle) {
        if let Some(value) = tags.get("rental") {
            bundle.rental = vocabulary_subset(value, self.taxonomy.rental());
        }
    }

    fn wikipedia_uri(&self, value: &str) -> Option<String> {
        if !self.wikipedia.is_match(value) {
            return None;
        }
        let mut words = value.split(' ').filter(|word| !word.is_empty());
        let first = words.next()?;
        let (lang, head) = first.split_once(':')?;
        let title: Vec<&str> = std::iter::once(head).chain(words).collect();
        let uri = format!("https://{lang}.wikipedia.org/wiki/{}", title.join("_"));
        is_http_uri(&uri).then_some(uri)
    }

    fn is_phone(&self, value: &str) -> bool {
        const SPECIAL: [char; 6] = [' ', '-', '(', ')', '[', ']'];

        let length = value.chars().count();
        if !(5..=30).contains(&length) {
            return false;
        }
        if !value
            .chars()
            .all(|ch| ch.is_ascii_digit() || ch == '+' || SPECIAL.contains(&ch))
        {
            return false;
        }

        let digits: String = value.chars().filter(|ch| !SPECIAL.contains(ch)).collect();
        self.phone_digits.is_match(&digits)
    }
}

/// First candidate key present with a non-empty value.
fn first_non_trivial<'t>(tags: &'t Tags, keys: &[&str]) -> Option<&'t str> {
    keys.iter()
        .filter_map(|key| tags.get(*key))
        .map(String::as_str)
        .find(|value| !value.is_empty())
}

/// First candidate key present at all; the value may still fail its rule.
fn first_present<'t>(tags: &'t Tags, keys: &[&str]) -> Option<&'t str> {
    keys.iter()
        .find_map(|key| tags.get(*key))
        .map(String::as_str)
}

fn coerce_http(value: &str) -> String {
    if value.starts_with("http://") || value.starts_with("https://") {
        value.to_owned()
    } else {
        format!("http://{value}")
    }
}

fn is_http_uri(value: &str) -> bool {
    Url::parse(value).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}

fn divide(value: &str) -> Vec<String> {
    value
        .split(';')
        .filter(|part| !part.is_empty())
        .map(|part| part.trim().to_owned())
        .collect()
}

fn all_non_trivial(parts: &[String]) -> bool {
    !parts.is_empty() && parts.iter().all(|part| !part.is_empty())
}

fn vocabulary_subset(value: &str, vocabulary: &BTreeSet<String>) -> Option<BTreeSet<String>> {
    let selected: BTreeSet<String> = divide(value)
        .into_iter()
        .filter(|item| vocabulary.contains(item))
        .collect();
    (!selected.is_empty()).then_some(selected)
}

/// Last positive run of consecutive digits in a free-text value.
fn last_digit_run(value: &str) -> Option<u64> {
    let mut last = 0u64;
    let mut current = 0u64;

    for ch in value.chars() {
        if let Some(digit) = ch.to_digit(10) {
            current = current
                .saturating_mul(10)
                .saturating_add(u64::from(digit));
        } else {
            if current > 0 {
                last = current;
            }
            current = 0;
        }
    }
    if current > 0 {
        last = current;
    }

    (last > 0).then_some(last)
}
