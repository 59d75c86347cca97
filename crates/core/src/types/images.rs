//! Product image lists.
//!
//! The `products.images` column has been written in three shapes over time:
//! a JSON array of URLs, a keyed map (`{"0": url, "1": url}`), and a bare
//! string. Reads accept all three; writes always use the keyed map.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Image URLs attached to a product, in whichever shape storage holds them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProductImages {
    /// `["https://...", ...]`
    List(Vec<String>),
    /// `{"0": "https://...", ...}`
    Keyed(BTreeMap<String, Value>),
    /// `"https://..."`
    Single(String),
}

impl Default for ProductImages {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

impl ProductImages {
    /// Build the keyed-map storage form from an ordered list of URLs.
    ///
    /// Blank entries are dropped and the remaining URLs trimmed.
    #[must_use]
    pub fn keyed_from<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let map = urls
            .into_iter()
            .map(|u| u.as_ref().trim().to_owned())
            .filter(|u| !u.is_empty())
            .enumerate()
            .map(|(i, u)| (i.to_string(), Value::String(u)))
            .collect();
        Self::Keyed(map)
    }

    /// URLs in display order.
    ///
    /// Keyed maps are ordered by numeric key first, then any non-numeric keys
    /// lexicographically; non-string values are skipped.
    #[must_use]
    pub fn urls(&self) -> Vec<String> {
        match self {
            Self::List(urls) => urls.iter().filter(|u| !u.is_empty()).cloned().collect(),
            Self::Single(url) if url.trim().is_empty() => Vec::new(),
            Self::Single(url) => vec![url.trim().to_owned()],
            Self::Keyed(map) => {
                let mut entries: Vec<(&String, &str)> = map
                    .iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k, s)))
                    .collect();
                entries.sort_by(|(a, _), (b, _)| {
                    match (a.parse::<u64>(), b.parse::<u64>()) {
                        (Ok(x), Ok(y)) => x.cmp(&y),
                        (Ok(_), Err(_)) => std::cmp::Ordering::Less,
                        (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
                        (Err(_), Err(_)) => a.cmp(b),
                    }
                });
                entries.into_iter().map(|(_, s)| s.to_owned()).collect()
            }
        }
    }

    /// First URL, used as the thumbnail.
    #[must_use]
    pub fn first(&self) -> Option<String> {
        self.urls().into_iter().next()
    }

    /// Whether there are no usable URLs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.urls().is_empty()
    }

    /// Deserialize a nullable column, treating `null` as no images.
    ///
    /// Use with `#[serde(default, deserialize_with = "ProductImages::nullable")]`.
    ///
    /// # Errors
    ///
    /// Returns the deserializer's error when the value has none of the
    /// accepted shapes.
    pub fn nullable<'de, D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Option::<Self>::deserialize(deserializer).map(Option::unwrap_or_default)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reads_array_form() {
        let images: ProductImages = serde_json::from_value(json!(["a.jpg", "b.jpg"])).unwrap();
        assert_eq!(images.urls(), vec!["a.jpg", "b.jpg"]);
    }

    #[test]
    fn test_reads_keyed_form_in_numeric_order() {
        let images: ProductImages =
            serde_json::from_value(json!({"10": "k.jpg", "2": "c.jpg", "0": "a.jpg"})).unwrap();
        assert_eq!(images.urls(), vec!["a.jpg", "c.jpg", "k.jpg"]);
    }

    #[test]
    fn test_keyed_form_skips_non_strings() {
        let images: ProductImages =
            serde_json::from_value(json!({"0": "a.jpg", "1": null, "cover": "z.jpg"})).unwrap();
        assert_eq!(images.urls(), vec!["a.jpg", "z.jpg"]);
    }

    #[test]
    fn test_reads_bare_string() {
        let images: ProductImages = serde_json::from_value(json!("solo.jpg")).unwrap();
        assert_eq!(images.first().as_deref(), Some("solo.jpg"));

        let blank: ProductImages = serde_json::from_value(json!("")).unwrap();
        assert!(blank.is_empty());
    }

    #[test]
    fn test_nullable_treats_null_as_empty() {
        #[derive(Deserialize)]
        struct Row {
            #[serde(default, deserialize_with = "ProductImages::nullable")]
            images: ProductImages,
        }

        let row: Row = serde_json::from_value(json!({"images": null})).unwrap();
        assert!(row.images.is_empty());
        let row: Row = serde_json::from_value(json!({})).unwrap();
        assert!(row.images.is_empty());
    }

    #[test]
    fn test_keyed_from_writes_storage_form() {
        let images = ProductImages::keyed_from([" a.jpg ", "", "b.jpg"]);
        assert_eq!(
            serde_json::to_value(&images).unwrap(),
            json!({"0": "a.jpg", "1": "b.jpg"})
        );
    }
}
