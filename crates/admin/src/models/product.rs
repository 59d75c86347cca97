//! Catalog products and the product form.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use storedesk_core::{Price, ProductId, ProductImages};

use super::null_as_default;

/// A row of the `products` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub price: Price,
    #[serde(default)]
    pub stock: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sub_category: String,
    #[serde(default, deserialize_with = "ProductImages::nullable")]
    pub images: ProductImages,
    #[serde(default)]
    pub featured: Option<bool>,
    /// Supplier listing the product is sourced from.
    #[serde(default, rename = "ali_express_link")]
    pub external_link: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub reviews: Option<i64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Product {
    #[must_use]
    pub fn description_text(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }

    #[must_use]
    pub fn thumbnail(&self) -> Option<String> {
        self.images.first()
    }

    #[must_use]
    pub fn is_featured(&self) -> bool {
        self.featured.unwrap_or(false)
    }
}

/// Insert body for a new product.
#[derive(Debug, Clone, Serialize)]
pub struct NewProduct {
    pub title: String,
    pub description: Option<String>,
    pub price: Price,
    pub stock: i64,
    pub category: String,
    pub sub_category: String,
    pub images: ProductImages,
    pub featured: bool,
    #[serde(rename = "ali_express_link")]
    pub external_link: Option<String>,
    pub rating: f64,
    pub reviews: i64,
}

/// Partial update of a product; `None` fields are left untouched.
///
/// The nested options on `description` and `external_link` distinguish
/// "leave alone" (`None`) from "clear" (`Some(None)`).
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProductUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<ProductImages>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
    #[serde(
        rename = "ali_express_link",
        skip_serializing_if = "Option::is_none"
    )]
    pub external_link: Option<Option<String>>,
}

// =============================================================================
// Form
// =============================================================================

/// Raw product form submission; every field arrives as text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub stock: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub sub_category: String,
    /// One image URL per line.
    #[serde(default)]
    pub images: String,
    /// Checkbox; present (`"on"`) when ticked.
    #[serde(default)]
    pub featured: Option<String>,
    #[serde(default)]
    pub external_link: String,
}

/// A validated product form.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDraft {
    pub title: String,
    pub description: Option<String>,
    pub price: Price,
    pub stock: i64,
    pub category: String,
    pub sub_category: String,
    pub image_urls: Vec<String>,
    pub featured: bool,
    pub external_link: Option<String>,
}

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

impl ProductForm {
    /// Prefill the form from an existing product.
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            title: product.title.clone(),
            description: product.description_text().to_owned(),
            price: product.price.amount().to_string(),
            stock: product.stock.unwrap_or(0).to_string(),
            category: product.category.clone(),
            sub_category: product.sub_category.clone(),
            images: product.images.urls().join("\n"),
            featured: product.is_featured().then(|| "on".to_owned()),
            external_link: product.external_link.clone().unwrap_or_default(),
        }
    }

    #[must_use]
    pub const fn is_featured(&self) -> bool {
        self.featured.is_some()
    }

    /// Validate a new product against the allowed categories.
    ///
    /// An empty `categories` list accepts any non-blank category.
    ///
    /// # Errors
    ///
    /// Returns every problem found, one message per field.
    pub fn validate(&self, categories: &[String]) -> Result<ProductDraft, Vec<String>> {
        self.validate_with(categories, None)
    }

    /// Validate an edit of a product currently filed under `stored_category`.
    ///
    /// The stored category stays acceptable even when it is no longer
    /// configured, and a product stored without one may be saved without one.
    ///
    /// # Errors
    ///
    /// Returns every problem found, one message per field.
    pub fn validate_edit(
        &self,
        categories: &[String],
        stored_category: &str,
    ) -> Result<ProductDraft, Vec<String>> {
        self.validate_with(categories, Some(stored_category))
    }

    fn validate_with(
        &self,
        categories: &[String],
        stored_category: Option<&str>,
    ) -> Result<ProductDraft, Vec<String>> {
        let mut errors = Vec::new();

        let title = self.title.trim().to_owned();
        if title.is_empty() {
            errors.push("Title is required".to_owned());
        }

        let price = match self.price.trim().parse::<Decimal>() {
            Ok(p) if p.is_sign_negative() => {
                errors.push("Price cannot be negative".to_owned());
                Price::ZERO
            }
            Ok(p) => Price::new(p),
            Err(_) => {
                errors.push("Price must be a number".to_owned());
                Price::ZERO
            }
        };

        let stock = match self.stock.trim() {
            "" => 0,
            raw => match raw.parse::<i64>() {
                Ok(s) if s >= 0 => s,
                _ => {
                    errors.push("Stock must be a whole number of at least 0".to_owned());
                    0
                }
            },
        };

        let category = self.category.trim().to_lowercase();
        let stored = stored_category.map(|c| c.trim().to_lowercase());
        if category.is_empty() {
            if stored.as_deref().is_none_or(|c| !c.is_empty()) {
                errors.push("Category is required".to_owned());
            }
        } else if !categories.is_empty()
            && !categories.contains(&category)
            && stored.as_deref() != Some(category.as_str())
        {
            errors.push(format!("Unknown category: {category}"));
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(ProductDraft {
            title,
            description: non_empty(&self.description),
            price,
            stock,
            category,
            sub_category: self.sub_category.trim().to_owned(),
            image_urls: self.images.lines().filter_map(non_empty).collect(),
            featured: self.is_featured(),
            external_link: non_empty(&self.external_link),
        })
    }
}

impl ProductDraft {
    /// Insert body for a new product with zeroed rating and reviews.
    #[must_use]
    pub fn into_new(self) -> NewProduct {
        NewProduct {
            title: self.title,
            description: self.description,
            price: self.price,
            stock: self.stock,
            category: self.category,
            sub_category: self.sub_category,
            images: ProductImages::keyed_from(&self.image_urls),
            featured: self.featured,
            external_link: self.external_link,
            rating: 0.0,
            reviews: 0,
        }
    }

    /// Update touching every editable column. A blank category is left as stored.
    #[must_use]
    pub fn into_update(self) -> ProductUpdate {
        ProductUpdate {
            title: Some(self.title),
            description: Some(self.description),
            price: Some(self.price),
            stock: Some(self.stock),
            category: (!self.category.is_empty()).then_some(self.category),
            sub_category: Some(self.sub_category),
            images: Some(ProductImages::keyed_from(&self.image_urls)),
            featured: Some(self.featured),
            external_link: Some(self.external_link),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn categories() -> Vec<String> {
        vec!["cosplay".to_owned(), "beauty".to_owned()]
    }

    fn form() -> ProductForm {
        ProductForm {
            title: " Wig ".to_owned(),
            price: "19.99".to_owned(),
            category: "Cosplay".to_owned(),
            images: "https://img.test/a.jpg\n\n https://img.test/b.jpg ".to_owned(),
            ..Default::default()
        }
    }

    #[test]
    fn test_product_reads_loose_rows() {
        let product: Product = serde_json::from_value(json!({
            "id": "6f1c1f60-4d3e-4c1b-9a51-0d7c4a2e9b11",
            "title": "Wig",
            "price": 12.5,
            "category": null,
            "images": {"1": "b.jpg", "0": "a.jpg"},
            "ali_express_link": "https://supplier.test/1"
        }))
        .unwrap();

        assert_eq!(product.price.to_string(), "$12.50");
        assert_eq!(product.category, "");
        assert_eq!(product.thumbnail().as_deref(), Some("a.jpg"));
        assert_eq!(product.external_link.as_deref(), Some("https://supplier.test/1"));
        assert!(!product.is_featured());
    }

    #[test]
    fn test_validate_defaults_and_normalizes() {
        let draft = form().validate(&categories()).unwrap();
        assert_eq!(draft.title, "Wig");
        assert_eq!(draft.category, "cosplay");
        assert_eq!(draft.stock, 0);
        assert_eq!(draft.description, None);
        assert_eq!(draft.external_link, None);
        assert_eq!(draft.image_urls, vec!["https://img.test/a.jpg", "https://img.test/b.jpg"]);
        assert!(!draft.featured);
    }

    #[test]
    fn test_validate_collects_every_error() {
        let bad = ProductForm {
            price: "abc".to_owned(),
            stock: "-2".to_owned(),
            category: "garden".to_owned(),
            ..Default::default()
        };
        let errors = bad.validate(&categories()).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.iter().any(|e| e.contains("Unknown category")));
    }

    #[test]
    fn test_new_product_uses_keyed_images_and_zeroed_counters() {
        let body = serde_json::to_value(form().validate(&categories()).unwrap().into_new()).unwrap();
        assert_eq!(body["images"], json!({"0": "https://img.test/a.jpg", "1": "https://img.test/b.jpg"}));
        assert_eq!(body["description"], json!(null));
        assert_eq!(body["ali_express_link"], json!(null));
        assert_eq!(body["stock"], json!(0));
        assert_eq!(body["featured"], json!(false));
        assert_eq!(body["rating"], json!(0.0));
        assert_eq!(body["reviews"], json!(0));
    }

    #[test]
    fn test_update_can_clear_description() {
        let update = ProductUpdate {
            description: Some(None),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&update).unwrap(), json!({"description": null}));
    }

    #[test]
    fn test_form_round_trips_existing_product() {
        let product: Product = serde_json::from_value(json!({
            "id": "6f1c1f60-4d3e-4c1b-9a51-0d7c4a2e9b11",
            "title": "Lipstick",
            "description": "Red",
            "price": "8.00",
            "stock": 3,
            "category": "beauty",
            "images": ["x.jpg"],
            "featured": true
        }))
        .unwrap();

        let form = ProductForm::from_product(&product);
        assert!(form.is_featured());
        assert_eq!(form.images, "x.jpg");

        let draft = form.validate(&categories()).unwrap();
        assert_eq!(draft.price, product.price);
        assert_eq!(draft.stock, 3);
        assert_eq!(draft.description.as_deref(), Some("Red"));
    }

    #[test]
    fn test_edit_keeps_unlisted_stored_category() {
        let product: Product = serde_json::from_value(json!({
            "id": "6f1c1f60-4d3e-4c1b-9a51-0d7c4a2e9b11",
            "title": "Bob Wig",
            "price": "5.00",
            "category": "wigs"
        }))
        .unwrap();

        let mut form = ProductForm::from_product(&product);
        form.price = "6.00".to_owned();

        assert!(form.validate(&categories()).is_err());
        let draft = form.validate_edit(&categories(), &product.category).unwrap();
        assert_eq!(draft.category, "wigs");
        assert_eq!(draft.price.to_string(), "$6.00");

        // Moving it to a different unlisted category is still refused.
        form.category = "hats".to_owned();
        let errors = form.validate_edit(&categories(), &product.category).unwrap_err();
        assert_eq!(errors, vec!["Unknown category: hats".to_owned()]);
    }

    #[test]
    fn test_edit_of_uncategorized_product_leaves_category_alone() {
        let product: Product = serde_json::from_value(json!({
            "id": "6f1c1f60-4d3e-4c1b-9a51-0d7c4a2e9b11",
            "title": "Mystery Box",
            "price": 3,
            "category": null
        }))
        .unwrap();

        let form = ProductForm::from_product(&product);
        assert!(form.validate(&categories()).is_err());

        let update = form
            .validate_edit(&categories(), &product.category)
            .unwrap()
            .into_update();
        assert_eq!(update.category, None);
        assert!(serde_json::to_value(&update).unwrap().get("category").is_none());
    }
}
