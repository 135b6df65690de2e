//! Products
//!
//! Catalog products are display metadata as far as pricing is concerned;
//! only `id` and `price` feed the cart.

use std::fmt;

use rusty_money::{Money, iso::Currency};

/// A product from the storefront catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    /// Catalog identifier, unique across the catalog.
    pub id: String,

    /// Display title.
    pub title: String,

    /// Unit price.
    pub price: Money<'static, Currency>,

    /// Thumbnail image URL, if the catalog provides one.
    pub thumbnail: Option<String>,

    /// Catalog category.
    pub category: String,

    /// Long-form description.
    pub description: String,
}

/// Read-only access to the external product catalog.
///
/// The catalog is consumed only to populate line-item display metadata;
/// the pricing core never calls it.
pub trait ProductCatalog {
    /// Error type surfaced by the catalog backend.
    type Error: fmt::Display;

    /// Fetch every product in the catalog.
    ///
    /// # Errors
    ///
    /// Returns the backend's error if the catalog cannot be reached.
    async fn products(&self) -> Result<Vec<Product>, Self::Error>;

    /// Fetch a single product by catalog id.
    ///
    /// # Errors
    ///
    /// Returns the backend's error if the catalog cannot be reached.
    async fn product(&self, id: &str) -> Result<Option<Product>, Self::Error>;
}
