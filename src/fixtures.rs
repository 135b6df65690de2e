//! Fixtures
//!
//! Demo catalog data and in-memory collaborator implementations, shared by
//! tests and examples. The in-memory order store assigns deterministic
//! ids and creation timestamps, standing in for a real backend that owns
//! both.

use std::{
    convert::Infallible,
    str::FromStr,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::USD};
use serde::Deserialize;
use thiserror::Error;

use crate::{
    checkout::{OrderRecord, OrderSnapshot, OrderStore, UserDirectory, UserProfile},
    products::{Product, ProductCatalog},
};

/// Fixture parsing errors.
#[derive(Debug, Error)]
pub enum FixtureError {
    /// YAML parsing error.
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format.
    #[error("invalid price format: {0}")]
    InvalidPrice(String),
}

/// Failure reported by an in-memory collaborator configured to reject
/// calls.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct CollaboratorDown(pub String);

/// Raw product entry as it appears in the fixture document.
#[derive(Debug, Deserialize)]
struct ProductFixture {
    id: String,
    title: String,
    price: String,
    thumbnail: Option<String>,
    category: String,
    description: String,
}

/// A small slice of the public catalog, USD-priced.
const CATALOG_YAML: &str = r#"
- id: "1"
  title: Essence Mascara Lash Princess
  price: "9.99"
  thumbnail: https://cdn.example.com/products/1/thumbnail.webp
  category: beauty
  description: A popular volumising mascara known for its dramatic effect.
- id: "2"
  title: Eyeshadow Palette with Mirror
  price: "19.99"
  thumbnail: https://cdn.example.com/products/2/thumbnail.webp
  category: beauty
  description: A versatile palette with a built-in mirror for on-the-go looks.
- id: "6"
  title: Calvin Klein CK One
  price: "49.99"
  thumbnail: https://cdn.example.com/products/6/thumbnail.webp
  category: fragrances
  description: A classic unisex fragrance, fresh and clean.
- id: "11"
  title: Annibale Colombo Bed
  price: "1899.99"
  thumbnail: https://cdn.example.com/products/11/thumbnail.webp
  category: furniture
  description: Luxurious king-size bed in solid wood.
- id: "16"
  title: Apple
  price: "1.99"
  thumbnail: https://cdn.example.com/products/16/thumbnail.webp
  category: groceries
  description: Fresh and crisp, perfect for snacking.
- id: "78"
  title: Apple MacBook Pro 14 Inch
  price: "1999.99"
  thumbnail: https://cdn.example.com/products/78/thumbnail.webp
  category: laptops
  description: A powerful and sleek laptop with the M-series chip.
"#;

/// Parses the demo product catalog.
///
/// # Errors
///
/// Returns a [`FixtureError`] if the embedded document is malformed or a
/// price does not parse as a decimal amount.
pub fn catalog() -> Result<Vec<Product>, FixtureError> {
    let raw: Vec<ProductFixture> = serde_norway::from_str(CATALOG_YAML)?;

    raw.into_iter()
        .map(|fixture| {
            let amount = Decimal::from_str(&fixture.price)
                .map_err(|_err| FixtureError::InvalidPrice(fixture.price.clone()))?;

            Ok(Product {
                id: fixture.id,
                title: fixture.title,
                price: Money::from_decimal(amount, USD),
                thumbnail: fixture.thumbnail,
                category: fixture.category,
                description: fixture.description,
            })
        })
        .collect()
}

/// An in-memory product catalog.
#[derive(Debug, Clone)]
pub struct StaticCatalog {
    products: Vec<Product>,
}

impl StaticCatalog {
    /// Creates a catalog over the demo products.
    ///
    /// # Errors
    ///
    /// Returns a [`FixtureError`] if the embedded fixture document fails to
    /// parse.
    pub fn demo() -> Result<Self, FixtureError> {
        Ok(Self {
            products: catalog()?,
        })
    }

    /// Creates a catalog over an explicit product list.
    #[must_use]
    pub fn with_products(products: Vec<Product>) -> Self {
        Self { products }
    }
}

impl ProductCatalog for StaticCatalog {
    type Error = Infallible;

    async fn products(&self) -> Result<Vec<Product>, Self::Error> {
        Ok(self.products.clone())
    }

    async fn product(&self, id: &str) -> Result<Option<Product>, Self::Error> {
        Ok(self.products.iter().find(|p| p.id == id).cloned())
    }
}

/// An in-memory user-record collaborator.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    profiles: FxHashMap<String, UserProfile>,
    down: Option<String>,
    calls: AtomicUsize,
}

impl InMemoryDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a directory that fails every lookup with the given message.
    #[must_use]
    pub fn down(message: impl Into<String>) -> Self {
        Self {
            profiles: FxHashMap::default(),
            down: Some(message.into()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Adds a profile record for a user id.
    #[must_use]
    pub fn with_profile(mut self, user_id: impl Into<String>, profile: UserProfile) -> Self {
        self.profiles.insert(user_id.into(), profile);
        self
    }

    /// How many lookups have been made against this directory.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl UserDirectory for InMemoryDirectory {
    type Error = CollaboratorDown;

    async fn profile(&self, user_id: &str) -> Result<Option<UserProfile>, Self::Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match &self.down {
            Some(message) => Err(CollaboratorDown(message.clone())),
            None => Ok(self.profiles.get(user_id).cloned()),
        }
    }
}

#[derive(Debug, Default)]
struct OrdersInner {
    records: Vec<OrderRecord>,
    seq: i64,
}

/// An in-memory order store.
///
/// Record ids and creation timestamps are assigned at write time from a
/// monotonic sequence, so history ordering is deterministic under test.
#[derive(Debug, Default)]
pub struct InMemoryOrders {
    inner: Mutex<OrdersInner>,
    reject: Option<String>,
    attempts: AtomicUsize,
}

impl InMemoryOrders {
    /// Timestamp base for store-assigned creation times.
    const EPOCH: i64 = 1_700_000_000;

    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that rejects every write with the given message.
    #[must_use]
    pub fn rejecting(message: impl Into<String>) -> Self {
        Self {
            inner: Mutex::new(OrdersInner::default()),
            reject: Some(message.into()),
            attempts: AtomicUsize::new(0),
        }
    }

    /// How many writes have been attempted, including rejected ones.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// How many records the store holds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    /// Check if the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, OrdersInner> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl OrderStore for InMemoryOrders {
    type Error = CollaboratorDown;

    async fn create(&self, snapshot: OrderSnapshot) -> Result<OrderRecord, Self::Error> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = &self.reject {
            return Err(CollaboratorDown(message.clone()));
        }

        let mut inner = self.lock();
        inner.seq += 1;

        let created_at = DateTime::from_timestamp(Self::EPOCH + inner.seq, 0)
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

        let record = OrderRecord {
            id: format!("order-{}", inner.seq),
            created_at,
            snapshot,
        };

        inner.records.push(record.clone());

        Ok(record)
    }

    async fn orders_for(&self, user_id: &str) -> Result<Vec<OrderRecord>, Self::Error> {
        Ok(self
            .lock()
            .records
            .iter()
            .filter(|record| record.snapshot.user_id == user_id)
            .cloned()
            .collect())
    }
}
