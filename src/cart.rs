//! Cart
//!
//! An ordered collection of line items, keyed by product id. Every
//! operation is synchronous and returns an explicit [`CartChange`] so the
//! presentation layer can decide how to re-render.

use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;

use crate::{money, products::Product};

/// Errors related to cart construction or totals.
#[derive(Debug, Error)]
pub enum CartError {
    /// An item's currency differs from the cart currency (product id, item
    /// currency, cart currency).
    #[error("item {0} has currency {1}, but cart has currency {2}")]
    CurrencyMismatch(String, &'static str, &'static str),

    /// A line total overflowed the decimal range.
    #[error("line total for item {0} overflowed")]
    Overflow(String),

    /// Wrapped money arithmetic error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Outcome of a cart mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartChange {
    /// The item was appended with quantity 1.
    Added,

    /// The product is already in the cart; nothing changed.
    AlreadyInCart,

    /// The matching line was deleted.
    Removed,

    /// The line's quantity is now this value.
    QuantityChanged(u32),

    /// No line matches the given product id.
    NotInCart,
}

/// One product entry in a cart with a quantity.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    product_id: String,
    title: String,
    thumbnail: Option<String>,
    unit_price: Money<'static, Currency>,
    quantity: u32,
}

impl LineItem {
    /// Creates a line item with the given quantity.
    ///
    /// A zero quantity is bumped to 1; lines always represent at least one
    /// unit.
    #[must_use]
    pub fn new(
        product_id: impl Into<String>,
        title: impl Into<String>,
        unit_price: Money<'static, Currency>,
        quantity: u32,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            title: title.into(),
            thumbnail: None,
            unit_price,
            quantity: quantity.max(1),
        }
    }

    /// Creates a single-unit line item from a catalog product.
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            product_id: product.id.clone(),
            title: product.title.clone(),
            thumbnail: product.thumbnail.clone(),
            unit_price: product.price,
            quantity: 1,
        }
    }

    /// Returns the product id of the line.
    #[must_use]
    pub fn product_id(&self) -> &str {
        &self.product_id
    }

    /// Returns the display title of the line.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the thumbnail URL of the line, if any.
    #[must_use]
    pub fn thumbnail(&self) -> Option<&str> {
        self.thumbnail.as_deref()
    }

    /// Returns the unit price of the line.
    #[must_use]
    pub fn unit_price(&self) -> &Money<'static, Currency> {
        &self.unit_price
    }

    /// Returns the quantity of the line. Always at least 1.
    #[must_use]
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Calculates unit price × quantity at full precision.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Overflow`] if the multiplication overflows the
    /// decimal range.
    pub fn line_total(&self) -> Result<Money<'static, Currency>, CartError> {
        money::times(&self.unit_price, self.quantity)
            .ok_or_else(|| CartError::Overflow(self.product_id.clone()))
    }
}

/// Cart
#[derive(Debug)]
pub struct Cart {
    items: Vec<LineItem>,
    currency: &'static Currency,
}

impl Cart {
    /// Create a new empty cart in the given currency.
    #[must_use]
    pub fn new(currency: &'static Currency) -> Self {
        Cart {
            items: Vec::new(),
            currency,
        }
    }

    /// Create a new cart with the given line items.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::CurrencyMismatch`] if any item's currency
    /// differs from the cart currency.
    pub fn with_items(
        items: impl Into<Vec<LineItem>>,
        currency: &'static Currency,
    ) -> Result<Self, CartError> {
        let items = items.into();

        items.iter().try_for_each(|item| {
            let item_currency = item.unit_price().currency();

            if item_currency == currency {
                Ok(())
            } else {
                Err(CartError::CurrencyMismatch(
                    item.product_id().to_owned(),
                    item_currency.iso_alpha_code,
                    currency.iso_alpha_code,
                ))
            }
        })?;

        Ok(Cart { items, currency })
    }

    /// Append an item to the cart with quantity 1.
    ///
    /// Adding a product id that is already in the cart is a no-op and
    /// returns [`CartChange::AlreadyInCart`].
    ///
    /// # Errors
    ///
    /// Returns [`CartError::CurrencyMismatch`] if the item's currency
    /// differs from the cart currency.
    pub fn add(&mut self, item: LineItem) -> Result<CartChange, CartError> {
        let item_currency = item.unit_price().currency();

        if item_currency != self.currency {
            return Err(CartError::CurrencyMismatch(
                item.product_id().to_owned(),
                item_currency.iso_alpha_code,
                self.currency.iso_alpha_code,
            ));
        }

        if self.get(item.product_id()).is_some() {
            return Ok(CartChange::AlreadyInCart);
        }

        self.items.push(item);

        Ok(CartChange::Added)
    }

    /// Delete the line matching the given product id.
    pub fn remove(&mut self, product_id: &str) -> CartChange {
        match self
            .items
            .iter()
            .position(|item| item.product_id() == product_id)
        {
            Some(position) => {
                self.items.remove(position);
                CartChange::Removed
            }
            None => CartChange::NotInCart,
        }
    }

    /// Increase the quantity of the matching line by one. No upper bound.
    pub fn increase(&mut self, product_id: &str) -> CartChange {
        match self.get_mut(product_id) {
            Some(item) => {
                item.quantity += 1;
                CartChange::QuantityChanged(item.quantity)
            }
            None => CartChange::NotInCart,
        }
    }

    /// Decrease the quantity of the matching line by one, flooring at 1.
    ///
    /// Use [`Cart::remove`] to delete a line entirely.
    pub fn decrease(&mut self, product_id: &str) -> CartChange {
        match self.get_mut(product_id) {
            Some(item) => {
                item.quantity = item.quantity.saturating_sub(1).max(1);
                CartChange::QuantityChanged(item.quantity)
            }
            None => CartChange::NotInCart,
        }
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Calculate the subtotal of the cart at full precision.
    ///
    /// An empty cart totals zero in the cart currency.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] if a line total overflows or money
    /// arithmetic fails.
    pub fn subtotal(&self) -> Result<Money<'static, Currency>, CartError> {
        self.items
            .iter()
            .try_fold(money::zero(self.currency), |acc, item| {
                Ok(acc.add(item.line_total()?)?)
            })
    }

    /// Get the line for a product id, if present.
    #[must_use]
    pub fn get(&self, product_id: &str) -> Option<&LineItem> {
        self.items
            .iter()
            .find(|item| item.product_id() == product_id)
    }

    fn get_mut(&mut self, product_id: &str) -> Option<&mut LineItem> {
        self.items
            .iter_mut()
            .find(|item| item.product_id() == product_id)
    }

    /// Iterate over the lines in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &LineItem> {
        self.items.iter()
    }

    /// Get the number of lines in the cart.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the cart is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get the currency of the cart.
    #[must_use]
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }
}
