//! Checkout
//!
//! Orchestrates order confirmation: precondition checks, best-effort
//! contact resolution, snapshot construction, and delegation to the
//! external order store. The store owns persistence and assigns creation
//! timestamps; the coordinator never invents one.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    cart::Cart,
    money,
    pricing::{BillTotals, PricingEngine, PricingError},
};

/// Errors surfaced by order confirmation.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// No signed-in shopper; the caller should prompt for sign-in.
    #[error("please sign in to confirm your order")]
    NotAuthenticated,

    /// Nothing to order; the caller should prompt to add items.
    #[error("your cart is empty")]
    EmptyCart,

    /// The order store rejected the write. The cart is left unchanged so
    /// the shopper can retry.
    #[error("failed to confirm order: {0}")]
    Persistence(String),

    /// Errors bubbled up from bill derivation.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// The signed-in shopper, as the authentication collaborator reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shopper {
    /// Stable user id.
    pub id: String,

    /// Display name from the auth provider, if any.
    pub display_name: Option<String>,

    /// Email from the auth provider, if any.
    pub email: Option<String>,

    /// Phone number from the auth provider, if any.
    pub phone: Option<String>,
}

impl Shopper {
    /// Creates a shopper with only an id; the auth provider supplied no
    /// contact fields.
    #[must_use]
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: None,
            email: None,
            phone: None,
        }
    }
}

/// Profile fields held by the user-record collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Full name on record.
    pub full_name: Option<String>,

    /// Email on record.
    pub email: Option<String>,

    /// Phone number on record.
    pub phone: Option<String>,

    /// Delivery address on record.
    pub address: Option<String>,
}

/// Buyer contact fields embedded in an order snapshot.
///
/// Resolved once at confirmation time: profile record first, then the
/// session identity, then empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    /// Buyer's full name.
    pub full_name: String,

    /// Buyer's email.
    pub email: String,

    /// Buyer's phone number.
    pub phone: String,

    /// Delivery address.
    pub address: String,
}

impl ContactInfo {
    /// Resolves contact fields from an optional profile record and the
    /// session identity, defaulting unknown fields to empty strings.
    #[must_use]
    pub fn resolve(profile: Option<UserProfile>, shopper: &Shopper) -> Self {
        let profile = profile.unwrap_or_default();

        Self {
            full_name: profile
                .full_name
                .or_else(|| shopper.display_name.clone())
                .unwrap_or_default(),
            email: profile
                .email
                .or_else(|| shopper.email.clone())
                .unwrap_or_default(),
            phone: profile
                .phone
                .or_else(|| shopper.phone.clone())
                .unwrap_or_default(),
            address: profile.address.unwrap_or_default(),
        }
    }
}

/// One purchased line in an order snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    /// Catalog product id.
    pub product_id: String,

    /// Display title at time of purchase.
    pub title: String,

    /// Unit price at time of purchase, rounded to cents.
    pub unit_price: Decimal,

    /// Units purchased.
    pub quantity: u32,
}

/// Immutable record of a confirmed purchase, handed to the order store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    /// Id of the buyer.
    pub user_id: String,

    /// Copy of the cart at confirmation time.
    pub items: Vec<OrderLine>,

    /// Bill breakdown, rounded to cents.
    pub bill: BillTotals,

    /// Buyer contact info at time of purchase.
    pub contact: ContactInfo,

    /// ISO currency code for every amount in the snapshot.
    pub currency: String,
}

impl OrderSnapshot {
    /// Builds a snapshot from the cart, its bill, and the resolved buyer.
    #[must_use]
    pub fn new(cart: &Cart, bill: BillTotals, shopper: &Shopper, contact: ContactInfo) -> Self {
        let items = cart
            .iter()
            .map(|line| OrderLine {
                product_id: line.product_id().to_owned(),
                title: line.title().to_owned(),
                unit_price: *money::round_to_cents(line.unit_price()).amount(),
                quantity: line.quantity(),
            })
            .collect();

        Self {
            user_id: shopper.id.clone(),
            items,
            bill,
            contact,
            currency: cart.currency().iso_alpha_code.to_owned(),
        }
    }
}

/// A snapshot as persisted by the order store, with the store-assigned id
/// and creation timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    /// Store-assigned record id.
    pub id: String,

    /// Store-assigned creation timestamp.
    pub created_at: DateTime<Utc>,

    /// The confirmed order.
    pub snapshot: OrderSnapshot,
}

/// The user-record collaborator: profile fields keyed by user id.
pub trait UserDirectory {
    /// Error type surfaced by the directory backend.
    type Error: fmt::Display;

    /// Fetch the profile record for a user, if one exists.
    ///
    /// # Errors
    ///
    /// Returns the backend's error if the directory cannot be reached.
    /// Checkout treats any failure as "no record" and degrades to session
    /// identity fields.
    async fn profile(&self, user_id: &str) -> Result<Option<UserProfile>, Self::Error>;
}

/// The order-store collaborator: append-only order persistence.
pub trait OrderStore {
    /// Error type surfaced by the store backend.
    type Error: fmt::Display;

    /// Persist a snapshot, assigning a record id and creation timestamp.
    ///
    /// # Errors
    ///
    /// Returns the backend's error if the write is rejected.
    async fn create(&self, snapshot: OrderSnapshot) -> Result<OrderRecord, Self::Error>;

    /// Fetch every order record for a user, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns the backend's error if the store cannot be reached.
    async fn orders_for(&self, user_id: &str) -> Result<Vec<OrderRecord>, Self::Error>;
}

impl<T: UserDirectory> UserDirectory for &T {
    type Error = T::Error;

    async fn profile(&self, user_id: &str) -> Result<Option<UserProfile>, Self::Error> {
        (**self).profile(user_id).await
    }
}

impl<T: OrderStore> OrderStore for &T {
    type Error = T::Error;

    async fn create(&self, snapshot: OrderSnapshot) -> Result<OrderRecord, Self::Error> {
        (**self).create(snapshot).await
    }

    async fn orders_for(&self, user_id: &str) -> Result<Vec<OrderRecord>, Self::Error> {
        (**self).orders_for(user_id).await
    }
}

/// Where the coordinator is in the confirmation flow.
///
/// Callers should disable the confirm action while `Submitting`; the
/// coordinator itself takes `&mut self`, so overlapping confirmations
/// cannot happen within one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckoutState {
    /// No confirmation in flight.
    #[default]
    Idle,

    /// A confirmation is awaiting its collaborator calls.
    Submitting,
}

/// Checkout coordinator
#[derive(Debug)]
pub struct CheckoutCoordinator<D, S> {
    directory: D,
    orders: S,
    state: CheckoutState,
}

impl<D, S> CheckoutCoordinator<D, S>
where
    D: UserDirectory,
    S: OrderStore,
{
    /// Creates a coordinator over the given collaborators.
    #[must_use]
    pub fn new(directory: D, orders: S) -> Self {
        Self {
            directory,
            orders,
            state: CheckoutState::Idle,
        }
    }

    /// Returns where the coordinator is in the confirmation flow.
    #[must_use]
    pub fn state(&self) -> CheckoutState {
        self.state
    }

    /// Confirms the order in the cart.
    ///
    /// Preconditions are checked before any collaborator is called. The
    /// profile fetch is best-effort; the order write is not started until
    /// it resolves, since the snapshot embeds profile data. On success the
    /// cart is cleared; on a store failure the cart is left intact so the
    /// shopper can retry.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::NotAuthenticated`]: no signed-in shopper.
    /// - [`CheckoutError::EmptyCart`]: nothing in the cart.
    /// - [`CheckoutError::Pricing`]: the bill could not be derived.
    /// - [`CheckoutError::Persistence`]: the order store rejected the write.
    pub async fn confirm_order(
        &mut self,
        cart: &mut Cart,
        shopper: Option<&Shopper>,
        pricing: &PricingEngine<'_>,
    ) -> Result<OrderRecord, CheckoutError> {
        let shopper = shopper.ok_or(CheckoutError::NotAuthenticated)?;

        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let bill = pricing.bill(cart)?;

        self.state = CheckoutState::Submitting;

        // Best-effort: a dead directory must not block checkout.
        let profile = self.directory.profile(&shopper.id).await.ok().flatten();
        let contact = ContactInfo::resolve(profile, shopper);
        let snapshot = OrderSnapshot::new(cart, bill.totals(), shopper, contact);

        let result = self.orders.create(snapshot).await;
        self.state = CheckoutState::Idle;

        match result {
            Ok(record) => {
                cart.clear();
                Ok(record)
            }
            Err(err) => Err(CheckoutError::Persistence(err.to_string())),
        }
    }

    /// Fetches the shopper's order history, most recent first.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Persistence`] if the store cannot be
    /// reached.
    pub async fn history(&self, user_id: &str) -> Result<Vec<OrderRecord>, CheckoutError> {
        let mut records = self
            .orders
            .orders_for(user_id)
            .await
            .map_err(|err| CheckoutError::Persistence(err.to_string()))?;

        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(records)
    }
}
