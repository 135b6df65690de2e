//! Pricing
//!
//! Derives a bill (subtotal, shipping, discount, total) from a cart and an
//! optional applied coupon. Amounts stay at full precision until they cross
//! a presentation boundary ([`Bill::totals`] or [`Bill::write_to`]).

use std::io;

use rust_decimal::Decimal;
use rusty_money::{Money, MoneyError, iso::Currency};
use serde::{Deserialize, Serialize};
use tabled::{
    builder::Builder,
    settings::{Alignment, Color, Style, object::{Columns, Rows}},
};
use thiserror::Error;

use crate::{
    cart::{Cart, CartError},
    coupons::{Coupon, CouponRegistry},
    money,
};

/// Errors that can occur while deriving or applying pricing.
#[derive(Debug, Error)]
pub enum PricingError {
    /// The applied coupon code is not in the registry.
    #[error("invalid coupon code: {code}")]
    InvalidCoupon {
        /// The code as the shopper entered it.
        code: String,
    },

    /// Errors bubbled up from the cart subtotal.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Wrapped money arithmetic error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// The storefront's shipping rule.
///
/// One canonical rule: orders ship free at or above the threshold, and pay a
/// fixed fee below it. An empty order ships nothing and pays nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct ShippingPolicy {
    free_over: Money<'static, Currency>,
    fee: Money<'static, Currency>,
}

impl ShippingPolicy {
    /// Creates a policy with the given free-shipping threshold and fee.
    #[must_use]
    pub fn new(free_over: Money<'static, Currency>, fee: Money<'static, Currency>) -> Self {
        Self { free_over, fee }
    }

    /// Returns the free-shipping threshold (inclusive).
    #[must_use]
    pub fn free_over(&self) -> &Money<'static, Currency> {
        &self.free_over
    }

    /// Returns the below-threshold fee.
    #[must_use]
    pub fn fee(&self) -> &Money<'static, Currency> {
        &self.fee
    }

    /// Calculates the shipping fee for a subtotal.
    #[must_use]
    pub fn fee_for(&self, subtotal: &Money<'static, Currency>) -> Money<'static, Currency> {
        if subtotal.amount().is_zero() || subtotal.amount() >= self.free_over.amount() {
            money::zero(subtotal.currency())
        } else {
            self.fee
        }
    }
}

impl Default for ShippingPolicy {
    /// The canonical storefront rule: free at $300 and above, $20 below.
    fn default() -> Self {
        Self::new(
            Money::from_major(300, rusty_money::iso::USD),
            Money::from_major(20, rusty_money::iso::USD),
        )
    }
}

/// Bill totals rounded to cents, for display and persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillTotals {
    /// Sum of line totals before shipping and discount.
    pub subtotal: Decimal,

    /// Shipping fee.
    pub shipping: Decimal,

    /// Discount granted by the applied coupon.
    pub discount: Decimal,

    /// Amount payable.
    pub total: Decimal,

    /// Code of the applied coupon, if any.
    pub coupon: Option<String>,
}

/// A fully derived bill for a cart.
#[derive(Debug, Clone, PartialEq)]
pub struct Bill {
    subtotal: Money<'static, Currency>,
    shipping: Money<'static, Currency>,
    discount: Money<'static, Currency>,
    total: Money<'static, Currency>,
    coupon: Option<String>,
}

impl Bill {
    /// Sum of line totals before shipping and discount.
    #[must_use]
    pub fn subtotal(&self) -> &Money<'static, Currency> {
        &self.subtotal
    }

    /// Shipping fee.
    #[must_use]
    pub fn shipping(&self) -> &Money<'static, Currency> {
        &self.shipping
    }

    /// Discount granted by the applied coupon.
    #[must_use]
    pub fn discount(&self) -> &Money<'static, Currency> {
        &self.discount
    }

    /// Amount payable.
    #[must_use]
    pub fn total(&self) -> &Money<'static, Currency> {
        &self.total
    }

    /// Code of the applied coupon, if any.
    #[must_use]
    pub fn coupon(&self) -> Option<&str> {
        self.coupon.as_deref()
    }

    /// Whether the order qualified for free delivery.
    #[must_use]
    pub fn free_delivery(&self) -> bool {
        self.shipping.amount().is_zero() && !self.subtotal.amount().is_zero()
    }

    /// Rounds every amount to cents for display or persistence.
    #[must_use]
    pub fn totals(&self) -> BillTotals {
        BillTotals {
            subtotal: *money::round_to_cents(&self.subtotal).amount(),
            shipping: *money::round_to_cents(&self.shipping).amount(),
            discount: *money::round_to_cents(&self.discount).amount(),
            total: *money::round_to_cents(&self.total).amount(),
            coupon: self.coupon.clone(),
        }
    }

    /// Renders the bill summary as a text table.
    ///
    /// # Errors
    ///
    /// Returns an [`io::Error`] if writing to `out` fails.
    pub fn write_to(&self, mut out: impl io::Write) -> io::Result<()> {
        let subtotal = money::round_to_cents(&self.subtotal).to_string();
        let total = money::round_to_cents(&self.total).to_string();

        let shipping = if self.free_delivery() {
            "Free".to_owned()
        } else {
            money::round_to_cents(&self.shipping).to_string()
        };

        let discount = match self.coupon() {
            Some(code) => format!("-{} ({code})", money::round_to_cents(&self.discount)),
            None => format!("-{}", money::round_to_cents(&self.discount)),
        };

        let mut builder = Builder::default();
        builder.push_record(["Bill Summary", ""]);
        builder.push_record(["Subtotal", subtotal.as_str()]);
        builder.push_record(["Shipping", shipping.as_str()]);
        builder.push_record(["Discount", discount.as_str()]);
        builder.push_record(["Total", total.as_str()]);

        let mut table = builder.build();
        table.with(Style::modern_rounded());
        table.modify(Rows::first(), Color::BOLD);
        table.modify(Rows::last(), Color::BOLD);
        table.modify(Columns::last(), Alignment::right());

        writeln!(out, "{table}")
    }
}

/// Pricing engine
///
/// Holds the at-most-one applied coupon and the shipping policy, and derives
/// bills from carts. The coupon registry is injected; the engine never
/// mutates it.
#[derive(Debug)]
pub struct PricingEngine<'r> {
    registry: &'r CouponRegistry,
    shipping: ShippingPolicy,
    applied: Option<Coupon>,
}

impl<'r> PricingEngine<'r> {
    /// Creates an engine over the given registry with the default shipping
    /// policy.
    #[must_use]
    pub fn new(registry: &'r CouponRegistry) -> Self {
        Self::with_shipping_policy(registry, ShippingPolicy::default())
    }

    /// Creates an engine with an explicit shipping policy.
    #[must_use]
    pub fn with_shipping_policy(registry: &'r CouponRegistry, shipping: ShippingPolicy) -> Self {
        Self {
            registry,
            shipping,
            applied: None,
        }
    }

    /// Applies a coupon code.
    ///
    /// A valid code replaces any previously applied coupon. An unknown code
    /// clears the applied coupon and reports [`PricingError::InvalidCoupon`];
    /// the shopper may retry with another code.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::InvalidCoupon`] if the code is not in the
    /// registry.
    pub fn apply_coupon(&mut self, code: &str) -> Result<&'r Coupon, PricingError> {
        match self.registry.find(code) {
            Some(coupon) => {
                self.applied = Some(coupon.clone());
                Ok(coupon)
            }
            None => {
                self.applied = None;
                Err(PricingError::InvalidCoupon {
                    code: code.to_owned(),
                })
            }
        }
    }

    /// Clears the applied coupon.
    pub fn clear_coupon(&mut self) {
        self.applied = None;
    }

    /// Returns the currently applied coupon, if any.
    #[must_use]
    pub fn applied_coupon(&self) -> Option<&Coupon> {
        self.applied.as_ref()
    }

    /// Returns the shipping policy.
    #[must_use]
    pub fn shipping_policy(&self) -> &ShippingPolicy {
        &self.shipping
    }

    /// Derives the bill for a cart.
    ///
    /// Total is clamped at zero: a discount can reduce the bill to nothing
    /// but never into credit.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if the cart subtotal or money arithmetic
    /// fails.
    pub fn bill(&self, cart: &Cart) -> Result<Bill, PricingError> {
        let subtotal = cart.subtotal()?;
        let shipping = self.shipping.fee_for(&subtotal);

        let discount = match &self.applied {
            Some(coupon) => coupon.discount_on(&subtotal),
            None => money::zero(cart.currency()),
        };

        let payable = subtotal.add(shipping)?.sub(discount)?;
        let total = if payable.amount().is_sign_negative() {
            money::zero(cart.currency())
        } else {
            payable
        };

        Ok(Bill {
            subtotal,
            shipping,
            discount,
            total,
            coupon: self.applied.as_ref().map(|c| c.code().to_owned()),
        })
    }
}
