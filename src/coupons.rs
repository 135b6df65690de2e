//! Coupons
//!
//! A fixed catalog of discount codes. The registry is static configuration,
//! not user data: it ships with built-in defaults and can be loaded from a
//! YAML file instead.

use std::{fs, path::Path};

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::money;

/// Coupon registry loading errors.
#[derive(Debug, Error)]
pub enum CouponConfigError {
    /// IO error reading the registry file.
    #[error("failed to read coupon file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error.
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Two coupons share a code after canonicalisation.
    #[error("duplicate coupon code: {0}")]
    DuplicateCode(String),

    /// A coupon code is empty or whitespace.
    #[error("empty coupon code")]
    EmptyCode,

    /// A percentage coupon's value is outside (0, 1].
    #[error("coupon {0} has percentage value {1}; expected a fraction in (0, 1]")]
    InvalidPercentage(String, Decimal),

    /// A flat coupon's value is not positive.
    #[error("coupon {0} has flat value {1}; expected a positive amount")]
    InvalidAmount(String, Decimal),
}

/// How a coupon's value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CouponKind {
    /// Value is a decimal fraction of the subtotal (0.10 = 10% off).
    Percentage,

    /// Value is a fixed amount off in major units, capped at the subtotal.
    Flat,
}

/// A named discount rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
    code: String,
    description: String,
    kind: CouponKind,
    value: Decimal,
}

impl Coupon {
    /// Creates a percentage coupon. The value is a decimal fraction.
    #[must_use]
    pub fn percentage(code: &str, description: &str, value: Decimal) -> Self {
        Self {
            code: canonical(code),
            description: description.to_owned(),
            kind: CouponKind::Percentage,
            value,
        }
    }

    /// Creates a flat-amount coupon. The value is in major units.
    #[must_use]
    pub fn flat(code: &str, description: &str, value: Decimal) -> Self {
        Self {
            code: canonical(code),
            description: description.to_owned(),
            kind: CouponKind::Flat,
            value,
        }
    }

    /// Returns the canonical (uppercase) code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Returns the display description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns how the value is interpreted.
    #[must_use]
    pub fn kind(&self) -> CouponKind {
        self.kind
    }

    /// Returns the raw value.
    #[must_use]
    pub fn value(&self) -> Decimal {
        self.value
    }

    /// Calculates the discount this coupon grants on a subtotal, at full
    /// precision.
    ///
    /// Flat coupons are capped at the subtotal so a discount can never push
    /// the bill negative.
    #[must_use]
    pub fn discount_on(&self, subtotal: &Money<'static, Currency>) -> Money<'static, Currency> {
        match self.kind {
            CouponKind::Percentage => money::percent_of(subtotal, Percentage::from(self.value)),
            CouponKind::Flat => {
                let capped = self.value.min(*subtotal.amount());
                Money::from_decimal(capped, subtotal.currency())
            }
        }
    }

    fn validate(&self) -> Result<(), CouponConfigError> {
        if self.code.is_empty() {
            return Err(CouponConfigError::EmptyCode);
        }

        match self.kind {
            CouponKind::Percentage => {
                if self.value <= Decimal::ZERO || self.value > Decimal::ONE {
                    return Err(CouponConfigError::InvalidPercentage(
                        self.code.clone(),
                        self.value,
                    ));
                }
            }
            CouponKind::Flat => {
                if self.value <= Decimal::ZERO {
                    return Err(CouponConfigError::InvalidAmount(
                        self.code.clone(),
                        self.value,
                    ));
                }
            }
        }

        Ok(())
    }
}

/// Canonical form of a coupon code: trimmed, uppercase.
fn canonical(code: &str) -> String {
    code.trim().to_uppercase()
}

/// The storefront's coupon catalog.
#[derive(Debug, Clone)]
pub struct CouponRegistry {
    coupons: FxHashMap<String, Coupon>,
    order: Vec<String>,
}

impl CouponRegistry {
    /// Builds a registry from a list of coupons.
    ///
    /// # Errors
    ///
    /// Returns a [`CouponConfigError`] if any coupon fails validation or
    /// two coupons share a canonical code.
    pub fn with_coupons(coupons: impl IntoIterator<Item = Coupon>) -> Result<Self, CouponConfigError> {
        let mut registry = CouponRegistry {
            coupons: FxHashMap::default(),
            order: Vec::new(),
        };

        for mut coupon in coupons {
            coupon.code = canonical(&coupon.code);
            coupon.validate()?;

            if registry.coupons.contains_key(coupon.code()) {
                return Err(CouponConfigError::DuplicateCode(coupon.code().to_owned()));
            }

            registry.order.push(coupon.code().to_owned());
            registry.coupons.insert(coupon.code().to_owned(), coupon);
        }

        Ok(registry)
    }

    /// Parses a registry from YAML (a sequence of coupon mappings).
    ///
    /// # Errors
    ///
    /// Returns a [`CouponConfigError`] if the YAML is malformed or any
    /// coupon fails validation.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, CouponConfigError> {
        let coupons: Vec<Coupon> = serde_norway::from_str(yaml)?;

        Self::with_coupons(coupons)
    }

    /// Loads a registry from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns a [`CouponConfigError`] if the file cannot be read, the YAML
    /// is malformed, or any coupon fails validation.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CouponConfigError> {
        let yaml = fs::read_to_string(path)?;

        Self::from_yaml_str(&yaml)
    }

    /// Looks up a coupon by code, case-insensitively.
    #[must_use]
    pub fn find(&self, code: &str) -> Option<&Coupon> {
        self.coupons.get(&canonical(code))
    }

    /// Iterate over the coupons in registry order.
    pub fn iter(&self) -> impl Iterator<Item = &Coupon> {
        self.order.iter().filter_map(|code| self.coupons.get(code))
    }

    /// Get the number of coupons in the registry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.coupons.len()
    }

    /// Check if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.coupons.is_empty()
    }
}

impl Default for CouponRegistry {
    /// The built-in storefront coupon catalog.
    fn default() -> Self {
        let coupons = [
            Coupon::percentage("SAVE10", "Get 10% off", Decimal::new(10, 2)),
            Coupon::flat("OFF50", "Flat $50 off", Decimal::new(50, 0)),
            Coupon::flat("OFF99", "Flat $99 off", Decimal::new(99, 0)),
            Coupon::percentage("BIG20", "20% off", Decimal::new(20, 2)),
        ];

        // The built-in catalog always validates.
        Self::with_coupons(coupons).unwrap_or_else(|_| CouponRegistry {
            coupons: FxHashMap::default(),
            order: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::dec;
    use rusty_money::iso::USD;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn default_registry_has_the_four_built_in_codes() {
        let registry = CouponRegistry::default();

        assert_eq!(registry.len(), 4);

        for code in ["SAVE10", "OFF50", "OFF99", "BIG20"] {
            assert!(registry.find(code).is_some(), "missing built-in {code}");
        }
    }

    #[test]
    fn find_is_case_insensitive() {
        let registry = CouponRegistry::default();

        let coupon = registry.find("  save10 ");

        assert_eq!(coupon.map(Coupon::code), Some("SAVE10"));
    }

    #[test]
    fn find_unknown_code_returns_none() {
        let registry = CouponRegistry::default();

        assert!(registry.find("FAKE99").is_none());
    }

    #[test]
    fn percentage_discount_is_a_fraction_of_the_subtotal() {
        let coupon = Coupon::percentage("SAVE10", "Get 10% off", dec!(0.10));
        let subtotal = Money::from_decimal(dec!(100.00), USD);

        assert_eq!(
            coupon.discount_on(&subtotal),
            Money::from_decimal(dec!(10.00), USD)
        );
    }

    #[test]
    fn flat_discount_ignores_the_subtotal() {
        let coupon = Coupon::flat("OFF50", "Flat $50 off", dec!(50));
        let subtotal = Money::from_decimal(dec!(500.00), USD);

        assert_eq!(
            coupon.discount_on(&subtotal),
            Money::from_decimal(dec!(50), USD)
        );
    }

    #[test]
    fn flat_discount_is_capped_at_the_subtotal() {
        let coupon = Coupon::flat("OFF50", "Flat $50 off", dec!(50));
        let subtotal = Money::from_decimal(dec!(30.00), USD);

        assert_eq!(
            coupon.discount_on(&subtotal),
            Money::from_decimal(dec!(30.00), USD)
        );
    }

    #[test]
    fn with_coupons_rejects_duplicate_codes() {
        let result = CouponRegistry::with_coupons([
            Coupon::flat("OFF50", "Flat $50 off", dec!(50)),
            Coupon::flat("off50", "Flat $50 off, again", dec!(50)),
        ]);

        assert!(matches!(
            result,
            Err(CouponConfigError::DuplicateCode(code)) if code == "OFF50"
        ));
    }

    #[test]
    fn with_coupons_rejects_out_of_range_percentages() {
        let result =
            CouponRegistry::with_coupons([Coupon::percentage("MEGA", "110% off", dec!(1.1))]);

        assert!(matches!(
            result,
            Err(CouponConfigError::InvalidPercentage(code, _)) if code == "MEGA"
        ));
    }

    #[test]
    fn with_coupons_rejects_non_positive_flat_amounts() {
        let result = CouponRegistry::with_coupons([Coupon::flat("ZILCH", "Nothing off", dec!(0))]);

        assert!(matches!(
            result,
            Err(CouponConfigError::InvalidAmount(code, _)) if code == "ZILCH"
        ));
    }

    #[test]
    fn with_coupons_rejects_empty_codes() {
        let result = CouponRegistry::with_coupons([Coupon::flat("   ", "Mystery", dec!(5))]);

        assert!(matches!(result, Err(CouponConfigError::EmptyCode)));
    }

    #[test]
    fn from_yaml_str_parses_a_coupon_list() -> TestResult {
        let yaml = r"
- code: WELCOME5
  description: $5 off your first order
  kind: flat
  value: 5
- code: SPRING15
  description: 15% off
  kind: percentage
  value: 0.15
";

        let registry = CouponRegistry::from_yaml_str(yaml)?;

        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.find("welcome5").map(Coupon::kind),
            Some(CouponKind::Flat)
        );
        assert_eq!(
            registry.find("SPRING15").map(Coupon::value),
            Some(dec!(0.15))
        );

        Ok(())
    }

    #[test]
    fn from_yaml_str_rejects_malformed_documents() {
        let result = CouponRegistry::from_yaml_str("code: not-a-sequence");

        assert!(matches!(result, Err(CouponConfigError::Yaml(_))));
    }

    #[test]
    fn iter_preserves_registry_order() {
        let registry = CouponRegistry::default();

        let codes: Vec<&str> = registry.iter().map(Coupon::code).collect();

        assert_eq!(codes, vec!["SAVE10", "OFF50", "OFF99", "BIG20"]);
    }
}
