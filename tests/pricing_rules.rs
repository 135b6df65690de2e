//! Integration tests for the canonical storefront pricing rules.
//!
//! One shipping rule everywhere: free at a $300 subtotal and above, $20
//! below, nothing for an empty cart. Discounts come only from coupons,
//! flat coupons are capped at the subtotal, and rounding to cents happens
//! only at the presentation boundary.

use rust_decimal::dec;
use rusty_money::{Money, iso::USD};
use testresult::TestResult;

use till::{
    cart::{Cart, CartChange, LineItem},
    coupons::CouponRegistry,
    pricing::{PricingEngine, PricingError},
};

fn usd(amount: rust_decimal::Decimal) -> Money<'static, rusty_money::iso::Currency> {
    Money::from_decimal(amount, USD)
}

#[test]
fn subtotal_is_exact_over_mixed_quantities() -> TestResult {
    let mut cart = Cart::new(USD);

    cart.add(LineItem::new("1", "Mascara", usd(dec!(9.99)), 3))?;
    cart.add(LineItem::new("2", "Palette", usd(dec!(19.99)), 1))?;
    cart.add(LineItem::new("16", "Apple", usd(dec!(1.99)), 7))?;

    // 29.97 + 19.99 + 13.93
    assert_eq!(cart.subtotal()?, usd(dec!(63.89)));

    Ok(())
}

#[test]
fn quantity_never_drops_below_one_and_grows_unbounded() -> TestResult {
    let mut cart = Cart::new(USD);
    cart.add(LineItem::new("1", "Mascara", usd(dec!(9.99)), 1))?;

    assert_eq!(cart.decrease("1"), CartChange::QuantityChanged(1));

    for expected in 2..=100 {
        assert_eq!(cart.increase("1"), CartChange::QuantityChanged(expected));
    }

    Ok(())
}

#[test]
fn save10_takes_ten_percent_of_a_hundred() -> TestResult {
    let registry = CouponRegistry::default();
    let mut engine = PricingEngine::new(&registry);
    engine.apply_coupon("SAVE10")?;

    let mut cart = Cart::new(USD);
    cart.add(LineItem::new("a", "Product a", usd(dec!(100.00)), 1))?;

    let bill = engine.bill(&cart)?;

    assert_eq!(bill.discount(), &usd(dec!(10.00)));

    Ok(())
}

#[test]
fn off50_is_flat_regardless_of_subtotal_but_capped() -> TestResult {
    let registry = CouponRegistry::default();
    let mut engine = PricingEngine::new(&registry);
    engine.apply_coupon("OFF50")?;

    let mut big = Cart::new(USD);
    big.add(LineItem::new("a", "Product a", usd(dec!(900.00)), 1))?;
    assert_eq!(engine.bill(&big)?.discount(), &usd(dec!(50)));

    let mut small = Cart::new(USD);
    small.add(LineItem::new("a", "Product a", usd(dec!(30.00)), 1))?;
    assert_eq!(engine.bill(&small)?.discount(), &usd(dec!(30.00)));

    Ok(())
}

#[test]
fn unknown_code_raises_invalid_coupon_and_clears_state() -> TestResult {
    let registry = CouponRegistry::default();
    let mut engine = PricingEngine::new(&registry);
    engine.apply_coupon("SAVE10")?;

    let result = engine.apply_coupon("FAKE99");

    assert!(matches!(
        result,
        Err(PricingError::InvalidCoupon { code }) if code == "FAKE99"
    ));
    assert!(engine.applied_coupon().is_none());

    // The next bill carries no discount.
    let mut cart = Cart::new(USD);
    cart.add(LineItem::new("a", "Product a", usd(dec!(100.00)), 1))?;
    assert_eq!(engine.bill(&cart)?.discount(), &usd(dec!(0)));

    Ok(())
}

#[test]
fn shipping_boundaries_are_canonical() -> TestResult {
    let registry = CouponRegistry::default();
    let engine = PricingEngine::new(&registry);

    let empty = Cart::new(USD);
    assert_eq!(engine.bill(&empty)?.shipping(), &usd(dec!(0)));

    let mut just_below = Cart::new(USD);
    just_below.add(LineItem::new("a", "Product a", usd(dec!(299.99)), 1))?;
    assert_eq!(engine.bill(&just_below)?.shipping(), &usd(dec!(20)));

    let mut at_threshold = Cart::new(USD);
    at_threshold.add(LineItem::new("a", "Product a", usd(dec!(300.00)), 1))?;

    let bill = engine.bill(&at_threshold)?;
    assert_eq!(bill.shipping(), &usd(dec!(0)));
    assert!(bill.free_delivery(), "boundary is inclusive");

    Ok(())
}

#[test]
fn big20_end_to_end_bill() -> TestResult {
    let registry = CouponRegistry::default();
    let mut engine = PricingEngine::new(&registry);
    engine.apply_coupon("BIG20")?;

    let mut cart = Cart::new(USD);
    cart.add(LineItem::new("a", "Product a", usd(dec!(50)), 1))?;
    cart.increase("a");

    let bill = engine.bill(&cart)?;

    assert_eq!(bill.subtotal(), &usd(dec!(100.00)));
    assert_eq!(bill.discount(), &usd(dec!(20.00)));
    assert_eq!(bill.shipping(), &usd(dec!(20.00)));
    assert_eq!(bill.total(), &usd(dec!(100.00)));

    let totals = bill.totals();
    assert_eq!(totals.total, dec!(100.00));
    assert_eq!(totals.coupon.as_deref(), Some("BIG20"));

    Ok(())
}

#[test]
fn coupon_registry_loads_from_disk() -> TestResult {
    use std::io::Write as _;

    let mut file = tempfile::NamedTempFile::new()?;
    writeln!(
        file,
        "- code: disk10\n  description: 10% off\n  kind: percentage\n  value: 0.1"
    )?;

    let registry = CouponRegistry::from_path(file.path())?;

    assert_eq!(registry.len(), 1);
    assert!(registry.find("DISK10").is_some());

    Ok(())
}
