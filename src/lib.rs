//! Till
//!
//! Till is the core engine of a retail storefront: cart state, coupon and
//! discount computation, bill derivation, and checkout orchestration.
//! External services (authentication, user records, order persistence, the
//! product catalog) are collaborator traits; [`fixtures`] provides
//! in-memory implementations for tests and demos.

pub mod cart;
pub mod checkout;
pub mod coupons;
pub mod fixtures;
pub mod money;
pub mod pricing;
pub mod products;
