//! Billing Core
//!
//! Three cooperating pieces over the relational store:
//!
//! - [`reconciler`] - accepts a meter value for (room, cycle, utility),
//!   carries the start reading forward from the last recorded period, and
//!   upserts the reading row.
//! - [`engine`] - the monthly batch: resolves the cycle, issues one draft
//!   bill per active contract (exactly once per tenant+cycle), and freezes
//!   the period's meter photos by linking them to the new bills.
//! - [`breakdown`] - live usage/amount computation shared by the engine and
//!   the bill-detail read path; stored bill amounts are only a cache.
//!
//! All monetary arithmetic goes through [`money`] (rust_decimal internally,
//! f64 at the storage boundary).

pub mod breakdown;
pub mod engine;
pub mod money;
pub mod reconciler;

#[cfg(test)]
pub(crate) mod fixtures;
