//! Participation Ledger
//!
//! Events and the participant entries they own. Per event, a member has at
//! most one entry; entries keep enrollment order; an absent entry always
//! carries 0 points.

pub mod service;

pub use service::LedgerService;
