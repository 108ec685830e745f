//! Single-custodian trust fund ledger.
//!
//! One trustor funds a shared pool and designates named beneficiaries,
//! each gated by an age threshold. A delegated trustee binds every
//! eligible beneficiary to a withdrawal address; each beneficiary then
//! withdraws an equal, floor-rounded share of the remaining pool exactly
//! once. Later withdrawers absorb earlier rounding remainders, so the
//! pool always drains to zero.
//!
//! The ledger is a plain value: no globals, no locks, no ambient caller
//! context. Callers are opaque pre-authenticated identities passed
//! explicitly; state-changing operations append [`ledger::TrustEvent`]
//! records for the host to forward.

pub mod ledger;
pub mod snapshot;

pub use ledger::{Age, Amount, Beneficiary, Identity, TrustError, TrustEvent, TrustLedger};
pub use snapshot::TrustSnapshot;
