//! Recurring application charges
//!
//! The lifecycle engine ([`ChargeService`]) and the [`ExpirySweeper`] that
//! evicts old charges. HTTP surfaces live in [`crate::rest`] and
//! [`crate::graphql`].

mod config;
mod service;
mod sweeper;
mod types;

pub use config::{ChargesConfig, MAX_SWEEPER_SECONDS, ReconfirmPolicy, SweeperConfig};
pub use service::{ChargeKeys, ChargeService, SweepReport};
pub use sweeper::{ExpirySweeper, SweeperHandle};
pub use types::{
    API_CLIENT_ID, ChargeStatus, ConfirmAction, Confirmation, NewCharge, Origin, RecurringCharge,
    ReplacementBehavior, StoredCharge, decorate_return_url, format_amount,
};
