//! Earnings tracking and disclosures
//!
//! Each participant owns an append-only ledger of payouts. At configured
//! checkpoints the participant is told how they are doing, in a configured
//! style, and the message is kept in their disclosure history.

pub mod disclosure;
pub mod ledger;

pub use disclosure::{DisclosureCheckpoint, DisclosureConfig, DisclosureRecord, DisclosureStyle};
pub use ledger::{EarningsLedgerEntry, EarningsTrackingService, RoundType};
