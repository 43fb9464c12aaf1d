//! Media-group aware relay engine.
//!
//! Channel posts that belong to one media group arrive as separate updates.
//! The [`Aggregator`] buffers them per [`GroupKey`] for a fixed grace period,
//! then hands the ordered batch to the [`Forwarder`], which fans it out to
//! every destination with per-destination failure isolation. Posts without a
//! group are forwarded immediately.
//!
//! A straggler that arrives after its group's grace period has elapsed opens
//! a new group and is relayed as a separate, partial batch.

pub mod aggregator;
pub mod buffer;
pub mod forwarder;
pub mod key;
pub mod settings;

pub use {
    aggregator::{Aggregator, Disposition, IgnoreReason},
    buffer::{Appended, CompletedGroup, GroupBuffer, Take},
    forwarder::{DeliveryReport, Forwarder},
    key::GroupKey,
    settings::{DEFAULT_GRACE_PERIOD, RelaySettings},
};
