//! Groups parsed BIDS file records into per-subject/session channel tuples.
//!
//! Files are bucketed by the configured `loop_over` entities, each bucket is
//! accumulated into a [`channel::ChannelData`], and rendered into a
//! `[groupingKey, record]` tuple.

pub mod analysis;
pub mod app;
pub mod channel;
pub mod config;
pub mod domain;
pub mod entity;
pub mod error;
pub mod fs_util;
pub mod grouping;
pub mod output;
pub mod suffix;
