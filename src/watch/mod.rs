// src/watch/mod.rs

//! Waiting for elements to appear.
//!
//! This module turns subtree-mutation notifications from a [`Document`]
//! into a single awaited result:
//! - an immediate lookup with no subscription when the element is already
//!   present,
//! - otherwise one mutation observer that re-runs the lookup per batch and
//!   is disconnected before the result is handed back.
//!
//! There is no timeout; wrap the future in
//! `tokio::time::timeout` if a bound is needed.
//!
//! [`Document`]: crate::dom::Document

pub mod element;

pub use element::{wait_for_element, ElementWatcher, WatchRequest, WatchState};
