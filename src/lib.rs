//! Terminal back-office for a storefront REST API.
//!
//! The sync engine lives in [`cache`], [`list`] and [`orders`]: list views
//! share cached pages keyed by their query, revalidate stale pages in the
//! background and drop responses for queries the user has already left.

pub mod api;
pub mod app;
pub mod cache;
pub mod commands;
pub mod config;
pub mod debounce;
pub mod event;
pub mod list;
pub mod logging;
pub mod orders;
pub mod query;
pub mod retry;
pub mod session;
pub mod ui;
