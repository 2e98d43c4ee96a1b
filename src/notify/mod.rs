//! Notifications for new filings: formatting and channel dispatch

pub mod format;

mod dispatch;

pub use dispatch::Notifier;
