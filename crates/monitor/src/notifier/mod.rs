//! Notification sink abstraction.
//!
//! The [`Notifier`] trait abstracts the remote messaging endpoint, allowing
//! production code to use [`TelegramNotifier`] while tests use `MockNotifier`.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐      ┌─────────────┐
//! │ MonitorLoop  │─────▶│ BatchBuffer │
//! └──────┬───────┘      └──────┬──────┘
//!        │ probe()             │ deliver()
//!        ▼                     ▼
//!   ┌──────────────────────────────┐
//!   │        Notifier (trait)      │
//!   └──────────────────────────────┘
//!          │               │
//!          ▼               ▼
//!   ┌──────────┐     ┌──────────┐
//!   │ Telegram │     │   Mock   │
//!   └────┬─────┘     └──────────┘
//!        ▼
//!   Telegram Bot API
//! ```
//!
//! # Failure semantics
//!
//! Ordinary transport failures (timeouts, connection errors, non-2xx
//! responses) are returned as [`NotifierError`] values and never panic.
//! Callers treat any `Err` as "not delivered".

pub mod telegram;

#[cfg(test)]
pub(crate) mod mock;

pub use telegram::TelegramNotifier;

use std::future::Future;

/// Errors reported by a [`Notifier`].
#[derive(Debug, thiserror::Error)]
pub enum NotifierError {
    /// The request could not be sent or the connection failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The endpoint answered with a non-success status code.
    #[error("unexpected status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body (shortened)
        body: String,
    },

    /// The endpoint answered 2xx but reported an application-level failure.
    #[error("api error: {0}")]
    Api(String),

    /// The response body could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

/// Trait abstracting the remote notification endpoint.
///
/// The trait is `Send + Sync + 'static`, allowing the notifier to be shared
/// through an `Arc` between the monitor loop and the daemon.
///
/// # Implementations
///
/// - [`TelegramNotifier`]: Production implementation using the Telegram Bot API
/// - `MockNotifier`: Test implementation recording messages (available in tests only)
pub trait Notifier: Send + Sync + 'static {
    /// Short name of the transport, used in log fields.
    fn name(&self) -> &str;

    /// Lightweight reachability/identity check.
    ///
    /// Returns a human-readable identity of the remote end (e.g. the bot
    /// username) on success.
    fn probe(&self) -> impl Future<Output = Result<String, NotifierError>> + Send;

    /// Delivers a plain-text message.
    ///
    /// # Errors
    ///
    /// Any `Err` means the message was not delivered and may be retried.
    fn deliver(&self, message: &str) -> impl Future<Output = Result<(), NotifierError>> + Send;
}
