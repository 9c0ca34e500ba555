//! Alert layer: message formatting and delivery to recipients.
//!
//! This module provides types and traits for:
//! - Rendering confirmed transitions into text ([`Alert`], [`AlertFormatter`])
//! - Delivering a message to every recipient ([`AlertDispatcher`], [`DispatchReport`])
//! - Telegram Bot API delivery ([`TelegramDispatcher`])
//! - Abstracting HTTP clients ([`HttpClient`], [`ReqwestClient`])

mod client;
mod dispatcher;
mod error;
mod format;
mod http;
mod telegram;

#[cfg(test)]
mod client_tests;

pub use client::ReqwestClient;
pub use dispatcher::{AlertDispatcher, DispatchReport, RecipientOutcome};
pub use error::{AlertTemplateError, DispatchError, HttpError};
pub use format::{Alert, AlertFormatter, DEFAULT_TEMPLATE, parse_utc_offset, status_text};
pub use http::{HttpClient, HttpRequest, HttpResponse};
pub use telegram::TelegramDispatcher;
