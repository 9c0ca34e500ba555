//! Telegram Bot API alert dispatcher.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{
    AlertDispatcher, DispatchError, DispatchReport, HttpClient, HttpError, HttpRequest,
    HttpResponse,
};

/// Sends alerts through the Telegram Bot API `sendMessage` method.
///
/// One request is made per recipient chat, sequentially. A failed chat is
/// logged and skipped; remaining chats are still attempted. Nothing is
/// retried.
///
/// # Example
///
/// ```
/// use reachwatch::alert::{ReqwestClient, TelegramDispatcher};
///
/// let dispatcher = TelegramDispatcher::new(ReqwestClient::new(), "123456:ABC-DEF");
/// assert_eq!(dispatcher.api_base().as_str(), "https://api.telegram.org/");
/// ```
pub struct TelegramDispatcher<H> {
    client: H,
    token: String,
    api_base: url::Url,
    dry_run: bool,
}

/// `sendMessage` request body.
#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

/// Error body returned by the Bot API.
#[derive(Deserialize)]
struct ApiFailure {
    description: Option<String>,
}

impl<H> TelegramDispatcher<H> {
    /// Public Bot API endpoint.
    pub const DEFAULT_API_BASE: &'static str = "https://api.telegram.org";

    /// Creates a dispatcher for the public Bot API.
    ///
    /// # Panics
    ///
    /// Panics only if [`Self::DEFAULT_API_BASE`] stops being a valid URL.
    #[must_use]
    pub fn new(client: H, token: impl Into<String>) -> Self {
        Self {
            client,
            token: token.into(),
            api_base: url::Url::parse(Self::DEFAULT_API_BASE)
                .expect("default API base is a valid URL"),
            dry_run: false,
        }
    }

    /// Points the dispatcher at another Bot API server.
    #[must_use]
    pub fn with_api_base(mut self, api_base: url::Url) -> Self {
        self.api_base = api_base;
        self
    }

    /// Enables dry-run mode: messages are logged instead of sent.
    #[must_use]
    pub const fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Returns the Bot API base URL.
    #[must_use]
    pub const fn api_base(&self) -> &url::Url {
        &self.api_base
    }

    /// Returns true if messages are only logged.
    #[must_use]
    pub const fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Returns the underlying HTTP client.
    #[must_use]
    pub const fn client(&self) -> &H {
        &self.client
    }

    /// Builds `{api_base}/bot{token}/sendMessage`.
    fn send_message_url(&self) -> Result<url::Url, HttpError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|()| HttpError::InvalidUrl("API base cannot have a path".to_string()))?
            .pop_if_empty()
            .push(&format!("bot{}", self.token))
            .push("sendMessage");
        Ok(url)
    }
}

impl<H> fmt::Debug for TelegramDispatcher<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramDispatcher")
            .field("token", &"<redacted>")
            .field("api_base", &self.api_base.as_str())
            .field("dry_run", &self.dry_run)
            .finish_non_exhaustive()
    }
}

impl<H: HttpClient> TelegramDispatcher<H> {
    async fn send_to(&self, chat_id: &str, text: &str) -> Result<(), DispatchError> {
        let request =
            HttpRequest::post(self.send_message_url()?).with_json(&SendMessage { chat_id, text })?;

        let response = self.client.request(request).await?;
        if response.is_success() {
            return Ok(());
        }

        Err(DispatchError::Rejected {
            status: response.status,
            description: failure_description(&response),
        })
    }
}

/// Extracts the Bot API `description`, falling back to the raw body.
fn failure_description(response: &HttpResponse) -> Option<String> {
    serde_json::from_slice::<ApiFailure>(&response.body)
        .ok()
        .and_then(|failure| failure.description)
        .or_else(|| {
            response
                .body_text()
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .map(ToString::to_string)
        })
}

impl<H: HttpClient> AlertDispatcher for TelegramDispatcher<H> {
    async fn dispatch(&self, message: &str, recipients: &[String]) -> DispatchReport {
        let mut report = DispatchReport::new();

        if self.dry_run {
            tracing::info!(
                "Dry-run: alert for {} recipient(s) not sent:\n{message}",
                recipients.len()
            );
            return report;
        }

        for chat_id in recipients {
            let result = self.send_to(chat_id, message).await;
            match &result {
                Ok(()) => tracing::debug!("Alert delivered to chat {chat_id}"),
                Err(e) => tracing::error!("Failed to deliver alert to chat {chat_id}: {e}"),
            }
            report.record(chat_id.as_str(), result);
        }

        report
    }
}
