//! Rendering of confirmed transitions into alert text.

use chrono::{DateTime, FixedOffset, Utc};
use handlebars::Handlebars;
use serde::Serialize;

use super::AlertTemplateError;
use crate::target::{Reachability, Target};

/// Template used when none is configured.
pub const DEFAULT_TEMPLATE: &str =
    "{{name}}: [ {{address}} ]\nDate: [ {{time}} ]\nObject: [ {{group}} ]\nStatus: {{status}}";

/// Timestamp layout used for the `time` template variable.
const TIME_FORMAT: &str = "%d.%m.%Y %H:%M:%S";

const TEMPLATE_NAME: &str = "alert";

/// Human-readable status line for a confirmed status.
#[must_use]
pub const fn status_text(status: Reachability) -> &'static str {
    match status {
        Reachability::Reachable => "connection restored! ✅",
        Reachability::Unreachable => "connection lost! ⛔",
    }
}

/// Parses a fixed UTC offset written as `+HH:MM` or `-HH:MM`.
///
/// # Errors
///
/// Returns a description of the problem if `input` is not a valid offset.
///
/// # Example
///
/// ```
/// use reachwatch::alert::parse_utc_offset;
///
/// let offset = parse_utc_offset("+02:00").unwrap();
/// assert_eq!(offset.local_minus_utc(), 7200);
/// assert!(parse_utc_offset("2h").is_err());
/// ```
pub fn parse_utc_offset(input: &str) -> Result<FixedOffset, String> {
    let input = input.trim();
    let (sign, rest) = match input.as_bytes().first() {
        Some(b'+') => (1, &input[1..]),
        Some(b'-') => (-1, &input[1..]),
        _ => return Err(format!("'{input}' must start with '+' or '-'")),
    };

    let Some((hours, minutes)) = rest.split_once(':') else {
        return Err(format!("'{input}' must have the form +HH:MM"));
    };
    let parse_part = |part: &str| -> Result<i32, String> {
        if part.len() != 2 || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format!("'{input}' must have the form +HH:MM"));
        }
        part.parse::<i32>().map_err(|e| e.to_string())
    };
    let hours = parse_part(hours)?;
    let minutes = parse_part(minutes)?;
    if hours > 23 || minutes > 59 {
        return Err(format!("'{input}' is out of range"));
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
        .ok_or_else(|| format!("'{input}' is out of range"))
}

/// A confirmed transition of one target, ready to be rendered.
#[derive(Debug, Clone, Copy)]
pub struct Alert<'a> {
    /// The target whose status changed.
    pub target: &'a Target,
    /// The newly confirmed status.
    pub status: Reachability,
    /// When the transition was confirmed.
    pub at: DateTime<Utc>,
}

/// Variables exposed to templates.
#[derive(Serialize)]
struct TemplateData<'a> {
    name: &'a str,
    address: &'a str,
    group: &'a str,
    time: String,
    status: &'static str,
    reachable: bool,
}

/// Renders [`Alert`]s with a handlebars template.
///
/// The template is compiled once and checked against a sample alert at
/// construction, in strict mode, so an unknown variable is reported at
/// startup rather than when the first alert fires. Output is not
/// HTML-escaped.
pub struct AlertFormatter {
    registry: Handlebars<'static>,
    offset: FixedOffset,
}

impl std::fmt::Debug for AlertFormatter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertFormatter")
            .field("offset", &self.offset)
            .finish_non_exhaustive()
    }
}

impl AlertFormatter {
    /// Compiles `template`, rendering timestamps in `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if the template does not parse, or references
    /// variables that do not exist.
    pub fn new(template: &str, offset: FixedOffset) -> Result<Self, AlertTemplateError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry.register_escape_fn(handlebars::no_escape);
        registry
            .register_template_string(TEMPLATE_NAME, template)
            .map_err(|e| AlertTemplateError::Syntax(e.to_string()))?;

        let formatter = Self { registry, offset };

        let sample = Target::new("192.0.2.1", "sample");
        formatter
            .try_render(&Alert {
                target: &sample,
                status: Reachability::Unreachable,
                at: DateTime::<Utc>::default(),
            })
            .map_err(AlertTemplateError::Render)?;

        Ok(formatter)
    }

    /// Creates a formatter with [`DEFAULT_TEMPLATE`].
    ///
    /// # Errors
    ///
    /// Never fails in practice; the error type is shared with [`Self::new`].
    pub fn with_default_template(offset: FixedOffset) -> Result<Self, AlertTemplateError> {
        Self::new(DEFAULT_TEMPLATE, offset)
    }

    /// Returns the offset timestamps are shown in.
    #[must_use]
    pub const fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Renders `alert`.
    ///
    /// A render failure is logged and replaced by a plain rendering of the
    /// default layout, so a confirmed transition is always announced.
    #[must_use]
    pub fn render(&self, alert: &Alert<'_>) -> String {
        self.try_render(alert).unwrap_or_else(|e| {
            tracing::error!("Alert template failed to render, using default layout: {e}");
            let data = self.template_data(alert);
            format!(
                "{}: [ {} ]\nDate: [ {} ]\nObject: [ {} ]\nStatus: {}",
                data.name, data.address, data.time, data.group, data.status
            )
        })
    }

    fn try_render(&self, alert: &Alert<'_>) -> Result<String, String> {
        self.registry
            .render(TEMPLATE_NAME, &self.template_data(alert))
            .map_err(|e| e.to_string())
    }

    fn template_data<'a>(&self, alert: &Alert<'a>) -> TemplateData<'a> {
        TemplateData {
            name: alert.target.display_name(),
            address: alert.target.address(),
            group: alert.target.group(),
            time: alert
                .at
                .with_timezone(&self.offset)
                .format(TIME_FORMAT)
                .to_string(),
            status: status_text(alert.status),
            reachable: alert.status.is_reachable(),
        }
    }
}
