//! Recurring application charge model.

use crate::error::{MockError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Client id reported on every charge.
pub const API_CLIENT_ID: &str = "123456";

/// Charge status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChargeStatus {
    #[default]
    Pending,
    Active,
    Declined,
}

impl ChargeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Declined => "declined",
        }
    }

    /// Whether the merchant already answered the confirmation page.
    #[must_use]
    pub fn is_confirmed(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for ChargeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a new subscription replaces an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReplacementBehavior {
    Standard,
    ApplyOnNextBillingCycle,
    ApplyImmediately,
}

/// A recurring application charge as the platform's REST API returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringCharge {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub currency: String,
    pub status: ChargeStatus,
    pub capped_amount: String,
    pub confirmation_url: String,
    pub return_url: String,
    pub decorated_return_url: String,
    pub terms: String,
    pub trial_days: u32,
    pub trial_ends_on: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub activated_on: Option<DateTime<Utc>>,
    pub billing_on: Option<DateTime<Utc>>,
    pub cancelled_on: Option<DateTime<Utc>>,
    pub test: Option<bool>,
    pub api_client_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacement_behavior: Option<ReplacementBehavior>,
}

/// Persisted form of a charge: the charge plus its owning store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCharge {
    #[serde(flatten)]
    pub charge: RecurringCharge,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<String>,
}

impl StoredCharge {
    /// Whether the charge is visible from `scope` (`None` sees everything).
    pub fn visible_to(&self, scope: Option<&str>) -> bool {
        match scope {
            None => true,
            Some(store) => self.store.as_deref() == Some(store),
        }
    }
}

/// Input for creating a charge, as accepted by the REST API.
///
/// Server-computed fields sent by clients are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NewCharge {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_decimal")]
    pub price: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub return_url: String,
    #[serde(default)]
    pub trial_days: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub capped_amount: Option<String>,
    #[serde(default)]
    pub terms: Option<String>,
    #[serde(default)]
    pub test: Option<bool>,
    #[serde(default)]
    pub replacement_behavior: Option<ReplacementBehavior>,
}

impl NewCharge {
    /// Check required fields, returning the price on success.
    pub fn validate(&self) -> Result<f64> {
        if self.name.trim().is_empty() {
            return Err(MockError::invalid_field("name", "can't be blank"));
        }
        if self.return_url.trim().is_empty() {
            return Err(MockError::invalid_field("return_url", "can't be blank"));
        }
        let price = self
            .price
            .ok_or_else(|| MockError::invalid_field("price", "can't be blank"))?;
        if !price.is_finite() || price < 0.0 {
            return Err(MockError::invalid_field("price", "must be a non-negative number"));
        }
        if let Some(currency) = &self.currency {
            if currency.trim().is_empty() {
                return Err(MockError::invalid_field("currency", "can't be blank"));
            }
        }
        Ok(price)
    }
}

/// What the merchant did on the confirmation page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmAction {
    Accept,
    Decline,
    /// No decision yet, just show the page.
    View,
}

impl ConfirmAction {
    /// Parse the `action` query parameter; anything unknown means `View`.
    pub fn from_param(action: Option<&str>) -> Self {
        match action {
            Some("accept") => Self::Accept,
            Some("decline") => Self::Decline,
            _ => Self::View,
        }
    }
}

/// Outcome of a confirmation request.
#[derive(Debug, Clone, PartialEq)]
pub enum Confirmation {
    /// The charge moved to `active` or `declined`.
    Decided(RecurringCharge),
    /// Nothing changed; render the confirmation page.
    Pending(RecurringCharge),
}

impl Confirmation {
    pub fn charge(&self) -> &RecurringCharge {
        match self {
            Self::Decided(charge) | Self::Pending(charge) => charge,
        }
    }
}

/// Scheme and host the caller reached the service on.
///
/// Confirmation links are built from it so they point back at this mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    scheme: String,
    host: String,
}

impl Origin {
    pub fn new(scheme: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
        }
    }

    /// Parse a base URL such as `http://localhost:8080`.
    ///
    /// A URL without a scheme is treated as plain http.
    pub fn from_base_url(url: &str) -> Self {
        let url = url.trim_end_matches('/');
        match url.split_once("://") {
            Some((scheme, host)) => Self::new(scheme, host),
            None => Self::new("http", url),
        }
    }

    pub fn base_url(&self) -> String {
        format!("{}://{}", self.scheme, self.host)
    }

    pub fn confirmation_url(&self, id: i64) -> String {
        format!("{}/confirm/{}", self.base_url(), id)
    }
}

/// Append `charge_id={id}` to a return URL.
pub fn decorate_return_url(return_url: &str, id: i64) -> String {
    let separator = if return_url.contains('?') { '&' } else { '?' };
    format!("{}{}charge_id={}", return_url, separator, id)
}

/// Accept a decimal as a JSON number or a numeric string.
pub fn deserialize_decimal<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Number(n)) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| D::Error::custom("price must be numeric")),
        Some(serde_json::Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| D::Error::custom("price must be numeric")),
        Some(_) => Err(D::Error::custom("price must be numeric")),
    }
}

/// Accept a money amount as a string or a number, normalized to a string.
pub fn deserialize_amount<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(D::Error::custom("capped_amount must be a string or number")),
    }
}

/// Format a price the way the platform prints money amounts.
pub fn format_amount(amount: f64) -> String {
    format!("{:.2}", amount)
}
