//! # Price Source
//!
//! The external lookup that turns a vendor link into a current price.
//!
//! ## Lookup Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Price Lookup Exchange                            │
//! │                                                                         │
//! │  GET <endpoint>?url=<encoded vendor link>                              │
//! │  User-Agent: <configured>                                              │
//! │                                                                         │
//! │  2xx  { "price": 12345.5 }   → 12345.50  (÷ 100 with minor_units)      │
//! │  2xx  { "price": "n/a" }     → InvalidPrice                            │
//! │  2xx  { "error": "..." }     → Service("...")                          │
//! │  4xx/5xx { "error": "..." }  → Service("...")                          │
//! │  4xx/5xx <anything else>     → Service("HTTP <status>")                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use atelier_core::lenient::decimal_from_value;
use atelier_core::money::round_money;
use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::debug;

use crate::config::LookupSettings;
use crate::error::{PricingError, PricingResult};

// =============================================================================
// Price Source Trait
// =============================================================================

/// Anything that can price a vendor link.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Current price for the product behind `link`, in currency units.
    async fn fetch_price(&self, link: &str) -> PricingResult<Decimal>;
}

// =============================================================================
// HTTP Price Source
// =============================================================================

/// Price source backed by the HTTP lookup service.
#[derive(Debug, Clone)]
pub struct HttpPriceSource {
    client: Client,
    endpoint: url::Url,
    timeout_secs: u64,
    minor_units: bool,
}

impl HttpPriceSource {
    /// Builds a client from the lookup settings. Fails when no endpoint is
    /// configured.
    pub fn new(settings: &LookupSettings) -> PricingResult<Self> {
        let endpoint = settings
            .endpoint
            .as_deref()
            .ok_or(PricingError::MissingEndpoint)?;
        let endpoint = url::Url::parse(endpoint)?;

        let client = Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(std::time::Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| PricingError::InvalidConfig(format!("Failed to build HTTP client: {e}")))?;

        Ok(HttpPriceSource {
            client,
            endpoint,
            timeout_secs: settings.timeout_secs,
            minor_units: settings.minor_units,
        })
    }

    /// The lookup URL for one vendor link.
    pub fn lookup_url(&self, link: &str) -> url::Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("url", link);
        url
    }

    fn request_error(&self, err: reqwest::Error) -> PricingError {
        if err.is_timeout() {
            PricingError::Timeout(self.timeout_secs)
        } else {
            PricingError::from(err)
        }
    }
}

#[async_trait]
impl PriceSource for HttpPriceSource {
    async fn fetch_price(&self, link: &str) -> PricingResult<Decimal> {
        let url = self.lookup_url(link);
        debug!(%link, "Looking up price");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.request_error(e))?;

        parse_lookup_response(status.is_success(), status.as_u16(), &body, self.minor_units)
    }
}

// =============================================================================
// Response Parsing
// =============================================================================

/// Interprets a lookup response body.
pub fn parse_lookup_response(
    success: bool,
    status: u16,
    body: &str,
    minor_units: bool,
) -> PricingResult<Decimal> {
    let json: Option<Value> = serde_json::from_str(body).ok();
    let service_message = json
        .as_ref()
        .and_then(|v| v.get("error"))
        .and_then(Value::as_str)
        .map(str::to_string);

    if !success {
        return Err(PricingError::Service(
            service_message.unwrap_or_else(|| format!("HTTP {status}")),
        ));
    }
    if let Some(message) = service_message {
        return Err(PricingError::Service(message));
    }

    let price = json
        .as_ref()
        .and_then(|v| v.get("price"))
        .ok_or_else(|| PricingError::InvalidPrice("response has no price".into()))?;

    // Only JSON numbers count; a string is treated as a missing marker.
    let amount = match price {
        Value::Number(_) => decimal_from_value(price),
        _ => None,
    }
    .filter(|amount| *amount >= Decimal::ZERO)
    .ok_or_else(|| PricingError::InvalidPrice(price.to_string()))?;

    let amount = if minor_units {
        amount / Decimal::ONE_HUNDRED
    } else {
        amount
    };
    Ok(round_money(amount))
}
