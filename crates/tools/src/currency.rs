//! Currency adapter backed by the Frankfurter exchange-rate API.
//!
//! The API quotes reference rates for the most recent market day; the date
//! it actually quoted is surfaced in the result and must reach the user
//! unchanged, even when it is a fallback date for a closed market.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;

use travel_agent_core::{Tool, ToolError, ToolInput, ToolOutput};
use travel_agent_config::ToolSettings;

/// A completed conversion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencyConversion {
    /// Source currency code
    pub base: String,
    /// Target currency code
    pub quote: String,
    /// Exchange rate actually quoted
    pub rate: f64,
    /// Amount requested
    pub amount: f64,
    /// amount * rate
    pub converted: f64,
    /// Date the rate was quoted for
    pub rate_date: NaiveDate,
}

#[derive(Deserialize)]
struct LatestRatesResponse {
    base: String,
    date: NaiveDate,
    rates: HashMap<String, f64>,
}

/// Frankfurter exchange-rate adapter
pub struct CurrencyTool {
    client: reqwest::Client,
    base_url: String,
    timeout_secs: u64,
}

impl CurrencyTool {
    pub fn new(settings: &ToolSettings) -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| ToolError::Upstream(e.to_string()))?;

        Ok(Self {
            client,
            base_url: settings.currency_endpoint.clone(),
            timeout_secs: settings.timeout_secs,
        })
    }

    /// Convert `amount` from one currency to another at the latest rate
    pub async fn convert(
        &self,
        amount: f64,
        from: &str,
        to: &str,
    ) -> Result<CurrencyConversion, ToolError> {
        if amount <= 0.0 {
            return Err(ToolError::InvalidArguments(
                "amount must be positive".to_string(),
            ));
        }

        let from = normalize_code(from)?;
        let to = normalize_code(to)?;
        if from == to {
            return Err(ToolError::InvalidArguments(
                "source and target currency are the same".to_string(),
            ));
        }

        let response = self
            .client
            .get(format!("{}/latest", self.base_url))
            .query(&[("base", from.as_str()), ("symbols", to.as_str())])
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND || status == reqwest::StatusCode::UNPROCESSABLE_ENTITY {
            // Frankfurter rejects unknown base currencies
            return Err(ToolError::UnsupportedCurrency(from));
        }
        if !status.is_success() {
            return Err(ToolError::Upstream(format!(
                "rate request failed: {status}"
            )));
        }

        let payload: LatestRatesResponse = response
            .json()
            .await
            .map_err(|e| ToolError::Upstream(format!("bad rate payload: {e}")))?;

        let rate = payload
            .rates
            .get(&to)
            .copied()
            .ok_or_else(|| ToolError::UnsupportedCurrency(to.clone()))?;

        tracing::debug!(base = %from, quote = %to, rate, date = %payload.date, "fetched exchange rate");

        Ok(CurrencyConversion {
            base: payload.base,
            quote: to,
            rate,
            amount,
            converted: amount * rate,
            rate_date: payload.date,
        })
    }
}

fn normalize_code(code: &str) -> Result<String, ToolError> {
    let code = code.trim().to_uppercase();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ToolError::UnsupportedCurrency(code));
    }
    Ok(code)
}

fn map_request_error(err: reqwest::Error) -> ToolError {
    if err.is_timeout() {
        ToolError::Timeout
    } else {
        ToolError::Upstream(err.to_string())
    }
}

#[async_trait]
impl Tool for CurrencyTool {
    fn name(&self) -> &str {
        "currency"
    }

    fn description(&self) -> &str {
        "Convert an amount between currencies at the latest reference rate"
    }

    fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    async fn execute(&self, input: ToolInput) -> Result<ToolOutput, ToolError> {
        let amount = input.f64_arg("amount")?;
        let from = input.str_arg("from")?;
        let to = input.str_arg("to")?;

        let conversion = self.convert(amount, from, to).await?;
        Ok(ToolOutput::new(json!(conversion)))
    }
}
