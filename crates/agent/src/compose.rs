//! Deterministic response composition.
//!
//! Every message containing tool-sourced numbers is rendered here from
//! the typed tool result, digit for digit. The LLM never phrases a
//! forecast or an exchange rate; its output passes through
//! `sanitize_llm_output` before reaching the user.

use once_cell::sync::Lazy;
use regex::Regex;

use travel_agent_core::ToolError;
use travel_agent_tools::{CurrencyConversion, WeatherForecast};

use crate::policy::Question;

/// Text for a clarifying question
pub fn clarification(question: Question) -> &'static str {
    match question {
        Question::Destination => "Where would you like to go?",
        Question::Duration => "How many days are you planning to stay?",
        Question::Interests => {
            "Any interests I should plan around - food, museums, nature? Say \"skip\" if not."
        }
        Question::CurrencyPair => {
            "Which currencies would you like to convert between? For example, USD to EUR."
        }
        Question::CurrencyAmount => "What amount would you like to convert?",
        Question::Generic => {
            "I can plan trips, check the weather forecast, or convert currencies. What would you like to do?"
        }
    }
}

/// Render a forecast with its date, timezone, and a non-live disclaimer.
///
/// The numbers come from the tool result verbatim.
pub fn weather_response(forecast: &WeatherForecast) -> String {
    format!(
        "Here's the forecast for {location} on {date} ({timezone} time): \
         a low of {low}\u{b0}C, a high of {high}\u{b0}C, and {precip} mm of precipitation expected. \
         Note this is a forecast, not a live reading.",
        location = forecast.location,
        date = forecast.date,
        timezone = forecast.timezone,
        low = forecast.low_c,
        high = forecast.high_c,
        precip = forecast.precipitation_mm,
    )
}

/// Render a conversion result, quoting the rate date the API returned
pub fn currency_response(conversion: &CurrencyConversion) -> String {
    format!(
        "Based on data from {date}, {amount} {base} converts to {converted:.2} {quote} at a rate of {rate}.",
        date = conversion.rate_date,
        amount = fmt_amount(conversion.amount),
        base = conversion.base,
        converted = conversion.converted,
        quote = conversion.quote,
        rate = conversion.rate,
    )
}

/// User-facing message for a failed forecast lookup. Never numbers.
pub fn weather_failure(error: &ToolError, location: &str) -> String {
    match error {
        ToolError::NotFound(_) => format!(
            "I couldn't find a place called \"{location}\". Could you check the spelling or try a nearby city?"
        ),
        ToolError::Timeout | ToolError::Upstream(_) => format!(
            "The weather service isn't responding right now, so I can't give you a reliable forecast for {location}. Please try again in a moment."
        ),
        _ => format!("I wasn't able to look up the forecast for {location}."),
    }
}

/// User-facing message for a failed conversion. Never numbers.
pub fn currency_failure(error: &ToolError) -> String {
    match error {
        ToolError::UnsupportedCurrency(code) => format!(
            "I don't have rates for \"{code}\". Could you give me a standard currency code, like USD or EUR?"
        ),
        ToolError::Timeout | ToolError::Upstream(_) => {
            "The exchange-rate service is unavailable right now, so I can't quote a rate. Please try again shortly.".to_string()
        }
        ToolError::InvalidArguments(_) => {
            "That conversion doesn't look right - I need a positive amount and two different currencies.".to_string()
        }
        _ => "I wasn't able to complete that conversion.".to_string(),
    }
}

/// Message when the LLM itself fails
pub fn generation_failure() -> &'static str {
    "I'm having trouble putting that together right now. Please try again in a moment."
}

static CODE_FENCE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```.*?```").unwrap());

static REALTIME_CLAIM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(i(?:'ve)? just checked|according to (?:live|real-time) data|based on (?:live|real-time) data|the latest live data shows?|checking (?:the data |live data )?(?:right )?now)\b",
    )
    .unwrap()
});

static PREAMBLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(okay|ok|sure|alright|certainly|got it)\b[,.! ]|^(i will|i'll go ahead|my plan is|here's what i'll do)\b")
        .unwrap()
});

/// Scrub model output before it reaches the user: drop code fences and
/// assistant preamble, and rewrite claims of having live data.
pub fn sanitize_llm_output(raw: &str) -> String {
    let without_fences = CODE_FENCE_RE.replace_all(raw, "");

    let body: Vec<&str> = without_fences
        .lines()
        .skip_while(|line| {
            let trimmed = line.trim();
            trimmed.is_empty() || PREAMBLE_RE.is_match(trimmed)
        })
        .collect();
    let body = body.join("\n");

    REALTIME_CLAIM_RE
        .replace_all(&body, "based on general information")
        .trim()
        .to_string()
}

fn fmt_amount(amount: f64) -> String {
    if amount.fract() == 0.0 && amount.abs() < 1e15 {
        format!("{}", amount as i64)
    } else {
        format!("{amount}")
    }
}
