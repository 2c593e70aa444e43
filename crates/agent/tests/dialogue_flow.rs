//! End-to-end dialogue tests with mock tools and a canned LLM.
//!
//! These walk whole conversations through the engine and assert the
//! grounding guarantees: tool numbers reach the user verbatim, slot
//! questions survive interstitial messages, and no failure path ever
//! produces invented figures.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use travel_agent_agent::TravelAgent;
use travel_agent_core::{Tool, ToolError, ToolInput, ToolOutput};
use travel_agent_llm::MockBackend;
use travel_agent_tools::ToolRegistry;

/// Currency tool quoting a fixed rate, recording every call
struct FixedRateTool {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Tool for FixedRateTool {
    fn name(&self) -> &str {
        "currency"
    }

    fn description(&self) -> &str {
        "Fixed-rate conversion for tests"
    }

    async fn execute(&self, input: ToolInput) -> Result<ToolOutput, ToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let amount = input.f64_arg("amount")?;
        let from = input.str_arg("from")?;
        let to = input.str_arg("to")?;

        Ok(ToolOutput::new(json!({
            "base": from,
            "quote": to,
            "rate": 0.85056,
            "amount": amount,
            "converted": amount * 0.85056,
            "rate_date": "2025-12-30",
        })))
    }
}

/// Weather tool returning a fixed forecast, recording every call
struct FixedForecastTool {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Tool for FixedForecastTool {
    fn name(&self) -> &str {
        "weather"
    }

    fn description(&self) -> &str {
        "Fixed forecast for tests"
    }

    async fn execute(&self, input: ToolInput) -> Result<ToolOutput, ToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let location = input.str_arg("location")?;
        let date = input.str_arg("date")?;

        Ok(ToolOutput::new(json!({
            "location": location,
            "timezone": "Europe/Paris",
            "date": date,
            "low_c": 2.1,
            "high_c": 7.4,
            "precipitation_mm": 0.3,
        })))
    }
}

/// Tool whose every call fails upstream
struct BrokenTool {
    name: &'static str,
}

#[async_trait]
impl Tool for BrokenTool {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "Always fails"
    }

    async fn execute(&self, _input: ToolInput) -> Result<ToolOutput, ToolError> {
        Err(ToolError::Upstream("connection refused".to_string()))
    }
}

struct Harness {
    agent: TravelAgent,
    currency_calls: Arc<AtomicUsize>,
    weather_calls: Arc<AtomicUsize>,
}

fn harness(llm: MockBackend) -> Harness {
    let currency_calls = Arc::new(AtomicUsize::new(0));
    let weather_calls = Arc::new(AtomicUsize::new(0));

    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(FixedRateTool {
        calls: currency_calls.clone(),
    }));
    registry.register(Arc::new(FixedForecastTool {
        calls: weather_calls.clone(),
    }));

    Harness {
        agent: TravelAgent::new(Arc::new(llm), Arc::new(registry), 12),
        currency_calls,
        weather_calls,
    }
}

fn broken_tools_harness(llm: MockBackend) -> TravelAgent {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(BrokenTool { name: "currency" }));
    registry.register(Arc::new(BrokenTool { name: "weather" }));
    TravelAgent::new(Arc::new(llm), Arc::new(registry), 12)
}

#[tokio::test]
async fn currency_flow_survives_interstitial_message() {
    let h = harness(MockBackend::failing());

    let reply = h.agent.process("I want to convert currency").await;
    assert!(reply.contains("Which currencies"));

    let reply = h.agent.process("USD to EUR").await;
    assert!(reply.contains("What amount"));

    // Off-topic answer: the amount question holds, no tool call yet
    let reply = h.agent.process("Paris").await;
    assert!(reply.contains("What amount"));
    assert_eq!(h.currency_calls.load(Ordering::SeqCst), 0);

    let reply = h.agent.process("100").await;
    assert_eq!(
        reply,
        "Based on data from 2025-12-30, 100 USD converts to 85.06 EUR at a rate of 0.85056."
    );
    assert_eq!(h.currency_calls.load(Ordering::SeqCst), 1);

    // The interstitial "Paris" never leaked into the trip context
    assert_eq!(h.agent.state_snapshot().destination, None);
}

#[tokio::test]
async fn pair_persists_for_follow_up_conversions() {
    let h = harness(MockBackend::failing());

    h.agent.process("convert 100 USD to EUR").await;
    let reply = h.agent.process("convert 250").await;

    assert!(reply.contains("250 USD"));
    assert!(reply.contains("212.64 EUR"));
    assert_eq!(h.currency_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn new_pair_while_awaiting_amount_requires_new_amount() {
    let h = harness(MockBackend::failing());

    h.agent.process("convert currency").await;
    h.agent.process("USD to EUR").await;
    let reply = h.agent.process("actually GBP to JPY").await;
    assert!(reply.contains("What amount"));
    assert_eq!(h.currency_calls.load(Ordering::SeqCst), 0);

    let reply = h.agent.process("100").await;
    assert!(reply.contains("100 GBP"));
    assert!(reply.contains("JPY"));
}

#[tokio::test]
async fn tool_is_never_called_with_missing_slots() {
    let h = harness(MockBackend::failing());

    h.agent.process("convert currency").await;
    h.agent.process("hmm").await;
    h.agent.process("what was I doing").await;

    assert_eq!(h.currency_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn live_weather_reply_is_grounded_and_disclaimed() {
    let h = harness(MockBackend::failing());

    let reply = h.agent.process("What's the weather in Paris right now?").await;

    assert_eq!(h.weather_calls.load(Ordering::SeqCst), 1);
    assert!(reply.contains("Paris"));
    assert!(reply.contains("Europe/Paris"));
    assert!(reply.contains("2.1"));
    assert!(reply.contains("7.4"));
    assert!(reply.contains("0.3 mm"));
    assert!(reply.contains("not a live reading"));
}

#[tokio::test]
async fn seasonal_weather_never_invokes_the_forecast_tool() {
    let h = harness(MockBackend::new(
        "March in Tokyo is mild with occasional showers; pack a light jacket.",
    ));

    let reply = h
        .agent
        .process("What's the weather like in Tokyo in March?")
        .await;

    assert_eq!(h.weather_calls.load(Ordering::SeqCst), 0);
    assert!(reply.contains("light jacket"));
}

#[tokio::test]
async fn weather_flow_asks_for_destination_then_calls() {
    let h = harness(MockBackend::failing());

    let reply = h.agent.process("what's the weather right now").await;
    assert!(reply.contains("Where"));
    assert_eq!(h.weather_calls.load(Ordering::SeqCst), 0);

    let reply = h.agent.process("Paris").await;
    assert_eq!(h.weather_calls.load(Ordering::SeqCst), 1);
    assert!(reply.contains("Paris"));
}

#[tokio::test]
async fn trip_answer_can_fill_multiple_slots() {
    let h = harness(MockBackend::new("Day 1: Sagrada Familia."));

    let reply = h.agent.process("help me plan a trip").await;
    assert!(reply.contains("Where"));

    // Two slots in one answer: duration question is skipped
    let reply = h.agent.process("Barcelona, 4 days").await;
    assert!(reply.contains("interests"));

    let reply = h.agent.process("food and museums").await;
    assert!(reply.contains("Sagrada Familia"));

    let state = h.agent.state_snapshot();
    assert_eq!(state.destination.as_deref(), Some("Barcelona"));
    assert_eq!(state.duration_days, Some(4));
}

#[tokio::test]
async fn itinerary_refinement_uses_prior_itinerary() {
    let h = harness(MockBackend::new("fallback").with_responses(vec![
        "Day 1: Sagrada Familia. Day 2: Camp Nou.".to_string(),
        "Day 1: Sagrada Familia. Day 2: beach afternoon.".to_string(),
    ]));

    h.agent.process("plan a trip to Barcelona, 4 days").await;
    h.agent.process("skip").await;
    let reply = h.agent.process("make it more relaxed").await;

    assert!(reply.contains("beach afternoon"));
}

#[tokio::test]
async fn broken_currency_tool_yields_no_numbers() {
    let agent = broken_tools_harness(MockBackend::failing());

    agent.process("convert 100 USD to EUR").await;
    let reply = agent.process("convert 100 USD to EUR").await;

    assert!(reply.contains("unavailable"));
    assert!(!reply.contains("85"));
    assert!(!reply.contains("0.85"));
}

#[tokio::test]
async fn broken_weather_tool_yields_apology_not_figures() {
    let agent = broken_tools_harness(MockBackend::failing());

    let reply = agent.process("What's the weather in Paris right now?").await;

    assert!(reply.contains("Paris"));
    assert!(!reply.chars().any(|c| c.is_ascii_digit()));
}

#[tokio::test]
async fn llm_outage_yields_retry_message() {
    let h = harness(MockBackend::failing());

    h.agent.process("plan a trip to Barcelona, 4 days").await;
    let reply = h.agent.process("skip").await;

    assert!(reply.contains("try again"));
}
