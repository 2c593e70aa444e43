//! The per-session dialogue engine.
//!
//! `TravelAgent` owns one conversation: it classifies the turn, runs the
//! policy, performs whatever I/O the decision calls for, and composes
//! the reply. `process` never returns an error - every failure mode
//! (tool outage, model outage, malformed payload) maps to a user-facing
//! message, and tool failures never fall back to model-generated
//! numbers.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use serde_json::json;

use travel_agent_core::{ToolError, ToolInput};
use travel_agent_llm::{LlmBackend, Message, PromptBuilder};
use travel_agent_tools::{CurrencyConversion, ToolExecutor, WeatherForecast};

use crate::compose;
use crate::intent::IntentClassifier;
use crate::policy::{decide, PolicyDecision, PromptSpec, ToolCall};
use crate::state::{Itinerary, SessionState};

const WEATHER_TOOL: &str = "weather";
const CURRENCY_TOOL: &str = "currency";
const PROMPT_TOKEN_BUDGET: usize = 3072;

/// One conversation's engine
pub struct TravelAgent {
    state: RwLock<SessionState>,
    history: RwLock<Vec<Message>>,
    /// Serializes turns so concurrent requests on one session cannot
    /// interleave state updates
    turn_guard: tokio::sync::Mutex<()>,
    classifier: IntentClassifier,
    llm: Arc<dyn LlmBackend>,
    tools: Arc<dyn ToolExecutor>,
    max_history: usize,
}

impl TravelAgent {
    pub fn new(llm: Arc<dyn LlmBackend>, tools: Arc<dyn ToolExecutor>, max_history: usize) -> Self {
        Self {
            state: RwLock::new(SessionState::new()),
            history: RwLock::new(Vec::new()),
            turn_guard: tokio::sync::Mutex::new(()),
            classifier: IntentClassifier::new(),
            llm,
            tools,
            max_history,
        }
    }

    /// Process one user turn and produce the reply
    pub async fn process(&self, user_message: &str) -> String {
        let _turn = self.turn_guard.lock().await;

        let decision = {
            let intent = {
                let state = self.state.read();
                self.classifier.classify(user_message, &state)
            };
            tracing::debug!(?intent, "classified turn");

            let mut state = self.state.write();
            state.turn_count += 1;
            decide(intent, &mut state, Utc::now().date_naive())
        };

        let reply = match decision {
            PolicyDecision::Ask(question) => compose::clarification(question).to_string(),
            PolicyDecision::CallTool(call) => self.run_tool(call).await,
            PolicyDecision::Generate(spec) => self.generate(spec, user_message).await,
        };

        self.record_turn(user_message, &reply);
        reply
    }

    async fn run_tool(&self, call: ToolCall) -> String {
        match call {
            ToolCall::Weather { location, date } => {
                let input = ToolInput::new(json!({
                    "location": location,
                    "date": date.to_string(),
                }));

                match self.tools.execute(WEATHER_TOOL, input).await {
                    Ok(output) => match serde_json::from_value::<WeatherForecast>(output.result) {
                        Ok(forecast) => compose::weather_response(&forecast),
                        Err(e) => {
                            tracing::error!(error = %e, "malformed weather tool output");
                            compose::weather_failure(
                                &ToolError::Upstream(e.to_string()),
                                &location,
                            )
                        }
                    },
                    Err(e) => {
                        tracing::warn!(error = %e, %location, "weather lookup failed");
                        compose::weather_failure(&e, &location)
                    }
                }
            }
            ToolCall::Currency { from, to, amount } => {
                let input = ToolInput::new(json!({
                    "amount": amount,
                    "from": from,
                    "to": to,
                }));

                match self.tools.execute(CURRENCY_TOOL, input).await {
                    Ok(output) => {
                        match serde_json::from_value::<CurrencyConversion>(output.result) {
                            Ok(conversion) => {
                                // The amount is consumed only once the
                                // conversion actually succeeded
                                self.state.write().complete_conversion();
                                compose::currency_response(&conversion)
                            }
                            Err(e) => {
                                tracing::error!(error = %e, "malformed currency tool output");
                                compose::currency_failure(&ToolError::Upstream(e.to_string()))
                            }
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, %from, %to, "conversion failed");
                        compose::currency_failure(&e)
                    }
                }
            }
        }
    }

    async fn generate(&self, spec: PromptSpec, user_message: &str) -> String {
        let history = self.history.read().clone();
        let commit_itinerary = matches!(
            &spec,
            PromptSpec::Itinerary { .. } | PromptSpec::Refinement { .. }
        );

        let builder = PromptBuilder::new().system_prompt();
        let builder = match spec {
            PromptSpec::Itinerary { context } => builder
                .with_trip_context(&context)
                .with_history(&history)
                .itinerary_task(),
            PromptSpec::Refinement { prior, instruction } => builder
                .with_trip_context(&self.state.read().to_context_string())
                .with_history(&history)
                .refinement_task(&prior, &instruction),
            PromptSpec::SeasonalGuidance { destination } => builder
                .with_history(&history)
                .seasonal_guidance_task(&destination),
        };
        let messages = builder
            .user_message(user_message)
            .build_with_limit(PROMPT_TOKEN_BUDGET);

        match self.llm.generate(&messages).await {
            Ok(result) => {
                let text = compose::sanitize_llm_output(&result.text);
                if text.is_empty() {
                    return compose::generation_failure().to_string();
                }
                if commit_itinerary {
                    self.commit_itinerary(&text);
                }
                text
            }
            Err(e) => {
                tracing::warn!(error = %e, "generation failed");
                compose::generation_failure().to_string()
            }
        }
    }

    fn commit_itinerary(&self, body: &str) {
        let mut state = self.state.write();
        let (Some(destination), Some(duration_days)) =
            (state.destination.clone(), state.duration_days)
        else {
            return;
        };
        state.last_itinerary = Some(Itinerary {
            destination,
            duration_days,
            body: body.to_string(),
            generated_at: Utc::now(),
        });
    }

    fn record_turn(&self, user_message: &str, reply: &str) {
        let mut history = self.history.write();
        history.push(Message::user(user_message));
        history.push(Message::assistant(reply));

        let len = history.len();
        if len > self.max_history {
            history.drain(..len - self.max_history);
        }
    }

    pub fn turn_count(&self) -> u32 {
        self.state.read().turn_count
    }

    /// Snapshot of the session state, for inspection endpoints
    pub fn state_snapshot(&self) -> SessionState {
        self.state.read().clone()
    }
}
