//! The per-turn dialogue policy.
//!
//! `decide` is a pure function from (intent, session state) to one of
//! three actions: ask a clarifying question, call a tool, or generate
//! with the LLM. All slot bookkeeping happens here; no I/O. Keeping the
//! policy pure makes every dialogue rule unit-testable without a
//! network or a model.
//!
//! The grounding rule is structural: a tool call is only ever emitted
//! when every argument it needs is present, and time-sensitive answers
//! (live forecast, exchange rate) can ONLY be reached through a tool
//! call, never through a generate action.

use chrono::NaiveDate;

use crate::intent::{CurrencySlots, Intent, TripSlots};
use crate::state::{DestinationFlow, PendingSlot, SessionState, SlotUpdates};

/// A clarifying question to put to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Question {
    Destination,
    Duration,
    Interests,
    CurrencyPair,
    CurrencyAmount,
    /// The message did not map to anything the agent can do
    Generic,
}

/// A fully-specified tool invocation
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCall {
    Weather { location: String, date: NaiveDate },
    Currency { from: String, to: String, amount: f64 },
}

/// What to ask the LLM to write
#[derive(Debug, Clone, PartialEq)]
pub enum PromptSpec {
    Itinerary {
        context: String,
    },
    Refinement {
        prior: String,
        instruction: String,
    },
    /// Qualitative climate guidance; explicitly not a dated forecast
    SeasonalGuidance {
        destination: String,
    },
}

/// The action chosen for this turn
#[derive(Debug, Clone, PartialEq)]
pub enum PolicyDecision {
    Ask(Question),
    CallTool(ToolCall),
    Generate(PromptSpec),
}

/// Decide the next action and update the session state accordingly
pub fn decide(intent: Intent, state: &mut SessionState, today: NaiveDate) -> PolicyDecision {
    match intent {
        Intent::TripPlanning(slots) => decide_trip(slots, state),
        Intent::ItineraryRefinement { instruction } => decide_refinement(instruction, state),
        Intent::SeasonalWeather { destination } => decide_seasonal(destination, state),
        Intent::LiveWeather { destination } => decide_live_weather(destination, state, today),
        Intent::CurrencyConversion(slots) => decide_currency(slots, state),
        Intent::Unrecognized => PolicyDecision::Ask(Question::Generic),
    }
}

fn decide_trip(slots: TripSlots, state: &mut SessionState) -> PolicyDecision {
    state.apply(&slots.into_updates());

    // One missing slot at a time, in a fixed order
    if state.destination.is_none() {
        state.set_pending(PendingSlot::Destination {
            resume: DestinationFlow::TripPlanning,
        });
        return PolicyDecision::Ask(Question::Destination);
    }
    if state.duration_days.is_none() {
        state.set_pending(PendingSlot::Duration);
        return PolicyDecision::Ask(Question::Duration);
    }
    if state.interests.is_empty() && !state.skip_interests {
        state.set_pending(PendingSlot::Interests);
        return PolicyDecision::Ask(Question::Interests);
    }

    state.clear_pending();
    PolicyDecision::Generate(PromptSpec::Itinerary {
        context: state.to_context_string(),
    })
}

fn decide_refinement(instruction: String, state: &mut SessionState) -> PolicyDecision {
    match &state.last_itinerary {
        Some(itinerary) => PolicyDecision::Generate(PromptSpec::Refinement {
            prior: itinerary.body.clone(),
            instruction,
        }),
        None => PolicyDecision::Ask(Question::Generic),
    }
}

fn decide_seasonal(destination: Option<String>, state: &mut SessionState) -> PolicyDecision {
    state.apply(&SlotUpdates {
        destination: destination.clone(),
        ..Default::default()
    });

    match destination.or_else(|| state.destination.clone()) {
        Some(destination) => {
            // Climate questions are answered from general knowledge,
            // never from the forecast tool
            PolicyDecision::Generate(PromptSpec::SeasonalGuidance { destination })
        }
        None => {
            state.set_pending(PendingSlot::Destination {
                resume: DestinationFlow::TripPlanning,
            });
            PolicyDecision::Ask(Question::Destination)
        }
    }
}

fn decide_live_weather(
    destination: Option<String>,
    state: &mut SessionState,
    today: NaiveDate,
) -> PolicyDecision {
    state.apply(&SlotUpdates {
        destination: destination.clone(),
        ..Default::default()
    });

    match destination.or_else(|| state.destination.clone()) {
        Some(location) => {
            state.clear_pending();
            PolicyDecision::CallTool(ToolCall::Weather {
                location,
                date: today,
            })
        }
        None => {
            state.set_pending(PendingSlot::Destination {
                resume: DestinationFlow::LiveWeather,
            });
            PolicyDecision::Ask(Question::Destination)
        }
    }
}

fn decide_currency(slots: CurrencySlots, state: &mut SessionState) -> PolicyDecision {
    state.apply(&SlotUpdates {
        currency_pair: slots.pair,
        currency_amount: slots.amount,
        ..Default::default()
    });

    let Some(pair) = state.currency_pair.clone() else {
        state.set_pending(PendingSlot::CurrencyPair);
        return PolicyDecision::Ask(Question::CurrencyPair);
    };

    let Some(amount) = state.currency_amount else {
        // Sticky: re-asked every turn until an amount arrives or the
        // user abandons the flow with a new pair
        state.set_pending(PendingSlot::CurrencyAmount);
        return PolicyDecision::Ask(Question::CurrencyAmount);
    };

    state.clear_pending();
    PolicyDecision::CallTool(ToolCall::Currency {
        from: pair.from,
        to: pair.to,
        amount,
    })
}
