//! Turn-level dialogue engine for the travel agent
//!
//! Features:
//! - Cumulative session state with slot-filling across turns
//! - Deterministic intent classification and slot extraction
//! - A pure dialogue policy deciding ask / call-tool / generate per turn
//! - Response composition with grounded-data disclaimers
//!
//! The no-hallucination guarantee lives here: any time-sensitive numeric
//! claim (forecast, exchange rate) comes from a tool adapter, and tool
//! failures surface as unavailability messages, never as LLM-generated
//! substitutes.

pub mod compose;
pub mod engine;
pub mod extract;
pub mod intent;
pub mod policy;
pub mod state;

pub use engine::TravelAgent;
pub use extract::SlotExtractor;
pub use intent::{CurrencySlots, Intent, IntentClassifier, TripSlots};
pub use policy::{decide, PolicyDecision, PromptSpec, Question, ToolCall};
pub use state::{
    BudgetTier, CurrencyPair, DestinationFlow, Itinerary, Pace, PendingSlot, SessionState,
    SlotUpdates,
};
