//! Per-session dialogue state.
//!
//! `SessionState` is the accumulating slot-filled trip context. It is pure
//! data plus mutation rules: no I/O, no locking (the engine serializes
//! turns). Slots persist across turns until explicitly replaced; values
//! that do not match the currently pending slot's expected type are
//! discarded at merge time.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Budget tier slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetTier {
    Budget,
    MidRange,
    Luxury,
}

impl fmt::Display for BudgetTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BudgetTier::Budget => write!(f, "budget"),
            BudgetTier::MidRange => write!(f, "mid-range"),
            BudgetTier::Luxury => write!(f, "luxury"),
        }
    }
}

/// Trip pace slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pace {
    Relaxed,
    Balanced,
    Packed,
}

impl fmt::Display for Pace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pace::Relaxed => write!(f, "relaxed"),
            Pace::Balanced => write!(f, "balanced"),
            Pace::Packed => write!(f, "packed"),
        }
    }
}

/// Which flow a destination answer resumes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestinationFlow {
    TripPlanning,
    LiveWeather,
}

/// The slot-fill question currently awaiting an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "slot")]
pub enum PendingSlot {
    Destination { resume: DestinationFlow },
    Duration,
    Interests,
    CurrencyPair,
    CurrencyAmount,
}

/// A from/to currency pair, ISO-4217 codes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyPair {
    pub from: String,
    pub to: String,
}

impl CurrencyPair {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.from, self.to)
    }
}

/// A generated itinerary, kept for refinement turns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Itinerary {
    pub destination: String,
    pub duration_days: u32,
    pub body: String,
    pub generated_at: DateTime<Utc>,
}

/// Slot values extracted from one message, to be merged into the state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlotUpdates {
    pub destination: Option<String>,
    pub duration_days: Option<u32>,
    pub party_size: Option<u32>,
    pub budget_tier: Option<BudgetTier>,
    pub pace: Option<Pace>,
    pub interests: Vec<String>,
    pub skip_interests: bool,
    pub currency_pair: Option<CurrencyPair>,
    pub currency_amount: Option<f64>,
}

impl SlotUpdates {
    pub fn is_empty(&self) -> bool {
        *self == SlotUpdates::default()
    }
}

/// Cumulative conversation state, one per session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionState {
    pub destination: Option<String>,
    pub duration_days: Option<u32>,
    pub party_size: Option<u32>,
    pub budget_tier: Option<BudgetTier>,
    pub pace: Option<Pace>,
    pub interests: BTreeSet<String>,
    /// Traveler explicitly skipped the interests question
    pub skip_interests: bool,
    pub pending: Option<PendingSlot>,
    pub currency_pair: Option<CurrencyPair>,
    /// Amount awaiting conversion; cleared when a conversion completes
    pub currency_amount: Option<f64>,
    pub last_itinerary: Option<Itinerary>,
    pub turn_count: u32,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge extracted slot values into the state.
    ///
    /// While a currency slot is pending, trip slots in the update are
    /// discarded rather than stored: an interstitial "Paris" during an
    /// awaiting-amount turn must not touch the trip context, and must not
    /// clear the pending question.
    pub fn apply(&mut self, updates: &SlotUpdates) {
        let currency_pending = matches!(
            self.pending,
            Some(PendingSlot::CurrencyPair) | Some(PendingSlot::CurrencyAmount)
        );

        if !currency_pending {
            if let Some(destination) = &updates.destination {
                self.destination = Some(destination.clone());
            }
            if let Some(days) = updates.duration_days {
                self.duration_days = Some(days);
            }
            if let Some(size) = updates.party_size {
                self.party_size = Some(size);
            }
            if let Some(tier) = updates.budget_tier {
                self.budget_tier = Some(tier);
            }
            if let Some(pace) = updates.pace {
                self.pace = Some(pace);
            }
            for interest in &updates.interests {
                self.interests.insert(interest.clone());
            }
            if updates.skip_interests {
                self.skip_interests = true;
            }
        }

        if let Some(pair) = &updates.currency_pair {
            // Replacing the pair mid-flow invalidates a previously given amount
            let replacing = self.currency_pair.as_ref().is_some_and(|p| p != pair);
            if replacing {
                self.currency_amount = None;
            }
            self.currency_pair = Some(pair.clone());
        }
        if let Some(amount) = updates.currency_amount {
            self.currency_amount = Some(amount);
        }
    }

    pub fn set_pending(&mut self, slot: PendingSlot) {
        self.pending = Some(slot);
    }

    pub fn clear_pending(&mut self) {
        self.pending = None;
    }

    /// Commit a completed currency conversion: the amount is consumed,
    /// the pair persists for follow-up conversions.
    pub fn complete_conversion(&mut self) {
        self.currency_amount = None;
        self.pending = None;
    }

    /// Whether all slots required for itinerary generation are filled
    pub fn trip_ready(&self) -> bool {
        self.destination.is_some()
            && self.duration_days.is_some()
            && (!self.interests.is_empty() || self.skip_interests)
    }

    /// Render the trip context for LLM prompts
    pub fn to_context_string(&self) -> String {
        let mut lines = Vec::new();

        if let Some(destination) = &self.destination {
            lines.push(format!("Destination: {destination}"));
        }
        if let Some(days) = self.duration_days {
            lines.push(format!("Duration: {days} days"));
        }
        if let Some(size) = self.party_size {
            lines.push(format!("Party size: {size}"));
        }
        if let Some(tier) = self.budget_tier {
            lines.push(format!("Budget: {tier}"));
        }
        if let Some(pace) = self.pace {
            lines.push(format!("Pace: {pace}"));
        }
        if !self.interests.is_empty() {
            let interests: Vec<&str> = self.interests.iter().map(String::as_str).collect();
            lines.push(format!("Interests: {}", interests.join(", ")));
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_merges_trip_slots() {
        let mut state = SessionState::new();
        state.apply(&SlotUpdates {
            destination: Some("Barcelona".to_string()),
            duration_days: Some(4),
            ..Default::default()
        });

        assert_eq!(state.destination.as_deref(), Some("Barcelona"));
        assert_eq!(state.duration_days, Some(4));
    }

    #[test]
    fn test_slots_persist_until_replaced() {
        let mut state = SessionState::new();
        state.apply(&SlotUpdates {
            destination: Some("Barcelona".to_string()),
            ..Default::default()
        });
        state.apply(&SlotUpdates {
            duration_days: Some(4),
            ..Default::default()
        });

        assert_eq!(state.destination.as_deref(), Some("Barcelona"));

        state.apply(&SlotUpdates {
            destination: Some("Lisbon".to_string()),
            ..Default::default()
        });
        assert_eq!(state.destination.as_deref(), Some("Lisbon"));
        assert_eq!(state.duration_days, Some(4));
    }

    #[test]
    fn test_trip_slots_discarded_while_currency_pending() {
        let mut state = SessionState::new();
        state.currency_pair = Some(CurrencyPair::new("USD", "EUR"));
        state.set_pending(PendingSlot::CurrencyAmount);

        state.apply(&SlotUpdates {
            destination: Some("Paris".to_string()),
            ..Default::default()
        });

        assert_eq!(state.destination, None);
        assert_eq!(state.pending, Some(PendingSlot::CurrencyAmount));
        assert!(state.currency_pair.is_some());
    }

    #[test]
    fn test_pair_replacement_resets_amount() {
        let mut state = SessionState::new();
        state.apply(&SlotUpdates {
            currency_pair: Some(CurrencyPair::new("USD", "EUR")),
            currency_amount: Some(50.0),
            ..Default::default()
        });

        state.apply(&SlotUpdates {
            currency_pair: Some(CurrencyPair::new("GBP", "JPY")),
            ..Default::default()
        });

        assert_eq!(state.currency_pair, Some(CurrencyPair::new("GBP", "JPY")));
        assert_eq!(state.currency_amount, None);
    }

    #[test]
    fn test_same_pair_keeps_amount() {
        let mut state = SessionState::new();
        state.apply(&SlotUpdates {
            currency_pair: Some(CurrencyPair::new("USD", "EUR")),
            currency_amount: Some(50.0),
            ..Default::default()
        });
        state.apply(&SlotUpdates {
            currency_pair: Some(CurrencyPair::new("USD", "EUR")),
            ..Default::default()
        });

        assert_eq!(state.currency_amount, Some(50.0));
    }

    #[test]
    fn test_trip_ready() {
        let mut state = SessionState::new();
        assert!(!state.trip_ready());

        state.destination = Some("Rome".to_string());
        state.duration_days = Some(3);
        assert!(!state.trip_ready());

        state.skip_interests = true;
        assert!(state.trip_ready());

        state.skip_interests = false;
        state.interests.insert("food".to_string());
        assert!(state.trip_ready());
    }

    #[test]
    fn test_complete_conversion_keeps_pair() {
        let mut state = SessionState::new();
        state.currency_pair = Some(CurrencyPair::new("USD", "EUR"));
        state.currency_amount = Some(100.0);
        state.set_pending(PendingSlot::CurrencyAmount);

        state.complete_conversion();

        assert_eq!(state.currency_amount, None);
        assert_eq!(state.pending, None);
        assert!(state.currency_pair.is_some());
    }

    #[test]
    fn test_context_string() {
        let mut state = SessionState::new();
        state.destination = Some("Kyoto".to_string());
        state.duration_days = Some(5);
        state.interests.insert("temples".to_string());
        state.interests.insert("food".to_string());

        let context = state.to_context_string();
        assert!(context.contains("Destination: Kyoto"));
        assert!(context.contains("Duration: 5 days"));
        // BTreeSet iterates in sorted order
        assert!(context.contains("Interests: food, temples"));
    }
}
