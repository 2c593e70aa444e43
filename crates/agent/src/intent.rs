//! Intent classification.
//!
//! Each user turn is mapped to a tagged intent carrying the slot values
//! found in the message. Classification is deterministic and
//! state-aware: a pending slot question changes how the next message is
//! read, so "100" during an awaiting-amount turn is a currency amount,
//! and "Barcelona, 4 days" during an awaiting-destination turn fills two
//! trip slots at once.

use crate::extract::{mentions_month, SlotExtractor};
use crate::state::{
    BudgetTier, CurrencyPair, DestinationFlow, Pace, PendingSlot, SessionState, SlotUpdates,
};

/// Trip slot values found in a single message
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TripSlots {
    pub destination: Option<String>,
    pub duration_days: Option<u32>,
    pub party_size: Option<u32>,
    pub budget_tier: Option<BudgetTier>,
    pub pace: Option<Pace>,
    pub interests: Vec<String>,
    pub skip_interests: bool,
}

impl TripSlots {
    pub fn into_updates(self) -> SlotUpdates {
        SlotUpdates {
            destination: self.destination,
            duration_days: self.duration_days,
            party_size: self.party_size,
            budget_tier: self.budget_tier,
            pace: self.pace,
            interests: self.interests,
            skip_interests: self.skip_interests,
            ..Default::default()
        }
    }
}

/// Currency slot values found in a single message
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurrencySlots {
    pub pair: Option<CurrencyPair>,
    pub amount: Option<f64>,
}

/// What the user is asking for this turn
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    TripPlanning(TripSlots),
    ItineraryRefinement { instruction: String },
    SeasonalWeather { destination: Option<String> },
    LiveWeather { destination: Option<String> },
    CurrencyConversion(CurrencySlots),
    Unrecognized,
}

const WEATHER_CUES: &[&str] = &[
    "weather",
    "temperature",
    "forecast",
    "rain",
    "raining",
    "sunny",
    "how hot",
    "how cold",
    "how warm",
];

const SEASONAL_CUES: &[&str] = &[
    "usually",
    "typical",
    "typically",
    "normally",
    "generally",
    "in general",
    "on average",
    "around this time of year",
    "that time of year",
    "time of year",
];

const IMMEDIACY_CUES: &[&str] = &[
    "right now",
    "currently",
    "at the moment",
    "as of now",
    "today",
    "tonight",
    "this week",
];

const CURRENCY_CUES: &[&str] = &["convert", "conversion", "exchange", "currency"];

const REFINEMENT_CUES: &[&str] = &[
    "instead",
    "change",
    "make it",
    "more relaxed",
    "more packed",
    "shorter",
    "longer",
    "add ",
    "remove",
    "swap",
    "replace",
    "drop day",
];

const TRIP_CUES: &[&str] = &[
    "plan",
    "trip",
    "itinerary",
    "visit",
    "travel",
    "vacation",
    "holiday",
    "getaway",
];

/// Deterministic, state-aware intent classifier
pub struct IntentClassifier {
    extractor: SlotExtractor,
}

impl IntentClassifier {
    pub fn new() -> Self {
        Self {
            extractor: SlotExtractor::new(),
        }
    }

    pub fn classify(&self, text: &str, state: &SessionState) -> Intent {
        let lower = text.to_lowercase();

        // A pending currency question is sticky: the conversation stays in
        // the currency flow until it resolves, and off-topic messages fall
        // through with empty slots so the question is re-asked.
        match state.pending {
            Some(PendingSlot::CurrencyPair) => return self.continue_awaiting_pair(text),
            Some(PendingSlot::CurrencyAmount) => return self.continue_awaiting_amount(text),
            _ => {}
        }

        if self.is_currency(&lower, text) {
            return Intent::CurrencyConversion(self.currency_slots(text));
        }

        if contains_any(&lower, WEATHER_CUES) {
            return self.classify_weather(text, &lower);
        }

        if state.last_itinerary.is_some() && contains_any(&lower, REFINEMENT_CUES) {
            return Intent::ItineraryRefinement {
                instruction: text.trim().to_string(),
            };
        }

        // Trip-slot question pending: read the message as an answer
        match state.pending {
            Some(PendingSlot::Destination { resume }) => {
                let destination = self.extractor.destination(text, true);
                return match resume {
                    DestinationFlow::LiveWeather => Intent::LiveWeather { destination },
                    DestinationFlow::TripPlanning => {
                        Intent::TripPlanning(self.trip_slots(text, true))
                    }
                };
            }
            Some(PendingSlot::Duration) | Some(PendingSlot::Interests) => {
                return Intent::TripPlanning(self.trip_slots(text, true));
            }
            _ => {}
        }

        if contains_any(&lower, TRIP_CUES) {
            return Intent::TripPlanning(self.trip_slots(text, false));
        }
        // No trip keyword, but a clear destination mention still reads as
        // trip planning ("4 days in Rome")
        let slots = self.trip_slots(text, false);
        if slots.destination.is_some() {
            return Intent::TripPlanning(slots);
        }

        Intent::Unrecognized
    }

    fn is_currency(&self, lower: &str, text: &str) -> bool {
        contains_any(lower, CURRENCY_CUES)
            || self.extractor.currency_query(text).is_some()
            || self.extractor.currency_pair(text).is_some()
    }

    fn currency_slots(&self, text: &str) -> CurrencySlots {
        if let Some((amount, pair)) = self.extractor.currency_query(text) {
            return CurrencySlots {
                pair: Some(pair),
                amount: Some(amount),
            };
        }
        // Only reached for currency-cued messages, so a bare number is
        // safe to read as the amount ("convert 250" reuses the last pair)
        CurrencySlots {
            pair: self.extractor.currency_pair(text),
            amount: self.extractor.amount(text),
        }
    }

    fn continue_awaiting_pair(&self, text: &str) -> Intent {
        if let Some((amount, pair)) = self.extractor.currency_query(text) {
            return Intent::CurrencyConversion(CurrencySlots {
                pair: Some(pair),
                amount: Some(amount),
            });
        }
        if let Some(pair) = self.extractor.currency_pair(text) {
            return Intent::CurrencyConversion(CurrencySlots {
                pair: Some(pair),
                amount: None,
            });
        }
        // An amount with no pair cannot be used yet; discard it
        Intent::CurrencyConversion(CurrencySlots::default())
    }

    fn continue_awaiting_amount(&self, text: &str) -> Intent {
        if let Some((amount, pair)) = self.extractor.currency_query(text) {
            return Intent::CurrencyConversion(CurrencySlots {
                pair: Some(pair),
                amount: Some(amount),
            });
        }
        if let Some(pair) = self.extractor.currency_pair(text) {
            // New pair mid-flow: accept it, amount must be re-asked
            return Intent::CurrencyConversion(CurrencySlots {
                pair: Some(pair),
                amount: None,
            });
        }
        if let Some(amount) = self.extractor.amount(text) {
            return Intent::CurrencyConversion(CurrencySlots {
                pair: None,
                amount: Some(amount),
            });
        }
        Intent::CurrencyConversion(CurrencySlots::default())
    }

    fn classify_weather(&self, text: &str, lower: &str) -> Intent {
        let destination = self.extractor.destination(text, false);

        // Month names and habitual phrasing ask about climate, not a
        // dated forecast
        if mentions_month(text) || contains_any(lower, SEASONAL_CUES) {
            return Intent::SeasonalWeather { destination };
        }
        if contains_any(lower, IMMEDIACY_CUES) {
            return Intent::LiveWeather { destination };
        }
        Intent::LiveWeather { destination }
    }

    fn trip_slots(&self, text: &str, allow_bare_destination: bool) -> TripSlots {
        TripSlots {
            destination: self.extractor.destination(text, allow_bare_destination),
            duration_days: self.extractor.duration_days(text),
            party_size: self.extractor.party_size(text),
            budget_tier: self.extractor.budget_tier(text),
            pace: self.extractor.pace(text),
            interests: self.extractor.interests(text),
            skip_interests: self.extractor.skips_interests(text),
        }
    }
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}
