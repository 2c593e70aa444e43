//! Regex-based slot extraction.
//!
//! Deterministic parsing keeps basic string work out of the LLM: amounts,
//! currency pairs, durations, party sizes, and destination mentions are
//! all extracted here with compiled patterns.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::state::{BudgetTier, CurrencyPair, Pace};

const AMOUNT: &str = r"(\d{1,3}(?:,\d{3})*(?:\.\d+)?|\d+(?:\.\d+)?)";
const CCY_TOKEN: &str = r"([A-Za-z]+|[$€£¥₪])";

/// Currency word/symbol aliases
const CURRENCY_ALIASES: &[(&str, &str)] = &[
    ("dollar", "USD"),
    ("dollars", "USD"),
    ("$", "USD"),
    ("euro", "EUR"),
    ("euros", "EUR"),
    ("€", "EUR"),
    ("pound", "GBP"),
    ("pounds", "GBP"),
    ("£", "GBP"),
    ("yen", "JPY"),
    ("¥", "JPY"),
    ("shekel", "ILS"),
    ("shekels", "ILS"),
    ("₪", "ILS"),
    ("rupee", "INR"),
    ("rupees", "INR"),
    ("franc", "CHF"),
    ("francs", "CHF"),
];

/// Lowercase codes accepted without explicit uppercasing by the user
const KNOWN_CODES: &[&str] = &[
    "usd", "eur", "gbp", "jpy", "ils", "inr", "chf", "cad", "aud", "nzd", "cny", "sek", "nok",
    "dkk", "pln", "czk", "huf", "ron", "try", "zar", "brl", "mxn", "sgd", "hkd", "krw", "thb",
    "php", "idr", "myr", "isk", "bgn",
];

static MONTH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|jun(?:e)?|jul(?:y)?|aug(?:ust)?|sep(?:tember)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\b",
    )
    .unwrap()
});

/// Fast check for month names (signals seasonal rather than exact-forecast)
pub fn mentions_month(text: &str) -> bool {
    MONTH_RE.is_match(text)
}

/// Capitalized captures that are not place names
const DESTINATION_STOPLIST: &[&str] = &[
    "I", "Me", "My", "We", "Our", "You", "The", "What", "When", "Where", "How", "Please", "January",
    "February", "March", "April", "May", "June", "July", "August", "September", "October",
    "November", "December",
];

/// Deterministic slot extractor with compiled patterns
pub struct SlotExtractor {
    amount_re: Regex,
    day_counter_re: Regex,
    currency_marker_re: Regex,
    pair_linked_re: Regex,
    pair_separator_re: Regex,
    full_query_re: Regex,
    full_query_rev_re: Regex,
    duration_days_re: Regex,
    duration_weeks_re: Regex,
    party_of_re: Regex,
    party_count_re: Regex,
    destination_prep_re: Regex,
    destination_bare_re: Regex,
    interest_re: Regex,
}

impl SlotExtractor {
    pub fn new() -> Self {
        Self {
            amount_re: Regex::new(&format!(r"\b{AMOUNT}\b")).unwrap(),
            day_counter_re: Regex::new(r"(?i)\bday\s+\d+\b").unwrap(),
            currency_marker_re: Regex::new(
                r"(?i)[$€£¥₪]|\b(usd|eur|gbp|jpy|ils|inr|dollars?|euros?|pounds?|yen|shekels?|rupees?)\b",
            )
            .unwrap(),
            pair_linked_re: Regex::new(&format!(
                r"(?i){CCY_TOKEN}\s*(?:to|into|in)\s*{CCY_TOKEN}"
            ))
            .unwrap(),
            pair_separator_re: Regex::new(&format!(r"{CCY_TOKEN}\s*[/\-]\s*{CCY_TOKEN}")).unwrap(),
            full_query_re: Regex::new(&format!(
                r"(?i)\b{AMOUNT}\b\s*{CCY_TOKEN}\s*(?:to|into|in)\s*{CCY_TOKEN}"
            ))
            .unwrap(),
            full_query_rev_re: Regex::new(&format!(
                r"(?i){CCY_TOKEN}\s*(?:to|into)\s*{CCY_TOKEN}\s*\b{AMOUNT}\b"
            ))
            .unwrap(),
            duration_days_re: Regex::new(r"(?i)\b(\d{1,3})\s*(?:-\s*)?(?:days?|nights?)\b")
                .unwrap(),
            duration_weeks_re: Regex::new(r"(?i)\b(a|one|two|three|\d{1,2})\s*(?:-\s*)?weeks?\b")
                .unwrap(),
            party_of_re: Regex::new(r"(?i)\b(?:party|group|family)\s+of\s+(\d{1,2})\b").unwrap(),
            party_count_re: Regex::new(
                r"(?i)\b(\d{1,2})\s+(?:of us|people|persons|adults|travell?ers)\b",
            )
            .unwrap(),
            destination_prep_re: Regex::new(
                r"\b(?:to|in|at|around|visit|visiting)\s+([A-Z][a-zA-Z]+(?:\s+[A-Z][a-zA-Z]+)*)",
            )
            .unwrap(),
            destination_bare_re: Regex::new(
                r"^([A-Z][a-zA-Z]+(?:\s+[A-Z][a-zA-Z]+){0,3})\s*(?:,|\.|!|$)",
            )
            .unwrap(),
            interest_re: Regex::new(
                r"(?i)\b(food|restaurants?|museums?|art|history|historical|nature|hiking|nightlife|beach(?:es)?|shopping|architecture|culture|photography|wine|music|temples?|markets?|sports?)\b",
            )
            .unwrap(),
        }
    }

    /// Extract a standalone numeric amount ("100", "1,200.50").
    ///
    /// "day 3" style counters are not amounts unless a currency marker is
    /// also present.
    pub fn amount(&self, text: &str) -> Option<f64> {
        if self.day_counter_re.is_match(text) && !self.currency_marker_re.is_match(text) {
            return None;
        }

        let captures = self.amount_re.captures(text)?;
        parse_amount(&captures[1])
    }

    /// Extract a pair-only mention ("USD to EUR", "eur/gbp", "$ to €")
    pub fn currency_pair(&self, text: &str) -> Option<CurrencyPair> {
        for re in [&self.pair_linked_re, &self.pair_separator_re] {
            // Later matches still count when an earlier one is not a
            // currency ("went to Rome, convert usd to eur")
            for captures in re.captures_iter(text) {
                let from = normalize_currency_token(&captures[1]);
                let to = normalize_currency_token(&captures[2]);
                if let (Some(from), Some(to)) = (from, to) {
                    if from != to {
                        return Some(CurrencyPair::new(from, to));
                    }
                }
            }
        }
        None
    }

    /// Extract a full conversion query ("convert 100 usd to eur",
    /// "USD to EUR 100")
    pub fn currency_query(&self, text: &str) -> Option<(f64, CurrencyPair)> {
        for captures in self.full_query_re.captures_iter(text) {
            let amount = parse_amount(&captures[1]);
            let from = normalize_currency_token(&captures[2]);
            let to = normalize_currency_token(&captures[3]);
            if let (Some(amount), Some(from), Some(to)) = (amount, from, to) {
                if from != to {
                    return Some((amount, CurrencyPair::new(from, to)));
                }
            }
        }

        for captures in self.full_query_rev_re.captures_iter(text) {
            let from = normalize_currency_token(&captures[1]);
            let to = normalize_currency_token(&captures[2]);
            let amount = parse_amount(&captures[3]);
            if let (Some(amount), Some(from), Some(to)) = (amount, from, to) {
                if from != to {
                    return Some((amount, CurrencyPair::new(from, to)));
                }
            }
        }

        None
    }

    /// Extract a trip duration in days ("4 days", "a week", "2 weeks")
    pub fn duration_days(&self, text: &str) -> Option<u32> {
        if let Some(captures) = self.duration_days_re.captures(text) {
            let days: u32 = captures[1].parse().ok()?;
            if days > 0 {
                return Some(days);
            }
        }

        if let Some(captures) = self.duration_weeks_re.captures(text) {
            let weeks = match captures[1].to_lowercase().as_str() {
                "a" | "one" => 1,
                "two" => 2,
                "three" => 3,
                n => n.parse().ok()?,
            };
            if weeks > 0 {
                return Some(weeks * 7);
            }
        }

        None
    }

    /// Extract a party size ("family of 4", "2 of us", "solo")
    pub fn party_size(&self, text: &str) -> Option<u32> {
        let lower = text.to_lowercase();

        if let Some(captures) = self
            .party_of_re
            .captures(text)
            .or_else(|| self.party_count_re.captures(text))
        {
            let size: u32 = captures[1].parse().ok()?;
            if size >= 1 {
                return Some(size);
            }
        }

        if lower.contains("solo") || lower.contains("just me") || lower.contains("by myself") {
            return Some(1);
        }
        if lower.contains("couple") || lower.contains("two of us") {
            return Some(2);
        }

        None
    }

    /// Extract a budget tier keyword
    pub fn budget_tier(&self, text: &str) -> Option<BudgetTier> {
        let lower = text.to_lowercase();

        if ["luxury", "high-end", "high end", "five-star", "5-star", "splurge"]
            .iter()
            .any(|k| lower.contains(k))
        {
            return Some(BudgetTier::Luxury);
        }
        if ["mid-range", "midrange", "mid range", "moderate"]
            .iter()
            .any(|k| lower.contains(k))
        {
            return Some(BudgetTier::MidRange);
        }
        if ["budget", "cheap", "shoestring", "low-cost", "affordable"]
            .iter()
            .any(|k| lower.contains(k))
        {
            return Some(BudgetTier::Budget);
        }

        None
    }

    /// Extract a pace keyword
    pub fn pace(&self, text: &str) -> Option<Pace> {
        let lower = text.to_lowercase();

        if ["relaxed", "laid-back", "laid back", "slow pace", "easygoing", "easy-going", "chill"]
            .iter()
            .any(|k| lower.contains(k))
        {
            return Some(Pace::Relaxed);
        }
        if ["packed", "intense", "fast-paced", "fast paced", "action-packed", "busy schedule"]
            .iter()
            .any(|k| lower.contains(k))
        {
            return Some(Pace::Packed);
        }
        if ["balanced", "a mix of", "mix of both"]
            .iter()
            .any(|k| lower.contains(k))
        {
            return Some(Pace::Balanced);
        }

        None
    }

    /// Extract interest keywords from a fixed vocabulary
    pub fn interests(&self, text: &str) -> Vec<String> {
        let mut found = Vec::new();
        for captures in self.interest_re.captures_iter(text) {
            let canonical = canonical_interest(&captures[1]);
            if !found.contains(&canonical) {
                found.push(canonical);
            }
        }
        found
    }

    /// Whether the message explicitly skips the interests question
    pub fn skips_interests(&self, text: &str) -> bool {
        let lower = text.trim().to_lowercase();
        lower == "skip"
            || lower.contains("skip that")
            || lower.contains("no preference")
            || lower.contains("nothing specific")
            || lower.contains("surprise me")
            || lower.contains("anything is fine")
    }

    /// Extract a destination mention.
    ///
    /// `allow_bare` accepts a message that is just a place name ("Paris",
    /// "Barcelona, 4 days") - used on continuation turns where a
    /// destination answer is expected.
    pub fn destination(&self, text: &str, allow_bare: bool) -> Option<String> {
        for captures in self.destination_prep_re.captures_iter(text) {
            if let Some(place) = accept_destination(&captures[1]) {
                return Some(place);
            }
        }

        if allow_bare {
            if let Some(captures) = self.destination_bare_re.captures(text.trim()) {
                if let Some(place) = accept_destination(&captures[1]) {
                    return Some(place);
                }
            }
        }

        None
    }
}

impl Default for SlotExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_amount(raw: &str) -> Option<f64> {
    let value: f64 = raw.replace(',', "").parse().ok()?;
    (value > 0.0).then_some(value)
}

fn normalize_currency_token(token: &str) -> Option<String> {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return None;
    }

    let lower = trimmed.to_lowercase();
    if let Some((_, code)) = CURRENCY_ALIASES.iter().find(|(alias, _)| *alias == lower) {
        return Some((*code).to_string());
    }

    // Bare 3-letter codes: uppercase always accepted, lowercase only for
    // known codes so that e.g. "fly to her" never reads as a pair
    if trimmed.len() == 3 && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
        if trimmed.chars().all(|c| c.is_ascii_uppercase()) {
            return Some(trimmed.to_string());
        }
        if KNOWN_CODES.contains(&lower.as_str()) {
            return Some(lower.to_uppercase());
        }
    }

    None
}

fn canonical_interest(word: &str) -> String {
    let lower = word.to_lowercase();
    match lower.as_str() {
        "restaurant" | "restaurants" => "food".to_string(),
        "historical" => "history".to_string(),
        "beach" => "beaches".to_string(),
        "museum" => "museums".to_string(),
        "temple" => "temples".to_string(),
        "market" => "markets".to_string(),
        "sport" => "sports".to_string(),
        other => other.to_string(),
    }
}

fn accept_destination(candidate: &str) -> Option<String> {
    let first_word = candidate.split_whitespace().next()?;
    if DESTINATION_STOPLIST.contains(&first_word) {
        return None;
    }
    Some(candidate.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> SlotExtractor {
        SlotExtractor::new()
    }

    #[test]
    fn test_amount_extraction() {
        let ex = extractor();
        assert_eq!(ex.amount("100"), Some(100.0));
        assert_eq!(ex.amount("1,200.50"), Some(1200.5));
        assert_eq!(ex.amount("convert 250 please"), Some(250.0));
        assert_eq!(ex.amount("no numbers here"), None);
    }

    #[test]
    fn test_day_counter_is_not_an_amount() {
        let ex = extractor();
        assert_eq!(ex.amount("what about day 3"), None);
        // With a currency marker the number is an amount again
        assert_eq!(ex.amount("day 3 costs 50 usd"), Some(3.0));
    }

    #[test]
    fn test_pair_extraction() {
        let ex = extractor();
        assert_eq!(
            ex.currency_pair("USD to EUR"),
            Some(CurrencyPair::new("USD", "EUR"))
        );
        assert_eq!(
            ex.currency_pair("eur/gbp"),
            Some(CurrencyPair::new("EUR", "GBP"))
        );
        assert_eq!(
            ex.currency_pair("dollars to euros"),
            Some(CurrencyPair::new("USD", "EUR"))
        );
        assert_eq!(
            ex.currency_pair("$ to €"),
            Some(CurrencyPair::new("USD", "EUR"))
        );
        assert_eq!(ex.currency_pair("USD to USD"), None);
    }

    #[test]
    fn test_pair_rejects_ordinary_words() {
        let ex = extractor();
        assert_eq!(ex.currency_pair("fly to her place"), None);
        assert_eq!(ex.currency_pair("4 days in Paris"), None);
    }

    #[test]
    fn test_full_query_extraction() {
        let ex = extractor();
        assert_eq!(
            ex.currency_query("convert 100 usd to eur"),
            Some((100.0, CurrencyPair::new("USD", "EUR")))
        );
        assert_eq!(
            ex.currency_query("1,200 $ to €"),
            Some((1200.0, CurrencyPair::new("USD", "EUR")))
        );
        assert_eq!(
            ex.currency_query("USD to EUR 100"),
            Some((100.0, CurrencyPair::new("USD", "EUR")))
        );
        assert_eq!(ex.currency_query("just 100"), None);
    }

    #[test]
    fn test_duration_extraction() {
        let ex = extractor();
        assert_eq!(ex.duration_days("4 days"), Some(4));
        assert_eq!(ex.duration_days("staying 3 nights"), Some(3));
        assert_eq!(ex.duration_days("a week"), Some(7));
        assert_eq!(ex.duration_days("two weeks in spain"), Some(14));
        assert_eq!(ex.duration_days("someday"), None);
    }

    #[test]
    fn test_party_size_extraction() {
        let ex = extractor();
        assert_eq!(ex.party_size("family of 4"), Some(4));
        assert_eq!(ex.party_size("there are 2 of us"), Some(2));
        assert_eq!(ex.party_size("traveling solo"), Some(1));
        assert_eq!(ex.party_size("a couple"), Some(2));
        assert_eq!(ex.party_size("nothing"), None);
    }

    #[test]
    fn test_budget_and_pace() {
        let ex = extractor();
        assert_eq!(ex.budget_tier("on a budget"), Some(BudgetTier::Budget));
        assert_eq!(ex.budget_tier("mid-range hotels"), Some(BudgetTier::MidRange));
        assert_eq!(ex.budget_tier("luxury all the way"), Some(BudgetTier::Luxury));
        assert_eq!(ex.pace("keep it relaxed"), Some(Pace::Relaxed));
        assert_eq!(ex.pace("packed schedule please"), Some(Pace::Packed));
        assert_eq!(ex.pace("tell me a story"), None);
    }

    #[test]
    fn test_interest_extraction() {
        let ex = extractor();
        let interests = ex.interests("we love food, museums and a bit of nightlife");
        assert_eq!(interests, vec!["food", "museums", "nightlife"]);

        assert!(ex.skips_interests("skip"));
        assert!(ex.skips_interests("no preference really"));
        assert!(!ex.skips_interests("food and wine"));
    }

    #[test]
    fn test_destination_with_preposition() {
        let ex = extractor();
        assert_eq!(
            ex.destination("Plan a trip to Barcelona for 4 days", false),
            Some("Barcelona".to_string())
        );
        assert_eq!(
            ex.destination("what to do in New York", false),
            Some("New York".to_string())
        );
        // Month names are not destinations
        assert_eq!(ex.destination("weather in January", false), None);
    }

    #[test]
    fn test_destination_bare() {
        let ex = extractor();
        assert_eq!(ex.destination("Paris", true), Some("Paris".to_string()));
        assert_eq!(
            ex.destination("Barcelona, 4 days", true),
            Some("Barcelona".to_string())
        );
        assert_eq!(ex.destination("Paris", false), None);
        assert_eq!(ex.destination("100", true), None);
    }
}
