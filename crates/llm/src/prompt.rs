//! Prompt building for the travel assistant.
//!
//! The system prompt carries the no-fabricated-numbers policy, but the
//! actual guarantee is enforced by the dialogue policy: tool-grounded paths
//! never reach the LLM for numeric content.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Prompt builder for the travel assistant
pub struct PromptBuilder {
    messages: Vec<Message>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
        }
    }

    /// Build the assistant system prompt
    pub fn system_prompt(mut self) -> Self {
        let system = r#"You are a friendly and practical travel-planning assistant.

## Your Role
- Help travelers plan itineraries, pick attractions, and pack sensibly
- Give seasonal weather guidance for trip planning
- Keep answers concrete and actionable

## Hard Rules
- NEVER invent exact temperatures, precipitation figures, or exchange rates.
  Numeric weather and currency data is supplied to you separately when it
  exists; when it does not, speak in qualitative, seasonal terms only.
- Never claim to have checked live data or searched the internet.
- Ask one question at a time when information is missing.

## Response Format
Respond in plain conversational prose. Short paragraphs or a compact
day-by-day list for itineraries. No preamble about what you are going to do."#;

        self.messages.push(Message::system(system));
        self
    }

    /// Add accumulated trip context
    pub fn with_trip_context(mut self, context: &str) -> Self {
        if !context.is_empty() {
            self.messages.push(Message::system(format!(
                "## Trip Context\n{context}\n\nUse this context; do not re-ask for details it already answers."
            )));
        }
        self
    }

    /// Add conversation history
    pub fn with_history(mut self, history: &[Message]) -> Self {
        self.messages.extend(history.iter().cloned());
        self
    }

    /// Task instruction: generate a fresh itinerary
    pub fn itinerary_task(mut self) -> Self {
        self.messages.push(Message::system(
            "## Task\nGenerate a day-by-day itinerary for the trip described in the context. \
             Balance the traveler's interests and pace. One compact paragraph per day.",
        ));
        self
    }

    /// Task instruction: refine a previously generated itinerary
    pub fn refinement_task(mut self, prior_itinerary: &str, instruction: &str) -> Self {
        self.messages.push(Message::system(format!(
            "## Task\nRevise the itinerary below according to the traveler's instruction. \
             Keep everything they did not ask to change.\n\n\
             ### Current Itinerary\n{prior_itinerary}\n\n\
             ### Instruction\n{instruction}"
        )));
        self
    }

    /// Task instruction: seasonal weather guidance, qualitative only
    pub fn seasonal_guidance_task(mut self, destination: &str) -> Self {
        self.messages.push(Message::system(format!(
            "## Task\nDescribe what the weather in {destination} is typically like around \
             this time of year: general warmth, rain likelihood, what to pack. \
             Qualitative guidance only - do NOT state exact temperatures, \
             precipitation amounts, or day-by-day figures."
        )));
        self
    }

    /// Add current user message
    pub fn user_message(mut self, message: &str) -> Self {
        self.messages.push(Message::user(message));
        self
    }

    /// Build final message list
    pub fn build(self) -> Vec<Message> {
        self.messages
    }

    /// Build with a context window limit
    ///
    /// Keeps all system messages and as many recent conversation messages
    /// as fit, dropping the oldest first.
    pub fn build_with_limit(self, max_tokens: usize) -> Vec<Message> {
        if self.estimate_tokens() <= max_tokens {
            return self.messages;
        }

        let (system_msgs, conv_msgs): (Vec<_>, Vec<_>) = self
            .messages
            .into_iter()
            .partition(|m| matches!(m.role, Role::System));

        let system_tokens: usize = system_msgs
            .iter()
            .map(|m| estimate_message_tokens(&m.content))
            .sum();
        let available = max_tokens.saturating_sub(system_tokens);

        let mut kept: Vec<Message> = Vec::new();
        let mut used = 0;
        for msg in conv_msgs.into_iter().rev() {
            let tokens = estimate_message_tokens(&msg.content);
            if used + tokens <= available {
                used += tokens;
                kept.push(msg);
            } else {
                break;
            }
        }
        kept.reverse();

        let mut result = system_msgs;
        result.extend(kept);

        tracing::debug!(
            kept = result.len(),
            tokens = system_tokens + used,
            "prompt truncated to context window"
        );

        result
    }

    /// Estimate token count for the current message list
    pub fn estimate_tokens(&self) -> usize {
        self.messages
            .iter()
            .map(|m| estimate_message_tokens(&m.content))
            .sum()
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn estimate_message_tokens(content: &str) -> usize {
    use unicode_segmentation::UnicodeSegmentation;

    // ~4 graphemes per token for latin-script text
    content.graphemes(true).count().max(1) / 4
}
