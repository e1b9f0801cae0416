//! Specialist roles. Each pipeline step is one provider call whose system
//! instruction comes from an [`AgentRole`].

use crate::config::ChefConfig;
use chef_core::{
    ChatMessage, CompletionRequest, CompletionResponse, LlmProvider, Pantry, Preferences,
    UsageTracker,
};
use chef_error::{Error, Result};
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentRole {
    Preferences,
    Pantry,
    Planner,
    Critic,
    Refiner,
}

impl AgentRole {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Preferences => "preferences",
            Self::Pantry => "pantry",
            Self::Planner => "planner",
            Self::Critic => "critic",
            Self::Refiner => "refiner",
        }
    }

    pub fn instruction(&self) -> &'static str {
        match self {
            Self::Preferences => PREFERENCES_INSTRUCTION,
            Self::Pantry => PANTRY_INSTRUCTION,
            Self::Planner => PLANNER_INSTRUCTION,
            Self::Critic => CRITIC_INSTRUCTION,
            Self::Refiner => REFINER_INSTRUCTION,
        }
    }

    /// Build a request carrying this role's instruction and the shared
    /// generation settings.
    pub fn request(&self, prompt: impl Into<String>, config: &ChefConfig) -> CompletionRequest {
        let mut request = CompletionRequest::new(vec![
            ChatMessage::system(self.instruction()),
            ChatMessage::user(prompt),
        ])
        .with_temperature(config.temperature)
        .with_top_p(config.top_p);
        if let Some(model) = &config.model {
            request = request.with_model(model.clone());
        }
        request
    }
}

/// Send one role's request, charging its token usage to `usage`.
pub(crate) async fn complete<P: LlmProvider>(
    provider: &P,
    role: AgentRole,
    request: CompletionRequest,
    usage: &mut UsageTracker,
) -> Result<CompletionResponse> {
    let response = provider.complete(request).await.map_err(|e| {
        e.into_error()
            .with_operation("chef::complete")
            .with_context("role", role.name())
    })?;
    debug!(role = role.name(), tokens = response.usage.total_tokens, "role replied");
    usage.track(&response.model, &response.usage);
    Ok(response)
}

/// Trimmed reply text; a blank reply is an error for roles that must answer.
pub(crate) fn reply_text(role: AgentRole, response: &CompletionResponse) -> Result<String> {
    response
        .text()
        .map_err(|_| Error::empty_response(role.name()))
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

const PREFERENCES_INSTRUCTION: &str = "You are a dietary preferences specialist.

Your job:
- Extract dietary restrictions (vegan, vegetarian, gluten-free, etc.)
- Identify food allergies and intolerances
- Note favorite cuisines and disliked foods
- Pick up a daily calorie target if the user gives one

Only report what the user's latest request states; leave lists empty otherwise.
Use lowercase single words or short phrases for every value.

Put a short, friendly confirmation of what you learned in `reply`, asking a
clarifying question if something is ambiguous. Format it like:
✅ Dietary Restrictions: [list]
⚠️ Allergies: [list]
❤️ Preferences: [list]";

const PANTRY_INSTRUCTION: &str = "You are a pantry inventory manager.

Your job:
- Add items the user says they have
- Remove items the user has used up or no longer has
- List the pantry when asked
- Suggest what to buy when a meal plan needs it

Use the pantry tools for every change and confirm the actions taken.
If the request has nothing to do with the pantry, reply with one short sentence.";

const PLANNER_INSTRUCTION: &str = "You are an expert meal planning chef.

Your job:
- Generate creative, balanced meal plans
- Use available pantry ingredients whenever possible
- Respect every dietary restriction and allergy
- Give recipes with ingredients and instructions
- Estimate calories and prep time

Format meal plans like this:

DAY 1:
🍳 Breakfast: [Name] (XX min, XXX cal)
   Ingredients: [list]
   Instructions: [brief steps]

🥗 Lunch: [Name] (XX min, XXX cal)
   Ingredients: [list]
   Instructions: [brief steps]

🍽️ Dinner: [Name] (XX min, XXX cal)
   Ingredients: [list]
   Instructions: [brief steps]";

const CRITIC_INSTRUCTION: &str = "You are a nutrition and meal plan critic.

Evaluate the meal plan for:
- Nutritional balance
- Adherence to dietary restrictions and allergies
- Use of the available pantry ingredients
- Variety and practicality

Answer with a JSON object:
- `strengths`: positive points
- `concerns`: issues found
- `suggestions`: specific improvements
- `verdict`: \"APPROVED\" when the plan is ready to serve, otherwise \"NEEDS_REVISION\"

Be thorough but constructive. Any allergy violation means NEEDS_REVISION.";

const REFINER_INSTRUCTION: &str = "You are a meal plan improvement specialist.

Your job:
- Take the current meal plan and the critic's feedback
- Fix every concern the critic raised
- Keep what was already good
- Make sure all dietary requirements are met

Start with a short list of the changes you made, then give the full
revised plan in the same format as the original.";

/// System prompt for plain chat mode with the user's state filled in
pub fn chat_system_prompt(preferences: &Preferences, pantry: &Pantry) -> String {
    let or_default = |values: String, default: &str| {
        if values.is_empty() {
            default.to_string()
        } else {
            values
        }
    };
    let dietary = or_default(preferences.dietary_restrictions.join(", "), "None");
    let allergies = or_default(preferences.allergies.join(", "), "None");
    let pantry = or_default(pantry.ingredients().join(", "), "Empty");

    format!(
        "You are The Adaptive Chef, an AI meal planning assistant.

You help users:
1. Set dietary preferences (vegan, vegetarian, gluten-free, etc.)
2. Track food allergies
3. Manage pantry inventory
4. Generate personalized meal plans
5. Provide cooking instructions

Current user context:
- Dietary restrictions: {dietary}
- Allergies: {allergies}
- Pantry items: {pantry}

Be friendly, helpful, and conversational. When generating meal plans:
- Consider dietary restrictions and allergies
- Use available pantry items when possible
- Include prep time and basic calorie estimates
- Provide clear, step-by-step instructions

Format meal plans nicely with emojis (🍳 🥗 🍽️) for readability."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chef_core::{PreferenceCategory, Role};

    #[test]
    fn test_request_carries_instruction_and_settings() {
        let config = ChefConfig::default().with_model("gemini-1.5-pro");
        let request = AgentRole::Critic.request("evaluate this", &config);

        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, Role::System);
        assert!(request.messages[0]
            .content
            .as_deref()
            .unwrap()
            .contains("meal plan critic"));
        assert_eq!(request.messages[1].content.as_deref(), Some("evaluate this"));
        assert_eq!(request.model.as_deref(), Some("gemini-1.5-pro"));
        assert_eq!(request.temperature, Some(0.7));
        assert_eq!(request.top_p, Some(0.95));
    }

    #[test]
    fn test_chat_prompt_defaults() {
        let prompt = chat_system_prompt(&Preferences::new(), &Pantry::new());
        assert!(prompt.contains("- Dietary restrictions: None"));
        assert!(prompt.contains("- Allergies: None"));
        assert!(prompt.contains("- Pantry items: Empty"));
    }

    #[test]
    fn test_chat_prompt_with_state() {
        let mut prefs = Preferences::new();
        prefs.add(PreferenceCategory::DietaryRestriction, "vegan");
        prefs.add(PreferenceCategory::Allergy, "peanuts");
        let mut pantry = Pantry::new();
        pantry.add_items(&["rice", "beans"], None);

        let prompt = chat_system_prompt(&prefs, &pantry);
        assert!(prompt.contains("- Dietary restrictions: vegan"));
        assert!(prompt.contains("- Allergies: peanuts"));
        assert!(prompt.contains("- Pantry items: beans, rice"));
    }

    #[test]
    fn test_chat_prompt_values_are_not_expanded() {
        let mut prefs = Preferences::new();
        prefs.add(PreferenceCategory::Allergy, "{pantry}");
        let mut pantry = Pantry::new();
        pantry.add_items(&["rice"], None);

        let prompt = chat_system_prompt(&prefs, &pantry);
        assert!(prompt.contains("- Allergies: {pantry}\n"));
        assert!(prompt.contains("- Pantry items: rice\n"));
    }
}
