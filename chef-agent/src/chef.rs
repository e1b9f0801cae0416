//! Chef orchestrates one request through the specialist roles:
//! 1. Context is built from the session (preferences, pantry, request)
//! 2. The preferences role extracts dietary facts as structured JSON
//! 3. The pantry role updates the inventory through tool calls
//! 4. Plan requests go through the refinement loop and the approval gate
//!
//! All state lives in the [`Session`] passed to each call.

use crate::approval::{ApprovalGate, ApprovalResult, AutoApprove};
use crate::config::ChefConfig;
use crate::context::{inject_context, wants_plan};
use crate::critique::json_payload;
use crate::refinement::{RefinementLoop, RefinementOutcome};
use crate::roles::{self, AgentRole};
use crate::tools::{execute_tool, pantry_tools};
use chef_core::{
    extract_keywords, ChatMessage, LlmProvider, PreferenceUpdate, Session, UsageTracker,
};
use chef_error::Result;
use serde::Deserialize;
use serde_json::json;
use std::fmt;
use tracing::{debug, info, instrument, warn};

/// Structured reply of the preferences role
#[derive(Debug, Deserialize)]
struct PreferencesReply {
    #[serde(default)]
    reply: String,
    #[serde(flatten)]
    update: PreferenceUpdate,
}

fn preferences_schema() -> serde_json::Value {
    let list = json!({ "type": "array", "items": { "type": "string" } });
    json!({
        "type": "object",
        "properties": {
            "reply": { "type": "string" },
            "dietary_restrictions": list,
            "allergies": list,
            "favorite_cuisines": list,
            "disliked_foods": list,
            "calorie_target": { "type": "integer", "nullable": true }
        },
        "required": ["reply"]
    })
}

/// A finished plan and what the gate made of it
#[derive(Debug, Clone)]
pub struct PlanResult {
    pub outcome: RefinementOutcome,
    pub approval: ApprovalResult,
}

/// Everything one request produced, rendered for the terminal via `Display`
#[derive(Debug, Clone, Default)]
pub struct ChefReply {
    pub preferences: Option<String>,
    pub pantry: Option<String>,
    pub plan: Option<PlanResult>,
}

impl fmt::Display for ChefReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sections: Vec<String> = Vec::new();
        sections.extend(self.preferences.clone());
        sections.extend(self.pantry.clone());
        if let Some(plan) = &self.plan {
            sections.push(plan.outcome.plan.clone());
            sections.push(plan.approval.note());
        }
        write!(f, "{}", sections.join("\n\n"))
    }
}

pub struct Chef<P: LlmProvider, G: ApprovalGate = AutoApprove> {
    pub(crate) provider: P,
    gate: G,
    pub(crate) config: ChefConfig,
    pub(crate) usage: UsageTracker,
}

impl<P: LlmProvider> Chef<P, AutoApprove> {
    pub fn new(provider: P) -> Self {
        Self::with_config(provider, ChefConfig::default())
    }

    pub fn with_config(provider: P, config: ChefConfig) -> Self {
        Self {
            provider,
            gate: AutoApprove,
            config,
            usage: UsageTracker::new(),
        }
    }
}

impl<P: LlmProvider, G: ApprovalGate> Chef<P, G> {
    /// Swap the approval gate
    pub fn with_gate<H: ApprovalGate>(self, gate: H) -> Chef<P, H> {
        Chef {
            provider: self.provider,
            gate,
            config: self.config,
            usage: self.usage,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn config(&self) -> &ChefConfig {
        &self.config
    }

    /// Token usage accumulated across every call so far
    pub fn usage(&self) -> &UsageTracker {
        &self.usage
    }

    /// Run one user request through the full pipeline.
    #[instrument(skip(self, session), fields(session_id = %session.id))]
    pub async fn process_request(&mut self, session: &mut Session, input: &str) -> Result<ChefReply> {
        let context = inject_context(session, input);

        let preferences = self.update_preferences(session, &context, input).await?;
        let pantry = self.manage_pantry(session, &context).await?;

        let plan = if wants_plan(input) {
            let context = inject_context(session, input);
            let outcome = RefinementLoop::new(&self.provider, &self.config)
                .run(&context, &mut self.usage)
                .await?;
            let approval = self.gate.review(&outcome.plan).await;
            if approval.approved {
                session.history.push(outcome.plan.clone());
                info!(history = session.history.len(), "meal plan saved");
            } else {
                warn!(feedback = %approval.feedback, "meal plan rejected");
            }
            Some(PlanResult { outcome, approval })
        } else {
            None
        };

        Ok(ChefReply {
            preferences: Some(preferences),
            pantry,
            plan,
        })
    }

    async fn update_preferences(
        &mut self,
        session: &mut Session,
        context: &str,
        input: &str,
    ) -> Result<String> {
        let role = AgentRole::Preferences;
        let request = role
            .request(context, &self.config)
            .with_response_schema(preferences_schema());
        let response = roles::complete(&self.provider, role, request, &mut self.usage).await?;
        let text = roles::reply_text(role, &response)?;

        let (message, update) = match serde_json::from_str::<PreferencesReply>(json_payload(&text)) {
            Ok(parsed) => (parsed.reply, parsed.update),
            Err(e) => {
                debug!(error = %e, "unstructured preferences reply, using keywords");
                (text.clone(), extract_keywords(input))
            }
        };

        let updated = session.preferences.merge(&update);
        if !updated.is_empty() {
            info!(fields = ?updated, "preferences updated");
        }
        Ok(message)
    }

    async fn manage_pantry(&mut self, session: &mut Session, context: &str) -> Result<Option<String>> {
        let role = AgentRole::Pantry;
        let mut request = role.request(context, &self.config).with_tools(pantry_tools());
        let mut last_results: Vec<String> = Vec::new();

        for round in 0..=self.config.max_tool_rounds {
            let response =
                roles::complete(&self.provider, role, request.clone(), &mut self.usage).await?;

            if response.tool_calls.is_empty() {
                let text = response.content.as_deref().map(str::trim).unwrap_or_default();
                if text.is_empty() {
                    return Ok((!last_results.is_empty()).then(|| last_results.join("\n")));
                }
                return Ok(Some(text.to_string()));
            }

            if round == self.config.max_tool_rounds {
                warn!(rounds = round, "pantry tool rounds exhausted");
                break;
            }

            request.messages.push(ChatMessage::assistant_tool_calls(
                response.content.clone(),
                response.tool_calls.clone(),
            ));
            last_results.clear();
            for call in &response.tool_calls {
                let result = execute_tool(&mut session.pantry, call);
                request
                    .messages
                    .push(ChatMessage::tool_result(call.id.clone(), result.clone()));
                last_results.push(result);
            }
            debug!(round, calls = response.tool_calls.len(), "pantry tools executed");
        }

        Ok((!last_results.is_empty()).then(|| last_results.join("\n")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedProvider;
    use chef_core::{ProviderError, Role, MAX_HISTORY};
    use chef_error::ErrorKind;

    const PREFS_NONE: &str = r#"{"reply": "Noted!"}"#;
    const APPROVE: &str = r#"{"strengths": ["uses pantry"], "verdict": "APPROVED"}"#;

    struct RejectAll;

    impl ApprovalGate for RejectAll {
        async fn review(&self, _plan: &str) -> ApprovalResult {
            ApprovalResult::rejected("not today")
        }
    }

    #[tokio::test]
    async fn test_structured_preferences_are_merged() {
        let provider = ScriptedProvider::new()
            .text(r#"{"reply": "✅ Dietary Restrictions: vegan", "dietary_restrictions": ["Vegan"], "allergies": ["peanuts"], "calorie_target": 1800}"#)
            .text("Nothing to change in your pantry.");
        let mut chef = Chef::new(provider);
        let mut session = Session::new("s");

        let reply = chef
            .process_request(&mut session, "Hi! I'm vegan and allergic to peanuts.")
            .await
            .unwrap();

        assert_eq!(session.preferences.dietary_restrictions, vec!["vegan"]);
        assert_eq!(session.preferences.allergies, vec!["peanuts"]);
        assert_eq!(session.preferences.calorie_target, Some(1800));
        assert!(reply.plan.is_none());
        assert_eq!(
            reply.to_string(),
            "✅ Dietary Restrictions: vegan\n\nNothing to change in your pantry."
        );
        assert_eq!(chef.usage().total_calls, 2);

        let requests = chef.provider().requests();
        assert!(requests[0].response_schema.is_some());
        assert!(requests[1].tools.is_some());
    }

    #[tokio::test]
    async fn test_fractional_calorie_target_keeps_structured_reply() {
        let provider = ScriptedProvider::new()
            .text(r#"{"reply": "Got it, 1800 a day.", "calorie_target": 1800.0}"#)
            .text("ok");
        let mut chef = Chef::new(provider);
        let mut session = Session::new("s");

        let reply = chef
            .process_request(&mut session, "Keep me around 1800 calories")
            .await
            .unwrap();

        assert_eq!(session.preferences.calorie_target, Some(1800));
        assert_eq!(reply.preferences.as_deref(), Some("Got it, 1800 a day."));
    }

    #[tokio::test]
    async fn test_unstructured_preferences_fall_back_to_keywords() {
        let provider = ScriptedProvider::new()
            .text("Great, you're vegan and vegan again!")
            .text("ok");
        let mut chef = Chef::new(provider);
        let mut session = Session::new("s");

        let reply = chef
            .process_request(&mut session, "I'm vegan, totally vegan, allergic to shellfish!")
            .await
            .unwrap();

        assert_eq!(session.preferences.dietary_restrictions, vec!["vegan"]);
        assert_eq!(session.preferences.allergies, vec!["shellfish"]);
        assert_eq!(
            reply.preferences.as_deref(),
            Some("Great, you're vegan and vegan again!")
        );
    }

    #[tokio::test]
    async fn test_pantry_tool_calls_mutate_session() {
        let provider = ScriptedProvider::new()
            .text(PREFS_NONE)
            .tool_call(
                "add_to_pantry",
                json!({"items": ["rice", "beans", "tomatoes", "spinach"]}),
            )
            .text("Added rice, beans, tomatoes and spinach.");
        let mut chef = Chef::new(provider);
        let mut session = Session::new("s");

        let reply = chef
            .process_request(&mut session, "Add rice, beans, tomatoes, and spinach to my pantry")
            .await
            .unwrap();

        assert_eq!(session.pantry.len(), 4);
        assert_eq!(session.pantry.get("spinach").unwrap().quantity, "1");
        assert_eq!(
            reply.pantry.as_deref(),
            Some("Added rice, beans, tomatoes and spinach.")
        );

        let requests = chef.provider().requests();
        let followup = &requests[2].messages;
        assert_eq!(followup.len(), 4);
        assert_eq!(followup[2].role, Role::Assistant);
        assert_eq!(followup[3].role, Role::Tool);
        assert_eq!(
            followup[3].content.as_deref(),
            Some("✅ Added 4 items to pantry: rice, beans, tomatoes, spinach")
        );
    }

    #[tokio::test]
    async fn test_pantry_tool_rounds_are_bounded() {
        let mut provider = ScriptedProvider::new().text(PREFS_NONE);
        for _ in 0..6 {
            provider = provider.tool_call("list_pantry", json!({}));
        }
        let mut chef = Chef::new(provider);
        let mut session = Session::new("s");

        let reply = chef
            .process_request(&mut session, "what is in my pantry?")
            .await
            .unwrap();

        // 1 preferences call + 4 tool rounds + the final call that is cut off
        assert_eq!(chef.provider().call_count(), 6);
        assert_eq!(reply.pantry.as_deref(), Some("🔍 Your pantry is empty"));
    }

    #[tokio::test]
    async fn test_plan_request_runs_loop_and_saves_history() {
        let provider = ScriptedProvider::new()
            .text(PREFS_NONE)
            .empty()
            .text("DAY 1: rice and beans")
            .text(APPROVE);
        let mut chef = Chef::new(provider);
        let mut session = Session::new("s");
        session.pantry.add_items(&["rice", "beans"], None);

        let reply = chef
            .process_request(&mut session, "Create a 3-day meal plan using my pantry items")
            .await
            .unwrap();

        let plan = reply.plan.as_ref().unwrap();
        assert!(plan.outcome.approved_by_critic);
        assert!(plan.approval.approved);
        assert_eq!(session.history.len(), 1);
        assert_eq!(
            session.history.latest().map(|e| e.plan.as_str()),
            Some("DAY 1: rice and beans")
        );
        assert!(reply
            .to_string()
            .ends_with("DAY 1: rice and beans\n\n✅ Meal plan approved and saved to your history!"));

        let planner_prompt = chef.provider().requests()[2].messages[1]
            .content
            .clone()
            .unwrap();
        assert!(planner_prompt.contains("📦 Your Pantry (2 items):"));
        assert!(planner_prompt.contains("📝 User Request: Create a 3-day meal plan"));
    }

    #[tokio::test]
    async fn test_unapproved_plan_is_still_auto_approved() {
        let revise = r#"{"verdict": "NEEDS_REVISION"}"#;
        let provider = ScriptedProvider::new()
            .text(PREFS_NONE)
            .empty()
            .text("plan 1")
            .text(revise)
            .text("plan 2")
            .text(revise)
            .text("plan 3")
            .text(revise);
        let mut chef = Chef::new(provider);
        let mut session = Session::new("s");

        let reply = chef.process_request(&mut session, "plan dinners").await.unwrap();

        let plan = reply.plan.unwrap();
        assert!(!plan.outcome.approved_by_critic);
        assert!(plan.approval.approved);
        assert_eq!(session.history.latest().map(|e| e.plan.as_str()), Some("plan 3"));
        assert_eq!(chef.provider().call_count(), 8);
    }

    #[tokio::test]
    async fn test_rejecting_gate_keeps_history_empty() {
        let provider = ScriptedProvider::new()
            .text(PREFS_NONE)
            .empty()
            .text("plan 1")
            .text(APPROVE);
        let mut chef = Chef::new(provider).with_gate(RejectAll);
        let mut session = Session::new("s");

        let reply = chef.process_request(&mut session, "generate a plan").await.unwrap();

        assert!(session.history.is_empty());
        assert!(reply
            .to_string()
            .ends_with("❌ Meal plan needs revision: not today"));
    }

    #[tokio::test]
    async fn test_history_is_bounded_across_requests() {
        let mut provider = ScriptedProvider::new();
        for i in 0..12 {
            provider = provider
                .text(PREFS_NONE)
                .empty()
                .text(&format!("plan {}", i))
                .text(APPROVE);
        }
        let mut chef = Chef::new(provider);
        let mut session = Session::new("s");

        for _ in 0..12 {
            chef.process_request(&mut session, "meal plan please").await.unwrap();
        }

        assert_eq!(session.history.len(), MAX_HISTORY);
        let plans: Vec<&str> = session.history.entries().map(|e| e.plan.as_str()).collect();
        assert_eq!(plans.first(), Some(&"plan 2"));
        assert_eq!(plans.last(), Some(&"plan 11"));
    }

    #[tokio::test]
    async fn test_provider_error_fails_the_request() {
        let provider = ScriptedProvider::new().error(ProviderError::AuthenticationFailed);
        let mut chef = Chef::new(provider);
        let mut session = Session::new("s");

        let err = chef.process_request(&mut session, "hello").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthenticationFailed);
        assert!(session.preferences.is_empty());
    }
}
