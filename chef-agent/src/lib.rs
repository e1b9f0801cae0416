//! # Chef Agent
//!
//! The agent turns a user message into calls against the model:
//! 1. Context is injected from the user's session
//! 2. The preferences role records dietary facts
//! 3. The pantry role manages inventory with tools
//! 4. Plan requests loop planner -> critic -> refiner until approved
//! 5. The approval gate decides whether the plan lands in history
//!
//! A plain chat mode skips the roles and streams a single reply.

mod approval;
mod chat;
mod chef;
mod config;
mod context;
mod critique;
mod refinement;
mod roles;
mod tools;

#[cfg(test)]
mod testing;

pub use approval::{ApprovalGate, ApprovalResult, AutoApprove};
pub use chat::{apply_keywords, build_chat_prompt};
pub use chef::{Chef, ChefReply, PlanResult};
pub use config::ChefConfig;
pub use context::{inject_context, wants_plan};
pub use critique::{Critique, Verdict, APPROVAL_MARKER};
pub use refinement::{PlanIteration, RefinementLoop, RefinementOutcome};
pub use roles::{chat_system_prompt, AgentRole};
pub use tools::{execute_tool, pantry_tools, ADD_TO_PANTRY, LIST_PANTRY, REMOVE_FROM_PANTRY};
