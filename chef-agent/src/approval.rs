//! Approval gate between the refinement loop and the user's history

use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalResult {
    pub approved: bool,
    pub feedback: String,
}

impl ApprovalResult {
    pub fn approved(feedback: impl Into<String>) -> Self {
        Self {
            approved: true,
            feedback: feedback.into(),
        }
    }

    pub fn rejected(feedback: impl Into<String>) -> Self {
        Self {
            approved: false,
            feedback: feedback.into(),
        }
    }

    /// Line appended to the reply shown to the user
    pub fn note(&self) -> String {
        if self.approved {
            "✅ Meal plan approved and saved to your history!".to_string()
        } else {
            format!("❌ Meal plan needs revision: {}", self.feedback)
        }
    }
}

/// Decides whether a finished plan is kept.
#[allow(async_fn_in_trait)]
pub trait ApprovalGate: Send + Sync {
    async fn review(&self, plan: &str) -> ApprovalResult;
}

/// Approves every plan immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApprove;

impl ApprovalGate for AutoApprove {
    async fn review(&self, plan: &str) -> ApprovalResult {
        info!(plan_chars = plan.len(), "meal plan auto-approved");
        ApprovalResult::approved("Looks great! Approved.")
    }
}
