//! # Plan refinement loop
//!
//! Plan, critique, and refine until the critic approves or the iteration
//! cap is reached:
//!
//! ```text
//! iteration 1:  planner(context)          -> plan     critic(plan) -> verdict
//! iteration k:  refiner(plan, critique)   -> plan     critic(plan) -> verdict
//! ```
//!
//! Reaching the cap is not a failure; the last plan is returned as is.
//! Provider errors are returned to the caller without retry.

use crate::config::ChefConfig;
use crate::critique::Critique;
use crate::roles::{self, AgentRole};
use chef_core::{LlmProvider, UsageTracker};
use chef_error::Result;
use tracing::{debug, info, instrument};

/// One plan/critique round
#[derive(Debug, Clone)]
pub struct PlanIteration {
    pub iteration: usize,
    pub plan: String,
    pub critique: Critique,
}

#[derive(Debug, Clone)]
pub struct RefinementOutcome {
    /// The last plan produced
    pub plan: String,
    pub iterations: Vec<PlanIteration>,
    pub approved_by_critic: bool,
}

impl RefinementOutcome {
    pub fn final_critique(&self) -> Option<&Critique> {
        self.iterations.last().map(|i| &i.critique)
    }
}

pub struct RefinementLoop<'a, P: LlmProvider> {
    provider: &'a P,
    config: &'a ChefConfig,
}

impl<'a, P: LlmProvider> RefinementLoop<'a, P> {
    pub fn new(provider: &'a P, config: &'a ChefConfig) -> Self {
        Self { provider, config }
    }

    #[instrument(skip_all, fields(max_iterations = self.config.max_iterations))]
    pub async fn run(&self, context: &str, usage: &mut UsageTracker) -> Result<RefinementOutcome> {
        let max_iterations = self.config.max_iterations.max(1);
        let mut iterations: Vec<PlanIteration> = Vec::with_capacity(max_iterations);

        for iteration in 1..=max_iterations {
            let plan = match iterations.last() {
                None => self.generate(context, usage).await?,
                Some(previous) => self.refine(context, previous, usage).await?,
            };
            let critique = self.critique(context, &plan, usage).await?;
            let approved = critique.is_approved();
            debug!(iteration, verdict = %critique.verdict, "plan critiqued");

            iterations.push(PlanIteration {
                iteration,
                plan,
                critique,
            });

            if approved {
                break;
            }
        }

        let approved_by_critic = iterations
            .last()
            .map(|i| i.critique.is_approved())
            .unwrap_or(false);
        let plan = iterations
            .last()
            .map(|i| i.plan.clone())
            .unwrap_or_default();
        info!(
            iterations = iterations.len(),
            approved_by_critic, "refinement finished"
        );

        Ok(RefinementOutcome {
            plan,
            iterations,
            approved_by_critic,
        })
    }

    async fn generate(&self, context: &str, usage: &mut UsageTracker) -> Result<String> {
        let prompt = format!("{}\n\nCreate the meal plan for this request.", context);
        let request = AgentRole::Planner.request(prompt, self.config);
        let response = roles::complete(self.provider, AgentRole::Planner, request, usage).await?;
        roles::reply_text(AgentRole::Planner, &response)
    }

    async fn critique(&self, context: &str, plan: &str, usage: &mut UsageTracker) -> Result<Critique> {
        let prompt = format!("{}\n\nMeal plan to evaluate:\n\n{}", context, plan);
        let request = AgentRole::Critic
            .request(prompt, self.config)
            .with_response_schema(Critique::schema());
        let response = roles::complete(self.provider, AgentRole::Critic, request, usage).await?;
        Ok(Critique::parse(&roles::reply_text(AgentRole::Critic, &response)?))
    }

    async fn refine(
        &self,
        context: &str,
        previous: &PlanIteration,
        usage: &mut UsageTracker,
    ) -> Result<String> {
        let prompt = format!(
            "{}\n\nCurrent meal plan:\n\n{}\n\nCritic feedback:\n\n{}",
            context, previous.plan, previous.critique
        );
        let request = AgentRole::Refiner.request(prompt, self.config);
        let response = roles::complete(self.provider, AgentRole::Refiner, request, usage).await?;
        roles::reply_text(AgentRole::Refiner, &response)
    }
}
