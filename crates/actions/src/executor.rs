//! Action-Plan Executor (§4.9): validates each step's type against the
//! allowlist, evaluates its condition against the prior step's outcome,
//! chains well-known result fields and offset expressions into later
//! steps' params, and dispatches to a vetted tool per [`ActionType`].

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;

use vc_domain::config::ActionsConfig;
use vc_domain::error::Result;
use vc_domain::trace::TraceEvent;
use vc_domain::types::{ActionPlan, ActionPlanStatus, ActionType, StepCondition, StepOutcome, StepResult};
use vc_persistence::provider::PersistenceClient;
use vc_persistence::types::ActionPlanRow;

use crate::audit::{AuditEvent, AuditLogEntry, AuditSink};
use crate::offset;
use crate::tools::ActionTool;

/// Result fields carried forward from one step's output into a later step's
/// params when that step sets `use_result_from`. Kept to a fixed, named set
/// rather than a blind merge so an unrelated field from a prior tool's
/// response can't leak into a step that didn't ask for it.
const WELL_KNOWN_RESULT_KEYS: &[&str] = &["meeting_id", "start_time", "join_link"];

pub struct ActionPlanExecutor {
    tools: HashMap<ActionType, Arc<dyn ActionTool>>,
    audit: Arc<dyn AuditSink>,
    config: ActionsConfig,
    persistence: Arc<dyn PersistenceClient>,
}

impl ActionPlanExecutor {
    pub fn new(
        tools: HashMap<ActionType, Arc<dyn ActionTool>>,
        audit: Arc<dyn AuditSink>,
        config: ActionsConfig,
        persistence: Arc<dyn PersistenceClient>,
    ) -> Self {
        Self { tools, audit, config, persistence }
    }

    /// Run every step of `plan` in order, mutating it in place with each
    /// step's outcome. Stops at the first failing step; a skipped step is
    /// not a failure and execution continues past it.
    ///
    /// Every step's `action_type` is validated against the allowlist before
    /// any step runs: an unregistered type anywhere in the plan rejects the
    /// whole plan up front rather than after earlier steps have already had
    /// real side effects (§4.9).
    pub async fn run(&self, plan: &mut ActionPlan) -> Result<()> {
        let steps = plan.steps.clone();

        let mut action_types = Vec::with_capacity(steps.len());
        for (index, step) in steps.iter().enumerate() {
            match ActionType::parse(&step.action_type) {
                Some(action_type) => action_types.push(action_type),
                None => {
                    return self
                        .fail(plan, format!("step {index} has unregistered action type '{}'", step.action_type))
                        .await;
                }
            }
        }

        plan.status = ActionPlanStatus::Running;
        plan.updated_at = Utc::now();
        self.audit
            .record(AuditLogEntry {
                tenant_id: plan.tenant_id.clone(),
                plan_id: plan.plan_id.clone(),
                event: AuditEvent::PlanStarted { step_count: plan.steps.len() },
                at: Utc::now(),
            })
            .await?;
        TraceEvent::ActionPlanStarted {
            plan_id: plan.plan_id.clone(),
            tenant_id: plan.tenant_id.clone(),
            step_count: plan.steps.len(),
        }
        .emit();

        for (index, step) in steps.iter().enumerate() {
            plan.current_step = index;
            let action_type = action_types[index];

            if !condition_met(step.condition, plan.step_results.last()) {
                plan.step_results.push(StepResult { step_index: index, outcome: StepOutcome::Skipped });
                continue;
            }

            let mut params = step.params.clone();
            if let Some(prior_index) = step.use_result_from {
                if let Some(StepResult { outcome: StepOutcome::Success { result }, .. }) = plan.step_results.get(prior_index) {
                    inject_well_known_keys(&mut params, result);
                }
            }
            apply_offset_expressions(&mut params)?;

            let outcome = self.execute_step(action_type, params).await;
            let ok = outcome.is_success();

            self.audit
                .record(AuditLogEntry {
                    tenant_id: plan.tenant_id.clone(),
                    plan_id: plan.plan_id.clone(),
                    event: AuditEvent::StepExecuted { step_index: index, action_type: action_type.as_str().to_string(), ok },
                    at: Utc::now(),
                })
                .await?;
            TraceEvent::ActionStepExecuted {
                plan_id: plan.plan_id.clone(),
                step_index: index,
                action_type: action_type.as_str().to_string(),
                ok,
            }
            .emit();

            plan.step_results.push(StepResult { step_index: index, outcome });
            if !ok {
                self.fail(plan, format!("step {index} ({}) failed", action_type.as_str())).await?;
                return Ok(());
            }
        }

        plan.status = ActionPlanStatus::Completed;
        plan.updated_at = Utc::now();
        self.finish(plan).await
    }

    async fn execute_step(&self, action_type: ActionType, params: serde_json::Value) -> StepOutcome {
        if self.config.dry_run {
            return StepOutcome::Success { result: serde_json::json!({"dry_run": true}) };
        }
        match self.tools.get(&action_type) {
            Some(tool) => match tool.execute(params).await {
                Ok(result) => StepOutcome::Success { result },
                Err(e) => StepOutcome::Failure { error: e.to_string() },
            },
            None => StepOutcome::Failure { error: format!("no tool registered for {}", action_type.as_str()) },
        }
    }

    async fn fail(&self, plan: &mut ActionPlan, error: String) -> Result<()> {
        plan.status = ActionPlanStatus::Failed;
        plan.error = Some(error);
        plan.updated_at = Utc::now();
        self.finish(plan).await
    }

    async fn finish(&self, plan: &ActionPlan) -> Result<()> {
        self.audit
            .record(AuditLogEntry {
                tenant_id: plan.tenant_id.clone(),
                plan_id: plan.plan_id.clone(),
                event: AuditEvent::PlanCompleted { status: format!("{:?}", plan.status) },
                at: Utc::now(),
            })
            .await?;
        TraceEvent::ActionPlanCompleted { plan_id: plan.plan_id.clone(), status: format!("{:?}", plan.status) }.emit();

        let row = ActionPlanRow {
            plan_id: plan.plan_id.clone(),
            tenant_id: plan.tenant_id.clone(),
            intent: plan.intent.clone(),
            context: plan.context.clone(),
            actions: serde_json::to_value(&plan.steps).unwrap_or(serde_json::Value::Null),
            status: plan.status,
            current_step: plan.current_step,
            step_results: plan.step_results.clone(),
            error: plan.error.clone(),
        };
        if let Err(e) = self.persistence.upsert_action_plan(row).await {
            tracing::warn!(plan_id = %plan.plan_id, error = %e, "failed to persist action plan");
        }

        Ok(())
    }
}

fn condition_met(condition: StepCondition, prior: Option<&StepResult>) -> bool {
    match condition {
        StepCondition::Always => true,
        StepCondition::IfPreviousSuccess => prior.map(|r| r.outcome.is_success()).unwrap_or(true),
        StepCondition::IfPreviousFailed => prior.map(|r| r.outcome.is_failure()).unwrap_or(false),
    }
}

fn inject_well_known_keys(params: &mut serde_json::Value, prior_result: &serde_json::Value) {
    let (Some(obj), Some(prior_obj)) = (params.as_object_mut(), prior_result.as_object()) else { return };
    for key in WELL_KNOWN_RESULT_KEYS {
        if let Some(value) = prior_obj.get(*key) {
            obj.insert(key.to_string(), value.clone());
        }
    }
}

/// Any `<field>_offset` param is applied against the absolute timestamp
/// already present under `<field>`, replacing it with the shifted time.
fn apply_offset_expressions(params: &mut serde_json::Value) -> Result<()> {
    let Some(obj) = params.as_object_mut() else { return Ok(()) };
    let mut resolved = Vec::new();
    for (key, value) in obj.iter() {
        let Some(base_key) = key.strip_suffix("_offset") else { continue };
        let Some(offset_raw) = value.as_str() else { continue };
        let Some(base_raw) = obj.get(base_key).and_then(|v| v.as_str()) else { continue };
        let base_time: chrono::DateTime<Utc> = base_raw
            .parse()
            .map_err(|_| vc_domain::error::Error::ActionNotAllowed(format!("'{base_key}' is not a valid timestamp")))?;
        let shifted = offset::apply_offset(base_time, offset_raw)?;
        resolved.push((base_key.to_string(), shifted.to_rfc3339()));
    }
    for (key, value) in resolved {
        obj.insert(key, serde_json::Value::String(value));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::NoopActionTool;
    use crate::audit::TracingAuditSink;
    use vc_domain::types::{ActionStep, StepResult};

    fn empty_plan(steps: Vec<ActionStep>) -> ActionPlan {
        let now = Utc::now();
        ActionPlan {
            plan_id: "plan-1".into(),
            tenant_id: "tenant-1".into(),
            conversation_id: None,
            user_id: None,
            intent: "test".into(),
            context: serde_json::Value::Null,
            steps,
            status: ActionPlanStatus::Pending,
            current_step: 0,
            step_results: Vec::new(),
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn step(action_type: &str, condition: StepCondition, use_result_from: Option<usize>, params: serde_json::Value) -> ActionStep {
        ActionStep { action_type: action_type.into(), params, condition, use_result_from }
    }

    fn executor(dry_run: bool) -> ActionPlanExecutor {
        let mut tools: HashMap<ActionType, Arc<dyn ActionTool>> = HashMap::new();
        tools.insert(ActionType::BookMeeting, Arc::new(NoopActionTool));
        tools.insert(ActionType::SendEmail, Arc::new(NoopActionTool));
        ActionPlanExecutor::new(
            tools,
            Arc::new(TracingAuditSink),
            ActionsConfig { dry_run, ..Default::default() },
            Arc::new(vc_persistence::mock::MockPersistenceClient::new()),
        )
    }

    #[tokio::test]
    async fn unknown_action_type_fails_the_plan_without_executing() {
        let mut plan = empty_plan(vec![step("delete_database", StepCondition::Always, None, serde_json::json!({}))]);
        executor(false).run(&mut plan).await.unwrap();
        assert_eq!(plan.status, ActionPlanStatus::Failed);
        assert!(plan.step_results.is_empty());
    }

    #[tokio::test]
    async fn if_previous_failed_step_is_skipped_when_previous_succeeded() {
        let mut plan = empty_plan(vec![
            step("book_meeting", StepCondition::Always, None, serde_json::json!({})),
            step("send_email", StepCondition::IfPreviousFailed, None, serde_json::json!({})),
        ]);
        executor(true).run(&mut plan).await.unwrap();
        assert_eq!(plan.status, ActionPlanStatus::Completed);
        assert!(matches!(plan.step_results[1].outcome, StepOutcome::Skipped));
    }

    #[tokio::test]
    async fn well_known_keys_chain_into_a_later_step() {
        let mut plan = empty_plan(vec![
            step("book_meeting", StepCondition::Always, None, serde_json::json!({})),
            step("send_email", StepCondition::Always, Some(0), serde_json::json!({"to": "a@example.com"})),
        ]);
        plan.step_results.push(StepResult {
            step_index: 0,
            outcome: StepOutcome::Success { result: serde_json::json!({"meeting_id": "m-1", "start_time": "2026-01-01T12:00:00Z"}) },
        });
        plan.current_step = 1;
        let executor = executor(true);
        let mut params = serde_json::json!({"to": "a@example.com"});
        if let Some(StepResult { outcome: StepOutcome::Success { result }, .. }) = plan.step_results.get(0) {
            inject_well_known_keys(&mut params, result);
        }
        assert_eq!(params["meeting_id"], "m-1");
        assert_eq!(params["start_time"], "2026-01-01T12:00:00Z");
        let _ = executor;
    }

    #[test]
    fn offset_expression_shifts_the_referenced_timestamp() {
        let mut params = serde_json::json!({"start_time": "2026-01-01T12:00:00+00:00", "start_time_offset": "-30m"});
        apply_offset_expressions(&mut params).unwrap();
        assert_eq!(params["start_time"], "2026-01-01T11:30:00+00:00");
    }

    #[tokio::test]
    async fn unregistered_type_later_in_the_plan_prevents_earlier_steps_from_running() {
        let mut plan = empty_plan(vec![
            step("book_meeting", StepCondition::Always, None, serde_json::json!({})),
            step("delete_database", StepCondition::Always, None, serde_json::json!({})),
        ]);
        executor(false).run(&mut plan).await.unwrap();
        assert_eq!(plan.status, ActionPlanStatus::Failed);
        assert!(plan.step_results.is_empty(), "step 0 must not have executed before validation failed on step 1");
    }

    #[tokio::test]
    async fn a_failing_step_stops_the_plan_before_later_steps_run() {
        let mut tools: HashMap<ActionType, Arc<dyn ActionTool>> = HashMap::new();
        tools.insert(ActionType::SendEmail, Arc::new(NoopActionTool));
        // book_meeting has no tool registered, so it fails.
        let executor = ActionPlanExecutor::new(
            tools,
            Arc::new(TracingAuditSink),
            ActionsConfig { dry_run: false, ..Default::default() },
            Arc::new(vc_persistence::mock::MockPersistenceClient::new()),
        );
        let mut plan = empty_plan(vec![
            step("book_meeting", StepCondition::Always, None, serde_json::json!({})),
            step("send_email", StepCondition::Always, None, serde_json::json!({})),
        ]);
        executor.run(&mut plan).await.unwrap();
        assert_eq!(plan.status, ActionPlanStatus::Failed);
        assert_eq!(plan.step_results.len(), 1);
    }
}
