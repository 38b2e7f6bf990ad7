use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;

use vc_actions::audit::TracingAuditSink;
use vc_actions::executor::ActionPlanExecutor;
use vc_actions::tools::NoopActionTool;
use vc_domain::config::ActionsConfig;
use vc_domain::types::{ActionPlan, ActionPlanStatus, ActionStep, ActionType, StepCondition, StepOutcome};

fn plan(steps: Vec<ActionStep>) -> ActionPlan {
    let now = Utc::now();
    ActionPlan {
        plan_id: "plan-integration-1".into(),
        tenant_id: "tenant-1".into(),
        conversation_id: Some("conv-1".into()),
        user_id: Some("user-1".into()),
        intent: "book a follow-up and remind me beforehand".into(),
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

/// Book a meeting, then schedule a reminder 30 minutes before the booked
/// start time, chaining both the meeting id and the offset timestamp
/// through `use_result_from`.
#[tokio::test]
async fn book_then_remind_chains_result_and_offset_through_two_steps() {
    let mut tools: HashMap<ActionType, Arc<dyn vc_actions::tools::ActionTool>> = HashMap::new();
    tools.insert(ActionType::BookMeeting, Arc::new(FixedResultTool));
    tools.insert(ActionType::ScheduleReminder, Arc::new(NoopActionTool));

    let executor = ActionPlanExecutor::new(
        tools,
        Arc::new(TracingAuditSink),
        ActionsConfig::default(),
        Arc::new(vc_persistence::mock::MockPersistenceClient::new()),
    );

    let mut plan = plan(vec![
        ActionStep {
            action_type: "book_meeting".into(),
            params: serde_json::json!({"attendee": "lead@example.com"}),
            condition: StepCondition::Always,
            use_result_from: None,
        },
        ActionStep {
            action_type: "schedule_reminder".into(),
            params: serde_json::json!({"start_time_offset": "-30m"}),
            condition: StepCondition::IfPreviousSuccess,
            use_result_from: Some(0),
        },
    ]);

    executor.run(&mut plan).await.unwrap();

    assert_eq!(plan.status, ActionPlanStatus::Completed);
    assert_eq!(plan.step_results.len(), 2);
    match &plan.step_results[1].outcome {
        StepOutcome::Success { result } => {
            assert_eq!(result["params"]["meeting_id"], "m-42");
            assert_eq!(result["params"]["start_time"], "2026-03-01T09:30:00+00:00");
        }
        other => panic!("expected success, got {other:?}"),
    }
}

#[tokio::test]
async fn plan_with_no_tools_registered_fails_on_first_step() {
    let executor = ActionPlanExecutor::new(
        HashMap::new(),
        Arc::new(TracingAuditSink),
        ActionsConfig::default(),
        Arc::new(vc_persistence::mock::MockPersistenceClient::new()),
    );
    let mut plan = plan(vec![ActionStep {
        action_type: "send_sms".into(),
        params: serde_json::json!({}),
        condition: StepCondition::Always,
        use_result_from: None,
    }]);
    executor.run(&mut plan).await.unwrap();
    assert_eq!(plan.status, ActionPlanStatus::Failed);
}

#[tokio::test]
async fn dry_run_never_invokes_the_underlying_tool() {
    let mut tools: HashMap<ActionType, Arc<dyn vc_actions::tools::ActionTool>> = HashMap::new();
    tools.insert(ActionType::SendEmail, Arc::new(PanicTool));
    let executor = ActionPlanExecutor::new(
        tools,
        Arc::new(TracingAuditSink),
        ActionsConfig { dry_run: true, ..Default::default() },
        Arc::new(vc_persistence::mock::MockPersistenceClient::new()),
    );
    let mut plan = plan(vec![ActionStep {
        action_type: "send_email".into(),
        params: serde_json::json!({}),
        condition: StepCondition::Always,
        use_result_from: None,
    }]);
    executor.run(&mut plan).await.unwrap();
    assert_eq!(plan.status, ActionPlanStatus::Completed);
}

struct FixedResultTool;
#[async_trait::async_trait]
impl vc_actions::tools::ActionTool for FixedResultTool {
    async fn execute(&self, _params: serde_json::Value) -> vc_domain::error::Result<serde_json::Value> {
        Ok(serde_json::json!({"meeting_id": "m-42", "start_time": "2026-03-01T10:00:00+00:00"}))
    }
}

struct PanicTool;
#[async_trait::async_trait]
impl vc_actions::tools::ActionTool for PanicTool {
    async fn execute(&self, _params: serde_json::Value) -> vc_domain::error::Result<serde_json::Value> {
        panic!("dry_run should never reach the tool");
    }
}
