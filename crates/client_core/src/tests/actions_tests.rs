use serde_json::json;
use shared::protocol::ResponseEnvelope;

use super::*;
use crate::{
    error::{ClientError, NO_RESPONSE_MESSAGE},
    feedback::FeedbackEvent,
    navigation::RecordingNavigator,
    test_support::{drain, StubCall, StubResourceClient},
};

const DETAIL_ROUTE: &str = "/actionitem/details/{id}";

fn item(id: i64, title: &str) -> Record {
    Record::new().with("id", id).with("title", title)
}

struct Harness {
    client: Arc<StubResourceClient>,
    table: Arc<TableState>,
    navigator: Arc<RecordingNavigator>,
    feedback: Feedback,
    controller: Arc<ListActionController>,
}

fn harness(client: StubResourceClient, rows: Vec<Record>) -> Harness {
    let client = Arc::new(client);
    let navigator = Arc::new(RecordingNavigator::new());
    let table = Arc::new(TableState::new("id", navigator.clone(), DETAIL_ROUTE).with_rows(rows));
    let feedback = Feedback::new();
    let controller = Arc::new(ListActionController::new(
        client.clone(),
        Resource::action_item(),
        table.clone(),
        feedback.clone(),
    ));
    Harness {
        client,
        table,
        navigator,
        feedback,
        controller,
    }
}

#[tokio::test]
async fn rejected_accept_keeps_row_and_shows_server_message() {
    let client = StubResourceClient::new();
    client
        .respond_ok(ResponseEnvelope::rejected("Already accepted"))
        .await;
    let h = harness(client, vec![item(7, "Torque wrench"), item(8, "Caliper")]);
    let mut events = h.feedback.subscribe();

    let outcome = h
        .controller
        .run_action(&item(7, "Torque wrench"), ActionType::Accept, Record::new())
        .await;

    assert_eq!(outcome, ActionOutcome::Rejected("Already accepted".into()));
    assert!(h.table.contains(&RecordId::from(7)).await);
    assert_eq!(h.table.len().await, 2);
    assert_eq!(h.controller.button_state(&RecordId::from(7)), ButtonState::Idle);
    assert_eq!(
        drain(&mut events)
            .iter()
            .map(FeedbackEvent::message)
            .collect::<Vec<_>>(),
        vec!["Already accepted".to_string()]
    );
}

#[tokio::test]
async fn accepted_row_is_removed_exactly_once() {
    let client = StubResourceClient::new();
    client
        .respond_ok(ResponseEnvelope::ok("Item accepted successfully"))
        .await;
    let h = harness(client, vec![item(7, "Torque wrench"), item(8, "Caliper")]);

    let outcome = h
        .controller
        .run_action(&item(7, "Torque wrench"), ActionType::Accept, Record::new())
        .await;

    assert_eq!(outcome, ActionOutcome::Completed(RowEffect::Remove));
    assert!(!h.table.contains(&RecordId::from(7)).await);
    assert!(h.table.contains(&RecordId::from(8)).await);
    assert!(h.navigator.visited().await.is_empty());
    assert_eq!(
        h.controller.button_state(&RecordId::from(7)),
        ButtonState::Resolved
    );

    let calls = h.client.calls().await;
    let StubCall::Submit(submission) = &calls[0] else {
        panic!("expected a submit");
    };
    assert_eq!(
        submission,
        &Submission::action(RecordId::from(7), ActionType::Accept, Record::new())
    );
}

#[tokio::test]
async fn resolved_row_ignores_further_actions() {
    let client = StubResourceClient::new();
    client.respond_ok(ResponseEnvelope::ok("done")).await;
    let h = harness(client, vec![item(7, "Torque wrench")]);
    let row = item(7, "Torque wrench");

    h.controller
        .run_action(&row, ActionType::Accept, Record::new())
        .await;
    let again = h
        .controller
        .run_action(&row, ActionType::Accept, Record::new())
        .await;

    assert_eq!(again, ActionOutcome::AlreadyResolved);
    assert_eq!(h.client.calls().await.len(), 1);
}

#[tokio::test]
async fn assign_opens_detail_instead_of_removing() {
    let client = StubResourceClient::new();
    client.respond_ok(ResponseEnvelope::ok("Assigned")).await;
    let h = harness(client, vec![item(3, "Micrometer")]);

    let outcome = h
        .controller
        .run_action(&item(3, "Micrometer"), ActionType::Assign, Record::new())
        .await;

    assert_eq!(outcome, ActionOutcome::Completed(RowEffect::OpenDetail));
    assert!(h.table.contains(&RecordId::from(3)).await);
    assert_eq!(
        h.navigator.visited().await,
        vec![Route::new("/actionitem/details/3")]
    );
}

#[tokio::test]
async fn network_failure_leaves_row_ready_for_retry() {
    let client = StubResourceClient::new();
    client
        .respond(Err(ClientError::Network("timed out".into())))
        .await;
    client.respond_ok(ResponseEnvelope::ok("Accepted")).await;
    let h = harness(client, vec![item(4, "Thermometer")]);
    let mut events = h.feedback.subscribe();
    let row = item(4, "Thermometer");

    let first = h
        .controller
        .run_action(&row, ActionType::Accept, Record::new())
        .await;
    assert!(matches!(first, ActionOutcome::Failed(OperationError::NetworkFailure(_))));
    assert!(h.table.contains(&RecordId::from(4)).await);
    assert_eq!(h.controller.button_state(&RecordId::from(4)), ButtonState::Idle);

    let second = h
        .controller
        .run_action(&row, ActionType::Accept, Record::new())
        .await;
    assert_eq!(second, ActionOutcome::Completed(RowEffect::Remove));
    assert!(h.table.is_empty().await);

    let messages: Vec<_> = drain(&mut events).iter().map(FeedbackEvent::message).collect();
    assert_eq!(messages, vec![NO_RESPONSE_MESSAGE.to_string(), "Accepted".to_string()]);
}

#[tokio::test]
async fn double_click_on_same_row_sends_one_request() {
    let (client, gate) = StubResourceClient::gated();
    client.respond_ok(ResponseEnvelope::ok("Accepted")).await;
    client.respond_ok(ResponseEnvelope::ok("Accepted")).await;
    let h = harness(client, vec![item(1, "A"), item(2, "B")]);

    let first = tokio::spawn({
        let controller = Arc::clone(&h.controller);
        async move {
            controller
                .run_action(&item(1, "A"), ActionType::Accept, Record::new())
                .await
        }
    });
    while h.client.calls().await.is_empty() {
        tokio::task::yield_now().await;
    }
    assert_eq!(
        h.controller.button_state(&RecordId::from(1)),
        ButtonState::Submitting
    );

    let repeated = h
        .controller
        .run_action(&item(1, "A"), ActionType::Accept, Record::new())
        .await;
    assert_eq!(repeated, ActionOutcome::Busy);

    // A different row is independent of the pending one.
    let other = tokio::spawn({
        let controller = Arc::clone(&h.controller);
        async move {
            controller
                .run_action(&item(2, "B"), ActionType::Accept, Record::new())
                .await
        }
    });
    while h.client.calls().await.len() < 2 {
        tokio::task::yield_now().await;
    }

    gate.notify_one();
    gate.notify_one();
    assert!(first.await.expect("join").is_completed());
    assert!(other.await.expect("join").is_completed());
    assert_eq!(h.client.submissions().await.len(), 2);
    assert!(h.table.is_empty().await);
}

#[tokio::test]
async fn update_replaces_row_with_submitted_fields() {
    let client = Arc::new(StubResourceClient::new());
    client.respond_ok(ResponseEnvelope::ok("Updated")).await;
    let navigator = Arc::new(RecordingNavigator::new());
    let row = Record::new().with("id", 5).with("description", "old");
    let table = Arc::new(
        TableState::new("id", navigator, "/visual-tests/{id}").with_rows(vec![row.clone()]),
    );
    let controller = ListActionController::new(
        client,
        Resource::visual_test(),
        table.clone(),
        Feedback::new(),
    );

    let outcome = controller
        .run_action(
            &row,
            ActionType::Update,
            Record::new().with("description", "new"),
        )
        .await;

    assert_eq!(outcome, ActionOutcome::Completed(RowEffect::Replace));
    let updated = table.find(&RecordId::from(5)).await.expect("row");
    assert_eq!(updated.text("description"), "new");
    assert_eq!(controller.button_state(&RecordId::from(5)), ButtonState::Idle);
}

#[tokio::test]
async fn row_without_id_is_refused_locally() {
    let h = harness(StubResourceClient::new(), Vec::new());
    let outcome = h
        .controller
        .run_action(
            &Record::new().with("title", "orphan"),
            ActionType::Accept,
            Record::new(),
        )
        .await;
    assert_eq!(outcome, ActionOutcome::MissingId);
    assert!(h.client.calls().await.is_empty());
}

#[tokio::test]
async fn refresh_replaces_rows_and_passes_filters() {
    let client = StubResourceClient::new();
    client
        .respond_ok(
            serde_json::from_value(json!({
                "status": true,
                "data": [{"id": 10, "title": "X"}, {"id": 11, "title": "Y"}]
            }))
            .expect("envelope"),
        )
        .await;
    let h = harness(client, vec![item(1, "stale")]);
    let filters: Filters = [("status".to_string(), "allotted".to_string())].into();

    let count = h.controller.refresh(&filters).await.expect("refresh");

    assert_eq!(count, 2);
    assert!(!h.table.contains(&RecordId::from(1)).await);
    assert!(h.table.contains(&RecordId::from(11)).await);
    assert_eq!(h.client.calls().await, vec![StubCall::FetchMany(filters)]);
}

#[tokio::test]
async fn failed_refresh_keeps_current_rows() {
    let client = StubResourceClient::new();
    client
        .respond_ok(ResponseEnvelope::rejected("Session expired"))
        .await;
    let h = harness(client, vec![item(1, "kept")]);

    let err = h
        .controller
        .refresh(&Filters::new())
        .await
        .expect_err("rejected");

    assert_eq!(err, OperationError::ServerRejection("Session expired".into()));
    assert_eq!(h.table.len().await, 1);
}

#[test]
fn row_effects_follow_action_kind() {
    assert_eq!(row_effect(ActionType::Accept), RowEffect::Remove);
    assert_eq!(row_effect(ActionType::Approve), RowEffect::Remove);
    assert_eq!(row_effect(ActionType::Reject), RowEffect::Remove);
    assert_eq!(row_effect(ActionType::Assign), RowEffect::OpenDetail);
    assert_eq!(row_effect(ActionType::Update), RowEffect::Replace);
}
