use shared::{domain::RecordId, protocol::ResponseEnvelope};

use super::*;
use crate::{
    actions::{RowEffect, TableState},
    error::OperationError,
    feedback::{Feedback, FeedbackEvent},
    navigation::RecordingNavigator,
    resource::{Resource, Submission},
    test_support::{drain, StubResourceClient},
};

fn request(id: i64) -> Record {
    Record::new()
        .with("revrequestid", id)
        .with("instrument", "Pressure gauge")
}

fn modal_with(
    client: Arc<StubResourceClient>,
    rows: Vec<Record>,
) -> (ConfirmationModal, Arc<TableState>, Feedback) {
    let table = Arc::new(
        TableState::new(
            "revrequestid",
            Arc::new(RecordingNavigator::new()),
            "/revision-requests/{id}",
        )
        .with_rows(rows),
    );
    let feedback = Feedback::new();
    let actions = Arc::new(ListActionController::new(
        client,
        Resource::revision_request(),
        table.clone(),
        feedback.clone(),
    ));
    (ConfirmationModal::new(actions), table, feedback)
}

#[tokio::test]
async fn approve_with_empty_reason_stays_open_without_request() {
    let client = Arc::new(StubResourceClient::new());
    let (modal, table, feedback) = modal_with(client.clone(), vec![request(12)]);
    let mut events = feedback.subscribe();

    modal.open(request(12)).await;
    modal.set_reason("").await;
    modal.set_remark("checked").await;
    let outcome = modal.submit(Decision::Approve).await;

    let ModalOutcome::Invalid(errors) = outcome else {
        panic!("expected inline validation error");
    };
    assert!(errors.contains(REASON_FIELD));
    assert!(!errors.contains(REMARK_FIELD));
    assert!(modal.is_open().await);
    assert!(client.calls().await.is_empty());
    assert_eq!(table.len().await, 1);
    let events = drain(&mut events);
    assert!(matches!(
        events.as_slice(),
        [FeedbackEvent::Error(OperationError::Validation(_))]
    ));
}

#[tokio::test]
async fn whitespace_remark_is_rejected_for_reject_too() {
    let client = Arc::new(StubResourceClient::new());
    let (modal, _, _) = modal_with(client.clone(), vec![request(12)]);

    modal.open(request(12)).await;
    modal.set_reason("out of tolerance").await;
    modal.set_remark("   ").await;

    let ModalOutcome::Invalid(errors) = modal.submit(Decision::Reject).await else {
        panic!("expected inline validation error");
    };
    assert_eq!(errors.fields().collect::<Vec<_>>(), vec![REMARK_FIELD]);
    assert!(client.calls().await.is_empty());
}

#[tokio::test]
async fn approve_sends_reason_and_remark_then_closes() {
    let client = Arc::new(StubResourceClient::new());
    client
        .respond_ok(ResponseEnvelope::ok("Revision request approved"))
        .await;
    let (modal, table, _) = modal_with(client.clone(), vec![request(12), request(13)]);

    modal.open(request(12)).await;
    modal.set_reason("Customer asked for a new range").await;
    modal.set_remark("Approved by QA").await;
    let outcome = modal.submit(Decision::Approve).await;

    assert_eq!(
        outcome,
        ModalOutcome::Action(ActionOutcome::Completed(RowEffect::Remove))
    );
    assert!(!modal.is_open().await);
    assert!(!table.contains(&RecordId::from(12)).await);
    assert!(table.contains(&RecordId::from(13)).await);
    assert_eq!(
        client.submissions().await,
        vec![Submission::action(
            RecordId::from(12),
            ActionType::Approve,
            Record::new()
                .with(REASON_FIELD, "Customer asked for a new range")
                .with(REMARK_FIELD, "Approved by QA"),
        )]
    );
}

#[tokio::test]
async fn rejected_reject_keeps_modal_open_for_retry() {
    let client = Arc::new(StubResourceClient::new());
    client
        .respond_ok(ResponseEnvelope::rejected("Request already closed"))
        .await;
    let (modal, table, _) = modal_with(client.clone(), vec![request(20)]);

    modal.open(request(20)).await;
    modal.set_reason("duplicate").await;
    modal.set_remark("see #19").await;
    let outcome = modal.submit(Decision::Reject).await;

    assert_eq!(
        outcome,
        ModalOutcome::Action(ActionOutcome::Rejected("Request already closed".into()))
    );
    assert!(modal.is_open().await);
    assert_eq!(modal.row().await, Some(request(20)));
    assert!(table.contains(&RecordId::from(20)).await);
    assert_eq!(
        client.submissions().await[0],
        Submission::action(
            RecordId::from(20),
            ActionType::Reject,
            Record::new()
                .with(REASON_FIELD, "duplicate")
                .with(REMARK_FIELD, "see #19"),
        )
    );
}

#[tokio::test]
async fn submit_on_closed_modal_does_nothing() {
    let client = Arc::new(StubResourceClient::new());
    let (modal, _, _) = modal_with(client.clone(), Vec::new());

    assert_eq!(modal.submit(Decision::Approve).await, ModalOutcome::NotOpen);

    modal.open(request(1)).await;
    modal.close().await;
    assert_eq!(modal.submit(Decision::Reject).await, ModalOutcome::NotOpen);
    assert!(client.calls().await.is_empty());
}

#[tokio::test]
async fn reopening_clears_previous_fields() {
    let client = Arc::new(StubResourceClient::new());
    let (modal, _, _) = modal_with(client, vec![request(1)]);

    modal.open(request(1)).await;
    modal.set_reason("first").await;
    modal.set_remark("first").await;
    modal.close().await;
    modal.open(request(1)).await;

    let ModalOutcome::Invalid(errors) = modal.submit(Decision::Approve).await else {
        panic!("fields should be blank after reopening");
    };
    assert_eq!(errors.len(), 2);
}

#[tokio::test]
async fn success_leaves_modal_reopened_on_another_row_open() {
    let (client, gate) = StubResourceClient::gated();
    let client = Arc::new(client);
    client
        .respond_ok(ResponseEnvelope::ok("Revision request approved"))
        .await;
    let (modal, table, _) = modal_with(client.clone(), vec![request(12), request(13)]);
    let modal = Arc::new(modal);

    modal.open(request(12)).await;
    modal.set_reason("range change").await;
    modal.set_remark("ok").await;
    let pending = tokio::spawn({
        let modal = Arc::clone(&modal);
        async move { modal.submit(Decision::Approve).await }
    });
    while client.calls().await.is_empty() {
        tokio::task::yield_now().await;
    }

    modal.open(request(13)).await;
    gate.notify_one();
    assert_eq!(
        pending.await.expect("join"),
        ModalOutcome::Action(ActionOutcome::Completed(RowEffect::Remove))
    );

    assert!(!table.contains(&RecordId::from(12)).await);
    assert!(modal.is_open().await);
    assert_eq!(modal.row().await, Some(request(13)));
}
