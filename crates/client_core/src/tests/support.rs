//! Scripted `ResourceClient` for controller tests.

use std::{collections::VecDeque, sync::Arc};

use async_trait::async_trait;
use shared::{domain::RecordId, protocol::ResponseEnvelope};
use tokio::sync::{Mutex, Notify};

use crate::{
    error::ClientError,
    feedback::FeedbackEvent,
    resource::{Filters, Resource, ResourceClient, Submission},
};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum StubCall {
    FetchOne(RecordId),
    FetchMany(Filters),
    Submit(Submission),
}

#[derive(Default)]
pub(crate) struct StubResourceClient {
    responses: Mutex<VecDeque<Result<ResponseEnvelope, ClientError>>>,
    calls: Mutex<Vec<StubCall>>,
    gate: Option<Arc<Notify>>,
}

impl StubResourceClient {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Every call parks until the returned `Notify` is signalled once per call.
    pub(crate) fn gated() -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        (
            Self {
                gate: Some(Arc::clone(&gate)),
                ..Self::default()
            },
            gate,
        )
    }

    pub(crate) async fn respond(&self, response: Result<ResponseEnvelope, ClientError>) {
        self.responses.lock().await.push_back(response);
    }

    pub(crate) async fn respond_ok(&self, envelope: ResponseEnvelope) {
        self.respond(Ok(envelope)).await;
    }

    pub(crate) async fn calls(&self) -> Vec<StubCall> {
        self.calls.lock().await.clone()
    }

    pub(crate) async fn submissions(&self) -> Vec<Submission> {
        self.calls
            .lock()
            .await
            .iter()
            .filter_map(|call| match call {
                StubCall::Submit(s) => Some(s.clone()),
                _ => None,
            })
            .collect()
    }

    async fn answer(&self, call: StubCall) -> Result<ResponseEnvelope, ClientError> {
        self.calls.lock().await.push(call);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(ClientError::Network("no scripted response".into())))
    }
}

#[async_trait]
impl ResourceClient for StubResourceClient {
    async fn fetch_one(
        &self,
        _resource: &Resource,
        id: &RecordId,
    ) -> Result<ResponseEnvelope, ClientError> {
        self.answer(StubCall::FetchOne(id.clone())).await
    }

    async fn fetch_many(
        &self,
        _resource: &Resource,
        filters: &Filters,
    ) -> Result<ResponseEnvelope, ClientError> {
        self.answer(StubCall::FetchMany(filters.clone())).await
    }

    async fn submit(
        &self,
        _resource: &Resource,
        submission: &Submission,
    ) -> Result<ResponseEnvelope, ClientError> {
        self.answer(StubCall::Submit(submission.clone())).await
    }
}

pub(crate) fn drain(rx: &mut tokio::sync::broadcast::Receiver<FeedbackEvent>) -> Vec<FeedbackEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
