//! reqwest-backed `ResourceClient`.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use shared::{domain::RecordId, protocol::ResponseEnvelope};
use tracing::{debug, warn};
use url::Url;

use crate::{
    error::ClientError,
    resource::{Filters, Resource, ResourceClient, Submission},
    settings::ClientSettings,
};

pub struct HttpResourceClient {
    http: Client,
    base_url: Url,
    auth_token: Option<String>,
}

impl HttpResourceClient {
    pub fn new(settings: &ClientSettings) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .map_err(|err| ClientError::InvalidUrl(err.to_string()))?;
        Self::with_client(http, settings)
    }

    pub fn with_client(http: Client, settings: &ClientSettings) -> Result<Self, ClientError> {
        let base_url = Url::parse(settings.api_base_url.trim())?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(format!(
                "{} cannot be used as a base url",
                settings.api_base_url
            )));
        }
        Ok(Self {
            http,
            base_url,
            auth_token: settings.auth_token.clone().filter(|t| !t.trim().is_empty()),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Joins `path` onto the base url. `id` becomes one extra percent-encoded
    /// path segment, so reserved characters in it stay part of the id.
    fn url(&self, path: &str, id: Option<&RecordId>) -> Result<Url, ClientError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let mut url = Url::parse(&format!("{base}/{}", path.trim_start_matches('/')))?;
        if let Some(id) = id {
            url.path_segments_mut()
                .map_err(|_| ClientError::InvalidUrl(format!("{path} cannot take an id segment")))?
                .pop_if_empty()
                .push(id.as_str());
        }
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn dispatch(
        &self,
        resource: &Resource,
        operation: &str,
        request: RequestBuilder,
    ) -> Result<ResponseEnvelope, ClientError> {
        let response = match self.authorize(request).send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(resource = %resource.name, operation, error = %err, "request got no response");
                return Err(ClientError::from(err));
            }
        };
        let envelope = read_envelope(response).await;
        match &envelope {
            Ok(envelope) => debug!(
                resource = %resource.name,
                operation,
                status = envelope.status,
                "request completed"
            ),
            Err(err) => warn!(resource = %resource.name, operation, error = %err, "request failed"),
        }
        envelope
    }
}

/// Any body that decodes as an envelope wins over the HTTP status, so a 4xx
/// carrying `{status:false, message}` still surfaces the server's message.
async fn read_envelope(response: Response) -> Result<ResponseEnvelope, ClientError> {
    let status = response.status();
    let body = response.bytes().await?;
    match serde_json::from_slice::<ResponseEnvelope>(&body) {
        Ok(envelope) => Ok(envelope),
        Err(_) if !status.is_success() => Err(ClientError::HttpStatus {
            status: status.as_u16(),
        }),
        Err(err) => Err(ClientError::Decode(err.to_string())),
    }
}

#[async_trait]
impl ResourceClient for HttpResourceClient {
    async fn fetch_one(
        &self,
        resource: &Resource,
        id: &RecordId,
    ) -> Result<ResponseEnvelope, ClientError> {
        let path = resource
            .get_path
            .as_deref()
            .ok_or_else(|| resource.unsupported("get"))?;
        let url = self.url(path, Some(id))?;
        self.dispatch(resource, "get", self.http.get(url)).await
    }

    async fn fetch_many(
        &self,
        resource: &Resource,
        filters: &Filters,
    ) -> Result<ResponseEnvelope, ClientError> {
        let path = resource
            .list_path
            .as_deref()
            .ok_or_else(|| resource.unsupported("list"))?;
        let url = self.url(path, None)?;
        self.dispatch(resource, "list", self.http.get(url).query(filters))
            .await
    }

    async fn submit(
        &self,
        resource: &Resource,
        submission: &Submission,
    ) -> Result<ResponseEnvelope, ClientError> {
        let prepared = submission.prepare(resource)?;
        let url = self.url(&prepared.path, prepared.id_segment.as_ref())?;
        self.dispatch(
            resource,
            submission.operation_name(),
            self.http.post(url).json(&prepared.body),
        )
        .await
    }
}

#[cfg(test)]
#[path = "tests/http_tests.rs"]
mod tests;
