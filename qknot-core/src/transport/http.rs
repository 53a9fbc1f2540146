use std::{fmt, time::Duration};

use async_trait::async_trait;
use qknot_model::{
    BackendCatalog, ExperimentResult, JobId, JobLookupRequest,
    JobSpecification, JobStatus, JobStatusCode, PollResponse,
    RuntimeSelection, RuntimeServiceRequest, SubmitJobRequest,
    SubmitJobResponse,
};
use reqwest::{Client, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use super::{JobTransport, TransportResult};
use crate::api_routes;
use crate::error::TransportError;

/// reqwest-backed [`JobTransport`].
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl HttpTransport {
    pub fn new(
        base_url: impl AsRef<str>,
        timeout: Duration,
    ) -> TransportResult<Self> {
        let raw = base_url.as_ref().trim();
        let parsed = Url::parse(raw).map_err(|err| {
            TransportError::Configuration(format!(
                "invalid backend URL '{raw}': {err}"
            ))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(TransportError::Configuration(format!(
                "backend URL must use http or https, got '{}'",
                parsed.scheme()
            )));
        }

        let client = Client::builder().timeout(timeout).build().map_err(|err| {
            TransportError::Configuration(format!(
                "failed to build HTTP client: {err}"
            ))
        })?;

        debug!(base_url = raw, ?timeout, "created HTTP transport");

        Ok(Self {
            client,
            base_url: raw.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, route: &str) -> String {
        api_routes::join(&self.base_url, route)
    }

    /// POST `body` and return the decoded JSON of a 2xx response.
    async fn post_json<B: Serialize + Sync>(
        &self,
        route: &str,
        body: &B,
    ) -> TransportResult<Value> {
        let url = self.build_url(route);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|err| {
                warn!(%url, error = %err, "backend request failed without a response");
                TransportError::unreachable(err)
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(TransportError::unreachable)?;

        if !status.is_success() {
            let detail = extract_detail(&text, status);
            warn!(%url, status = status.as_u16(), %detail, "backend rejected request");
            return Err(classify_status(status, detail));
        }

        serde_json::from_str(&text).map_err(|err| TransportError::Decode {
            context: route_context(route),
            message: err.to_string(),
        })
    }

    async fn post_typed<B, T>(&self, route: &str, body: &B) -> TransportResult<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let value = self.post_json(route, body).await?;
        decode(route_context(route), value)
    }
}

fn route_context(route: &str) -> &'static str {
    match route {
        api_routes::jobs::SUBMIT => "submit",
        api_routes::jobs::POLL => "poll",
        api_routes::jobs::CANCEL => "cancel",
        api_routes::backends::LIST => "backends",
        _ => "backend",
    }
}

fn decode<T: DeserializeOwned>(
    context: &'static str,
    value: Value,
) -> TransportResult<T> {
    serde_json::from_value(value).map_err(|err| TransportError::Decode {
        context,
        message: err.to_string(),
    })
}

fn classify_status(status: StatusCode, detail: String) -> TransportError {
    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            TransportError::RequestValidation { detail }
        }
        other => TransportError::Server {
            status: other.as_u16(),
            detail,
        },
    }
}

/// Pull a human-readable message out of an error body.
///
/// Understands `{"detail": "..."}` and the list form
/// `{"detail": [{"msg": "..."}, ...]}`; anything else falls back to the raw
/// text, then to the status reason.
pub(crate) fn extract_detail(body: &str, status: StatusCode) -> String {
    let from_json = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| value.get("detail").cloned())
        .and_then(|detail| match detail {
            Value::String(message) => Some(message),
            Value::Array(items) => {
                let messages: Vec<String> = items
                    .iter()
                    .filter_map(|item| match item {
                        Value::String(message) => Some(message.clone()),
                        other => other
                            .get("msg")
                            .and_then(Value::as_str)
                            .map(str::to_string),
                    })
                    .collect();
                (!messages.is_empty()).then(|| messages.join("; "))
            }
            Value::Null => None,
            other => Some(other.to_string()),
        });

    from_json
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        })
}

/// A COMPLETED body carries the full result; every other status is a plain
/// status record.
pub(crate) fn decode_poll_body(value: Value) -> TransportResult<PollResponse> {
    let status = value
        .get("status")
        .and_then(Value::as_str)
        .map(JobStatusCode::parse);

    match status {
        Some(JobStatusCode::Completed) => {
            decode::<ExperimentResult>("poll", value).map(PollResponse::Completed)
        }
        Some(_) => decode::<JobStatus>("poll", value).map(PollResponse::Status),
        None => Err(TransportError::Decode {
            context: "poll",
            message: "response has no status field".into(),
        }),
    }
}

#[async_trait]
impl JobTransport for HttpTransport {
    async fn submit(
        &self,
        spec: &JobSpecification,
    ) -> TransportResult<SubmitJobResponse> {
        let body = SubmitJobRequest::from(spec);
        self.post_typed(api_routes::jobs::SUBMIT, &body).await
    }

    async fn poll(
        &self,
        job_id: &JobId,
        runtime: &RuntimeSelection,
    ) -> TransportResult<PollResponse> {
        let body = JobLookupRequest::new(job_id, runtime);
        let value = self.post_json(api_routes::jobs::POLL, &body).await?;
        decode_poll_body(value)
    }

    async fn cancel(
        &self,
        job_id: &JobId,
        runtime: &RuntimeSelection,
    ) -> TransportResult<JobStatus> {
        let body = JobLookupRequest::new(job_id, runtime);
        self.post_typed(api_routes::jobs::CANCEL, &body).await
    }

    async fn list_capabilities(
        &self,
        runtime: &RuntimeSelection,
    ) -> TransportResult<BackendCatalog> {
        let body = RuntimeServiceRequest::from(runtime);
        self.post_typed(api_routes::backends::LIST, &body).await
    }
}
