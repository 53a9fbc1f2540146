use std::time::Duration;

use httpmock::prelude::*;
use qknot_core::{HttpTransport, JobTransport, TransportError, api_routes};
use qknot_model::{
    JobSpecification, JobStatusCode, PollResponse, RuntimeChannel,
    RuntimeSelection,
};
use serde_json::json;

fn transport(server: &MockServer) -> HttpTransport {
    HttpTransport::new(server.base_url(), Duration::from_secs(5))
        .expect("valid base url")
}

fn cloud_runtime() -> RuntimeSelection {
    RuntimeSelection::new(
        RuntimeChannel::parse("ibm_cloud"),
        Some("instance-a".into()),
    )
}

#[tokio::test]
async fn submit_posts_specification_and_decodes_response() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path(api_routes::jobs::SUBMIT).json_body(json!({
                "backend_name": "ibm_kyiv",
                "braid_word": "s1 s2^-1 s1",
                "shots": 2048,
                "optimization_level": 3,
                "closure_method": "trace"
            }));
            then.status(200).json_body(json!({
                "job_id": "job-123",
                "status": "QUEUED",
                "backend": "ibm_kyiv",
                "runtime_channel_used": "ibm_quantum_platform",
                "runtime_instance_used": null,
                "closure_method": "trace",
                "circuit_summary": {
                    "depth": 14,
                    "size": 30,
                    "two_qubit_gate_count": 8,
                    "operation_counts": {"cx": 8, "rz": 12},
                    "signature": "sig-abc"
                }
            }));
        })
        .await;

    let spec = JobSpecification::new("ibm_kyiv", "s1 s2^-1 s1", 2048);
    let response = transport(&server).submit(&spec).await.unwrap();

    mock.assert_async().await;
    assert_eq!(
        response.assigned_job_id().map(|id| id.as_str()),
        Some("job-123")
    );
    assert_eq!(response.status, JobStatusCode::Queued);
    assert_eq!(
        response.echoed_signature().map(|s| s.as_str()),
        Some("sig-abc")
    );
}

#[tokio::test]
async fn poll_sends_runtime_inputs_and_splits_on_status() {
    let server = MockServer::start_async().await;
    let running = server
        .mock_async(|when, then| {
            when.method(POST).path(api_routes::jobs::POLL).json_body(json!({
                "job_id": "job-running",
                "runtime_channel": "ibm_cloud",
                "runtime_instance": "instance-a"
            }));
            then.status(200).json_body(json!({
                "job_id": "job-running",
                "status": "RUNNING",
                "backend": "ibm_kyiv",
                "runtime_channel_used": "ibm_cloud",
                "runtime_instance_used": "instance-a"
            }));
        })
        .await;
    let done = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(api_routes::jobs::POLL)
                .json_body(json!({"job_id": "job-done"}));
            then.status(200).json_body(json!({
                "job_id": "job-done",
                "backend": "ibm_kyiv",
                "runtime_channel_used": "ibm_quantum_platform",
                "runtime_instance_used": null,
                "counts": [
                    {"name": "0", "probability": 0.75},
                    {"name": "1", "probability": 0.25}
                ],
                "expectation_value": 0.5,
                "jones_polynomial": "V(t) = -t^-4 + t^-3 + t^-1",
                "status": "COMPLETED"
            }));
        })
        .await;

    let transport = transport(&server);

    let response = transport
        .poll(&"job-running".into(), &cloud_runtime())
        .await
        .unwrap();
    assert!(matches!(
        response,
        PollResponse::Status(ref status) if status.status == JobStatusCode::Running
    ));

    let response = transport
        .poll(&"job-done".into(), &RuntimeSelection::default())
        .await
        .unwrap();
    let PollResponse::Completed(result) = response else {
        panic!("expected a completed poll response");
    };
    assert_eq!(result.histogram.len(), 2);
    assert_eq!(result.jones_polynomial, "V(t) = -t^-4 + t^-3 + t^-1");

    running.assert_async().await;
    done.assert_async().await;
}

#[tokio::test]
async fn validation_rejection_carries_detail() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(api_routes::jobs::SUBMIT);
            then.status(422).json_body(json!({
                "detail": [
                    {"loc": ["body", "shots"], "msg": "Input should be greater than 0", "type": "greater_than"}
                ]
            }));
        })
        .await;

    let spec = JobSpecification::new("ibm_kyiv", "s1 s2 s1", 1);
    let err = transport(&server).submit(&spec).await.unwrap_err();

    assert!(matches!(err, TransportError::RequestValidation { .. }));
    assert_eq!(
        err.to_string(),
        "request validation failed: Input should be greater than 0"
    );
}

#[tokio::test]
async fn server_failure_carries_status_and_detail() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(api_routes::jobs::CANCEL);
            then.status(500)
                .json_body(json!({"detail": "IBM Runtime rejected the cancel"}));
        })
        .await;

    let err = transport(&server)
        .cancel(&"job-1".into(), &cloud_runtime())
        .await
        .unwrap_err();

    assert!(matches!(err, TransportError::Server { status: 500, .. }));
    assert_eq!(
        err.to_string(),
        "server error (500): IBM Runtime rejected the cancel"
    );
}

#[tokio::test]
async fn cancel_decodes_cancelled_status() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(api_routes::jobs::CANCEL);
            then.status(200).json_body(json!({
                "job_id": "job-1",
                "status": "CANCELLED",
                "backend": "ibm_kyiv",
                "detail": "Job cancellation requested."
            }));
        })
        .await;

    let status = transport(&server)
        .cancel(&"job-1".into(), &cloud_runtime())
        .await
        .unwrap();
    assert!(status.status.is_cancelled());
    assert_eq!(status.detail.as_deref(), Some("Job cancellation requested."));
}

#[tokio::test]
async fn list_capabilities_decodes_catalog() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(api_routes::backends::LIST);
            then.status(200).json_body(json!({
                "runtime_channel_used": "ibm_quantum_platform",
                "runtime_instance_used": null,
                "recommended_backend": "ibm_torino",
                "backends": [
                    {"name": "ibm_torino", "num_qubits": 133, "pending_jobs": 3, "operational": true},
                    {"name": "ibm_kyiv", "num_qubits": 127, "pending_jobs": 41, "operational": true}
                ]
            }));
        })
        .await;

    let catalog = transport(&server)
        .list_capabilities(&RuntimeSelection::default())
        .await
        .unwrap();
    assert_eq!(catalog.recommended_backend.as_deref(), Some("ibm_torino"));
    assert_eq!(catalog.backends.len(), 2);
    assert_eq!(catalog.candidates(4)[0].name, "ibm_torino");
}

#[tokio::test]
async fn undecodable_success_body_is_a_decode_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(api_routes::jobs::POLL);
            then.status(200).body("<html>proxy login</html>");
        })
        .await;

    let err = transport(&server)
        .poll(&"job-1".into(), &RuntimeSelection::default())
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::Decode { context: "poll", .. }));
}

#[tokio::test]
async fn closed_port_is_unreachable() {
    let transport =
        HttpTransport::new("http://127.0.0.1:1", Duration::from_secs(2)).unwrap();
    let spec = JobSpecification::new("ibm_kyiv", "s1 s2 s1", 1024);

    let err = transport.submit(&spec).await.unwrap_err();

    assert!(matches!(err, TransportError::Unreachable(_)));
    assert_eq!(err.to_string(), "could not reach the backend");
}
