use crate::ids::JobId;
use crate::status::JobStatusCode;

/// One bar of the measurement histogram.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HistogramEntry {
    /// Measured bitstring label, zero-padded by the service (`00`, `01`).
    pub name: String,
    pub probability: f64,
}

/// Terminal success payload. Immutable once received.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExperimentResult {
    pub job_id: JobId,
    pub backend: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub runtime_channel_used: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub runtime_instance_used: Option<String>,
    /// Ordered as the service sent it. Not guaranteed to sum exactly to 1.
    #[cfg_attr(feature = "serde", serde(rename = "counts"))]
    pub histogram: Vec<HistogramEntry>,
    pub expectation_value: f64,
    pub jones_polynomial: String,
    pub status: JobStatusCode,
}

impl ExperimentResult {
    pub fn total_probability(&self) -> f64 {
        self.histogram.iter().map(|entry| entry.probability).sum()
    }

    pub fn probability_of(&self, label: &str) -> Option<f64> {
        self.histogram
            .iter()
            .find(|entry| entry.name == label)
            .map(|entry| entry.probability)
    }
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;

    #[test]
    fn decodes_completed_payload() {
        let result: ExperimentResult = serde_json::from_str(
            r#"{
                "job_id": "job-123",
                "backend": "ibm_kyiv",
                "runtime_channel_used": "ibm_cloud",
                "runtime_instance_used": null,
                "counts": [
                    {"name": "00", "probability": 0.7},
                    {"name": "01", "probability": 0.3}
                ],
                "expectation_value": 0.4,
                "jones_polynomial": "V(t) = 0.400t^-4 + t^-3 + t^-1",
                "status": "COMPLETED"
            }"#,
        )
        .expect("result payload");

        assert_eq!(result.status, JobStatusCode::Completed);
        assert_eq!(result.histogram[0].name, "00");
        assert!((result.total_probability() - 1.0).abs() < 1e-9);
        assert_eq!(result.probability_of("01"), Some(0.3));
    }
}
