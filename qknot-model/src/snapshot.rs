use chrono::{DateTime, Utc};

use crate::ids::JobId;
use crate::runtime::{RuntimeChannel, RuntimeSelection};

/// Minimal record needed to resume polling after the controller is
/// recreated. Written as one unit; never partially populated.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PendingJobSnapshot {
    pub job_id: JobId,
    /// Device the job is known to run on, when the service reported one.
    #[cfg_attr(feature = "serde", serde(default))]
    pub backend: Option<String>,
    /// Channel input the job was submitted with (`None` = auto).
    #[cfg_attr(feature = "serde", serde(default))]
    pub runtime_channel: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub runtime_instance: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub saved_at: Option<DateTime<Utc>>,
}

impl PendingJobSnapshot {
    pub fn new(
        job_id: JobId,
        backend: Option<String>,
        runtime: &RuntimeSelection,
    ) -> Self {
        Self {
            job_id,
            backend,
            runtime_channel: runtime.channel_wire(),
            runtime_instance: runtime.instance_wire(),
            saved_at: Some(Utc::now()),
        }
    }

    /// Runtime inputs to poll with, rehydrated from the snapshot rather than
    /// from whatever the caller currently has selected.
    pub fn runtime(&self) -> RuntimeSelection {
        RuntimeSelection::new(
            RuntimeChannel::from_wire(self.runtime_channel.as_deref()),
            self.runtime_instance.clone(),
        )
    }

    /// A record without a job identifier cannot be resumed.
    pub fn is_resumable(&self) -> bool {
        !self.job_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_inputs_round_trip_through_snapshot() {
        let runtime = RuntimeSelection::new(
            RuntimeChannel::parse("ibm_cloud"),
            Some("hub/group/project".into()),
        );
        let snapshot =
            PendingJobSnapshot::new("job-9".into(), Some("ibm_kyiv".into()), &runtime);
        assert_eq!(snapshot.runtime(), runtime);
        assert!(snapshot.is_resumable());
        assert!(snapshot.saved_at.is_some());
    }

    #[test]
    fn auto_channel_is_stored_as_absent() {
        let snapshot = PendingJobSnapshot::new(
            "job-9".into(),
            None,
            &RuntimeSelection::default(),
        );
        assert_eq!(snapshot.runtime_channel, None);
        assert_eq!(snapshot.runtime().channel, RuntimeChannel::Auto);
    }
}
