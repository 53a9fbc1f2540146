/// A hardware device the runtime service can execute on.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BackendInfo {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub num_qubits: Option<u32>,
    /// Queue depth at the time of listing.
    #[cfg_attr(feature = "serde", serde(default))]
    pub pending_jobs: Option<u32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub operational: Option<bool>,
}

impl BackendInfo {
    /// Unknown qubit counts are assumed to fit; the service re-checks.
    pub fn fits(&self, required_qubits: u32) -> bool {
        self.num_qubits.is_none_or(|qubits| qubits >= required_qubits)
    }
}

/// Response of the list-capabilities operation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BackendCatalog {
    #[cfg_attr(feature = "serde", serde(default))]
    pub runtime_channel_used: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub runtime_instance_used: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub recommended_backend: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub backends: Vec<BackendInfo>,
}

impl BackendCatalog {
    pub fn find(&self, name: &str) -> Option<&BackendInfo> {
        self.backends.iter().find(|backend| backend.name == name)
    }

    /// Operational devices large enough for `required_qubits`, shortest
    /// queue first. Unknown queue depths sort last.
    pub fn candidates(&self, required_qubits: u32) -> Vec<&BackendInfo> {
        let mut candidates: Vec<&BackendInfo> = self
            .backends
            .iter()
            .filter(|backend| backend.operational != Some(false))
            .filter(|backend| backend.fits(required_qubits))
            .collect();
        candidates.sort_by(|a, b| {
            a.pending_jobs
                .unwrap_or(u32::MAX)
                .cmp(&b.pending_jobs.unwrap_or(u32::MAX))
                .then_with(|| a.name.cmp(&b.name))
        });
        candidates
    }
}
