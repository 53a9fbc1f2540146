use std::collections::BTreeMap;

use crate::ids::CircuitSignature;

/// Metadata of the transpiled circuit the service actually submitted.
///
/// Only the signature matters to the controller; the remaining fields are
/// kept for display and tolerate absence on decode.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct CircuitSummary {
    pub depth: Option<u32>,
    pub size: Option<u32>,
    pub width: Option<u32>,
    pub num_qubits: Option<u32>,
    pub num_clbits: Option<u32>,
    pub two_qubit_gate_count: Option<u32>,
    pub measurement_count: Option<u32>,
    pub operation_counts: BTreeMap<String, u32>,
    pub signature: Option<CircuitSignature>,
}
