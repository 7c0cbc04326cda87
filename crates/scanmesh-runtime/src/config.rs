use serde::Deserialize;

/// What to do when a classification buffer contradicts the mesh topology.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreconditionPolicy {
    /// Log at error level and skip the mesh for this event.
    #[default]
    Skip,
    /// Abort the process.
    Panic,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub precondition_policy: PreconditionPolicy,
    /// Log per-class face counts for every classified mesh (debug level).
    pub log_class_histograms: bool,
}
