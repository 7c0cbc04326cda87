use hashbrown::HashMap;
use scanmesh_classify::RawClassification;
use thiserror::Error;

use crate::id::LegacyMeshId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("no classification available for mesh")]
    Unavailable,
    #[error("classification fetch failed: {0}")]
    Failed(String),
}

/// Platform call that returns the current classification buffer of a mesh.
pub trait ClassificationSource {
    fn fetch(&mut self, id: LegacyMeshId) -> Result<RawClassification, FetchError>;
}

impl<S: ClassificationSource + ?Sized> ClassificationSource for Box<S> {
    fn fetch(&mut self, id: LegacyMeshId) -> Result<RawClassification, FetchError> {
        (**self).fetch(id)
    }
}

/// Source answering from a table of canned responses; ids without a response
/// are unavailable.
#[derive(Default, Debug)]
pub struct ScriptedSource {
    responses: HashMap<LegacyMeshId, Result<RawClassification, FetchError>>,
    fetches: u64,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, id: impl Into<LegacyMeshId>, raw: RawClassification) {
        self.responses.insert(id.into(), Ok(raw));
    }

    pub fn set_error(&mut self, id: impl Into<LegacyMeshId>, err: FetchError) {
        self.responses.insert(id.into(), Err(err));
    }

    pub fn forget(&mut self, id: impl Into<LegacyMeshId>) {
        self.responses.remove(&id.into());
    }

    /// Total number of fetch calls answered so far.
    pub fn fetch_count(&self) -> u64 {
        self.fetches
    }
}

impl ClassificationSource for ScriptedSource {
    fn fetch(&mut self, id: LegacyMeshId) -> Result<RawClassification, FetchError> {
        self.fetches += 1;
        self.responses
            .get(&id)
            .cloned()
            .unwrap_or(Err(FetchError::Unavailable))
    }
}
