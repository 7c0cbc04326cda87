use scanmesh_classify::{ClassifyError, SemanticClass};
use scanmesh_geom::{Transform, TriMesh};
use scanmesh_partition::PartitionError;
use thiserror::Error;

use crate::id::TrackableId;
use crate::source::FetchError;

/// A base mesh as delivered for one add or update.
#[derive(Clone, Copy, Debug)]
pub struct MeshUpdate<'a> {
    pub id: TrackableId,
    pub mesh: &'a TriMesh,
    /// Local placement of the base mesh; submeshes copy it when created.
    pub transform: Transform,
}

/// One notification from the mesh feed. Batches are handled added, then
/// updated, then removed, each in arrival order.
#[derive(Clone, Debug, Default)]
pub struct MeshChanges<'a> {
    pub added: Vec<MeshUpdate<'a>>,
    pub updated: Vec<MeshUpdate<'a>>,
    pub removed: Vec<TrackableId>,
}

impl<'a> MeshChanges<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, id: TrackableId, mesh: &'a TriMesh, transform: Transform) -> Self {
        self.added.push(MeshUpdate { id, mesh, transform });
        self
    }

    /// Submeshes keep the transform captured at add time, so none is taken here.
    pub fn update(mut self, id: TrackableId, mesh: &'a TriMesh) -> Self {
        self.updated.push(MeshUpdate {
            id,
            mesh,
            transform: Transform::IDENTITY,
        });
        self
    }

    pub fn remove(mut self, id: TrackableId) -> Self {
        self.removed.push(id);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.added.len() + self.updated.len() + self.removed.len()
    }

    /// Flattens the batches into dispatch order.
    pub fn events(&self) -> impl Iterator<Item = MeshEvent<'a>> + '_ {
        self.added
            .iter()
            .map(|u| MeshEvent::Added(*u))
            .chain(self.updated.iter().map(|u| MeshEvent::Updated(*u)))
            .chain(self.removed.iter().map(|id| MeshEvent::Removed(*id)))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Added,
    Updated,
    Removed,
}

#[derive(Clone, Copy, Debug)]
pub enum MeshEvent<'a> {
    Added(MeshUpdate<'a>),
    Updated(MeshUpdate<'a>),
    Removed(TrackableId),
}

impl MeshEvent<'_> {
    #[inline]
    pub fn kind(&self) -> EventKind {
        match self {
            MeshEvent::Added(_) => EventKind::Added,
            MeshEvent::Updated(_) => EventKind::Updated,
            MeshEvent::Removed(_) => EventKind::Removed,
        }
    }

    #[inline]
    pub fn id(&self) -> TrackableId {
        match self {
            MeshEvent::Added(u) | MeshEvent::Updated(u) => u.id,
            MeshEvent::Removed(id) => *id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreconditionViolation {
    #[error(transparent)]
    Classify(ClassifyError),
    #[error(transparent)]
    Partition(#[from] PartitionError),
}

/// Why a mesh was left untouched for one event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("classification provider is missing")]
    MissingSubsystem,
    #[error("no classification data: {0}")]
    Fetch(#[from] FetchError),
    #[error("no classification data: {0}")]
    NoData(ClassifyError),
    #[error("precondition violation: {0}")]
    Precondition(#[from] PreconditionViolation),
}

impl From<ClassifyError> for SkipReason {
    fn from(e: ClassifyError) -> Self {
        if e.is_precondition_violation() {
            SkipReason::Precondition(PreconditionViolation::Classify(e))
        } else {
            SkipReason::NoData(e)
        }
    }
}

impl From<PartitionError> for SkipReason {
    fn from(e: PartitionError) -> Self {
        SkipReason::Precondition(e.into())
    }
}

/// Result of handling one event; faces are matched face counts per class slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Tracked { faces: [usize; SemanticClass::COUNT] },
    Refreshed { faces: [usize; SemanticClass::COUNT] },
    Removed,
    Skipped(SkipReason),
    AlreadyTracked,
    NotTracked,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub id: TrackableId,
    pub kind: EventKind,
    pub outcome: EventOutcome,
}
