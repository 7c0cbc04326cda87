//! Tracks classified submeshes of live scanned meshes and keeps them in sync
//! with add/update/remove notifications (single-threaded, engine-agnostic).
#![forbid(unsafe_code)]

mod config;
mod events;
mod host;
mod id;
mod source;
mod table;
mod templates;

pub use config::{PreconditionPolicy, RuntimeConfig};
pub use events::{
    EventKind, EventOutcome, EventRecord, MeshChanges, MeshEvent, MeshUpdate,
    PreconditionViolation, SkipReason,
};
pub use host::{LiveSubmesh, MemoryHandle, MemoryHost, MemoryHostStats, SubmeshHost};
pub use id::{LegacyMeshId, ParseIdError, TrackableId};
pub use source::{ClassificationSource, FetchError, ScriptedSource};
pub use table::{ClassSubmesh, SubmeshSlots, TrackingTable, TrackingTableStats};
pub use templates::{ClassTemplates, SubmeshTemplate, TemplateEntry, TemplateError, TemplatesConfig};

use scanmesh_classify::{FaceClasses, SemanticClass, normalize};
use scanmesh_geom::TriMesh;
use scanmesh_partition::{PartitionError, partition_into};

const EVENTS: &str = "mesh_events";

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeStats {
    pub notifications: u64,
    pub tracked: u64,
    pub refreshed: u64,
    pub removed: u64,
    pub skipped: u64,
    pub ignored: u64,
}

/// Owns the tracking table and every class submesh. Each event is handled
/// to completion before the next one starts; a failure for one mesh never
/// affects the others.
pub struct Runtime<S, H: SubmeshHost> {
    source: Option<S>,
    host: H,
    templates: ClassTemplates,
    config: RuntimeConfig,
    table: TrackingTable<H::Handle>,
    stats: RuntimeStats,
}

impl<S: ClassificationSource, H: SubmeshHost> Runtime<S, H> {
    /// Runtime without a classification source; every add is skipped until
    /// one is provided.
    pub fn new(templates: ClassTemplates, host: H) -> Self {
        Self {
            source: None,
            host,
            templates,
            config: RuntimeConfig::default(),
            table: TrackingTable::new(),
            stats: RuntimeStats::default(),
        }
    }

    pub fn with_source(mut self, source: S) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn set_source(&mut self, source: Option<S>) {
        self.source = source;
    }

    pub fn source_mut(&mut self) -> Option<&mut S> {
        self.source.as_mut()
    }

    pub fn templates(&self) -> &ClassTemplates {
        &self.templates
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn table(&self) -> &TrackingTable<H::Handle> {
        &self.table
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn stats(&self) -> RuntimeStats {
        self.stats
    }

    /// Handles one notification: added, then updated, then removed.
    pub fn apply(&mut self, changes: &MeshChanges<'_>) -> Vec<EventRecord> {
        self.stats.notifications += 1;
        let mut records = Vec::with_capacity(changes.len());
        for event in changes.events() {
            let outcome = self.handle(event);
            records.push(EventRecord {
                id: event.id(),
                kind: event.kind(),
                outcome,
            });
        }
        records
    }

    /// Routes a single event to its handler.
    pub fn handle(&mut self, event: MeshEvent<'_>) -> EventOutcome {
        let outcome = match event {
            MeshEvent::Added(u) => self.on_added(&u),
            MeshEvent::Updated(u) => self.on_updated(&u),
            MeshEvent::Removed(id) => self.on_removed(id),
        };
        match &outcome {
            EventOutcome::Tracked { .. } => self.stats.tracked += 1,
            EventOutcome::Refreshed { .. } => self.stats.refreshed += 1,
            EventOutcome::Removed => self.stats.removed += 1,
            EventOutcome::Skipped(_) => self.stats.skipped += 1,
            EventOutcome::AlreadyTracked | EventOutcome::NotTracked => self.stats.ignored += 1,
        }
        outcome
    }

    /// Releases every tracked submesh.
    pub fn shutdown(&mut self) -> usize {
        let n = self.table.clear(&mut self.host);
        log::info!(target: EVENTS, "released {} tracked meshes", n);
        n
    }

    fn on_added(&mut self, update: &MeshUpdate<'_>) -> EventOutcome {
        let id = update.id;
        if self.table.contains(id) {
            log::warn!(target: EVENTS, "add for already tracked mesh {}; ignoring", id);
            return EventOutcome::AlreadyTracked;
        }
        let faces = match self.classify(id, update.mesh) {
            Ok(faces) => faces,
            Err(reason) => return self.skip(id, EventKind::Added, reason),
        };

        let slots = self
            .table
            .create(id, &self.templates, update.transform, &mut self.host);
        match store_partition(slots, update.mesh, &faces, &mut self.host) {
            Ok(counts) => {
                log::debug!(
                    target: EVENTS,
                    "added {} with {} class submeshes ({} faces)",
                    id,
                    slots.occupied(),
                    update.mesh.triangle_count()
                );
                EventOutcome::Tracked { faces: counts }
            }
            Err(e) => {
                self.table.remove(id, &mut self.host);
                self.skip(id, EventKind::Added, e.into())
            }
        }
    }

    fn on_updated(&mut self, update: &MeshUpdate<'_>) -> EventOutcome {
        let id = update.id;
        if !self.table.contains(id) {
            log::trace!(target: EVENTS, "update for untracked mesh {}", id);
            return EventOutcome::NotTracked;
        }
        // On failure the previous geometry stays in place.
        let faces = match self.classify(id, update.mesh) {
            Ok(faces) => faces,
            Err(reason) => return self.skip(id, EventKind::Updated, reason),
        };
        let Some(slots) = self.table.get_mut(id) else {
            return EventOutcome::NotTracked;
        };
        match store_partition(slots, update.mesh, &faces, &mut self.host) {
            Ok(counts) => {
                log::debug!(
                    target: EVENTS,
                    "updated {} ({} faces)",
                    id,
                    update.mesh.triangle_count()
                );
                EventOutcome::Refreshed { faces: counts }
            }
            Err(e) => self.skip(id, EventKind::Updated, e.into()),
        }
    }

    fn on_removed(&mut self, id: TrackableId) -> EventOutcome {
        if self.table.remove(id, &mut self.host) {
            log::debug!(target: EVENTS, "removed {}", id);
            EventOutcome::Removed
        } else {
            log::trace!(target: EVENTS, "remove for untracked mesh {}", id);
            EventOutcome::NotTracked
        }
    }

    /// Fetches and normalizes classification for `mesh`, checking that it
    /// covers exactly the mesh's faces.
    fn classify(&mut self, id: TrackableId, mesh: &TriMesh) -> Result<FaceClasses, SkipReason> {
        let source = self.source.as_mut().ok_or(SkipReason::MissingSubsystem)?;
        let raw = source.fetch(id.into())?;
        let faces = normalize(mesh, &raw)?;
        if faces.len() != mesh.triangle_count() {
            return Err(PartitionError::FaceCountMismatch {
                triangles: mesh.triangle_count(),
                faces: faces.len(),
            }
            .into());
        }
        if self.config.log_class_histograms {
            let (counts, unrecognized) = faces.histogram();
            let summary: Vec<String> = SemanticClass::ALL
                .iter()
                .filter(|c| counts[c.index()] > 0)
                .map(|c| format!("{}={}", c, counts[c.index()]))
                .collect();
            log::debug!(
                target: EVENTS,
                "{} classes [{}] unrecognized={}",
                id,
                summary.join(" "),
                unrecognized
            );
        }
        Ok(faces)
    }

    fn skip(&mut self, id: TrackableId, kind: EventKind, reason: SkipReason) -> EventOutcome {
        match &reason {
            SkipReason::MissingSubsystem => {
                log::warn!(target: EVENTS, "{:?} {} skipped: {}", kind, id, reason)
            }
            SkipReason::Fetch(_) | SkipReason::NoData(_) => {
                log::debug!(target: EVENTS, "{:?} {} skipped: {}", kind, id, reason)
            }
            SkipReason::Precondition(_) => {
                if self.config.precondition_policy == PreconditionPolicy::Panic {
                    panic!("{:?} {}: {}", kind, id, reason);
                }
                log::error!(target: EVENTS, "{:?} {} skipped: {}", kind, id, reason)
            }
        }
        EventOutcome::Skipped(reason)
    }
}

fn store_partition<H: SubmeshHost>(
    slots: &mut SubmeshSlots<H::Handle>,
    mesh: &TriMesh,
    faces: &FaceClasses,
    host: &mut H,
) -> Result<[usize; SemanticClass::COUNT], PartitionError> {
    let counts = partition_into(mesh, faces, slots.iter_mut().map(|s| (s.class, &mut s.mesh)))?;
    for s in slots.iter_mut() {
        s.revision = s.revision.wrapping_add(1);
        host.upload(&mut s.handle, &s.mesh);
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanmesh_geom::{Transform, Vec3};

    #[test]
    fn revision_wraps_instead_of_overflowing() {
        let mut host = MemoryHost::new();
        let mut table = TrackingTable::new();
        let templates = ClassTemplates::new().with(SemanticClass::Wall, SubmeshTemplate::new("WallMesh"));
        let id = TrackableId::new(1, 1);
        let slots = table.create(id, &templates, Transform::IDENTITY, &mut host);
        if let Some(wall) = slots.get_mut(SemanticClass::Wall) {
            wall.revision = u32::MAX;
        }

        let mesh = TriMesh::from_vertices(
            &[Vec3::ZERO, Vec3::UP, Vec3::new(1.0, 0.0, 0.0)],
            &[],
            vec![0, 1, 2],
        )
        .unwrap();
        let faces = FaceClasses::from(vec![SemanticClass::Wall]);
        let counts = store_partition(slots, &mesh, &faces, &mut host).unwrap();
        assert_eq!(counts[SemanticClass::Wall.index()], 1);
        let wall = slots.get(SemanticClass::Wall).unwrap();
        assert_eq!(wall.revision, 0);
        assert_eq!(wall.mesh.triangle_count(), 1);
    }
}
