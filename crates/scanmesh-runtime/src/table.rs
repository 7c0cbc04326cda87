use hashbrown::HashMap;
use hashbrown::hash_map::Entry;
use scanmesh_classify::SemanticClass;
use scanmesh_geom::Transform;
use scanmesh_partition::ClassMesh;

use crate::host::SubmeshHost;
use crate::id::TrackableId;
use crate::templates::ClassTemplates;

/// Geometry subset of one base mesh for one class, plus its scene handle.
#[derive(Debug)]
pub struct ClassSubmesh<H> {
    pub class: SemanticClass,
    /// Placement of the base mesh when the submesh was created.
    pub transform: Transform,
    pub mesh: ClassMesh,
    pub handle: H,
    /// Number of times geometry has been written; wraps.
    pub revision: u32,
}

/// Nine optional submeshes indexed by class value.
#[derive(Debug)]
pub struct SubmeshSlots<H> {
    slots: [Option<ClassSubmesh<H>>; SemanticClass::COUNT],
}

impl<H> SubmeshSlots<H> {
    fn instantiate<Host>(
        templates: &ClassTemplates,
        transform: Transform,
        host: &mut Host,
    ) -> Self
    where
        Host: SubmeshHost<Handle = H>,
    {
        let slots = std::array::from_fn(|i| {
            let class = SemanticClass::ALL[i];
            templates.get(class).map(|template| ClassSubmesh {
                class,
                transform,
                mesh: ClassMesh::default(),
                handle: host.instantiate(class, template, &transform),
                revision: 0,
            })
        });
        Self { slots }
    }

    #[inline]
    pub fn get(&self, class: SemanticClass) -> Option<&ClassSubmesh<H>> {
        self.slots[class.index()].as_ref()
    }

    #[inline]
    pub fn get_mut(&mut self, class: SemanticClass) -> Option<&mut ClassSubmesh<H>> {
        self.slots[class.index()].as_mut()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClassSubmesh<H>> {
        self.slots.iter().flatten()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ClassSubmesh<H>> {
        self.slots.iter_mut().flatten()
    }

    pub fn classes(&self) -> impl Iterator<Item = SemanticClass> + '_ {
        self.iter().map(|s| s.class)
    }

    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    fn release<Host>(self, host: &mut Host) -> usize
    where
        Host: SubmeshHost<Handle = H>,
    {
        let mut released = 0;
        for submesh in self.slots.into_iter().flatten() {
            host.destroy(submesh.handle);
            released += 1;
        }
        released
    }
}

#[derive(Default, Debug, Clone, Copy)]
pub struct TrackingTableStats {
    pub entries: usize,
    pub submeshes: usize,
    pub triangles: usize,
}

/// Mesh id → materialized class submeshes. The only record of which
/// submeshes exist; mutation needs `&mut` so there is a single writer.
#[derive(Debug)]
pub struct TrackingTable<H> {
    entries: HashMap<TrackableId, SubmeshSlots<H>>,
}

impl<H> Default for TrackingTable<H> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<H> TrackingTable<H> {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn contains(&self, id: TrackableId) -> bool {
        self.entries.contains_key(&id)
    }

    #[inline]
    pub fn get(&self, id: TrackableId) -> Option<&SubmeshSlots<H>> {
        self.entries.get(&id)
    }

    #[inline]
    pub fn get_mut(&mut self, id: TrackableId) -> Option<&mut SubmeshSlots<H>> {
        self.entries.get_mut(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = TrackableId> + '_ {
        self.entries.keys().copied()
    }

    /// Instantiates one submesh per configured template at `transform` and
    /// records them under `id`. An existing entry is released first so the
    /// table never holds two entries for one id.
    pub fn create<Host>(
        &mut self,
        id: TrackableId,
        templates: &ClassTemplates,
        transform: Transform,
        host: &mut Host,
    ) -> &mut SubmeshSlots<H>
    where
        Host: SubmeshHost<Handle = H>,
    {
        let slots = SubmeshSlots::instantiate(templates, transform, host);
        match self.entries.entry(id) {
            Entry::Occupied(mut o) => {
                log::warn!("replacing tracked submeshes of {}", id);
                let old = o.insert(slots);
                old.release(host);
                o.into_mut()
            }
            Entry::Vacant(v) => v.insert(slots),
        }
    }

    /// Destroys every submesh of `id` and evicts the entry. Unknown ids are a
    /// no-op; returns whether an entry existed.
    pub fn remove<Host>(&mut self, id: TrackableId, host: &mut Host) -> bool
    where
        Host: SubmeshHost<Handle = H>,
    {
        match self.entries.remove(&id) {
            Some(slots) => {
                let n = slots.release(host);
                log::trace!("released {} submeshes of {}", n, id);
                true
            }
            None => false,
        }
    }

    /// Removes every entry; returns how many there were.
    pub fn clear<Host>(&mut self, host: &mut Host) -> usize
    where
        Host: SubmeshHost<Handle = H>,
    {
        let n = self.entries.len();
        for (_, slots) in self.entries.drain() {
            slots.release(host);
        }
        n
    }

    pub fn stats(&self) -> TrackingTableStats {
        let mut out = TrackingTableStats {
            entries: self.entries.len(),
            ..Default::default()
        };
        for slots in self.entries.values() {
            for s in slots.iter() {
                out.submeshes += 1;
                out.triangles += s.mesh.triangle_count();
            }
        }
        out
    }
}
