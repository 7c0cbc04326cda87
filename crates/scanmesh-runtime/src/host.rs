use hashbrown::HashMap;
use scanmesh_classify::SemanticClass;
use scanmesh_geom::Transform;
use scanmesh_partition::ClassMesh;

use crate::templates::SubmeshTemplate;

/// Scene-graph side of a class submesh: creates, refreshes and releases the
/// engine object that displays one [`ClassMesh`].
pub trait SubmeshHost {
    type Handle;

    fn instantiate(
        &mut self,
        class: SemanticClass,
        template: &SubmeshTemplate,
        transform: &Transform,
    ) -> Self::Handle;

    fn upload(&mut self, handle: &mut Self::Handle, mesh: &ClassMesh);

    fn destroy(&mut self, handle: Self::Handle);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MemoryHandle(u64);

#[derive(Clone, Debug)]
pub struct LiveSubmesh {
    pub class: SemanticClass,
    pub prefab: String,
    pub transform: Transform,
    pub uploads: u32,
    pub triangles: usize,
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryHostStats {
    pub created: u64,
    pub destroyed: u64,
    pub uploads: u64,
}

/// Host that keeps submesh objects in memory; used headless and in tests.
#[derive(Default, Debug)]
pub struct MemoryHost {
    live: HashMap<u64, LiveSubmesh>,
    next_serial: u64,
    stats: MemoryHostStats,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn get(&self, handle: &MemoryHandle) -> Option<&LiveSubmesh> {
        self.live.get(&handle.0)
    }

    pub fn stats(&self) -> MemoryHostStats {
        self.stats
    }
}

impl SubmeshHost for MemoryHost {
    type Handle = MemoryHandle;

    fn instantiate(
        &mut self,
        class: SemanticClass,
        template: &SubmeshTemplate,
        transform: &Transform,
    ) -> MemoryHandle {
        self.next_serial += 1;
        let serial = self.next_serial;
        self.live.insert(
            serial,
            LiveSubmesh {
                class,
                prefab: template.prefab.clone(),
                transform: *transform,
                uploads: 0,
                triangles: 0,
            },
        );
        self.stats.created += 1;
        MemoryHandle(serial)
    }

    fn upload(&mut self, handle: &mut MemoryHandle, mesh: &ClassMesh) {
        if let Some(live) = self.live.get_mut(&handle.0) {
            live.uploads += 1;
            live.triangles = mesh.triangle_count();
            self.stats.uploads += 1;
        } else {
            log::warn!("upload to released submesh #{}", handle.0);
        }
    }

    fn destroy(&mut self, handle: MemoryHandle) {
        if self.live.remove(&handle.0).is_some() {
            self.stats.destroyed += 1;
        } else {
            log::warn!("double release of submesh #{}", handle.0);
        }
    }
}
