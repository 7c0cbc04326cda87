//! Scene scripts: meshes, provider responses and a notification sequence,
//! replayed through the runtime with the in-memory host.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use scanmesh_classify::{Granularity, ParseClassError, RawClassification, SemanticClass};
use scanmesh_geom::{MeshError, Quat, Transform, TriMesh, Vec3};
use scanmesh_runtime::{
    ClassTemplates, EventOutcome, EventRecord, FetchError, MemoryHost, MeshChanges, ParseIdError,
    Runtime, RuntimeConfig, ScriptedSource, TemplateEntry, TemplateError, TrackableId,
};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("failed to read scene: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse scene: {0}")]
    Toml(#[from] toml::de::Error),
    #[error(transparent)]
    Templates(#[from] TemplateError),
    #[error(transparent)]
    Id(#[from] ParseIdError),
    #[error(transparent)]
    Class(#[from] ParseClassError),
    #[error("mesh `{name}`: {source}")]
    Mesh { name: String, source: MeshError },
    #[error("notification {step} references unknown mesh `{name}`")]
    UnknownMesh { step: usize, name: String },
    #[error("classification for {id} needs `values` or `classes`, not both")]
    AmbiguousClassification { id: TrackableId },
}

// --- File format ---

#[derive(Deserialize, Default)]
struct SceneFile {
    #[serde(default)]
    config: RuntimeConfig,
    /// Run without a classification provider.
    #[serde(default)]
    no_provider: bool,
    #[serde(default)]
    templates: HashMap<String, TemplateEntry>,
    #[serde(default)]
    meshes: Vec<MeshDef>,
    #[serde(default)]
    notifications: Vec<NotificationDef>,
}

#[derive(Deserialize)]
struct MeshDef {
    name: String,
    positions: Vec<f32>,
    normals: Vec<f32>,
    indices: Vec<u32>,
}

#[derive(Deserialize, Default)]
struct NotificationDef {
    /// Provider responses changed before the notification is delivered.
    #[serde(default)]
    classify: Vec<ClassificationDef>,
    #[serde(default)]
    added: Vec<AddedDef>,
    #[serde(default)]
    updated: Vec<MeshRefDef>,
    #[serde(default)]
    removed: Vec<String>,
}

#[derive(Deserialize)]
struct ClassificationDef {
    id: String,
    granularity: Option<u32>,
    values: Option<Vec<u32>>,
    classes: Option<Vec<String>>,
    #[serde(default)]
    unavailable: bool,
}

#[derive(Deserialize)]
struct AddedDef {
    id: String,
    mesh: String,
    #[serde(default)]
    position: [f32; 3],
    /// Quaternion as `[x, y, z, w]`.
    rotation: Option<[f32; 4]>,
}

#[derive(Deserialize)]
struct MeshRefDef {
    id: String,
    mesh: String,
}

// --- Validated scene ---

#[derive(Clone, Debug)]
pub enum Response {
    Data(RawClassification),
    Unavailable,
}

#[derive(Clone, Debug, Default)]
pub struct Step {
    pub classify: Vec<(TrackableId, Response)>,
    pub added: Vec<(TrackableId, String, Transform)>,
    pub updated: Vec<(TrackableId, String)>,
    pub removed: Vec<TrackableId>,
}

#[derive(Debug)]
pub struct Scene {
    pub templates: ClassTemplates,
    pub config: RuntimeConfig,
    pub provider: bool,
    pub meshes: hashbrown::HashMap<String, TriMesh>,
    pub steps: Vec<Step>,
}

impl Scene {
    pub fn from_toml_str(toml_str: &str) -> Result<Self, SceneError> {
        let file: SceneFile = toml::from_str(toml_str)?;
        Self::from_file(file)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    fn from_file(file: SceneFile) -> Result<Self, SceneError> {
        let templates = ClassTemplates::from_entries(&file.templates)?;
        let mut meshes = hashbrown::HashMap::new();
        for def in file.meshes {
            let mesh = TriMesh::new(def.positions, def.normals, def.indices).map_err(|source| {
                SceneError::Mesh {
                    name: def.name.clone(),
                    source,
                }
            })?;
            meshes.insert(def.name, mesh);
        }

        let mut steps = Vec::with_capacity(file.notifications.len());
        for (i, n) in file.notifications.into_iter().enumerate() {
            let known = |name: &str| {
                if meshes.contains_key(name) {
                    Ok(())
                } else {
                    Err(SceneError::UnknownMesh {
                        step: i,
                        name: name.to_string(),
                    })
                }
            };
            let mut step = Step::default();
            for c in n.classify {
                let id: TrackableId = c.id.parse()?;
                step.classify.push((id, response(id, c)?));
            }
            for a in n.added {
                known(&a.mesh)?;
                let rotation = a
                    .rotation
                    .map(|[x, y, z, w]| Quat::from_xyzw(x, y, z, w).normalized())
                    .unwrap_or(Quat::IDENTITY);
                let [px, py, pz] = a.position;
                let position = Vec3::new(px, py, pz);
                step.added
                    .push((a.id.parse()?, a.mesh, Transform::new(position, rotation)));
            }
            for u in n.updated {
                known(&u.mesh)?;
                step.updated.push((u.id.parse()?, u.mesh));
            }
            for r in n.removed {
                step.removed.push(r.parse()?);
            }
            steps.push(step);
        }

        Ok(Scene {
            templates,
            config: file.config,
            provider: !file.no_provider,
            meshes,
            steps,
        })
    }

    /// Feeds every notification through a fresh runtime. Tracked submeshes
    /// are left alive so the caller can inspect them.
    pub fn replay(&self) -> Replay {
        let mut runtime = Runtime::new(self.templates.clone(), MemoryHost::new())
            .with_config(self.config.clone());
        if self.provider {
            runtime.set_source(Some(ScriptedSource::new()));
        }
        let mut records = Vec::new();

        for (i, step) in self.steps.iter().enumerate() {
            if let Some(source) = runtime.source_mut() {
                for (id, resp) in &step.classify {
                    match resp {
                        Response::Data(raw) => source.set(*id, raw.clone()),
                        Response::Unavailable => source.set_error(*id, FetchError::Unavailable),
                    }
                }
            }

            let mut changes = MeshChanges::new();
            // Mesh names were checked while loading.
            for (id, name, transform) in &step.added {
                if let Some(mesh) = self.meshes.get(name) {
                    changes = changes.add(*id, mesh, *transform);
                }
            }
            for (id, name) in &step.updated {
                if let Some(mesh) = self.meshes.get(name) {
                    changes = changes.update(*id, mesh);
                }
            }
            for id in &step.removed {
                changes = changes.remove(*id);
            }

            for record in runtime.apply(&changes) {
                log::info!(
                    "step {}: {:?} {} -> {}",
                    i,
                    record.kind,
                    record.id,
                    describe(&record.outcome)
                );
                records.push((i, record));
            }
        }
        Replay { runtime, records }
    }
}

fn response(id: TrackableId, c: ClassificationDef) -> Result<Response, SceneError> {
    if c.unavailable {
        return Ok(Response::Unavailable);
    }
    let values = match (c.values, c.classes) {
        (Some(_), Some(_)) => return Err(SceneError::AmbiguousClassification { id }),
        (Some(values), None) => values,
        (None, Some(names)) => names
            .iter()
            .map(|n| n.parse::<SemanticClass>().map(|class| class as u32))
            .collect::<Result<Vec<_>, _>>()?,
        (None, None) => Vec::new(),
    };
    Ok(Response::Data(RawClassification {
        granularity: c
            .granularity
            .unwrap_or(Granularity::PerFaceExplicit.code()),
        values,
    }))
}

pub fn describe(outcome: &EventOutcome) -> String {
    let counts = |faces: &[usize; SemanticClass::COUNT]| {
        SemanticClass::ALL
            .iter()
            .filter(|c| faces[c.index()] > 0)
            .map(|c| format!("{}={}", c, faces[c.index()]))
            .collect::<Vec<_>>()
            .join(" ")
    };
    match outcome {
        EventOutcome::Tracked { faces } => format!("tracked [{}]", counts(faces)),
        EventOutcome::Refreshed { faces } => format!("refreshed [{}]", counts(faces)),
        EventOutcome::Removed => "removed".to_string(),
        EventOutcome::Skipped(reason) => format!("skipped ({})", reason),
        EventOutcome::AlreadyTracked => "ignored (already tracked)".to_string(),
        EventOutcome::NotTracked => "ignored (not tracked)".to_string(),
    }
}

pub struct Replay {
    pub runtime: Runtime<ScriptedSource, MemoryHost>,
    /// Every handled event with the index of its notification.
    pub records: Vec<(usize, EventRecord)>,
}

impl Replay {
    /// Tracked ids in order, each with per-class triangle counts.
    pub fn tracked(&self) -> Vec<(TrackableId, Vec<(SemanticClass, usize)>)> {
        let table = self.runtime.table();
        let mut ids: Vec<TrackableId> = table.ids().collect();
        ids.sort();
        ids.into_iter()
            .filter_map(|id| {
                let slots = table.get(id)?;
                let classes = slots
                    .iter()
                    .map(|s| (s.class, s.mesh.triangle_count()))
                    .collect();
                Some((id, classes))
            })
            .collect()
    }

    pub fn print_summary(&self) {
        let stats = self.runtime.stats();
        println!(
            "{} notifications: {} tracked, {} refreshed, {} removed, {} skipped, {} ignored",
            stats.notifications,
            stats.tracked,
            stats.refreshed,
            stats.removed,
            stats.skipped,
            stats.ignored
        );
        let table = self.runtime.table().stats();
        println!(
            "{} tracked meshes, {} class submeshes, {} triangles",
            table.entries, table.submeshes, table.triangles
        );
        for (id, classes) in self.tracked() {
            let parts: Vec<String> = classes
                .iter()
                .map(|(c, n)| format!("{}={}", c, n))
                .collect();
            println!("  {} [{}]", id, parts.join(" "));
        }
        let host = self.runtime.host().stats();
        println!(
            "host: {} live, {} created, {} destroyed, {} uploads",
            self.runtime.host().live_count(),
            host.created,
            host.destroyed,
            host.uploads
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanmesh_runtime::{EventKind, SkipReason};

    const SCENE: &str = r#"
[templates]
wall = "WallMesh"
floor = { prefab = "FloorMesh", material = "Carpet" }

[[meshes]]
name = "quad"
positions = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0]
normals = [0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0]
indices = [0, 1, 2, 0, 2, 3]

[[notifications]]
classify = [{ id = "1-1", classes = ["wall", "floor"] }]
added = [{ id = "1-1", mesh = "quad", position = [0.0, 2.0, 0.0] }]

[[notifications]]
classify = [{ id = "1-1", unavailable = true }]
updated = [{ id = "1-1", mesh = "quad" }, { id = "2-2", mesh = "quad" }]

[[notifications]]
classify = [{ id = "1-1", granularity = 1, values = [2, 4, 4, 4] }]
updated = [{ id = "1-1", mesh = "quad" }]
"#;

    #[test]
    fn parses_and_replays() {
        let scene = Scene::from_toml_str(SCENE).unwrap();
        assert_eq!(scene.steps.len(), 3);
        assert_eq!(scene.templates.configured_count(), 2);

        let replay = scene.replay();
        let outcomes: Vec<_> = replay
            .records
            .iter()
            .map(|(i, r)| (*i, r.kind, r.outcome.clone()))
            .collect();
        assert!(matches!(outcomes[0], (0, EventKind::Added, EventOutcome::Tracked { .. })));
        assert_eq!(
            outcomes[1],
            (
                1,
                EventKind::Updated,
                EventOutcome::Skipped(SkipReason::Fetch(FetchError::Unavailable))
            )
        );
        assert_eq!(outcomes[2], (1, EventKind::Updated, EventOutcome::NotTracked));
        // Per-vertex: faces start at vertex 0 (floor) and 0 (floor).
        assert!(matches!(outcomes[3], (2, EventKind::Updated, EventOutcome::Refreshed { .. })));

        let tracked = replay.tracked();
        assert_eq!(tracked.len(), 1);
        assert_eq!(
            tracked[0].1,
            vec![(SemanticClass::Floor, 2), (SemanticClass::Wall, 0)]
        );
        let slots = replay.runtime.table().get(TrackableId::new(1, 1)).unwrap();
        let wall = slots.get(SemanticClass::Wall).unwrap();
        assert_eq!(wall.transform.position, Vec3::new(0.0, 2.0, 0.0));
    }

    #[test]
    fn demo_scene_replays() {
        let scene = Scene::from_toml_str(include_str!("../demos/scene.toml")).unwrap();
        let replay = scene.replay();
        let tracked = replay.tracked();
        assert_eq!(tracked.len(), 1);
        let (id, classes) = &tracked[0];
        assert_eq!(*id, TrackableId::new(0xB2, 1));
        // Both faces start at vertex 0, which is a table vertex.
        assert!(classes.contains(&(SemanticClass::Table, 2)));
        assert!(classes.contains(&(SemanticClass::Seat, 0)));
        assert_eq!(replay.runtime.host().live_count(), 4);
    }

    #[test]
    fn no_provider_skips_adds() {
        let src = format!("no_provider = true\n{}", SCENE);
        let replay = Scene::from_toml_str(&src).unwrap().replay();
        assert_eq!(
            replay.records[0].1.outcome,
            EventOutcome::Skipped(SkipReason::MissingSubsystem)
        );
        assert_eq!(replay.runtime.host().live_count(), 0);
    }

    #[test]
    fn rejects_unknown_mesh_reference() {
        let err = Scene::from_toml_str(
            r#"
[[notifications]]
added = [{ id = "1-1", mesh = "missing" }]
"#,
        )
        .unwrap_err();
        assert!(matches!(err, SceneError::UnknownMesh { step: 0, .. }));
    }

    #[test]
    fn rejects_bad_ids_and_classes() {
        let err = Scene::from_toml_str("[[notifications]]\nremoved = [\"nope\"]\n").unwrap_err();
        assert!(matches!(err, SceneError::Id(_)));
        let err = Scene::from_toml_str(
            "[[notifications]]\nclassify = [{ id = \"1-1\", classes = [\"sofa\"] }]\n",
        )
        .unwrap_err();
        assert!(matches!(err, SceneError::Class(_)));
    }

    #[test]
    fn rejects_templates_naming_one_class_twice() {
        let err = Scene::from_toml_str("[templates]\nwall = \"A\"\nWALL = \"B\"\n").unwrap_err();
        assert!(matches!(
            err,
            SceneError::Templates(TemplateError::DuplicateClass { .. })
        ));
    }

    #[test]
    fn rejects_bad_mesh() {
        let err = Scene::from_toml_str(
            r#"
[[meshes]]
name = "broken"
positions = [0.0, 0.0, 0.0]
normals = [0.0, 0.0, 1.0]
indices = [0, 1, 2]
"#,
        )
        .unwrap_err();
        assert!(matches!(err, SceneError::Mesh { .. }));
    }
}
