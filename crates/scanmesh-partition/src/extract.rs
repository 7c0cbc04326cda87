use scanmesh_classify::{FaceClasses, SemanticClass};
use scanmesh_geom::TriMesh;
use thiserror::Error;

use crate::class_mesh::ClassMesh;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PartitionError {
    #[error("mesh has {triangles} triangles but {faces} face classifications")]
    FaceCountMismatch { triangles: usize, faces: usize },
}

#[inline]
fn check_face_count(base: &TriMesh, faces: &FaceClasses) -> Result<(), PartitionError> {
    if base.triangle_count() != faces.len() {
        return Err(PartitionError::FaceCountMismatch {
            triangles: base.triangle_count(),
            faces: faces.len(),
        });
    }
    Ok(())
}

fn fill_class(base: &TriMesh, faces: &FaceClasses, target: SemanticClass, out: &mut ClassMesh) -> usize {
    let matched = faces.count(target);
    out.clear_keep_capacity();
    if matched == 0 {
        return 0;
    }

    out.idx.reserve(matched * 3);
    let idx = base.indices();
    for (face, class) in faces.iter().enumerate() {
        if class == Some(target) {
            let o = face * 3;
            out.idx.extend_from_slice(&idx[o..o + 3]);
        }
    }
    out.pos.extend_from_slice(base.positions());
    out.norm.extend_from_slice(base.normals());
    matched
}

/// Writes into `out` the faces of `base` classified as `target`.
///
/// Faces keep their base-mesh order and vertex indices; vertices and normals
/// are copied whole. With no matching face `out` is left empty but usable.
/// Returns the number of faces written.
pub fn extract_class(
    base: &TriMesh,
    faces: &FaceClasses,
    target: SemanticClass,
    out: &mut ClassMesh,
) -> Result<usize, PartitionError> {
    check_face_count(base, faces)?;
    let matched = fill_class(base, faces, target, out);
    log::trace!("extracted {} {} faces of {}", matched, target, base.triangle_count());
    Ok(matched)
}

/// Runs [`extract_class`] for each `(class, buffer)` slot after validating the
/// face count once. Returns matched face counts indexed by class value.
pub fn partition_into<'a>(
    base: &TriMesh,
    faces: &FaceClasses,
    slots: impl IntoIterator<Item = (SemanticClass, &'a mut ClassMesh)>,
) -> Result<[usize; SemanticClass::COUNT], PartitionError> {
    check_face_count(base, faces)?;
    let mut counts = [0usize; SemanticClass::COUNT];
    for (class, out) in slots {
        counts[class.index()] = fill_class(base, faces, class, out);
    }
    Ok(counts)
}
