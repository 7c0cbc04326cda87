use thiserror::Error;

use crate::Vec3;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MeshError {
    #[error("position array length {0} is not a multiple of 3")]
    PositionsNotXyz(usize),
    #[error("normal array length {normals} does not match position array length {positions}")]
    NormalCountMismatch { positions: usize, normals: usize },
    #[error("index array length {0} is not a multiple of 3")]
    IndicesNotTriangles(usize),
    #[error("triangle index {index} out of range for {vertices} vertices")]
    IndexOutOfRange { index: u32, vertices: usize },
}

/// Triangulated surface as delivered by the scanning subsystem.
///
/// Positions and normals are interleaved xyz triples; `idx` holds three
/// vertex indices per face and face order is the order of insertion.
/// Normals are either absent (empty) or one per vertex.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TriMesh {
    pos: Vec<f32>,
    norm: Vec<f32>,
    idx: Vec<u32>,
}

impl TriMesh {
    pub fn new(pos: Vec<f32>, norm: Vec<f32>, idx: Vec<u32>) -> Result<Self, MeshError> {
        if pos.len() % 3 != 0 {
            return Err(MeshError::PositionsNotXyz(pos.len()));
        }
        if !norm.is_empty() && norm.len() != pos.len() {
            return Err(MeshError::NormalCountMismatch {
                positions: pos.len(),
                normals: norm.len(),
            });
        }
        if idx.len() % 3 != 0 {
            return Err(MeshError::IndicesNotTriangles(idx.len()));
        }
        let vertices = pos.len() / 3;
        if let Some(&index) = idx.iter().find(|&&i| i as usize >= vertices) {
            return Err(MeshError::IndexOutOfRange { index, vertices });
        }
        Ok(Self { pos, norm, idx })
    }

    pub fn from_vertices(
        vertices: &[Vec3],
        normals: &[Vec3],
        idx: Vec<u32>,
    ) -> Result<Self, MeshError> {
        let flatten = |vs: &[Vec3]| vs.iter().flat_map(|v| [v.x, v.y, v.z]).collect::<Vec<_>>();
        Self::new(flatten(vertices), flatten(normals), idx)
    }

    #[inline]
    pub fn positions(&self) -> &[f32] {
        &self.pos
    }

    #[inline]
    pub fn normals(&self) -> &[f32] {
        &self.norm
    }

    #[inline]
    pub fn indices(&self) -> &[u32] {
        &self.idx
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.pos.len() / 3
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.idx.len() / 3
    }

    #[inline]
    pub fn triangle(&self, face: usize) -> [u32; 3] {
        let o = face * 3;
        [self.idx[o], self.idx[o + 1], self.idx[o + 2]]
    }

    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.idx.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> TriMesh {
        TriMesh::from_vertices(
            &[
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 1.0),
                Vec3::new(0.0, 0.0, 1.0),
            ],
            &[Vec3::UP; 4],
            vec![0, 1, 2, 0, 2, 3],
        )
        .unwrap()
    }

    #[test]
    fn counts_and_triangles() {
        let m = quad();
        assert_eq!(m.vertex_count(), 4);
        assert_eq!(m.triangle_count(), 2);
        assert_eq!(m.triangle(1), [0, 2, 3]);
        assert_eq!(m.triangles().collect::<Vec<_>>(), vec![[0, 1, 2], [0, 2, 3]]);
        assert_eq!(&m.positions()[6..9], &[1.0, 0.0, 1.0]);
        assert_eq!(m.normals().len(), 12);
    }

    #[test]
    fn rejects_partial_triangle() {
        let err = TriMesh::new(vec![0.0; 9], vec![], vec![0, 1]).unwrap_err();
        assert_eq!(err, MeshError::IndicesNotTriangles(2));
    }

    #[test]
    fn rejects_out_of_range_index() {
        let err = TriMesh::new(vec![0.0; 9], vec![], vec![0, 1, 3]).unwrap_err();
        assert_eq!(
            err,
            MeshError::IndexOutOfRange {
                index: 3,
                vertices: 3
            }
        );
    }

    #[test]
    fn rejects_mismatched_normals() {
        let err = TriMesh::new(vec![0.0; 9], vec![0.0; 6], vec![0, 1, 2]).unwrap_err();
        assert!(matches!(err, MeshError::NormalCountMismatch { .. }));
    }

    #[test]
    fn normals_may_be_absent() {
        let m = TriMesh::new(vec![0.0; 9], vec![], vec![0, 1, 2]).unwrap();
        assert_eq!(m.triangle_count(), 1);
        assert!(m.normals().is_empty());
        assert_eq!(TriMesh::default().triangle_count(), 0);
    }
}
