use scanmesh_geom::TriMesh;
use thiserror::Error;

use crate::class::SemanticClass;

/// How many raw classification values the provider emits per geometric unit.
///
/// The numeric codes are the provider's "elements per vector" values and are
/// kept verbatim.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Granularity {
    /// Code 0: the provider did not say; values are per face.
    PerFaceImplicit,
    /// Code 1: one value per vertex.
    PerVertex,
    /// Code 3: one value per face (three vertex slots packed into one value).
    PerFaceExplicit,
}

impl Granularity {
    #[inline]
    pub fn from_code(code: u32) -> Option<Granularity> {
        match code {
            0 => Some(Granularity::PerFaceImplicit),
            1 => Some(Granularity::PerVertex),
            3 => Some(Granularity::PerFaceExplicit),
            _ => None,
        }
    }

    #[inline]
    pub const fn code(self) -> u32 {
        match self {
            Granularity::PerFaceImplicit => 0,
            Granularity::PerVertex => 1,
            Granularity::PerFaceExplicit => 3,
        }
    }

    #[inline]
    pub const fn is_per_face(self) -> bool {
        matches!(
            self,
            Granularity::PerFaceImplicit | Granularity::PerFaceExplicit
        )
    }
}

/// Classification buffer as fetched from the provider for one mesh.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawClassification {
    pub granularity: u32,
    pub values: Vec<u32>,
}

impl RawClassification {
    pub fn per_face(values: Vec<u32>) -> Self {
        Self {
            granularity: Granularity::PerFaceExplicit.code(),
            values,
        }
    }

    pub fn per_vertex(values: Vec<u32>) -> Self {
        Self {
            granularity: Granularity::PerVertex.code(),
            values,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifyError {
    #[error("classification buffer is empty")]
    Empty,
    #[error("unsupported classification granularity code {0}")]
    UnsupportedGranularity(u32),
    #[error("face {face} references vertex {vertex} outside classification buffer of length {len}")]
    VertexOutOfRange { face: usize, vertex: u32, len: usize },
}

impl ClassifyError {
    /// True when the buffer contradicts the mesh topology, as opposed to
    /// simply carrying no usable data.
    #[inline]
    pub fn is_precondition_violation(&self) -> bool {
        matches!(self, ClassifyError::VertexOutOfRange { .. })
    }
}

/// One class per triangle, in triangle order. `None` marks a raw value that
/// names no known class; such faces never match any class.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FaceClasses {
    classes: Vec<Option<SemanticClass>>,
}

impl FaceClasses {
    pub fn from_raw(values: &[u32]) -> Self {
        Self {
            classes: values.iter().map(|&v| SemanticClass::from_raw(v)).collect(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    #[inline]
    pub fn get(&self, face: usize) -> Option<SemanticClass> {
        self.classes.get(face).copied().flatten()
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<SemanticClass>> + '_ {
        self.classes.iter().copied()
    }

    /// Number of faces matching `class`.
    pub fn count(&self, class: SemanticClass) -> usize {
        self.classes.iter().filter(|c| **c == Some(class)).count()
    }

    /// Per-class face counts indexed by class value, plus the unrecognized count.
    pub fn histogram(&self) -> ([usize; SemanticClass::COUNT], usize) {
        let mut counts = [0usize; SemanticClass::COUNT];
        let mut unrecognized = 0usize;
        for c in &self.classes {
            match c {
                Some(class) => counts[class.index()] += 1,
                None => unrecognized += 1,
            }
        }
        (counts, unrecognized)
    }
}

impl From<Vec<SemanticClass>> for FaceClasses {
    fn from(v: Vec<SemanticClass>) -> Self {
        Self {
            classes: v.into_iter().map(Some).collect(),
        }
    }
}

impl FromIterator<SemanticClass> for FaceClasses {
    fn from_iter<I: IntoIterator<Item = SemanticClass>>(iter: I) -> Self {
        Self {
            classes: iter.into_iter().map(Some).collect(),
        }
    }
}

/// Converts a raw provider buffer into one class per triangle of `mesh`.
///
/// Per-face buffers are narrowed value by value. Per-vertex buffers take the
/// class of each triangle's first vertex only; the other two vertices are
/// ignored even when they disagree.
pub fn normalize(mesh: &TriMesh, raw: &RawClassification) -> Result<FaceClasses, ClassifyError> {
    let granularity = Granularity::from_code(raw.granularity)
        .ok_or(ClassifyError::UnsupportedGranularity(raw.granularity))?;
    if raw.values.is_empty() {
        return Err(ClassifyError::Empty);
    }

    let faces = if granularity.is_per_face() {
        FaceClasses::from_raw(&raw.values)
    } else {
        let len = raw.values.len();
        let mut classes = Vec::with_capacity(mesh.triangle_count());
        for (face, tri) in mesh.triangles().enumerate() {
            // Every corner must be covered, even though only the first is read.
            if let Some(&vertex) = tri.iter().find(|&&v| v as usize >= len) {
                return Err(ClassifyError::VertexOutOfRange { face, vertex, len });
            }
            classes.push(SemanticClass::from_raw(raw.values[tri[0] as usize]));
        }
        FaceClasses { classes }
    };

    let (_, unrecognized) = faces.histogram();
    if unrecognized > 0 {
        log::debug!(
            "{} of {} face classifications name no known class",
            unrecognized,
            faces.len()
        );
    }
    Ok(faces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanmesh_geom::Vec3;

    fn one_triangle() -> TriMesh {
        TriMesh::from_vertices(
            &[
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            &[],
            vec![0, 1, 2],
        )
        .unwrap()
    }

    #[test]
    fn granularity_codes_roundtrip() {
        for g in [
            Granularity::PerFaceImplicit,
            Granularity::PerVertex,
            Granularity::PerFaceExplicit,
        ] {
            assert_eq!(Granularity::from_code(g.code()), Some(g));
        }
        assert_eq!(Granularity::from_code(2), None);
        assert_eq!(Granularity::from_code(4), None);
    }

    #[test]
    fn first_vertex_wins() {
        let raw = RawClassification::per_vertex(vec![
            SemanticClass::Wall as u32,
            SemanticClass::Floor as u32,
            SemanticClass::Floor as u32,
        ]);
        let faces = normalize(&one_triangle(), &raw).unwrap();
        assert_eq!(faces.len(), 1);
        assert_eq!(faces.get(0), Some(SemanticClass::Wall));
    }

    #[test]
    fn implicit_code_zero_is_per_face() {
        let raw = RawClassification {
            granularity: 0,
            values: vec![SemanticClass::Seat as u32],
        };
        let faces = normalize(&one_triangle(), &raw).unwrap();
        assert_eq!(faces.get(0), Some(SemanticClass::Seat));
    }

    #[test]
    fn unsupported_granularity_is_no_data() {
        let raw = RawClassification {
            granularity: 2,
            values: vec![4],
        };
        let err = normalize(&one_triangle(), &raw).unwrap_err();
        assert_eq!(err, ClassifyError::UnsupportedGranularity(2));
        assert!(!err.is_precondition_violation());
    }

    #[test]
    fn empty_buffer_is_no_data() {
        let err = normalize(&one_triangle(), &RawClassification::per_face(vec![])).unwrap_err();
        assert_eq!(err, ClassifyError::Empty);
    }

    #[test]
    fn short_vertex_buffer_is_precondition_violation() {
        let mesh = TriMesh::new(vec![0.0; 12], vec![], vec![3, 1, 2]).unwrap();
        let raw = RawClassification::per_vertex(vec![4, 4, 4]);
        let err = normalize(&mesh, &raw).unwrap_err();
        assert_eq!(
            err,
            ClassifyError::VertexOutOfRange {
                face: 0,
                vertex: 3,
                len: 3
            }
        );
        assert!(err.is_precondition_violation());
    }

    #[test]
    fn uncovered_trailing_corner_is_precondition_violation() {
        // First vertex is covered; vertices 1 and 2 are not.
        let raw = RawClassification::per_vertex(vec![SemanticClass::Wall as u32]);
        let err = normalize(&one_triangle(), &raw).unwrap_err();
        assert_eq!(
            err,
            ClassifyError::VertexOutOfRange {
                face: 0,
                vertex: 1,
                len: 1
            }
        );
        assert!(err.is_precondition_violation());
    }

    #[test]
    fn later_face_with_uncovered_corner_fails_whole_buffer() {
        let mesh = TriMesh::new(vec![0.0; 12], vec![], vec![0, 1, 2, 0, 2, 3]).unwrap();
        let raw = RawClassification::per_vertex(vec![4, 4, 4]);
        let err = normalize(&mesh, &raw).unwrap_err();
        assert_eq!(
            err,
            ClassifyError::VertexOutOfRange {
                face: 1,
                vertex: 3,
                len: 3
            }
        );
    }

    #[test]
    fn unknown_values_match_nothing() {
        let faces = FaceClasses::from_raw(&[4, 42, 2]);
        let (counts, unrecognized) = faces.histogram();
        assert_eq!(counts[SemanticClass::Wall.index()], 1);
        assert_eq!(counts[SemanticClass::Floor.index()], 1);
        assert_eq!(unrecognized, 1);
        assert_eq!(faces.get(1), None);
        assert_eq!(faces.count(SemanticClass::Unknown), 0);
    }
}
