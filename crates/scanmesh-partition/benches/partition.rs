use criterion::{Criterion, black_box, criterion_group, criterion_main};

use scanmesh_classify::{FaceClasses, SemanticClass};
use scanmesh_geom::TriMesh;
use scanmesh_partition::{ClassMesh, extract_class, partition_into};

// Grid of n x n quads, two triangles each, classes cycling through all nine.
fn grid(n: usize) -> (TriMesh, FaceClasses) {
    let verts = (n + 1) * (n + 1);
    let mut pos = Vec::with_capacity(verts * 3);
    let mut norm = Vec::with_capacity(verts * 3);
    for z in 0..=n {
        for x in 0..=n {
            pos.extend_from_slice(&[x as f32, 0.0, z as f32]);
            norm.extend_from_slice(&[0.0, 1.0, 0.0]);
        }
    }
    let row = (n + 1) as u32;
    let mut idx = Vec::with_capacity(n * n * 6);
    for z in 0..n as u32 {
        for x in 0..n as u32 {
            let a = z * row + x;
            idx.extend_from_slice(&[a, a + row, a + 1, a + 1, a + row, a + row + 1]);
        }
    }
    let faces = (0..n * n * 2)
        .map(|i| SemanticClass::ALL[(i / 7) % SemanticClass::COUNT])
        .collect();
    (TriMesh::new(pos, norm, idx).unwrap(), faces)
}

fn bench_extract_single(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract_class");
    let (base, faces) = grid(128);
    let mut out = ClassMesh::default();
    group.bench_function("wall_128x128", |b| {
        b.iter(|| {
            let n = extract_class(&base, &faces, SemanticClass::Wall, &mut out).unwrap();
            black_box(n);
        })
    });
    group.finish();
}

fn bench_partition_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("partition_into");
    let (base, faces) = grid(128);
    let mut slots: Vec<ClassMesh> = vec![ClassMesh::default(); SemanticClass::COUNT];
    group.bench_function("all_classes_128x128", |b| {
        b.iter(|| {
            let counts = partition_into(
                &base,
                &faces,
                SemanticClass::ALL.iter().copied().zip(slots.iter_mut()),
            )
            .unwrap();
            black_box(counts);
        })
    });
    group.finish();
}

criterion_group!(benches, bench_extract_single, bench_partition_all);
criterion_main!(benches);
