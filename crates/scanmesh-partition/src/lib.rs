//! Splits a classified base mesh into per-class submesh buffers (CPU only).
#![forbid(unsafe_code)]

mod class_mesh;
mod extract;

pub use class_mesh::ClassMesh;
pub use extract::{PartitionError, extract_class, partition_into};
