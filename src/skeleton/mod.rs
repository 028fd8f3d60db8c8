//! Read-only skeleton captures consumed by the correspondence resolver.

pub use self::snapshot::{BoneRecord, SkeletonSnapshot};

mod snapshot;
