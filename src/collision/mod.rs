//! Posed surface baking and vertex-level penetration resolution.

pub use self::aabb::Aabb;
pub use self::baked::BakedSurface;
pub use self::resolver::{
    resolve_buffer, PenetrationCandidate, ResolveSettings, MAX_PUSH_OUT, MAX_THRESHOLD,
    MIN_PUSH_OUT, MIN_THRESHOLD,
};
pub use self::triangle::Triangle;

mod aabb;
mod baked;
mod resolver;
mod triangle;
