/*!
clothfit
========

**clothfit** fits a clothing skinned mesh onto a differently-shaped
character skinned mesh. It establishes a correspondence between two
skeletons that share no canonical naming schema, rigidly aligns the
clothing skeleton onto its character counterparts, then detects and
resolves surface interpenetration between the posed meshes at vertex
granularity with shape-preserving smoothing.

*/

#![deny(non_camel_case_types)]
#![deny(unused_parens)]
#![deny(non_upper_case_globals)]
#![warn(missing_docs)]
#![warn(unused_imports)]
#![allow(missing_copy_implementations)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::manual_range_contains)]

#[macro_use]
extern crate approx;

pub extern crate nalgebra as na;

pub mod alignment;
pub mod collision;
pub mod correspondence;
pub mod pipeline;
pub mod scene;
pub mod skeleton;
pub mod smoothing;
pub mod utils;

/// Aliases for the mathematical types used throughout this crate.
pub mod math {
    pub use na::{Isometry3, Matrix3, Point3, Translation3, UnitQuaternion, UnitVector3, Vector3};

    /// The scalar type used throughout this crate.
    pub type Real = f32;

    /// The default tolerance used for geometric operations.
    pub const DEFAULT_EPSILON: Real = Real::EPSILON;

    /// The dimension of the space.
    pub const DIM: usize = 3;

    /// The point type.
    pub type Point = Point3<Real>;

    /// The vector type.
    pub type Vector = Vector3<Real>;

    /// The unit vector type.
    pub type UnitVector = UnitVector3<Real>;

    /// The rotation type.
    pub type Rotation = UnitQuaternion<Real>;
}
