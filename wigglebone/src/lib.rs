//! Spring-driven jiggle (secondary motion) for skeletal bones.
//!
//! Each frame, a bone's motion relative to where it was on the previous frame is fed into a
//! damped spring. The spring's tension is turned back into an extra swing rotation and a
//! Y-axis stretch on the bone.
//!
//! The crate carries its own small armature model (`ArmatureData`/`Armature`), keyframed
//! actions, and a `Scene` that drives frame changes through the two jiggle hooks.

#![forbid(unsafe_code)]

mod error;
mod math;
mod model;
mod runtime;

#[cfg(feature = "json")]
pub mod json;

pub use error::*;
pub use math::*;
pub use model::*;
pub use runtime::*;
