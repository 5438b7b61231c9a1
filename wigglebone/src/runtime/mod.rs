mod animation;
mod armature;
mod jiggle;
mod registry;
mod scene;

pub use animation::*;
pub use armature::*;
pub use jiggle::*;
pub use registry::*;
pub use scene::*;



#[cfg(test)]
mod animation_tests;


#[cfg(test)]
mod scene_tests;
