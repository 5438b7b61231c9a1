use crate::{JiggleSettings, relative_vector};
use glam::{Mat4, Vec3};

/// Spring state carried from one frame to the next for a single bone.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct JiggleState {
    /// Bone matrix (armature space) at the end of its previous update.
    pub reference: Mat4,
    /// Accumulated tension. Only X and Z drive rotation.
    pub spring: Vec3,
    pub velocity: Vec3,
}

impl Default for JiggleState {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY)
    }
}

/// What the integrator reads from a bone each frame.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BoneSample {
    /// Current bone matrix in armature space.
    pub matrix: Mat4,
    /// The bone's local (pose) space in armature space: parent pose times rest offset.
    pub local_space: Mat4,
    /// Current local rotation as XYZ euler angles.
    pub rotation: Vec3,
}

/// Result of one integrator step.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct JiggleOutput {
    /// Positional lag in the previous frame's bone space.
    pub vec: Vec3,
    /// Keyed swing change. Zero unless the bone is animated.
    pub deltarot: Vec3,
    pub tension: Vec3,
    /// Extra euler rotation derived from `tension`, in radians.
    pub offset: Vec3,
    /// New local rotation (XYZ euler) to store on the bone.
    pub rotation: Vec3,
    pub scale_y: f32,
}

impl JiggleState {
    pub fn new(reference: Mat4) -> Self {
        Self {
            reference,
            spring: Vec3::ZERO,
            velocity: Vec3::ZERO,
        }
    }

    /// Zeroes the spring, keeping the reference matrix.
    pub fn reset_motion(&mut self) {
        self.spring = Vec3::ZERO;
        self.velocity = Vec3::ZERO;
    }

    pub fn is_finite(&self) -> bool {
        self.spring.is_finite() && self.velocity.is_finite()
    }

    /// Advances the spring by one frame.
    ///
    /// The reference matrix is always replaced by `sample.matrix`. On the start frame the
    /// spring is reset and the returned output carries no motion.
    pub fn step(
        &mut self,
        settings: &JiggleSettings,
        sample: &BoneSample,
        start_frame: bool,
    ) -> JiggleOutput {
        let mut vec = relative_vector(&self.reference, &sample.matrix);

        // Swing change between where the bone was left last frame and where its keys put it now.
        let previous = crate::euler_from_quat(crate::matrix_rotation(
            &(sample.local_space.inverse() * self.reference),
        ));
        let mut deltarot = if settings.animated {
            Vec3::new(
                previous.z - sample.rotation.z,
                0.0,
                sample.rotation.x - previous.x,
            )
        } else {
            Vec3::ZERO
        };

        self.reference = sample.matrix;

        let mut tension = self.spring + vec + deltarot;
        self.velocity = (self.velocity - tension * settings.stiffness) * (1.0 - settings.dampen);
        self.spring = tension + self.velocity;

        if start_frame {
            vec = Vec3::ZERO;
            deltarot = Vec3::ZERO;
            tension = Vec3::ZERO;
            self.reset_motion();
        }

        let offset = Vec3::new(
            (-tension.z * settings.amplitude).to_radians(),
            0.0,
            (tension.x * settings.amplitude).to_radians(),
        );
        let additional = if settings.animated {
            sample.rotation
        } else {
            Vec3::ZERO
        };
        let rotation = Vec3::new(
            additional.x + offset.x,
            sample.rotation.y,
            additional.z + offset.z,
        );

        JiggleOutput {
            vec,
            deltarot,
            tension,
            offset,
            rotation,
            scale_y: 1.0 - vec.y * settings.stretch,
        }
    }
}
