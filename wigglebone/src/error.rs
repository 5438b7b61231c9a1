use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown armature: {name}")]
    UnknownArmature { name: String },

    #[error("duplicate armature name: {name}")]
    DuplicateArmature { name: String },

    #[error("unknown bone '{bone}' in armature '{armature}'")]
    UnknownBone { armature: String, bone: String },

    #[error("unknown action: {name}")]
    UnknownAction { name: String },

    #[error("invalid value: {message}")]
    InvalidValue { message: String },

    #[cfg(feature = "json")]
    #[error("failed to parse scene JSON: {message}")]
    JsonParse { message: String },

    #[cfg(feature = "json")]
    #[error("unknown parent bone '{parent}' for bone '{bone}'")]
    JsonUnknownBoneParent { bone: String, parent: String },

    #[cfg(feature = "json")]
    #[error("duplicate bone name '{bone}' in armature '{armature}'")]
    JsonDuplicateBone { armature: String, bone: String },

    #[cfg(feature = "json")]
    #[error("unknown bone '{bone}' referenced by action '{action}'")]
    JsonUnknownActionBone { action: String, bone: String },

    #[cfg(feature = "json")]
    #[error("unsupported rotation mode '{value}' for bone '{bone}'")]
    JsonUnsupportedRotationMode { bone: String, value: String },

    #[cfg(feature = "json")]
    #[error("invalid keyframes for action '{action}', bone '{bone}': {message}")]
    JsonInvalidKeyframes {
        action: String,
        bone: String,
        message: String,
    },
}
