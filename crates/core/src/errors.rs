//! Error types for the core sync domain.

use thiserror::Error;

/// Rejections raised while validating a sync push payload. These are
/// surfaced before any storage access, so a rejected push is never
/// partially applied.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SyncValidationError {
    #[error("Request body must be an object.")]
    BodyNotObject,

    #[error("Field 'presets' must be an array.")]
    PresetsNotArray,

    #[error("Each preset must be an object containing an 'id' field.")]
    PresetMissingId,

    #[error("Duplicate preset id '{0}' in payload.")]
    DuplicatePresetId(String),

    #[error("Field 'salesByPreset' must be an object of arrays.")]
    SalesByPresetInvalid,

    #[error("Field 'clientVersion' must be a finite number when provided.")]
    ClientVersionInvalid,
}
