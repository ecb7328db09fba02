//! API response models, annotated with `utoipa` for the generated documentation.

pub mod aliases;
