//! Input-side helpers: extension-based classification and resolution of
//! command-line input paths into validated [`textra_core::InputSpec`]s.

pub mod mime_detect;
pub mod resolver;

pub use mime_detect::{detect_mime_type, input_kind, is_audio, is_document, is_image};
pub use resolver::{classify, resolve, resolve_all};
