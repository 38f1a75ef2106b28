pub mod error;
pub mod mock;
pub mod traits;
pub mod types;

pub use error::{Result, TextraError};
pub use mock::MockRecognizer;
pub use traits::Recognizer;
pub use types::{
    Destination, InputKind, InputSpec, Origin, OutputKind, OutputRequest, Position,
    RecognitionRequest, RecognitionResult, Recognized, Region, Scope, Unit, PLACEHOLDER,
};
