//! External collaborator clients
//!
//! Each client is an explicitly constructed, injected dependency; stage code
//! sees only the trait, never a process-wide singleton.

pub mod generation_client;
pub mod tts_client;

pub use generation_client::{GenerationClient, GenerationError, TextGenerator};
pub use tts_client::{HttpTtsClient, SpeechSynthesizer, TtsError};
