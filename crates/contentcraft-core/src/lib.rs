pub mod ai;
pub mod catalog;
pub mod config;
pub mod content;
pub mod error;
pub mod generator;
pub mod history;
pub mod input;
pub mod prompt;
pub mod state;
pub mod storage;

// Re-export main types for convenience
pub use ai::{ElevenLabsClient, GeminiClient, ImageGenerator, SpeechSynthesizer, TextGenerator};
pub use catalog::{Catalog, FieldKind, FormField, OutputKind, Template};
pub use config::Config;
pub use content::{ContentKind, ExportOrigin};
pub use error::GenerationError;
pub use generator::Generator;
pub use history::{HistoryItem, HistoryStore};
pub use input::GenerationInput;
pub use prompt::Unmatched;
pub use state::{NavigationError, Navigator, View};
pub use storage::{KeyValueStore, MemoryStore, SqliteStore};
