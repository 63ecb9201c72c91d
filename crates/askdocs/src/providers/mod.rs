//! Provider traits and implementations for external collaborators

pub mod embedding;
pub mod generator;
pub mod memory;
pub mod ollama;
pub mod remote;
pub mod vector_index;

pub use embedding::EmbeddingProvider;
pub use generator::AnswerGenerator;
pub use memory::MemoryIndex;
pub use ollama::{OllamaClient, OllamaEmbedder, OllamaGenerator};
pub use remote::RemoteIndex;
pub use vector_index::VectorIndex;
