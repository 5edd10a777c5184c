pub mod generation;
pub mod kv;

pub use generation::{OpenAiGenerationAdapter, UnavailableGenerationAdapter};
pub use kv::MemoryKvAdapter;
