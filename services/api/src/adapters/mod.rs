pub mod db;
pub mod storage;
pub mod text_llm;

pub use db::DbAdapter;
pub use storage::{CloudinaryStorage, UnconfiguredStorage};
pub use text_llm::{OpenAiTextAdapter, UnconfiguredTextGenerator};
