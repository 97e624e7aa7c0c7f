// src/config/mod.rs
pub mod settings;
pub mod tuning;

pub use settings::{CosmosSettings, LanguageSettings, OpenAiSettings, TranslatorSettings};
pub use tuning::Tuning;
