pub mod catalog;
pub mod context;
pub mod engine;
pub mod labels;
pub mod types;
pub mod vocabulary;
