pub mod api;
pub mod language;
pub mod models;

pub use language::Language;
