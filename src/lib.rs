pub mod assist;
pub mod buffer;
pub mod config;
pub mod language;
pub mod lsp;
pub mod workspace;
