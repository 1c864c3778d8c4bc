//! Caret-context classification and snippet alignment.
//!
//! Per query, [`token::classify`] and [`context::resolve`] run first, then
//! [`strategy::select`] picks what to ask the backend for. The backend is the
//! only suspension point; every candidate it returns goes through
//! [`align::align`] before it is handed to the host as a [`Suggestion`].

pub mod align;
pub mod backend;
pub mod candidate;
pub mod context;
pub mod engine;
pub mod error;
pub mod imports;
pub mod lifecycle;
pub mod strategy;
pub mod token;

pub use candidate::{CandidateSnippet, InsertionPlan, Suggestion};
pub use context::{ResolvedContext, SyntaxContext};
pub use engine::{AssistEngine, QuerySnapshot};
pub use error::AssistError;
pub use lifecycle::{QueryController, QueryHandle, QueryState, Trigger};
pub use strategy::Strategy;
pub use token::{Token, TokenKind};
