//! Dialogue management for the medical assistant
//!
//! Features:
//! - Per-user conversation sessions with staleness, idle eviction and a size bound
//! - Ordered, rule-based intent routing ahead of any model call
//! - Symptom collection, specialist resolution and provider recommendation
//! - Appointment directives for the last recommended provider

pub mod engine;
pub mod responses;
pub mod routing;
pub mod session;

pub use engine::DialogueEngine;
pub use routing::{classify, Route, RoutingContext};
pub use session::{is_session_stale, ConversationSession, SessionSlot, SessionStore};
