//! Text processing for the medical assistant
//!
//! This crate provides the pure, stateless parsing used by the dialogue
//! engine:
//! - **Directives**: `FIND_SPECIALIST:`, `Symptoms:`/`Severity:` and
//!   `SCHEDULE_EVENT:` marker extraction from model output
//! - **Temporal**: best-effort 12-hour time and `M/D/YY` date parsing
//! - **Intent**: word-boundary token matchers used for routing
//! - **Preview**: grapheme-safe truncation for log fields
//!
//! # Example
//!
//! ```
//! use medibot_text_processing::directives::extract_schedule_directive;
//! use medibot_text_processing::temporal::parse_time;
//!
//! let text = "SCHEDULE_EVENT:\nTitle: Checkup\nDate: 2025-03-08";
//! let directive = extract_schedule_directive(text).unwrap();
//! assert_eq!(directive.time, None);
//! assert_eq!(parse_time("2pm"), "2:00 PM");
//! ```

pub mod directives;
pub mod intent;
pub mod preview;
pub mod temporal;

pub use directives::{
    extract_schedule_directive, extract_specialist_mention, extract_symptom_declaration,
    SymptomDeclaration,
};
pub use preview::log_preview;
pub use temporal::{parse_date, parse_time, DEFAULT_TIME};
