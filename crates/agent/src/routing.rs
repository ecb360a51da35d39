//! Per-Message Intent Routing
//!
//! Each message is classified into exactly one [`Route`] by an ordered list
//! of rules; the first rule that matches wins. The only state consulted is
//! the session's "awaiting more symptoms" flag, so classification is cheap
//! and deterministic and runs before any model call.
//!
//! ```text
//! greeting > thanks > goodbye > help > awaiting(stop|continue)
//!          > direct specialist > schedule with them > language model
//! ```

use medibot_core::SpecialistCategory;
use medibot_text_processing::intent;

/// Outcome of routing one message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Greeting,
    Thanks,
    Goodbye,
    Help,
    /// User has no further symptoms to add
    AwaitingSymptomsStop,
    /// More symptom input while the flag is set
    AwaitingSymptomsContinue,
    /// User named a specialist or asked for a doctor
    DirectSpecialistRequest(SpecialistCategory),
    /// "schedule with them" against the last recommended provider
    ScheduleWithLastProvider,
    /// Everything else goes to the language model
    LlmDelegated,
}

impl Route {
    /// Stable label for logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            Route::Greeting => "greeting",
            Route::Thanks => "thanks",
            Route::Goodbye => "goodbye",
            Route::Help => "help",
            Route::AwaitingSymptomsStop => "awaiting_symptoms_stop",
            Route::AwaitingSymptomsContinue => "awaiting_symptoms_continue",
            Route::DirectSpecialistRequest(_) => "direct_specialist_request",
            Route::ScheduleWithLastProvider => "schedule_with_last_provider",
            Route::LlmDelegated => "llm_delegated",
        }
    }

    /// Whether handling this route calls the language model
    pub fn uses_llm(&self) -> bool {
        matches!(self, Route::AwaitingSymptomsContinue | Route::LlmDelegated)
    }
}

/// Inputs to classification
#[derive(Debug, Clone)]
pub struct RoutingContext {
    /// Lowercased, trimmed message
    pub normalized: String,
    pub awaiting_more_symptoms: bool,
}

impl RoutingContext {
    pub fn new(message: &str, awaiting_more_symptoms: bool) -> Self {
        Self {
            normalized: intent::normalize(message),
            awaiting_more_symptoms,
        }
    }
}

type Rule = (&'static str, fn(&RoutingContext) -> Option<Route>);

/// Routing rules in precedence order
pub const RULES: &[Rule] = &[
    ("greeting", |ctx| {
        intent::starts_with_greeting(&ctx.normalized).then_some(Route::Greeting)
    }),
    ("thanks", |ctx| {
        intent::contains_thanks(&ctx.normalized).then_some(Route::Thanks)
    }),
    ("goodbye", |ctx| {
        intent::contains_goodbye(&ctx.normalized).then_some(Route::Goodbye)
    }),
    ("help", |ctx| {
        intent::is_help_request(&ctx.normalized).then_some(Route::Help)
    }),
    ("awaiting_symptoms", |ctx| {
        if !ctx.awaiting_more_symptoms {
            return None;
        }
        Some(if intent::contains_negation(&ctx.normalized) {
            Route::AwaitingSymptomsStop
        } else {
            Route::AwaitingSymptomsContinue
        })
    }),
    ("direct_specialist", |ctx| {
        intent::find_specialist_keyword(&ctx.normalized).map(Route::DirectSpecialistRequest)
    }),
    // Whether a provider is on record is decided by the handler
    ("schedule_with_them", |ctx| {
        (intent::contains_scheduling_verb(&ctx.normalized) && intent::mentions_them(&ctx.normalized))
            .then_some(Route::ScheduleWithLastProvider)
    }),
];

/// First matching route, falling back to the language model
pub fn classify(ctx: &RoutingContext) -> Route {
    for (name, rule) in RULES {
        if let Some(route) = rule(ctx) {
            tracing::trace!(rule = *name, route = route.label(), "Routing rule matched");
            return route;
        }
    }
    Route::LlmDelegated
}
