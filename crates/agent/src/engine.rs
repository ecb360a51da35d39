//! Dialogue Engine
//!
//! Orchestrates one turn: lock the user's session, classify the message,
//! run the matching handler and build the response envelope. Only the
//! language model can fail a turn; directory misses and malformed markers
//! degrade to fallback replies.

use chrono::{DateTime, Local, NaiveDate, Utc};
use std::sync::Arc;
use std::time::Duration;

use medibot_config::constants::sessions::STALENESS_SECS;
use medibot_core::{
    Error, LanguageModel, ResponseEnvelope, Result, ScheduleDirective, SpecialistResolver,
};
use medibot_llm::PromptBuilder;
use medibot_text_processing::directives::{
    extract_schedule_directive, extract_specialist_mention, extract_symptom_declaration,
    format_schedule_block, strip_marker_lines, strip_schedule_block,
};
use medibot_text_processing::temporal::{parse_date_with_today, parse_time};
use medibot_text_processing::{intent, log_preview, DEFAULT_TIME};
use medibot_tools::ProviderLookup;

use crate::responses;
use crate::routing::{classify, Route, RoutingContext};
use crate::session::{ConversationSession, SessionStore};

/// Per-user dialogue manager
#[derive(Clone)]
pub struct DialogueEngine {
    llm: Arc<dyn LanguageModel>,
    resolver: Arc<dyn SpecialistResolver>,
    lookup: ProviderLookup,
    sessions: Arc<SessionStore>,
    staleness: Duration,
}

impl DialogueEngine {
    pub fn new(
        llm: Arc<dyn LanguageModel>,
        resolver: Arc<dyn SpecialistResolver>,
        lookup: ProviderLookup,
        sessions: Arc<SessionStore>,
    ) -> Self {
        Self {
            llm,
            resolver,
            lookup,
            sessions,
            staleness: Duration::from_secs(STALENESS_SECS),
        }
    }

    /// Age after which prior symptom context is ignored
    pub fn with_staleness(mut self, staleness: Duration) -> Self {
        self.staleness = staleness;
        self
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub fn llm(&self) -> &Arc<dyn LanguageModel> {
        &self.llm
    }

    pub fn resolver_policy(&self) -> &'static str {
        self.resolver.policy()
    }

    /// Handle one message from `user_id`
    pub async fn process(&self, user_id: &str, message: &str) -> Result<ResponseEnvelope> {
        self.process_at(user_id, message, Utc::now()).await
    }

    /// [`Self::process`] at an explicit time
    pub async fn process_at(
        &self,
        user_id: &str,
        message: &str,
        now: DateTime<Utc>,
    ) -> Result<ResponseEnvelope> {
        let message = message.trim();
        if message.is_empty() {
            return Err(Error::missing_message());
        }

        let slot = self.sessions.slot(user_id);
        let mut session = slot.lock().await;

        let stale = session.is_stale(now, self.staleness);
        if stale && session.awaiting_more_symptoms {
            tracing::debug!(user_id = %user_id, "Stale session, no longer awaiting symptoms");
            session.awaiting_more_symptoms = false;
        }
        session.touch(now);

        let route = classify(&RoutingContext::new(message, session.awaiting_more_symptoms));
        metrics::counter!("medibot_dialogue_routes_total", "route" => route.label()).increment(1);
        tracing::info!(
            user_id = %user_id,
            route = route.label(),
            stale,
            message = %log_preview(message),
            "Processing message"
        );

        let turn = Turn {
            message,
            stale,
            today: now.with_timezone(&Local).date_naive(),
        };

        match route {
            Route::Greeting => Ok(ResponseEnvelope::text(responses::GREETING)),
            Route::Thanks => Ok(ResponseEnvelope::text(responses::THANKS)),
            Route::Goodbye => Ok(ResponseEnvelope::text(responses::GOODBYE)),
            Route::Help => Ok(ResponseEnvelope::text(responses::HELP_TEXT)),
            Route::AwaitingSymptomsStop => Ok(self.finish_symptoms(&mut session, &turn).await),
            Route::AwaitingSymptomsContinue => self.continue_symptoms(&mut session, &turn).await,
            Route::DirectSpecialistRequest(category) => {
                Ok(self.direct_request(&mut session, &turn, &category).await)
            }
            Route::ScheduleWithLastProvider => Ok(schedule_with_last_provider(&session, &turn)),
            Route::LlmDelegated => self.delegate(&mut session, &turn).await,
        }
    }

    /// Resolve accumulated symptoms and recommend a provider
    async fn finish_symptoms(
        &self,
        session: &mut ConversationSession,
        turn: &Turn<'_>,
    ) -> ResponseEnvelope {
        session.awaiting_more_symptoms = false;

        let specialists = self.resolver.resolve(&session.symptoms);
        tracing::debug!(
            symptoms = ?session.symptoms,
            specialists = ?specialists,
            "Resolved specialists"
        );

        let Some(specialist) = specialists.into_iter().next() else {
            return ResponseEnvelope::text(responses::stop_fallback());
        };

        let location = intent::extract_location(turn.message);
        match self.lookup.lookup(&specialist, location.as_deref()).await {
            Some(provider) => {
                let text = responses::stop_recommendation(&specialist, &provider);
                session.last_recommended_provider = Some(provider);
                ResponseEnvelope::text(text)
            }
            None => ResponseEnvelope::text(responses::stop_fallback()),
        }
    }

    /// Collect more symptoms through the model; its text is never shown
    async fn continue_symptoms(
        &self,
        session: &mut ConversationSession,
        turn: &Turn<'_>,
    ) -> Result<ResponseEnvelope> {
        let prompt = PromptBuilder::new()
            .with_today(turn.today)
            .user_message(turn.message)
            .build();
        let completion = self.llm.complete(&prompt).await?;

        let declaration = extract_symptom_declaration(&completion);
        session.merge_symptoms(&declaration.symptoms);
        session.set_severity(declaration.severity);

        Ok(ResponseEnvelope::text(responses::SYMPTOMS_NOTED))
    }

    async fn direct_request(
        &self,
        session: &mut ConversationSession,
        turn: &Turn<'_>,
        category: &str,
    ) -> ResponseEnvelope {
        let location = intent::extract_location(turn.message);
        match self.lookup.lookup(category, location.as_deref()).await {
            Some(provider) => {
                let text = responses::direct_found(category, &provider);
                session.last_recommended_provider = Some(provider);
                ResponseEnvelope::text(text)
            }
            None => ResponseEnvelope::text(responses::direct_not_found(category)),
        }
    }

    async fn delegate(
        &self,
        session: &mut ConversationSession,
        turn: &Turn<'_>,
    ) -> Result<ResponseEnvelope> {
        let mut prompt = PromptBuilder::new().with_today(turn.today);
        if !turn.stale && session.has_symptom_context() {
            prompt = prompt.with_prior_context(&session.symptoms, session.severity.as_deref());
        }
        let completion = self.llm.complete(&prompt.user_message(turn.message).build()).await?;

        let recommendation = match extract_specialist_mention(&completion) {
            Some(specialist) => {
                let location = intent::extract_location(turn.message);
                match self.lookup.lookup(&specialist, location.as_deref()).await {
                    Some(provider) => {
                        let block = responses::recommendation_block(&specialist, &provider);
                        session.last_recommended_provider = Some(provider);
                        Some(block)
                    }
                    None => Some(responses::lookup_failed_note(&specialist)),
                }
            }
            None => None,
        };

        let declaration = extract_symptom_declaration(&completion);
        if !declaration.symptoms.is_empty() {
            if turn.stale {
                session.replace_symptoms(&declaration.symptoms);
            } else {
                session.merge_symptoms(&declaration.symptoms);
            }
            session.set_severity(declaration.severity);
            session.awaiting_more_symptoms = true;
            return Ok(ResponseEnvelope::text(responses::MORE_SYMPTOMS_PROMPT));
        }
        session.set_severity(declaration.severity);

        let directive =
            extract_schedule_directive(&completion).map(|d| d.with_default_time(DEFAULT_TIME));
        let mut text = strip_schedule_block(&strip_marker_lines(&completion));
        if let Some(block) = recommendation {
            text.push_str(&block);
        }

        let text = match (text.trim().is_empty(), &directive) {
            (false, _) => text.trim().to_string(),
            (true, Some(directive)) => responses::event_added(directive),
            (true, None) => responses::EMPTY_REPLY_FALLBACK.to_string(),
        };

        Ok(match directive {
            Some(directive) => ResponseEnvelope::with_event(text, directive),
            None => ResponseEnvelope::text(text),
        })
    }
}

/// Per-turn inputs shared by the handlers
struct Turn<'a> {
    message: &'a str,
    stale: bool,
    today: NaiveDate,
}

/// Book the last recommended provider at the date and time named in the message
fn schedule_with_last_provider(session: &ConversationSession, turn: &Turn<'_>) -> ResponseEnvelope {
    let Some(provider) = &session.last_recommended_provider else {
        return ResponseEnvelope::text(responses::NO_PROVIDER_ON_RECORD);
    };

    let title = format!("Appointment with {}", provider.name);
    let date = parse_date_with_today(turn.message, turn.today);
    let time = parse_time(turn.message);

    let block = format_schedule_block(&title, &date, &time);
    let directive = extract_schedule_directive(&block).unwrap_or_else(|| {
        tracing::warn!(block = %block, "Synthesized schedule block did not parse");
        ScheduleDirective {
            title,
            date: date.clone(),
            time: Some(time.clone()),
        }
    });

    let text = responses::schedule_confirmation(provider, &date, &time);
    ResponseEnvelope::with_event(text, directive.with_default_time(DEFAULT_TIME))
}
