use std::env;
use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;
use smarttrip_core::{build_prompt, parse_itinerary_response, ParsedResponse, TripForm, TripRequest};
use smarttrip_generation::GenerationClient;
use smarttrip_observability::AppMetrics;
use tracing::{info, instrument, warn};

mod error;
mod session;

pub use error::PipelineError;
pub use session::{PlanningSession, SessionView};

pub const DEFAULT_SHARE_BASE_URL: &str = "https://smarttrip.app/join";

/// Runs trip requests through prompt building, generation and response
/// decoding, and keeps each session's option set current.
pub struct ItineraryPlanner<G>
where
    G: GenerationClient,
{
    client: Arc<G>,
    metrics: Arc<AppMetrics>,
    share_base_url: String,
}

impl<G> Clone for ItineraryPlanner<G>
where
    G: GenerationClient,
{
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            metrics: self.metrics.clone(),
            share_base_url: self.share_base_url.clone(),
        }
    }
}

impl<G> ItineraryPlanner<G>
where
    G: GenerationClient,
{
    pub fn new(client: Arc<G>, metrics: Arc<AppMetrics>) -> Self {
        let share_base_url = env::var("SMARTTRIP_SHARE_BASE_URL")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_SHARE_BASE_URL.to_string());

        Self {
            client,
            metrics,
            share_base_url,
        }
    }

    pub fn with_share_base_url(mut self, share_base_url: impl Into<String>) -> Self {
        self.share_base_url = share_base_url.into();
        self
    }

    pub fn client(&self) -> &G {
        &self.client
    }

    pub fn metrics(&self) -> &Arc<AppMetrics> {
        &self.metrics
    }

    /// Validates the form and opens a session. Nothing is sent to the
    /// generation service here.
    pub fn open_session(
        &self,
        form: &TripForm,
        today: NaiveDate,
    ) -> Result<Arc<PlanningSession>, PipelineError> {
        let request = form.validate(today).map_err(|error| {
            warn!(error = %error, "trip form rejected");
            PipelineError::Validation(error)
        })?;
        Ok(Arc::new(PlanningSession::new(request, &self.share_base_url)))
    }

    /// Opens a session and fills it with its first option set.
    pub async fn plan(
        &self,
        form: &TripForm,
        today: NaiveDate,
    ) -> Result<(Arc<PlanningSession>, SessionView), PipelineError> {
        let session = self.open_session(form, today)?;
        let view = self.generate(&session).await?;
        Ok((session, view))
    }

    /// Produces a fresh option set for the session and replaces the old one
    /// wholesale. On failure the previous options stay untouched. Refused with
    /// [`PipelineError::Busy`] while another generation for the same session
    /// is outstanding.
    #[instrument(skip(self, session), fields(session_id = %session.id()))]
    pub async fn generate(&self, session: &PlanningSession) -> Result<SessionView, PipelineError> {
        let guard = match session.try_begin() {
            Ok(guard) => guard,
            Err(error) => {
                self.metrics.inc_busy_rejection();
                warn!("generation refused, one is already in flight");
                return Err(error);
            }
        };

        let started = Instant::now();
        self.metrics.inc_generation();
        let result = self.run_pipeline(session.request()).await;
        self.metrics.observe_latency(started.elapsed());

        match result {
            Ok(parsed) => {
                self.metrics.add_options(parsed.options.len());
                self.metrics.add_images_dropped(parsed.images_dropped);
                info!(
                    options = parsed.options.len(),
                    images_dropped = parsed.images_dropped,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "itinerary options generated"
                );
                session.replace_options(parsed.options);
                drop(guard);
                Ok(session.view())
            }
            Err(error) => {
                self.metrics.inc_failure();
                warn!(kind = error.kind(), error = %error, "itinerary generation failed");
                Err(error)
            }
        }
    }

    /// Same pipeline, same trip; the new set never merges with the old one.
    pub async fn regenerate(&self, session: &PlanningSession) -> Result<SessionView, PipelineError> {
        self.generate(session).await
    }

    /// Prompt, generate, decode. Stateless.
    pub async fn run_pipeline(&self, request: &TripRequest) -> Result<ParsedResponse, PipelineError> {
        info!(
            destination = %request.destination(),
            duration_days = request.duration_days(),
            group_type = %request.group_type(),
            "generating itinerary"
        );

        let prompt = build_prompt(request);
        let text = self.client.generate(&prompt).await?;
        let parsed = parse_itinerary_response(&text)?;
        Ok(parsed)
    }
}
