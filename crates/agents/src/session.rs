use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use smarttrip_core::{ItineraryOption, TripRequest};
use uuid::Uuid;

use crate::error::PipelineError;

/// One trip being planned: the validated request, the current option set,
/// and which option the traveller picked.
#[derive(Debug)]
pub struct PlanningSession {
    id: Uuid,
    request: TripRequest,
    share_link: String,
    created_at: DateTime<Utc>,
    state: RwLock<SessionState>,
    in_flight: AtomicBool,
}

#[derive(Debug, Default)]
struct SessionState {
    options: Vec<ItineraryOption>,
    selected: Option<usize>,
    generation: u64,
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub share_link: String,
    pub created_at: DateTime<Utc>,
    pub trip: TripRequest,
    pub duration_days: u32,
    pub generation: u64,
    pub generating: bool,
    pub updated_at: Option<DateTime<Utc>>,
    pub selected_index: Option<usize>,
    pub options: Vec<ItineraryOption>,
}

impl PlanningSession {
    pub(crate) fn new(request: TripRequest, share_base_url: &str) -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            share_link: format!("{}/{}", share_base_url.trim_end_matches('/'), id),
            request,
            created_at: Utc::now(),
            state: RwLock::new(SessionState::default()),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn request(&self) -> &TripRequest {
        &self.request
    }

    pub fn share_link(&self) -> &str {
        &self.share_link
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Last time the option set changed, or creation time before the first set.
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.state.read().updated_at.unwrap_or(self.created_at)
    }

    /// Idle for at least `ttl` as of `now`. A session with a generation in
    /// flight never expires.
    pub fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        let Ok(ttl) = chrono::Duration::from_std(ttl) else {
            return false;
        };
        !self.is_generating()
            && self
                .last_activity()
                .checked_add_signed(ttl)
                .is_some_and(|deadline| deadline <= now)
    }

    pub fn is_generating(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn options(&self) -> Vec<ItineraryOption> {
        self.state.read().options.clone()
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.state.read().selected
    }

    /// Picks one of the already generated options. No generation happens.
    pub fn select(&self, index: usize) -> Result<ItineraryOption, PipelineError> {
        let mut state = self.state.write();
        let available = state.options.len();
        let option = state
            .options
            .get(index)
            .cloned()
            .ok_or(PipelineError::OptionOutOfRange { index, available })?;
        state.selected = Some(index);
        Ok(option)
    }

    pub fn view(&self) -> SessionView {
        let state = self.state.read();
        SessionView {
            session_id: self.id,
            share_link: self.share_link.clone(),
            created_at: self.created_at,
            trip: self.request.clone(),
            duration_days: self.request.duration_days(),
            generation: state.generation,
            generating: self.is_generating(),
            updated_at: state.updated_at,
            selected_index: state.selected,
            options: state.options.clone(),
        }
    }

    /// Claims the session for one generation. A second claim while the first
    /// is outstanding is refused.
    pub(crate) fn try_begin(&self) -> Result<InFlightGuard<'_>, PipelineError> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| PipelineError::Busy)?;
        Ok(InFlightGuard {
            flag: &self.in_flight,
        })
    }

    pub(crate) fn replace_options(&self, options: Vec<ItineraryOption>) {
        let mut state = self.state.write();
        state.selected = if options.is_empty() { None } else { Some(0) };
        state.options = options;
        state.generation += 1;
        state.updated_at = Some(Utc::now());
    }
}

/// Releases the in-flight claim when dropped, whatever the outcome.
pub(crate) struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
