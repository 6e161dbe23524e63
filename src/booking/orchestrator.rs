//! End-to-end claim run
//!
//! One run walks a fixed sequence: login, settle, clock sync, warm-up,
//! keep-alive, wait (with one offset refinement), listing fetch, ranking and
//! claim attempts. A step failure aborts the run and is reported with the
//! step it happened in. The keep-alive task is stopped and joined on every
//! exit path.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::booking::claim::{classify_failure, ClaimAttempt, FailureClass};
use crate::booking::ranker::{Ranker, Ranking};
use crate::booking::source::{CandidateSource, SourceSettings};
use crate::client::CountySession;
use crate::config::{ClientConfig, Config, TimingConfig};
use crate::error::{Error, TeeshotErrorTrait};
use crate::models::{Candidate, Confirmation, Credentials, TargetConfig};
use crate::parser::{ListingHtmlParser, ListingParser};
use crate::scheduler::{
    sleep_or_cancel, until_cancelled, ClockOffset, ClockSync, PrecisionWaiter, SessionKeeper,
};
use crate::utils::format_clock;

/// Step of a run, used to report where it stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStep {
    Session,
    Login,
    Settle,
    ClockSync,
    WarmUp,
    KeepAlive,
    Refine,
    Countdown,
    Delay,
    FetchListing,
    Rank,
    Claim,
}

impl fmt::Display for RunStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Session => "session",
            Self::Login => "login",
            Self::Settle => "settle",
            Self::ClockSync => "clock-sync",
            Self::WarmUp => "warm-up",
            Self::KeepAlive => "keep-alive",
            Self::Refine => "refine",
            Self::Countdown => "countdown",
            Self::Delay => "delay",
            Self::FetchListing => "fetch-listing",
            Self::Rank => "rank",
            Self::Claim => "claim",
        };
        f.write_str(name)
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// A reservation was made
    Booked {
        candidate: Candidate,
        confirmation: Confirmation,
    },
    /// Dry run: the candidate that would have been claimed
    DryRun { candidate: Candidate },
    /// Nothing in the listing matched the window and course filter
    NoCandidates,
    /// Every shortlisted candidate failed
    Exhausted { tried: usize },
    /// Stopped on request
    Cancelled,
    /// A step failed and the run was aborted
    Failed { step: RunStep, reason: String },
}

impl RunOutcome {
    pub fn is_booked(&self) -> bool {
        matches!(self, Self::Booked { .. })
    }

    /// Process exit code for this outcome
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Booked { .. } | Self::DryRun { .. } => 0,
            Self::NoCandidates | Self::Exhausted { .. } => 2,
            Self::Cancelled => 130,
            Self::Failed { .. } => 1,
        }
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Booked {
                candidate,
                confirmation,
            } => write!(
                f,
                "booked {candidate} (reservation {} / no. {})",
                confirmation.reservation_id, confirmation.reservation_no
            ),
            Self::DryRun { candidate } => write!(f, "dry run, would claim {candidate}"),
            Self::NoCandidates => f.write_str("no matching tee times"),
            Self::Exhausted { tried } => write!(f, "all {tried} candidates failed"),
            Self::Cancelled => f.write_str("cancelled"),
            Self::Failed { step, reason } => write!(f, "failed at {step}: {reason}"),
        }
    }
}

/// Timing and retry parameters of a run
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub settle_delay: Duration,
    pub clock_attempts: u32,
    pub clock_retry_pause: Duration,
    /// Lead before the target at which the offset is re-measured; also the
    /// countdown threshold
    pub refine_lead: Duration,
    pub keepalive_interval: Duration,
    pub keepalive_tick: Duration,
    /// Keep-alive stops this long before the target
    pub keepalive_lead: Duration,
    pub listing: SourceSettings,
    pub claim_candidates: usize,
    pub claim_attempts: u32,
    pub claim_retry_pause: Duration,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self::from(&TimingConfig::default())
    }
}

impl From<&TimingConfig> for RunSettings {
    fn from(timing: &TimingConfig) -> Self {
        Self {
            settle_delay: Duration::from_millis(timing.settle_delay_ms),
            clock_attempts: timing.clock_attempts,
            clock_retry_pause: Duration::from_millis(timing.clock_retry_pause_ms),
            refine_lead: Duration::from_secs(timing.refine_lead_secs),
            keepalive_interval: Duration::from_secs(timing.keepalive_interval_secs),
            keepalive_tick: Duration::from_millis(timing.keepalive_tick_ms),
            keepalive_lead: Duration::from_secs(timing.keepalive_lead_secs),
            listing: SourceSettings::from(timing),
            claim_candidates: timing.claim_candidates,
            claim_attempts: timing.claim_attempts.max(1),
            claim_retry_pause: Duration::from_millis(timing.claim_retry_pause_ms),
        }
    }
}

/// A step failure carried up to [`Orchestrator::run`]
struct StepFailure {
    step: RunStep,
    error: Error,
}

trait AtStep<T> {
    fn at(self, step: RunStep) -> std::result::Result<T, StepFailure>;
}

impl<T, E: Into<Error>> AtStep<T> for std::result::Result<T, E> {
    fn at(self, step: RunStep) -> std::result::Result<T, StepFailure> {
        self.map_err(|e| StepFailure {
            step,
            error: e.into(),
        })
    }
}

type StepResult<T> = std::result::Result<T, StepFailure>;

fn cancelled_at(step: RunStep) -> StepFailure {
    StepFailure {
        step,
        error: Error::Cancelled,
    }
}

fn ensure_active(cancel: &CancellationToken, step: RunStep) -> StepResult<()> {
    if cancel.is_cancelled() {
        Err(cancelled_at(step))
    } else {
        Ok(())
    }
}

/// Await a step's request, abandoning it if the run is cancelled meanwhile
async fn guarded<T, E, F>(cancel: &CancellationToken, step: RunStep, future: F) -> StepResult<T>
where
    E: Into<Error>,
    F: Future<Output = std::result::Result<T, E>>,
{
    match until_cancelled(future, cancel).await {
        Some(result) => result.at(step),
        None => Err(cancelled_at(step)),
    }
}

fn error_chain(error: &Error) -> String {
    let mut chain = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        let text = cause.to_string();
        if !chain.contains(&text) {
            chain.push_str(": ");
            chain.push_str(&text);
        }
        source = cause.source();
    }
    chain
}

fn chrono_duration(duration: Duration) -> ChronoDuration {
    ChronoDuration::from_std(duration).unwrap_or_else(|_| ChronoDuration::zero())
}

/// Drives a claim run from login to reservation
pub struct Orchestrator {
    client: ClientConfig,
    settings: RunSettings,
    clock: ClockSync,
    waiter: PrecisionWaiter,
    source: CandidateSource,
    parser: Box<dyn ListingParser>,
    ranker: Ranker,
    claim: ClaimAttempt,
}

impl Orchestrator {
    pub fn new(client: ClientConfig, settings: RunSettings) -> Self {
        Self {
            clock: ClockSync::new(settings.clock_attempts, settings.clock_retry_pause),
            waiter: PrecisionWaiter::new(settings.refine_lead),
            source: CandidateSource::new(settings.listing.clone()),
            parser: Box::new(ListingHtmlParser::new()),
            ranker: Ranker::new(settings.claim_candidates),
            claim: ClaimAttempt::new(),
            client,
            settings,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.client.clone(), RunSettings::from(&config.timing))
    }

    /// Replace the listing parser
    pub fn with_parser(mut self, parser: Box<dyn ListingParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    /// Execute one run
    ///
    /// Consumes the credentials; they are dropped once login is done.
    /// Cancelling `cancel` stops the run at the next suspension point and
    /// abandons any request in flight. Dropping the returned future also
    /// stops the keep-alive task.
    pub async fn run(
        &self,
        target: &TargetConfig,
        credentials: Credentials,
        cancel: CancellationToken,
    ) -> RunOutcome {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "run",
            run_id = %run_id,
            club = %target.club_seq,
            date = %target.claim_date_param()
        );

        async {
            tracing::info!(
                run_at = %target.run_at,
                window = %target.window,
                course = %target.category,
                order = %target.order,
                dry_run = target.dry_run,
                "Claim run starting"
            );

            let keeper_cancel = cancel.child_token();
            let _keeper_guard = keeper_cancel.clone().drop_guard();
            let mut keeper: Option<JoinHandle<u32>> = None;

            let outcome = match self
                .execute(target, credentials, &cancel, &keeper_cancel, &mut keeper)
                .await
            {
                Ok(outcome) => outcome,
                Err(failure) if failure.error.is_cancelled() => {
                    tracing::warn!(step = %failure.step, "Run cancelled");
                    RunOutcome::Cancelled
                }
                Err(failure) => {
                    tracing::error!(
                        step = %failure.step,
                        category = %failure.error.category(),
                        error = %error_chain(&failure.error),
                        "Run aborted"
                    );
                    RunOutcome::Failed {
                        step: failure.step,
                        reason: failure.error.to_string(),
                    }
                }
            };

            keeper_cancel.cancel();
            if let Some(handle) = keeper.take() {
                match handle.await {
                    Ok(pings) => tracing::debug!(pings, "Keep-alive task joined"),
                    Err(e) => tracing::warn!(error = %e, "Keep-alive task ended abnormally"),
                }
            }

            tracing::info!(outcome = %outcome, "Run finished; background work stopped");
            outcome
        }
        .instrument(span)
        .await
    }

    async fn execute(
        &self,
        target: &TargetConfig,
        credentials: Credentials,
        cancel: &CancellationToken,
        keeper_cancel: &CancellationToken,
        keeper: &mut Option<JoinHandle<u32>>,
    ) -> StepResult<RunOutcome> {
        let mut session =
            CountySession::new(&self.client, target.club_seq.clone()).at(RunStep::Session)?;

        ensure_active(cancel, RunStep::Login)?;
        guarded(cancel, RunStep::Login, session.login(&credentials)).await?;
        drop(credentials);

        tracing::info!(
            settle_ms = self.settings.settle_delay.as_millis() as u64,
            "Letting the session settle"
        );
        if !sleep_or_cancel(self.settings.settle_delay, cancel).await {
            return Err(cancelled_at(RunStep::Settle));
        }

        let run_instant = target.run_instant();
        let mut offset = self
            .clock
            .measure(&session, cancel)
            .await
            .at(RunStep::ClockSync)?;
        let mut target_at = offset.to_local(run_instant);
        log_target(&offset, target_at, "Initial target");

        ensure_active(cancel, RunStep::WarmUp)?;
        guarded(cancel, RunStep::WarmUp, session.warm_up()).await?;
        tracing::info!("Tee-time page opened; session is active");

        ensure_active(cancel, RunStep::KeepAlive)?;
        let cutoff = target_at - chrono_duration(self.settings.keepalive_lead);
        let keeper_task = SessionKeeper::with_interval(
            session.pinger().at(RunStep::KeepAlive)?,
            self.settings.keepalive_interval,
            self.settings.keepalive_tick,
        );
        *keeper = Some(keeper_task.spawn(cutoff, keeper_cancel.clone()));

        let refine_at = target_at - chrono_duration(self.settings.refine_lead);
        if Utc::now() < refine_at {
            if self
                .waiter
                .wait_until(refine_at, cancel, false)
                .await
                .is_cancelled()
            {
                return Err(cancelled_at(RunStep::Refine));
            }

            tracing::info!("Re-measuring server time before the countdown");
            offset = self
                .clock
                .measure(&session, cancel)
                .await
                .at(RunStep::Refine)?;
            target_at = offset.to_local(run_instant);
            log_target(&offset, target_at, "Refined target");
        } else {
            tracing::warn!("Less than the refinement lead remains; keeping the initial offset");
        }

        if self
            .waiter
            .wait_until(target_at, cancel, true)
            .await
            .is_cancelled()
        {
            return Err(cancelled_at(RunStep::Countdown));
        }

        if !target.attempt_delay.is_zero() {
            tracing::info!(
                delay_ms = target.attempt_delay.as_millis() as u64,
                "Applying attempt delay"
            );
            if !sleep_or_cancel(target.attempt_delay, cancel).await {
                return Err(cancelled_at(RunStep::Delay));
            }
        }

        let date = target.claim_date_param();
        let document = self
            .source
            .fetch(&session, &date, cancel)
            .await
            .at(RunStep::FetchListing)?;
        let candidates = self.parser.extract_candidates(document.body());

        ensure_active(cancel, RunStep::Rank)?;
        let ranking = self
            .ranker
            .rank(candidates, &target.window, &target.category, target.order);

        let Some(best) = ranking.best() else {
            tracing::warn!("No tee times match the window and course filter");
            return Ok(RunOutcome::NoCandidates);
        };

        if target.dry_run {
            tracing::info!(candidate = %best, slot_id = %best.slot_id, "Dry run; not claiming");
            return Ok(RunOutcome::DryRun {
                candidate: best.clone(),
            });
        }

        self.claim_shortlist(&session, &date, &ranking, &offset, cancel)
            .await
    }

    async fn claim_shortlist(
        &self,
        session: &CountySession,
        date: &str,
        ranking: &Ranking,
        offset: &ClockOffset,
        cancel: &CancellationToken,
    ) -> StepResult<RunOutcome> {
        let shortlist = ranking.shortlist();
        let max_attempts = self.settings.claim_attempts;
        tracing::info!(candidates = shortlist.len(), max_attempts, "Claiming in ranked order");

        for (index, candidate) in shortlist.iter().enumerate() {
            let rank = index + 1;

            for attempt in 1..=max_attempts {
                ensure_active(cancel, RunStep::Claim)?;
                tracing::info!(
                    rank,
                    candidate = %candidate,
                    attempt,
                    max_attempts,
                    "Claim attempt"
                );

                let attempt_future = self.claim.attempt(session, date, candidate, offset);
                let Some(outcome) = until_cancelled(attempt_future, cancel).await else {
                    return Err(cancelled_at(RunStep::Claim));
                };
                if let (true, Some(confirmation)) = (outcome.success, outcome.confirmation) {
                    return Ok(RunOutcome::Booked {
                        candidate: candidate.clone(),
                        confirmation,
                    });
                }

                tracing::warn!(rank, attempt, message = %outcome.message, "Claim attempt failed");
                if classify_failure(&outcome.message) == FailureClass::SlotGone {
                    tracing::warn!(rank, candidate = %candidate, "Slot taken or closed; moving on");
                    break;
                }

                if attempt < max_attempts {
                    tracing::info!(
                        pause_ms = self.settings.claim_retry_pause.as_millis() as u64,
                        "Retrying the same candidate"
                    );
                    if !sleep_or_cancel(self.settings.claim_retry_pause, cancel).await {
                        return Err(cancelled_at(RunStep::Claim));
                    }
                }
            }

            tracing::warn!(rank, candidate = %candidate, "Candidate exhausted");
        }

        tracing::error!(tried = shortlist.len(), "Every shortlisted candidate failed");
        Ok(RunOutcome::Exhausted {
            tried: shortlist.len(),
        })
    }
}

fn log_target(offset: &ClockOffset, target_at: DateTime<Utc>, label: &str) {
    tracing::info!(
        target = %format_clock(target_at),
        offset_secs = offset.seconds(),
        degraded = offset.is_degraded(),
        "{label} (KST, local clock)"
    );
}
