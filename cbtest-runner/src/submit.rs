//! Compile + submit as one fallible step.

use std::sync::atomic::{AtomicBool, Ordering};

use cbtest_core::{compile, CompiledPayload, StrategyState};
use tracing::{info, warn};

use crate::engine::{BacktestEngine, EngineResult, SubmitError};
use crate::session::Session;

/// A payload and the engine's answer to it.
#[derive(Debug, Clone)]
pub struct Submission {
    pub payload: CompiledPayload,
    pub result: EngineResult,
}

/// Compile `state` and send it to `engine` with the session's credential.
///
/// Nothing is sent if compilation fails or the session is signed out. A 401
/// clears the session credential. The state is only read, so after any
/// failure it can be edited and resubmitted unchanged.
pub fn compile_and_submit<E>(
    state: &StrategyState,
    engine: &E,
    session: &mut Session,
) -> Result<Submission, SubmitError>
where
    E: BacktestEngine + ?Sized,
{
    let payload = compile(state).map_err(|e| {
        warn!(error = %e, "configuration rejected before submission");
        SubmitError::from(e)
    })?;
    let credential = session.credential().ok_or(SubmitError::NotAuthenticated)?;

    match engine.submit(&payload, credential) {
        Ok(result) => {
            info!(
                predicates = payload.exclude_conditions().len(),
                "backtest completed"
            );
            Ok(Submission { payload, result })
        }
        Err(SubmitError::Unauthorized) => {
            warn!("engine returned 401; discarding credential");
            session.invalidate();
            Err(SubmitError::Unauthorized)
        }
        Err(e) => {
            warn!(error = %e, "backtest submission failed");
            Err(e)
        }
    }
}

/// At most one submission in flight at a time.
///
/// A second call while the first is still running fails immediately with
/// `AlreadyInFlight` instead of queueing.
#[derive(Debug, Default)]
pub struct Submitter {
    in_flight: AtomicBool,
}

impl Submitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn submit<E>(
        &self,
        state: &StrategyState,
        engine: &E,
        session: &mut Session,
    ) -> Result<Submission, SubmitError>
    where
        E: BacktestEngine + ?Sized,
    {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(SubmitError::AlreadyInFlight);
        }
        let _guard = InFlight(&self.in_flight);
        compile_and_submit(state, engine, session)
    }
}

/// Clears the in-flight flag on drop, including on panic.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
