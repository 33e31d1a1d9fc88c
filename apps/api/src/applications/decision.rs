use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::applications::in_flight::InFlightRegistry;
use crate::backend::{BackendError, JobBoardBackend, StatusTransition};
use crate::models::application::{ApplicationId, ApplicationStatus, JobApplication};

/// An admin's verdict on a pending application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Accepted,
    Rejected,
}

impl Decision {
    pub const fn target(self) -> ApplicationStatus {
        match self {
            Decision::Accepted => ApplicationStatus::Accepted,
            Decision::Rejected => ApplicationStatus::Rejected,
        }
    }
}

impl ApplicationStatus {
    /// `Pending` is the only state with outgoing transitions.
    pub fn apply(self, decision: Decision) -> Result<ApplicationStatus, DecisionError> {
        if self.is_terminal() {
            return Err(DecisionError::AlreadyDecided { current: self });
        }
        Ok(decision.target())
    }
}

#[derive(Debug, Error)]
pub enum DecisionError {
    #[error("application was already {current}")]
    AlreadyDecided { current: ApplicationStatus },

    #[error("a decision on application {0} is already in flight")]
    InFlight(ApplicationId),

    #[error("application {0} not found")]
    NotFound(ApplicationId),

    #[error("could not record decision: {0}")]
    Backend(#[source] BackendError),
}

/// Applies accept/reject decisions.
///
/// Two independent guards: the in-flight registry stops this process from
/// issuing a second request for the same application, and the backend's
/// compare-and-set refuses any transition out of a terminal state.
pub struct ApplicantDecisionMachine {
    backend: Arc<dyn JobBoardBackend>,
    in_flight: InFlightRegistry,
}

impl ApplicantDecisionMachine {
    pub fn new(backend: Arc<dyn JobBoardBackend>, in_flight: InFlightRegistry) -> Self {
        Self { backend, in_flight }
    }

    pub async fn decide(
        &self,
        application_id: &ApplicationId,
        decision: Decision,
    ) -> Result<JobApplication, DecisionError> {
        let _guard = self
            .in_flight
            .try_acquire(format!("decision:{application_id}"))
            .ok_or_else(|| DecisionError::InFlight(application_id.clone()))?;

        let application = self
            .backend
            .fetch_application(application_id)
            .await
            .map_err(DecisionError::Backend)?
            .ok_or_else(|| DecisionError::NotFound(application_id.clone()))?;

        let next = application.status.apply(decision)?;

        match self
            .backend
            .transition_status(application_id, ApplicationStatus::Pending, next)
            .await
        {
            Ok(StatusTransition::Applied(updated)) => {
                info!("Application {application_id} is now {}", updated.status);
                Ok(updated)
            }
            Ok(StatusTransition::Refused { current }) => {
                warn!("Decision on {application_id} lost the race; status is {current}");
                Err(DecisionError::AlreadyDecided { current })
            }
            Err(BackendError::NotFound(_)) => Err(DecisionError::NotFound(application_id.clone())),
            Err(err) => Err(DecisionError::Backend(err)),
        }
    }
}
