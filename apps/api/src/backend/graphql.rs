use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use super::{BackendError, JobBoardBackend, StatusTransition};
use crate::attachments::reference::AttachmentReference;
use crate::graphql::{operations, GqlOutcome, GraphqlClient};
use crate::models::application::{ApplicationId, ApplicationStatus, JobApplication, NewApplication};
use crate::models::job::SavedJob;
use crate::models::profile::{AttachmentPatch, PersonalDetails, UserProfile};

// ────────────────────────────────────────────────────────────────────────────
// Wire shapes (camelCase, as the backend schema spells them)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileDto {
    email: String,
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    education: Option<String>,
    #[serde(default)]
    experience: Option<String>,
    #[serde(default)]
    skills: Option<Vec<String>>,
    #[serde(default)]
    resume: AttachmentReference,
    #[serde(default)]
    cover_letter: AttachmentReference,
    #[serde(default)]
    profile_photo: AttachmentReference,
    #[serde(default)]
    self_intro_video: AttachmentReference,
}

impl From<ProfileDto> for UserProfile {
    fn from(dto: ProfileDto) -> Self {
        UserProfile {
            email: dto.email,
            details: PersonalDetails {
                full_name: dto.full_name.unwrap_or_default(),
                phone: dto.phone.unwrap_or_default(),
                address: dto.address.unwrap_or_default(),
                education: dto.education.unwrap_or_default(),
                experience: dto.experience.unwrap_or_default(),
                skills: dto.skills.unwrap_or_default(),
            },
            resume: dto.resume,
            cover_letter: dto.cover_letter,
            profile_photo: dto.profile_photo,
            self_intro_video: dto.self_intro_video,
        }
    }
}

impl From<&UserProfile> for ProfileDto {
    fn from(profile: &UserProfile) -> Self {
        let details = &profile.details;
        ProfileDto {
            email: profile.email.clone(),
            full_name: Some(details.full_name.clone()),
            phone: Some(details.phone.clone()),
            address: Some(details.address.clone()),
            education: Some(details.education.clone()),
            experience: Some(details.experience.clone()),
            skills: Some(details.skills.clone()),
            resume: profile.resume.clone(),
            cover_letter: profile.cover_letter.clone(),
            profile_photo: profile.profile_photo.clone(),
            self_intro_video: profile.self_intro_video.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AttachmentPatchDto<'a> {
    resume: &'a AttachmentReference,
    cover_letter: &'a AttachmentReference,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApplicationDto {
    id: String,
    user_email: String,
    job_id: String,
    #[serde(default)]
    resume: AttachmentReference,
    #[serde(default)]
    cover_letter: AttachmentReference,
    applied_at: DateTime<Utc>,
    status: ApplicationStatus,
}

impl From<ApplicationDto> for JobApplication {
    fn from(dto: ApplicationDto) -> Self {
        JobApplication {
            id: ApplicationId(dto.id),
            user_email: dto.user_email,
            job_id: dto.job_id,
            resume: dto.resume,
            cover_letter: dto.cover_letter,
            applied_at: dto.applied_at,
            status: dto.status,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewApplicationDto<'a> {
    user_email: &'a str,
    job_id: &'a str,
    resume: &'a AttachmentReference,
    cover_letter: &'a AttachmentReference,
    applied_at: DateTime<Utc>,
    status: ApplicationStatus,
}

#[derive(Debug, Deserialize)]
struct DecisionDto {
    applied: bool,
    application: ApplicationDto,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SavedJobDto {
    job_id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    deadline: Option<DateTime<Utc>>,
}

// ────────────────────────────────────────────────────────────────────────────
// Backend implementation
// ────────────────────────────────────────────────────────────────────────────

/// `JobBoardBackend` over the job board's GraphQL API.
#[derive(Clone)]
pub struct GraphqlBackend {
    client: GraphqlClient,
}

impl GraphqlBackend {
    pub fn new(client: GraphqlClient) -> Self {
        Self { client }
    }
}

/// `NotFound` becomes `Ok(None)`; conflicts and transport errors become errors.
fn settle<T>(outcome: GqlOutcome<T>) -> Result<Option<T>, BackendError> {
    match outcome {
        GqlOutcome::Data(data) => Ok(Some(data)),
        GqlOutcome::NotFound => Ok(None),
        GqlOutcome::Conflict(message) => Err(BackendError::Conflict(message)),
        GqlOutcome::TransportError(err) => Err(BackendError::Transport(err.to_string())),
    }
}

#[async_trait]
impl JobBoardBackend for GraphqlBackend {
    async fn fetch_profile(&self, email: &str) -> Result<Option<UserProfile>, BackendError> {
        let outcome = self
            .client
            .execute::<_, ProfileDto>(&operations::USER_PROFILE, &json!({ "email": email }))
            .await;
        Ok(settle(outcome)?.map(UserProfile::from))
    }

    async fn save_profile(&self, profile: &UserProfile) -> Result<UserProfile, BackendError> {
        let input = ProfileDto::from(profile);
        let outcome = self
            .client
            .execute::<_, ProfileDto>(&operations::SAVE_USER_PROFILE, &json!({ "input": input }))
            .await;
        settle(outcome)?
            .map(UserProfile::from)
            .ok_or_else(|| BackendError::NotFound(format!("profile {}", profile.email)))
    }

    async fn update_profile_attachments(
        &self,
        email: &str,
        patch: &AttachmentPatch,
    ) -> Result<UserProfile, BackendError> {
        let input = AttachmentPatchDto {
            resume: &patch.resume,
            cover_letter: &patch.cover_letter,
        };
        let outcome = self
            .client
            .execute::<_, ProfileDto>(
                &operations::UPDATE_PROFILE_ATTACHMENTS,
                &json!({ "email": email, "input": input }),
            )
            .await;
        settle(outcome)?
            .map(UserProfile::from)
            .ok_or_else(|| BackendError::NotFound(format!("profile {email}")))
    }

    async fn create_application(
        &self,
        application: &NewApplication,
    ) -> Result<JobApplication, BackendError> {
        let input = NewApplicationDto {
            user_email: &application.user_email,
            job_id: &application.job_id,
            resume: &application.resume,
            cover_letter: &application.cover_letter,
            applied_at: application.applied_at,
            status: application.status,
        };
        let outcome = self
            .client
            .execute::<_, ApplicationDto>(
                &operations::CREATE_JOB_APPLICATION,
                &json!({ "input": input }),
            )
            .await;
        settle(outcome)?.map(JobApplication::from).ok_or_else(|| {
            BackendError::NotFound(format!("job {}", application.job_id))
        })
    }

    async fn fetch_application(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<JobApplication>, BackendError> {
        let outcome = self
            .client
            .execute::<_, ApplicationDto>(&operations::JOB_APPLICATION, &json!({ "id": id }))
            .await;
        Ok(settle(outcome)?.map(JobApplication::from))
    }

    async fn transition_status(
        &self,
        id: &ApplicationId,
        expected: ApplicationStatus,
        next: ApplicationStatus,
    ) -> Result<StatusTransition, BackendError> {
        let outcome = self
            .client
            .execute::<_, DecisionDto>(
                &operations::DECIDE_JOB_APPLICATION,
                &json!({ "id": id, "expectedStatus": expected, "status": next }),
            )
            .await;

        match settle(outcome) {
            Ok(Some(DecisionDto {
                applied: true,
                application,
            })) => Ok(StatusTransition::Applied(application.into())),
            Ok(Some(DecisionDto { application, .. })) => Ok(StatusTransition::Refused {
                current: application.status,
            }),
            Ok(None) => Err(BackendError::NotFound(format!("application {id}"))),
            Err(BackendError::Conflict(message)) => {
                // Some deployments signal the failed precondition as an error;
                // read back the authoritative status.
                warn!("Decision on {id} refused by backend: {message}");
                match self.fetch_application(id).await? {
                    Some(current) if current.status.is_terminal() => {
                        Ok(StatusTransition::Refused {
                            current: current.status,
                        })
                    }
                    // Still pending: the refusal was not a lost race.
                    Some(_) => Err(BackendError::Conflict(message)),
                    None => Err(BackendError::NotFound(format!("application {id}"))),
                }
            }
            Err(err) => Err(err),
        }
    }

    async fn save_job(&self, user_email: &str, job_id: &str) -> Result<(), BackendError> {
        let outcome = self
            .client
            .execute::<_, bool>(
                &operations::SAVE_JOB,
                &json!({ "userEmail": user_email, "jobId": job_id }),
            )
            .await;
        match settle(outcome)? {
            Some(true) => Ok(()),
            Some(false) => Err(BackendError::Conflict(format!("job {job_id} already saved"))),
            None => Err(BackendError::NotFound(format!("job {job_id}"))),
        }
    }

    async fn delete_saved_job(&self, user_email: &str, job_id: &str) -> Result<(), BackendError> {
        let outcome = self
            .client
            .execute::<_, bool>(
                &operations::DELETE_SAVED_JOB,
                &json!({ "userEmail": user_email, "jobId": job_id }),
            )
            .await;
        match settle(outcome)? {
            Some(true) => Ok(()),
            Some(false) | None => Err(BackendError::NotFound(format!("saved job {job_id}"))),
        }
    }

    async fn saved_jobs(&self, user_email: &str) -> Result<Vec<SavedJob>, BackendError> {
        let outcome = self
            .client
            .execute::<_, Vec<SavedJobDto>>(
                &operations::SAVED_JOBS,
                &json!({ "userEmail": user_email }),
            )
            .await;
        let jobs = settle(outcome)?.unwrap_or_default();
        Ok(jobs
            .into_iter()
            .map(|dto| SavedJob {
                user_email: user_email.to_string(),
                title: dto.title.unwrap_or_else(|| dto.job_id.clone()),
                job_id: dto.job_id,
                deadline: dto.deadline,
            })
            .collect())
    }
}
