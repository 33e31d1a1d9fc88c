// GraphQL documents sent to the job board backend.
// The schema is owned by the backend; field selections here must track it.

/// A named operation and the top-level `data` field its result lives under.
#[derive(Debug, Clone, Copy)]
pub struct Operation {
    pub name: &'static str,
    pub field: &'static str,
    pub document: &'static str,
}

pub const USER_PROFILE: Operation = Operation {
    name: "UserProfile",
    field: "userProfile",
    document: r#"
query UserProfile($email: String!) {
  userProfile(email: $email) {
    email fullName phone address education experience skills
    resume coverLetter profilePhoto selfIntroVideo
  }
}"#,
};

pub const SAVE_USER_PROFILE: Operation = Operation {
    name: "SaveUserProfile",
    field: "saveUserProfile",
    document: r#"
mutation SaveUserProfile($input: UserProfileInput!) {
  saveUserProfile(input: $input) {
    email fullName phone address education experience skills
    resume coverLetter profilePhoto selfIntroVideo
  }
}"#,
};

pub const UPDATE_PROFILE_ATTACHMENTS: Operation = Operation {
    name: "UpdateProfileAttachments",
    field: "updateProfileAttachments",
    document: r#"
mutation UpdateProfileAttachments($email: String!, $input: ProfileAttachmentsInput!) {
  updateProfileAttachments(email: $email, input: $input) {
    email fullName phone address education experience skills
    resume coverLetter profilePhoto selfIntroVideo
  }
}"#,
};

pub const CREATE_JOB_APPLICATION: Operation = Operation {
    name: "CreateJobApplication",
    field: "createJobApplication",
    document: r#"
mutation CreateJobApplication($input: JobApplicationInput!) {
  createJobApplication(input: $input) {
    id userEmail jobId resume coverLetter appliedAt status
  }
}"#,
};

pub const JOB_APPLICATION: Operation = Operation {
    name: "JobApplication",
    field: "jobApplication",
    document: r#"
query JobApplication($id: ID!) {
  jobApplication(id: $id) {
    id userEmail jobId resume coverLetter appliedAt status
  }
}"#,
};

/// Applies `status` only while the stored status equals `expectedStatus`.
pub const DECIDE_JOB_APPLICATION: Operation = Operation {
    name: "DecideJobApplication",
    field: "decideJobApplication",
    document: r#"
mutation DecideJobApplication($id: ID!, $expectedStatus: ApplicationStatus!, $status: ApplicationStatus!) {
  decideJobApplication(id: $id, expectedStatus: $expectedStatus, status: $status) {
    applied
    application { id userEmail jobId resume coverLetter appliedAt status }
  }
}"#,
};

pub const SAVE_JOB: Operation = Operation {
    name: "SaveJob",
    field: "saveJob",
    document: r#"
mutation SaveJob($userEmail: String!, $jobId: ID!) {
  saveJob(userEmail: $userEmail, jobId: $jobId)
}"#,
};

pub const DELETE_SAVED_JOB: Operation = Operation {
    name: "DeleteSavedJob",
    field: "deleteSavedJob",
    document: r#"
mutation DeleteSavedJob($userEmail: String!, $jobId: ID!) {
  deleteSavedJob(userEmail: $userEmail, jobId: $jobId)
}"#,
};

pub const SAVED_JOBS: Operation = Operation {
    name: "SavedJobs",
    field: "savedJobs",
    document: r#"
query SavedJobs($userEmail: String!) {
  savedJobs(userEmail: $userEmail) {
    jobId title deadline
  }
}"#,
};
