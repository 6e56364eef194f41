//! Activity log records.

use std::fmt;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::principal::UserId;

/// Kind of activity recorded for an authenticated view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    JobViewed,
    CompanyViewed,
    CandidateViewed,
    BlogPostViewed,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::JobViewed => "job_viewed",
            ActivityType::CompanyViewed => "company_viewed",
            ActivityType::CandidateViewed => "candidate_viewed",
            ActivityType::BlogPostViewed => "blog_post_viewed",
        }
    }

    /// Kind of entity this activity refers to.
    pub fn subject_kind(&self) -> SubjectKind {
        match self {
            ActivityType::JobViewed => SubjectKind::Job,
            ActivityType::CompanyViewed => SubjectKind::Company,
            ActivityType::CandidateViewed => SubjectKind::User,
            ActivityType::BlogPostViewed => SubjectKind::BlogPost,
        }
    }

    /// Route parameter that identifies the subject.
    pub fn subject_param(&self) -> &'static str {
        match self {
            ActivityType::JobViewed | ActivityType::CompanyViewed | ActivityType::BlogPostViewed => {
                "slug"
            }
            ActivityType::CandidateViewed => "id",
        }
    }

    /// Human-readable description for a subject with the given display name.
    pub fn describe(&self, display_name: &str) -> String {
        match self {
            ActivityType::JobViewed => format!("Viewed job: {}", display_name),
            ActivityType::CompanyViewed => format!("Viewed company: {}", display_name),
            ActivityType::CandidateViewed => format!("Viewed candidate profile: {}", display_name),
            ActivityType::BlogPostViewed => format!("Read blog post: {}", display_name),
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    Job,
    Company,
    User,
    BlogPost,
}

/// Reference to the entity an activity is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SubjectRef {
    pub kind: SubjectKind,
    pub id: String,
}

/// An entry in the activity log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ActivityRecord {
    pub id: String,
    pub activity_type: ActivityType,
    pub description: String,
    pub subject: SubjectRef,
    pub causer: UserId,
    pub created_at: DateTime<Utc>,
}

impl ActivityRecord {
    pub fn new(
        activity_type: ActivityType,
        description: impl Into<String>,
        subject: SubjectRef,
        causer: UserId,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            activity_type,
            description: description.into(),
            subject,
            causer,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_interpolates_name() {
        assert_eq!(
            ActivityType::JobViewed.describe("Rust Engineer"),
            "Viewed job: Rust Engineer"
        );
        assert_eq!(
            ActivityType::CandidateViewed.describe("Grace Hopper"),
            "Viewed candidate profile: Grace Hopper"
        );
    }

    #[test]
    fn test_subject_params() {
        assert_eq!(ActivityType::CandidateViewed.subject_param(), "id");
        assert_eq!(ActivityType::BlogPostViewed.subject_param(), "slug");
        assert_eq!(ActivityType::CandidateViewed.subject_kind(), SubjectKind::User);
    }
}
