//! Viewable board entities.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::principal::UserId;

/// A company profile owned by an employer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Company {
    pub id: String,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub website: Option<String>,
    pub owner_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl Company {
    pub fn new(slug: impl Into<String>, name: impl Into<String>, owner_id: UserId) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            slug: slug.into(),
            name: name.into(),
            website: None,
            owner_id,
            created_at: Utc::now(),
        }
    }
}

/// A job posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Job {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub company_id: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_true")]
    pub is_open: bool,
    pub created_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl Job {
    pub fn new(slug: impl Into<String>, title: impl Into<String>, company_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            slug: slug.into(),
            title: title.into(),
            company_id: company_id.into(),
            location: None,
            description: String::new(),
            is_open: true,
            created_at: Utc::now(),
        }
    }
}

/// A blog post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BlogPost {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub author_id: UserId,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub published: bool,
    pub created_at: DateTime<Utc>,
}

impl BlogPost {
    pub fn new(slug: impl Into<String>, title: impl Into<String>, author_id: UserId) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            slug: slug.into(),
            title: title.into(),
            author_id,
            body: String::new(),
            published: true,
            created_at: Utc::now(),
        }
    }
}
