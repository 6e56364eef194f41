//! Public read handlers for jobs, companies, candidates and blog posts.
//!
//! These are the routes the activity recorder watches.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use jobboard_models::{BlogPost, Company, Job, Role, UserId};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub async fn show_job(State(state): State<AppState>, Path(slug): Path<String>) -> ApiResult<Json<Job>> {
    state
        .stores
        .entities
        .find_job_by_slug(&slug)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Job not found"))
}

pub async fn show_company(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<Company>> {
    state
        .stores
        .entities
        .find_company_by_slug(&slug)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Company not found"))
}

/// Public view of a candidate. Contact details stay private.
#[derive(Serialize)]
pub struct CandidateProfile {
    pub id: UserId,
    pub name: String,
}

pub async fn show_candidate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<CandidateProfile>> {
    let user = state
        .stores
        .entities
        .find_user_by_id(&UserId::from(id))
        .await?
        .filter(|u| u.has_role(Role::Candidate))
        .ok_or_else(|| ApiError::not_found("Candidate not found"))?;

    Ok(Json(CandidateProfile {
        id: user.id,
        name: user.name,
    }))
}

pub async fn show_blog_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<BlogPost>> {
    state
        .stores
        .entities
        .find_blog_post_by_slug(&slug)
        .await?
        .filter(|post| post.published)
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Blog post not found"))
}
