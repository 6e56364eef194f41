//! Read-only lookups for viewable entities.

use async_trait::async_trait;

use jobboard_models::{BlogPost, Company, Job, Principal, UserId};

use crate::error::StoreResult;

#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn find_job_by_slug(&self, slug: &str) -> StoreResult<Option<Job>>;

    async fn find_company_by_slug(&self, slug: &str) -> StoreResult<Option<Company>>;

    async fn find_user_by_id(&self, id: &UserId) -> StoreResult<Option<Principal>>;

    async fn find_blog_post_by_slug(&self, slug: &str) -> StoreResult<Option<BlogPost>>;
}
