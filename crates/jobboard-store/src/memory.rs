//! In-memory store backend.
//!
//! Each collection lives behind its own `RwLock`. The backend can be switched
//! into an unavailable mode so callers can exercise their failure paths.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use jobboard_models::{
    ActivityRecord, BlogPost, Company, CredentialKind, Job, Principal, Session, SessionId, UserId,
};

use crate::activity_log::ActivityLog;
use crate::entity_repo::EntityStore;
use crate::error::{StoreError, StoreResult};
use crate::principal_repo::{PrincipalStore, SessionStore};

/// Maximum number of activity records kept in memory.
const MAX_ACTIVITY_RECORDS: usize = 10_000;

#[derive(Default)]
pub struct MemoryStore {
    principals: RwLock<HashMap<UserId, Principal>>,
    sessions: RwLock<HashMap<SessionId, Session>>,
    jobs: RwLock<HashMap<String, Job>>,
    companies: RwLock<HashMap<String, Company>>,
    blog_posts: RwLock<HashMap<String, BlogPost>>,
    activity: RwLock<VecDeque<ActivityRecord>>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with `StoreError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("memory store switched off"));
        }
        Ok(())
    }

    pub async fn insert_principal(&self, principal: Principal) {
        self.principals.write().await.insert(principal.id.clone(), principal);
    }

    pub async fn insert_job(&self, job: Job) {
        self.jobs.write().await.insert(job.slug.clone(), job);
    }

    pub async fn insert_company(&self, company: Company) {
        self.companies.write().await.insert(company.slug.clone(), company);
    }

    pub async fn insert_blog_post(&self, post: BlogPost) {
        self.blog_posts.write().await.insert(post.slug.clone(), post);
    }

    /// Apply `change` to the stored record under the write lock.
    async fn update_principal<F>(&self, id: &UserId, change: F) -> StoreResult<Option<Principal>>
    where
        F: FnOnce(&mut Principal) + Send,
    {
        self.check_available()?;
        let mut principals = self.principals.write().await;
        let Some(principal) = principals.get_mut(id) else {
            return Ok(None);
        };
        change(principal);
        debug!(user_id = %id, "Updated principal");
        Ok(Some(principal.clone()))
    }

    /// Number of sessions held, expired ones included.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Number of activity records currently held.
    pub async fn activity_len(&self) -> usize {
        self.activity.read().await.len()
    }
}

#[async_trait]
impl PrincipalStore for MemoryStore {
    async fn find_by_id(&self, id: &UserId) -> StoreResult<Option<Principal>> {
        self.check_available()?;
        Ok(self.principals.read().await.get(id).cloned())
    }

    async fn set_banned(&self, id: &UserId, banned: bool) -> StoreResult<Option<Principal>> {
        self.update_principal(id, |p| if banned { p.ban() } else { p.unban() })
            .await
    }

    async fn suspend_until(&self, id: &UserId, until: DateTime<Utc>) -> StoreResult<Option<Principal>> {
        self.update_principal(id, |p| p.suspend_until(until)).await
    }

    async fn clear_suspension(&self, id: &UserId) -> StoreResult<bool> {
        self.check_available()?;
        let mut principals = self.principals.write().await;
        let lifted = principals
            .get_mut(id)
            .map(|p| p.lift_suspension())
            .unwrap_or(false);
        if lifted {
            debug!(user_id = %id, "Cleared suspension");
        }
        Ok(lifted)
    }

    async fn list(&self, limit: usize, offset: usize) -> StoreResult<Vec<Principal>> {
        self.check_available()?;
        let mut all: Vec<Principal> = self.principals.read().await.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.0.cmp(&b.id.0)));
        Ok(all.into_iter().skip(offset).take(limit).collect())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create(&self, user_id: &UserId, kind: CredentialKind, ttl: Duration) -> StoreResult<Session> {
        self.check_available()?;
        let session = Session::new(user_id.clone(), kind, ttl);
        let mut sessions = self.sessions.write().await;
        let now = Utc::now();
        sessions.retain(|_, s| !s.is_expired_at(now));
        sessions.insert(session.id.clone(), session.clone());
        Ok(session)
    }

    async fn find(&self, id: &SessionId) -> StoreResult<Option<Session>> {
        self.check_available()?;
        let now = Utc::now();
        Ok(self
            .sessions
            .read()
            .await
            .get(id)
            .filter(|s| !s.is_expired_at(now))
            .cloned())
    }

    async fn revoke(&self, id: &SessionId) -> StoreResult<()> {
        self.check_available()?;
        self.sessions.write().await.remove(id);
        Ok(())
    }

    async fn revoke_all_for(&self, user_id: &UserId) -> StoreResult<usize> {
        self.check_available()?;
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| &s.user_id != user_id);
        Ok(before - sessions.len())
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn find_job_by_slug(&self, slug: &str) -> StoreResult<Option<Job>> {
        self.check_available()?;
        Ok(self.jobs.read().await.get(slug).cloned())
    }

    async fn find_company_by_slug(&self, slug: &str) -> StoreResult<Option<Company>> {
        self.check_available()?;
        Ok(self.companies.read().await.get(slug).cloned())
    }

    async fn find_user_by_id(&self, id: &UserId) -> StoreResult<Option<Principal>> {
        PrincipalStore::find_by_id(self, id).await
    }

    async fn find_blog_post_by_slug(&self, slug: &str) -> StoreResult<Option<BlogPost>> {
        self.check_available()?;
        Ok(self.blog_posts.read().await.get(slug).cloned())
    }
}

#[async_trait]
impl ActivityLog for MemoryStore {
    async fn track(&self, record: ActivityRecord) -> StoreResult<()> {
        self.check_available()?;
        let mut activity = self.activity.write().await;
        if activity.len() >= MAX_ACTIVITY_RECORDS {
            activity.pop_front();
        }
        activity.push_back(record);
        Ok(())
    }

    async fn recent(&self, limit: usize) -> StoreResult<Vec<ActivityRecord>> {
        self.check_available()?;
        Ok(self.activity.read().await.iter().rev().take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobboard_models::{ActivityType, Role, SubjectKind, SubjectRef};

    #[tokio::test]
    async fn test_set_banned_and_find_principal() {
        let store = MemoryStore::new();
        let p = Principal::new("Ada", "ada@example.com", Role::Employer);
        store.insert_principal(p.clone()).await;

        let banned = store.set_banned(&p.id, true).await.unwrap().unwrap();
        assert!(banned.is_banned);

        let found = store.find_by_id(&p.id).await.unwrap().unwrap();
        assert!(found.is_banned);
        assert!(store.set_banned(&UserId::new(), true).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clear_suspension_keeps_ban() {
        let store = MemoryStore::new();
        let mut p = Principal::new("Ada", "ada@example.com", Role::Employer);
        p.suspend_until(Utc::now() - Duration::minutes(5));
        store.insert_principal(p.clone()).await;
        store.set_banned(&p.id, true).await.unwrap();

        assert!(store.clear_suspension(&p.id).await.unwrap());
        assert!(!store.clear_suspension(&p.id).await.unwrap());

        let found = store.find_by_id(&p.id).await.unwrap().unwrap();
        assert!(found.is_banned);
        assert!(!found.is_suspended);
        assert!(found.suspended_until.is_none());
    }

    #[tokio::test]
    async fn test_suspend_until_keeps_ban() {
        let store = MemoryStore::new();
        let p = Principal::new("Ada", "ada@example.com", Role::Employer);
        store.insert_principal(p.clone()).await;
        store.set_banned(&p.id, true).await.unwrap();

        let until = Utc::now() + Duration::days(1);
        let updated = store.suspend_until(&p.id, until).await.unwrap().unwrap();
        assert!(updated.is_banned);
        assert_eq!(updated.suspended_until, Some(until));
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let store = MemoryStore::new();
        let user = UserId::new();
        let session = store
            .create(&user, CredentialKind::Browser, Duration::hours(1))
            .await
            .unwrap();

        store.revoke(&session.id).await.unwrap();
        store.revoke(&session.id).await.unwrap();
        assert!(store.find(&session.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_session_is_absent() {
        let store = MemoryStore::new();
        let session = store
            .create(&UserId::new(), CredentialKind::Api, Duration::seconds(-1))
            .await
            .unwrap();
        assert!(store.find(&session.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_purges_expired_sessions() {
        let store = MemoryStore::new();
        let user = UserId::new();
        store.create(&user, CredentialKind::Api, Duration::seconds(-1)).await.unwrap();
        store.create(&user, CredentialKind::Api, Duration::seconds(-1)).await.unwrap();
        assert_eq!(store.session_count().await, 1);

        let live = store.create(&user, CredentialKind::Browser, Duration::hours(1)).await.unwrap();
        assert_eq!(store.session_count().await, 1);
        assert!(store.find(&live.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_activity_log_drops_oldest_when_full() {
        let store = MemoryStore::new();
        let causer = UserId::new();
        for i in 0..=MAX_ACTIVITY_RECORDS {
            let record = ActivityRecord::new(
                ActivityType::JobViewed,
                ActivityType::JobViewed.describe("job"),
                SubjectRef { kind: SubjectKind::Job, id: i.to_string() },
                causer.clone(),
            );
            store.track(record).await.unwrap();
        }

        assert_eq!(store.activity_len().await, MAX_ACTIVITY_RECORDS);
        let recent = store.recent(MAX_ACTIVITY_RECORDS).await.unwrap();
        assert_eq!(recent[0].subject.id, MAX_ACTIVITY_RECORDS.to_string());
        assert_eq!(recent.last().unwrap().subject.id, "1");
    }

    #[tokio::test]
    async fn test_revoke_all_for_user() {
        let store = MemoryStore::new();
        let user = UserId::new();
        let other = UserId::new();
        store.create(&user, CredentialKind::Browser, Duration::hours(1)).await.unwrap();
        store.create(&user, CredentialKind::Api, Duration::hours(1)).await.unwrap();
        let kept = store.create(&other, CredentialKind::Browser, Duration::hours(1)).await.unwrap();

        assert_eq!(store.revoke_all_for(&user).await.unwrap(), 2);
        assert!(store.find(&kept.id).await.unwrap().is_some());
    }

    #[test]
    fn test_unavailable_mode() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        let result = tokio_test::block_on(store.find_job_by_slug("anything"));
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_recent_activity_newest_first() {
        let store = MemoryStore::new();
        let causer = UserId::new();
        for title in ["first", "second"] {
            let record = ActivityRecord::new(
                ActivityType::JobViewed,
                ActivityType::JobViewed.describe(title),
                SubjectRef { kind: SubjectKind::Job, id: title.to_string() },
                causer.clone(),
            );
            store.track(record).await.unwrap();
        }

        let recent = store.recent(10).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].subject.id, "second");
    }
}
