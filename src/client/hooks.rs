use std::time::Duration;

use super::{ApiClient, ClientResult, QueryClient, QueryKey, QueryPolicy, ResourceQuery};
use crate::api::users::OnboardingStatus;
use crate::models::{
    Assessment, Comment, DailyReflection, DailyReflectionResponse, Group, GroupMember,
    LearningResource, Post, ReflectionOverview, UserEmotion, UserProfile,
};

const MINUTE: Duration = Duration::from_secs(60);

/// Feeds and anything other members write to.
pub const SOCIAL_POLICY: QueryPolicy = QueryPolicy {
    stale_time: Duration::from_secs(30),
    gc_time: Duration::from_secs(5 * 60),
    retry: 2,
};

/// Data only the caller changes: check-ins, reflection answers, onboarding.
pub const PERSONAL_POLICY: QueryPolicy = QueryPolicy {
    stale_time: MINUTE,
    gc_time: Duration::from_secs(10 * 60),
    retry: 1,
};

/// Curated content that changes rarely.
pub const CATALOG_POLICY: QueryPolicy = QueryPolicy {
    stale_time: Duration::from_secs(10 * 60),
    gc_time: Duration::from_secs(30 * 60),
    retry: 3,
};

pub const SESSION_POLICY: QueryPolicy = QueryPolicy {
    stale_time: Duration::from_secs(5 * 60),
    gc_time: Duration::from_secs(10 * 60),
    retry: 0,
};

/// Cached reads over [`ApiClient`], one method per query.
pub struct Queries {
    api: ApiClient,
    cache: QueryClient,
}

impl Queries {
    pub fn new(api: ApiClient) -> Self {
        Self::with_cache(api, QueryClient::new())
    }

    pub fn with_cache(api: ApiClient, cache: QueryClient) -> Self {
        Self { api, cache }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn cache(&self) -> &QueryClient {
        &self.cache
    }

    pub async fn session(&self) -> ClientResult<UserProfile> {
        self.cache
            .fetch(QueryKey::new("session"), SESSION_POLICY, || self.api.session())
            .await
    }

    pub async fn onboarding_status(&self) -> ClientResult<OnboardingStatus> {
        self.cache
            .fetch(QueryKey::new("onboarding-status"), PERSONAL_POLICY, || {
                self.api.onboarding_status()
            })
            .await
    }

    pub async fn user(&self, id: i64) -> ClientResult<UserProfile> {
        self.cache
            .fetch(QueryKey::new("user").with(id), SOCIAL_POLICY, || self.api.user(id))
            .await
    }

    pub async fn groups(&self, category: Option<&str>) -> ClientResult<Vec<Group>> {
        let key = QueryKey::new("groups").with(category.unwrap_or("all"));
        self.cache
            .fetch(key, CATALOG_POLICY, || self.api.groups(category))
            .await
    }

    pub async fn group(&self, id: i64) -> ClientResult<Group> {
        self.cache
            .fetch(QueryKey::new("group").with(id), SOCIAL_POLICY, || self.api.group(id))
            .await
    }

    pub async fn group_members(&self, id: i64) -> ClientResult<Vec<GroupMember>> {
        self.cache
            .fetch(QueryKey::new("group-members").with(id), SOCIAL_POLICY, || {
                self.api.group_members(id)
            })
            .await
    }

    pub async fn group_posts(&self, id: i64) -> ClientResult<Vec<Post>> {
        self.cache
            .fetch(QueryKey::new("group-posts").with(id), SOCIAL_POLICY, || {
                self.api.group_posts(id)
            })
            .await
    }

    pub async fn post(&self, id: i64) -> ClientResult<Post> {
        self.cache
            .fetch(QueryKey::new("post").with(id), SOCIAL_POLICY, || self.api.post(id))
            .await
    }

    pub async fn comments(&self, post_id: i64) -> ClientResult<Vec<Comment>> {
        self.cache
            .fetch(QueryKey::new("comments").with(post_id), SOCIAL_POLICY, || {
                self.api.comments(post_id)
            })
            .await
    }

    pub async fn reflections(&self) -> ClientResult<Vec<ReflectionOverview>> {
        self.cache
            .fetch(QueryKey::new("reflections"), PERSONAL_POLICY, || self.api.reflections())
            .await
    }

    pub async fn created_reflections(&self) -> ClientResult<Vec<DailyReflection>> {
        self.cache
            .fetch(QueryKey::new("reflections-created"), PERSONAL_POLICY, || {
                self.api.created_reflections()
            })
            .await
    }

    pub async fn reflection(&self, id: i64) -> ClientResult<DailyReflection> {
        self.cache
            .fetch(QueryKey::new("reflection").with(id), CATALOG_POLICY, || {
                self.api.reflection(id)
            })
            .await
    }

    pub async fn reflection_response(&self, id: i64) -> ClientResult<Option<DailyReflectionResponse>> {
        self.cache
            .fetch(QueryKey::new("reflection-response").with(id), PERSONAL_POLICY, || {
                self.api.reflection_response(id)
            })
            .await
    }

    pub async fn checkins(&self, limit: Option<i64>) -> ClientResult<Vec<UserEmotion>> {
        let key = QueryKey::new("checkins").with(limit.map_or("default".to_string(), |l| l.to_string()));
        self.cache
            .fetch(key, PERSONAL_POLICY, || self.api.checkins(limit))
            .await
    }

    pub async fn checkin_tags(&self) -> ClientResult<Vec<String>> {
        self.cache
            .fetch(QueryKey::new("tags-checkins"), PERSONAL_POLICY, || {
                self.api.checkin_tags()
            })
            .await
    }

    pub async fn resource_tags(&self) -> ClientResult<Vec<String>> {
        self.cache
            .fetch(QueryKey::new("tags-resources"), CATALOG_POLICY, || {
                self.api.resource_tags()
            })
            .await
    }

    pub async fn resources(&self, query: &ResourceQuery) -> ClientResult<Vec<LearningResource>> {
        let key = QueryKey::new("resources")
            .with(query.category.as_deref().unwrap_or(""))
            .with(query.difficulty.as_deref().unwrap_or(""))
            .with(query.resource_type.as_deref().unwrap_or(""))
            .with(query.tag.as_deref().unwrap_or(""));
        self.cache
            .fetch(key, CATALOG_POLICY, || self.api.resources(query))
            .await
    }

    pub async fn resource(&self, id: i64) -> ClientResult<LearningResource> {
        self.cache
            .fetch(QueryKey::new("resource").with(id), CATALOG_POLICY, || {
                self.api.resource(id)
            })
            .await
    }

    pub async fn assessment(&self, resource_id: i64) -> ClientResult<Assessment> {
        self.cache
            .fetch(QueryKey::new("assessment").with(resource_id), CATALOG_POLICY, || {
                self.api.assessment(resource_id)
            })
            .await
    }
}
