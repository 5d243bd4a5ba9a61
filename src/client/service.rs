use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, instrument};

use super::{ClientError, ClientResult};
use crate::api::users::OnboardingStatus;
use crate::envelope::Envelope;
use crate::models::{
    Assessment, AssessmentResult, Comment, CommentReply, DailyReflection, DailyReflectionResponse,
    Group, GroupMember, LearningResource, LikeState, Post, ReflectionOverview, RoleRecord,
    UserEmotion, UserProfile,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Thin typed wrapper over the `/api` routes. The session cookie set by
/// [`ApiClient::login`] is kept in the client's cookie store.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

/// Query-string filters for [`ApiClient::resources`].
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct ResourceQuery {
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub resource_type: Option<String>,
    pub tag: Option<String>,
}

impl ResourceQuery {
    fn pairs(&self) -> Vec<(&'static str, &str)> {
        [
            ("category", &self.category),
            ("difficulty", &self.difficulty),
            ("type", &self.resource_type),
            ("tag", &self.tag),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.as_deref().map(|value| (name, value)))
        .collect()
    }
}

/// Splits a decoded envelope into the handler's data or an error carrying
/// the server's message.
pub fn unwrap_envelope<T>(status: StatusCode, envelope: Envelope<T>) -> ClientResult<Option<T>> {
    if status.is_success() {
        Ok(envelope.data)
    } else {
        Err(ClientError::Api {
            status: status.as_u16(),
            message: envelope.message,
        })
    }
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> ClientResult<Self> {
        let http = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    async fn send_optional<T: DeserializeOwned>(&self, request: RequestBuilder) -> ClientResult<Option<T>> {
        let response = request.send().await?;
        let status = response.status();

        let envelope = match response.json::<Envelope<T>>().await {
            Ok(envelope) => envelope,
            Err(e) if status.is_success() => return Err(e.into()),
            Err(_) => {
                return Err(ClientError::Api {
                    status: status.as_u16(),
                    message: status.canonical_reason().unwrap_or("Request failed").to_string(),
                });
            }
        };

        debug!(status = status.as_u16(), message = %envelope.message, "API response");
        unwrap_envelope(status, envelope)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ClientResult<T> {
        self.send_optional(request).await?.ok_or(ClientError::MissingData)
    }

    async fn send_unit(&self, request: RequestBuilder) -> ClientResult<()> {
        self.send_optional::<serde_json::Value>(request).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn health(&self) -> ClientResult<bool> {
        let response = self.http.get(self.url("/health")).send().await?;
        Ok(response.status().is_success())
    }

    #[instrument(skip(self, password))]
    pub async fn register(&self, email: &str, password: &str, full_name: &str) -> ClientResult<UserProfile> {
        let body = json!({ "email": email, "password": password, "fullName": full_name });
        self.send(self.http.post(self.url("/auth/register")).json(&body)).await
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<UserProfile> {
        let body = json!({ "email": email, "password": password });
        self.send(self.http.post(self.url("/auth/login")).json(&body)).await
    }

    pub async fn logout(&self) -> ClientResult<()> {
        self.send_unit(self.http.post(self.url("/auth/logout"))).await
    }

    pub async fn session(&self) -> ClientResult<UserProfile> {
        self.send(self.http.get(self.url("/auth/session"))).await
    }

    pub async fn user(&self, id: i64) -> ClientResult<UserProfile> {
        self.send(self.http.get(self.url(&format!("/users/{}", id)))).await
    }

    /// `changes` is sent as-is, so only the keys present are updated.
    pub async fn update_user(&self, id: i64, changes: &serde_json::Value) -> ClientResult<UserProfile> {
        self.send(self.http.patch(self.url(&format!("/users/{}", id))).json(changes))
            .await
    }

    pub async fn onboarding_status(&self) -> ClientResult<OnboardingStatus> {
        self.send(self.http.get(self.url("/onboarding-status"))).await
    }

    pub async fn complete_onboarding(&self, username: &str, expertise: Option<&str>) -> ClientResult<UserProfile> {
        let body = json!({ "username": username, "expertise": expertise });
        self.send(self.http.post(self.url("/onboarding")).json(&body)).await
    }

    pub async fn roles(&self) -> ClientResult<Vec<RoleRecord>> {
        self.send(self.http.get(self.url("/roles"))).await
    }

    pub async fn groups(&self, category: Option<&str>) -> ClientResult<Vec<Group>> {
        let mut request = self.http.get(self.url("/groups"));
        if let Some(category) = category {
            request = request.query(&[("category", category)]);
        }
        self.send(request).await
    }

    pub async fn create_group(
        &self,
        category: &str,
        name: &str,
        description: &str,
        image: Option<&str>,
    ) -> ClientResult<Group> {
        let body = json!({ "category": category, "name": name, "description": description, "image": image });
        self.send(self.http.post(self.url("/groups")).json(&body)).await
    }

    pub async fn group(&self, id: i64) -> ClientResult<Group> {
        self.send(self.http.get(self.url(&format!("/groups/{}", id)))).await
    }

    pub async fn group_members(&self, id: i64) -> ClientResult<Vec<GroupMember>> {
        self.send(self.http.get(self.url(&format!("/groups/{}/members", id))))
            .await
    }

    pub async fn join_group(&self, id: i64) -> ClientResult<Group> {
        self.send(self.http.post(self.url(&format!("/groups/{}/join", id))))
            .await
    }

    pub async fn group_posts(&self, id: i64) -> ClientResult<Vec<Post>> {
        self.send(self.http.get(self.url(&format!("/groups/{}/posts", id))))
            .await
    }

    pub async fn create_post(&self, group_id: i64, content: &str) -> ClientResult<Post> {
        let body = json!({ "content": content });
        self.send(
            self.http
                .post(self.url(&format!("/groups/{}/posts", group_id)))
                .json(&body),
        )
        .await
    }

    pub async fn post(&self, id: i64) -> ClientResult<Post> {
        self.send(self.http.get(self.url(&format!("/posts/{}", id)))).await
    }

    pub async fn update_post(&self, id: i64, content: &str) -> ClientResult<Post> {
        let body = json!({ "content": content });
        self.send(self.http.patch(self.url(&format!("/posts/{}", id))).json(&body))
            .await
    }

    pub async fn like_post(&self, id: i64) -> ClientResult<LikeState> {
        self.send(self.http.post(self.url(&format!("/posts/{}/like", id))))
            .await
    }

    pub async fn comments(&self, post_id: i64) -> ClientResult<Vec<Comment>> {
        self.send(self.http.get(self.url(&format!("/posts/{}/comments", post_id))))
            .await
    }

    pub async fn create_comment(&self, post_id: i64, content: &str) -> ClientResult<Comment> {
        let body = json!({ "content": content });
        self.send(
            self.http
                .post(self.url(&format!("/posts/{}/comments", post_id)))
                .json(&body),
        )
        .await
    }

    pub async fn like_comment(&self, id: i64) -> ClientResult<LikeState> {
        self.send(self.http.post(self.url(&format!("/comments/{}/like", id))))
            .await
    }

    pub async fn replies(&self, comment_id: i64) -> ClientResult<Vec<CommentReply>> {
        self.send(self.http.get(self.url(&format!("/comments/{}/replies", comment_id))))
            .await
    }

    pub async fn create_reply(&self, comment_id: i64, content: &str) -> ClientResult<CommentReply> {
        let body = json!({ "content": content });
        self.send(
            self.http
                .post(self.url(&format!("/comments/{}/replies", comment_id)))
                .json(&body),
        )
        .await
    }

    pub async fn like_reply(&self, id: i64) -> ClientResult<LikeState> {
        self.send(self.http.post(self.url(&format!("/replies/{}/like", id))))
            .await
    }

    pub async fn reflections(&self) -> ClientResult<Vec<ReflectionOverview>> {
        self.send(self.http.get(self.url("/reflection"))).await
    }

    pub async fn created_reflections(&self) -> ClientResult<Vec<DailyReflection>> {
        self.send(self.http.get(self.url("/reflection/created"))).await
    }

    pub async fn reflection(&self, id: i64) -> ClientResult<DailyReflection> {
        self.send(self.http.get(self.url(&format!("/reflection/{}", id))))
            .await
    }

    pub async fn create_reflection(&self, question: &str) -> ClientResult<DailyReflection> {
        let body = json!({ "reflectionQuestion": question });
        self.send(self.http.post(self.url("/reflection")).json(&body)).await
    }

    pub async fn update_reflection(&self, id: i64, question: &str) -> ClientResult<DailyReflection> {
        let body = json!({ "reflectionQuestion": question });
        self.send(
            self.http
                .patch(self.url(&format!("/reflection/{}", id)))
                .json(&body),
        )
        .await
    }

    pub async fn submit_reflection_response(
        &self,
        id: i64,
        response: &str,
    ) -> ClientResult<DailyReflectionResponse> {
        let body = json!({ "response": response });
        self.send(
            self.http
                .post(self.url(&format!("/reflection/{}/response", id)))
                .json(&body),
        )
        .await
    }

    /// `None` when the caller has not answered yet.
    pub async fn reflection_response(&self, id: i64) -> ClientResult<Option<DailyReflectionResponse>> {
        self.send_optional(self.http.get(self.url(&format!("/reflection/{}/response", id))))
            .await
    }

    pub async fn create_checkin(
        &self,
        emotion: &str,
        intensity: i64,
        activities: &[String],
        note: Option<&str>,
    ) -> ClientResult<UserEmotion> {
        let body = json!({
            "emotion": emotion,
            "intensity": intensity,
            "activities": activities,
            "note": note,
        });
        self.send(self.http.post(self.url("/checkins")).json(&body)).await
    }

    pub async fn checkins(&self, limit: Option<i64>) -> ClientResult<Vec<UserEmotion>> {
        let mut request = self.http.get(self.url("/checkins"));
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit)]);
        }
        self.send(request).await
    }

    pub async fn checkin_tags(&self) -> ClientResult<Vec<String>> {
        self.send(self.http.get(self.url("/tags/checkins"))).await
    }

    pub async fn resource_tags(&self) -> ClientResult<Vec<String>> {
        self.send(self.http.get(self.url("/tags/resources"))).await
    }

    pub async fn resources(&self, query: &ResourceQuery) -> ClientResult<Vec<LearningResource>> {
        self.send(self.http.get(self.url("/resources")).query(&query.pairs()))
            .await
    }

    /// `resource` is the camelCase creation body, optionally with a nested
    /// `assessment`.
    pub async fn create_resource(&self, resource: &serde_json::Value) -> ClientResult<LearningResource> {
        self.send(self.http.post(self.url("/resources")).json(resource)).await
    }

    pub async fn resource(&self, id: i64) -> ClientResult<LearningResource> {
        self.send(self.http.get(self.url(&format!("/resources/{}", id))))
            .await
    }

    pub async fn assessment(&self, resource_id: i64) -> ClientResult<Assessment> {
        self.send(self.http.get(self.url(&format!("/resources/{}/assessment", resource_id))))
            .await
    }

    /// `answers` pairs a question id with the chosen option id.
    pub async fn submit_assessment(&self, id: i64, answers: &[(i64, i64)]) -> ClientResult<AssessmentResult> {
        let answers: Vec<_> = answers
            .iter()
            .map(|(question_id, option_id)| json!({ "questionId": question_id, "optionId": option_id }))
            .collect();
        self.send(
            self.http
                .post(self.url(&format!("/assessments/{}/submit", id)))
                .json(&json!({ "answers": answers })),
        )
        .await
    }
}
