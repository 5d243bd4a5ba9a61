use chrono::{DateTime, NaiveDateTime, Utc};
use rocket::FromForm;
use serde::{Deserialize, Serialize};

use crate::auth::{Permission, User};

pub fn to_utc(dt: Option<NaiveDateTime>) -> DateTime<Utc> {
    dt.map(|dt| DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc))
        .unwrap_or_else(Utc::now)
}

/// Decodes a JSON array column, treating malformed content as empty.
pub fn decode_string_list(raw: Option<String>) -> Vec<String> {
    raw.and_then(|raw| match serde_json::from_str(&raw) {
        Ok(list) => Some(list),
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring malformed JSON list column");
            None
        }
    })
    .unwrap_or_default()
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RoleRecord {
    pub id: i64,
    pub name: String,
}

/// A user as seen by someone else. `email` is only filled in for the
/// user themself or a viewer with `ViewEmails`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub email: Option<String>,
    pub full_name: String,
    pub username: Option<String>,
    pub profile_pic_url: Option<String>,
    pub expertise: Option<String>,
    pub role: String,
    pub onboarding_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn for_viewer(user: User, viewer: &User) -> Self {
        let show_email = viewer.id == user.id || viewer.has_permission(Permission::ViewEmails);

        Self {
            id: user.id,
            email: show_email.then_some(user.email),
            full_name: user.full_name,
            username: user.username,
            profile_pic_url: user.profile_pic_url,
            expertise: user.expertise,
            role: user.role.to_string(),
            onboarding_completed: user.onboarding_completed,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Partial update of a user row; `None` leaves the column untouched.
#[derive(Debug, Default, Clone)]
pub struct UserChanges {
    pub full_name: Option<String>,
    pub username: Option<String>,
    pub profile_pic_url: Option<String>,
    pub expertise: Option<String>,
    pub onboarding_completed: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: i64,
    pub category: String,
    pub name: String,
    pub description: String,
    pub image: Option<String>,
    pub member_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbGroup {
    pub id: i64,
    pub category: String,
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub member_count: Option<i64>,
    pub created_at: Option<NaiveDateTime>,
}

impl From<DbGroup> for Group {
    fn from(db: DbGroup) -> Self {
        Self {
            id: db.id,
            category: db.category,
            name: db.name,
            description: db.description.unwrap_or_default(),
            image: db.image,
            member_count: db.member_count.unwrap_or_default(),
            created_at: to_utc(db.created_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMember {
    pub user_id: i64,
    pub full_name: String,
    pub username: Option<String>,
    pub profile_pic_url: Option<String>,
    pub joined_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbGroupMember {
    pub user_id: i64,
    pub full_name: Option<String>,
    pub username: Option<String>,
    pub profile_pic_url: Option<String>,
    pub joined_at: Option<NaiveDateTime>,
}

impl From<DbGroupMember> for GroupMember {
    fn from(db: DbGroupMember) -> Self {
        Self {
            user_id: db.user_id,
            full_name: db.full_name.unwrap_or_default(),
            username: db.username,
            profile_pic_url: db.profile_pic_url,
            joined_at: to_utc(db.joined_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    pub group_id: i64,
    pub author_id: i64,
    pub author_name: String,
    pub content: String,
    pub like_count: i64,
    pub comment_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbPost {
    pub id: i64,
    pub group_id: i64,
    pub author_id: i64,
    pub author_name: Option<String>,
    pub content: String,
    pub like_count: Option<i64>,
    pub comment_count: Option<i64>,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

impl From<DbPost> for Post {
    fn from(db: DbPost) -> Self {
        Self {
            id: db.id,
            group_id: db.group_id,
            author_id: db.author_id,
            author_name: db.author_name.unwrap_or_default(),
            content: db.content,
            like_count: db.like_count.unwrap_or_default(),
            comment_count: db.comment_count.unwrap_or_default(),
            created_at: to_utc(db.created_at),
            updated_at: to_utc(db.updated_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub author_name: String,
    pub content: String,
    pub like_count: i64,
    pub reply_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbComment {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub author_name: Option<String>,
    pub content: String,
    pub like_count: Option<i64>,
    pub reply_count: Option<i64>,
    pub created_at: Option<NaiveDateTime>,
}

impl From<DbComment> for Comment {
    fn from(db: DbComment) -> Self {
        Self {
            id: db.id,
            post_id: db.post_id,
            author_id: db.author_id,
            author_name: db.author_name.unwrap_or_default(),
            content: db.content,
            like_count: db.like_count.unwrap_or_default(),
            reply_count: db.reply_count.unwrap_or_default(),
            created_at: to_utc(db.created_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentReply {
    pub id: i64,
    pub comment_id: i64,
    pub author_id: i64,
    pub author_name: String,
    pub content: String,
    pub like_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbCommentReply {
    pub id: i64,
    pub comment_id: i64,
    pub author_id: i64,
    pub author_name: Option<String>,
    pub content: String,
    pub like_count: Option<i64>,
    pub created_at: Option<NaiveDateTime>,
}

impl From<DbCommentReply> for CommentReply {
    fn from(db: DbCommentReply) -> Self {
        Self {
            id: db.id,
            comment_id: db.comment_id,
            author_id: db.author_id,
            author_name: db.author_name.unwrap_or_default(),
            content: db.content,
            like_count: db.like_count.unwrap_or_default(),
            created_at: to_utc(db.created_at),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeTarget {
    Post,
    Comment,
    Reply,
}

impl LikeTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            LikeTarget::Post => "post",
            LikeTarget::Comment => "comment",
            LikeTarget::Reply => "reply",
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            LikeTarget::Post => "posts",
            LikeTarget::Comment => "comments",
            LikeTarget::Reply => "comment_replies",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LikeState {
    pub liked: bool,
    pub like_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyReflection {
    pub id: i64,
    pub user_id: i64,
    pub reflection_question: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbDailyReflection {
    pub id: i64,
    pub user_id: i64,
    pub question: String,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

impl From<DbDailyReflection> for DailyReflection {
    fn from(db: DbDailyReflection) -> Self {
        Self {
            id: db.id,
            user_id: db.user_id,
            reflection_question: db.question,
            created_at: to_utc(db.created_at),
            updated_at: to_utc(db.updated_at),
        }
    }
}

/// A reflection together with the caller's completion state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReflectionOverview {
    #[serde(flatten)]
    pub reflection: DailyReflection,
    pub is_completed: bool,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbReflectionOverview {
    pub id: i64,
    pub user_id: i64,
    pub question: String,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
    pub is_completed: Option<bool>,
}

impl From<DbReflectionOverview> for ReflectionOverview {
    fn from(db: DbReflectionOverview) -> Self {
        Self {
            is_completed: db.is_completed.unwrap_or_default(),
            reflection: DailyReflection {
                id: db.id,
                user_id: db.user_id,
                reflection_question: db.question,
                created_at: to_utc(db.created_at),
                updated_at: to_utc(db.updated_at),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyReflectionResponse {
    pub id: i64,
    pub reflection_id: i64,
    pub user_id: i64,
    pub response: String,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbDailyReflectionResponse {
    pub id: i64,
    pub reflection_id: i64,
    pub user_id: i64,
    pub response: String,
    pub is_completed: bool,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

impl From<DbDailyReflectionResponse> for DailyReflectionResponse {
    fn from(db: DbDailyReflectionResponse) -> Self {
        Self {
            id: db.id,
            reflection_id: db.reflection_id,
            user_id: db.user_id,
            response: db.response,
            is_completed: db.is_completed,
            created_at: to_utc(db.created_at),
            updated_at: to_utc(db.updated_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEmotion {
    pub id: i64,
    pub user_id: i64,
    pub emotion: String,
    pub intensity: i64,
    pub activities: Vec<String>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbUserEmotion {
    pub id: i64,
    pub user_id: i64,
    pub emotion: String,
    pub intensity: i64,
    pub activities: Option<String>,
    pub note: Option<String>,
    pub created_at: Option<NaiveDateTime>,
}

impl From<DbUserEmotion> for UserEmotion {
    fn from(db: DbUserEmotion) -> Self {
        Self {
            id: db.id,
            user_id: db.user_id,
            emotion: db.emotion,
            intensity: db.intensity,
            activities: decode_string_list(db.activities),
            note: db.note,
            created_at: to_utc(db.created_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningResource {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub url: Option<String>,
    pub category: String,
    pub difficulty: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub tags: Vec<String>,
    pub created_by: Option<i64>,
    pub has_assessment: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbLearningResource {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub category: String,
    pub difficulty: String,
    pub resource_type: String,
    pub tags: Option<String>,
    pub created_by: Option<i64>,
    pub has_assessment: Option<bool>,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

impl From<DbLearningResource> for LearningResource {
    fn from(db: DbLearningResource) -> Self {
        Self {
            id: db.id,
            title: db.title,
            description: db.description.unwrap_or_default(),
            url: db.url,
            category: db.category,
            difficulty: db.difficulty,
            resource_type: db.resource_type,
            tags: decode_string_list(db.tags),
            created_by: db.created_by,
            has_assessment: db.has_assessment.unwrap_or_default(),
            created_at: to_utc(db.created_at),
            updated_at: to_utc(db.updated_at),
        }
    }
}

/// Query-string filters for listing learning resources.
#[derive(Debug, Default, Clone, FromForm)]
pub struct ResourceFilter {
    pub category: Option<String>,
    pub difficulty: Option<String>,
    #[field(name = "type")]
    pub resource_type: Option<String>,
    pub tag: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub id: i64,
    pub resource_id: i64,
    pub title: String,
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: i64,
    pub prompt: String,
    pub position: i64,
    pub options: Vec<AnswerOption>,
}

/// An answer choice. Correctness stays server-side.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOption {
    pub id: i64,
    #[serde(skip)]
    pub question_id: i64,
    pub label: String,
    pub position: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentResult {
    pub attempt_id: i64,
    pub score: i64,
    pub total: i64,
}

/// Input for a new resource's nested assessment.
#[derive(Debug, Clone)]
pub struct NewAssessment {
    pub title: String,
    pub questions: Vec<NewQuestion>,
}

#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub prompt: String,
    pub options: Vec<(String, bool)>,
}

#[derive(Debug, Clone)]
pub struct NewResource {
    pub title: String,
    pub description: String,
    pub url: Option<String>,
    pub category: String,
    pub difficulty: String,
    pub resource_type: String,
    pub tags: Vec<String>,
    pub assessment: Option<NewAssessment>,
}

#[derive(Debug, Clone)]
pub struct NewCheckin {
    pub emotion: String,
    pub intensity: i64,
    pub activities: Vec<String>,
    pub note: Option<String>,
}
