use std::collections::HashMap;

use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::models::{
    AnswerOption, Assessment, AssessmentResult, DbLearningResource, LearningResource, NewResource,
    Question, ResourceFilter, decode_string_list,
};
use crate::tags::normalize_tags;

const RESOURCE_SELECT: &str = "SELECT r.id, r.title, r.description, r.url, r.category, r.difficulty,
        r.resource_type, r.tags, r.created_by,
        EXISTS (SELECT 1 FROM assessments a WHERE a.resource_id = r.id) AS has_assessment,
        r.created_at, r.updated_at
     FROM learning_resources r";

#[instrument(skip(pool))]
pub async fn list_resources(
    pool: &Pool<Sqlite>,
    filter: &ResourceFilter,
) -> Result<Vec<LearningResource>, AppError> {
    info!("Listing learning resources");
    let rows = sqlx::query_as::<_, DbLearningResource>(&format!(
        "{RESOURCE_SELECT}
         WHERE (?1 IS NULL OR r.category = ?1)
           AND (?2 IS NULL OR r.difficulty = ?2)
           AND (?3 IS NULL OR r.resource_type = ?3)
         ORDER BY r.created_at DESC, r.id DESC"
    ))
    .bind(filter.category.as_deref())
    .bind(filter.difficulty.as_deref())
    .bind(filter.resource_type.as_deref())
    .fetch_all(pool)
    .await?;

    let resources = rows.into_iter().map(LearningResource::from);

    let wanted_tag = filter
        .tag
        .as_deref()
        .and_then(|tag| normalize_tags([tag]).into_iter().next());

    Ok(match wanted_tag {
        Some(tag) => resources
            .filter(|resource| normalize_tags(&resource.tags).contains(&tag))
            .collect(),
        None => resources.collect(),
    })
}

#[instrument(skip(pool))]
pub async fn get_resource(pool: &Pool<Sqlite>, id: i64) -> Result<LearningResource, AppError> {
    info!("Fetching learning resource");
    let row = sqlx::query_as::<_, DbLearningResource>(&format!("{RESOURCE_SELECT} WHERE r.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(resource) => Ok(LearningResource::from(resource)),
        _ => Err(AppError::NotFound(format!("Learning resource {} not found", id))),
    }
}

/// Inserts the resource and its optional assessment in one transaction.
#[instrument(skip(pool, resource), fields(title = %resource.title))]
pub async fn create_resource(
    pool: &Pool<Sqlite>,
    created_by: i64,
    resource: &NewResource,
) -> Result<i64, AppError> {
    info!("Creating learning resource");
    let tags = serde_json::to_string(&resource.tags)?;

    let mut tx = pool.begin().await?;

    let resource_id = sqlx::query(
        "INSERT INTO learning_resources
             (title, description, url, category, difficulty, resource_type, tags, created_by)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(resource.title.trim())
    .bind(&resource.description)
    .bind(resource.url.as_deref())
    .bind(resource.category.trim())
    .bind(resource.difficulty.trim())
    .bind(resource.resource_type.trim())
    .bind(tags)
    .bind(created_by)
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    if let Some(assessment) = &resource.assessment {
        let assessment_id = sqlx::query("INSERT INTO assessments (resource_id, title) VALUES (?, ?)")
            .bind(resource_id)
            .bind(assessment.title.trim())
            .execute(&mut *tx)
            .await?
            .last_insert_rowid();

        for (q_index, question) in assessment.questions.iter().enumerate() {
            let question_id = sqlx::query(
                "INSERT INTO assessment_questions (assessment_id, prompt, position) VALUES (?, ?, ?)",
            )
            .bind(assessment_id)
            .bind(question.prompt.trim())
            .bind(q_index as i64)
            .execute(&mut *tx)
            .await?
            .last_insert_rowid();

            for (o_index, (label, is_correct)) in question.options.iter().enumerate() {
                sqlx::query(
                    "INSERT INTO assessment_options (question_id, label, is_correct, position)
                     VALUES (?, ?, ?, ?)",
                )
                .bind(question_id)
                .bind(label.trim())
                .bind(*is_correct)
                .bind(o_index as i64)
                .execute(&mut *tx)
                .await?;
            }
        }
    }

    tx.commit().await?;

    Ok(resource_id)
}

/// Raw tag lists of every resource, oldest first.
#[instrument(skip(pool))]
pub async fn get_resource_tag_lists(pool: &Pool<Sqlite>) -> Result<Vec<Vec<String>>, AppError> {
    info!("Fetching resource tags");
    let rows: Vec<Option<String>> =
        sqlx::query_scalar("SELECT tags FROM learning_resources ORDER BY created_at, id")
            .fetch_all(pool)
            .await?;

    Ok(rows.into_iter().map(decode_string_list).collect())
}

#[instrument(skip(pool))]
pub async fn get_assessment_for_resource(pool: &Pool<Sqlite>, resource_id: i64) -> Result<Assessment, AppError> {
    let assessment_id: Option<i64> =
        sqlx::query_scalar("SELECT id FROM assessments WHERE resource_id = ?")
            .bind(resource_id)
            .fetch_optional(pool)
            .await?;

    match assessment_id {
        Some(id) => get_assessment(pool, id).await,
        _ => Err(AppError::NotFound(format!(
            "Learning resource {} has no assessment",
            resource_id
        ))),
    }
}

#[instrument(skip(pool))]
pub async fn get_assessment(pool: &Pool<Sqlite>, id: i64) -> Result<Assessment, AppError> {
    info!("Fetching assessment");
    let header: Option<(i64, i64, String)> =
        sqlx::query_as("SELECT id, resource_id, title FROM assessments WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;

    let Some((id, resource_id, title)) = header else {
        return Err(AppError::NotFound(format!("Assessment {} not found", id)));
    };

    let questions: Vec<(i64, String, i64)> = sqlx::query_as(
        "SELECT id, prompt, position FROM assessment_questions
         WHERE assessment_id = ? ORDER BY position, id",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    let options = sqlx::query_as::<_, AnswerOption>(
        "SELECT o.id, o.question_id, o.label, o.position
         FROM assessment_options o
         JOIN assessment_questions q ON q.id = o.question_id
         WHERE q.assessment_id = ?
         ORDER BY o.position, o.id",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    let mut options_by_question: HashMap<i64, Vec<AnswerOption>> = HashMap::new();
    for option in options {
        options_by_question
            .entry(option.question_id)
            .or_default()
            .push(option);
    }

    let questions = questions
        .into_iter()
        .map(|(question_id, prompt, position)| Question {
            id: question_id,
            prompt,
            position,
            options: options_by_question.remove(&question_id).unwrap_or_default(),
        })
        .collect();

    Ok(Assessment {
        id,
        resource_id,
        title,
        questions,
    })
}

/// Scores `answers` (question id → option id) and records the attempt.
/// Unanswered questions and options from other questions score zero.
#[instrument(skip(pool))]
pub async fn submit_assessment(
    pool: &Pool<Sqlite>,
    assessment_id: i64,
    user_id: i64,
    answers: &HashMap<i64, i64>,
) -> Result<AssessmentResult, AppError> {
    info!("Scoring assessment");
    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM assessments WHERE id = ?")
        .bind(assessment_id)
        .fetch_optional(pool)
        .await?;

    if exists.is_none() {
        return Err(AppError::NotFound(format!("Assessment {} not found", assessment_id)));
    }

    let total: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM assessment_questions WHERE assessment_id = ?")
            .bind(assessment_id)
            .fetch_one(pool)
            .await?;

    let correct: Vec<(i64, i64)> = sqlx::query_as(
        "SELECT q.id, o.id
         FROM assessment_questions q
         JOIN assessment_options o ON o.question_id = q.id
         WHERE q.assessment_id = ? AND o.is_correct",
    )
    .bind(assessment_id)
    .fetch_all(pool)
    .await?;

    let score = correct
        .iter()
        .filter(|(question_id, option_id)| answers.get(question_id) == Some(option_id))
        .count() as i64;

    let attempt_id = sqlx::query(
        "INSERT INTO assessment_attempts (assessment_id, user_id, score, total) VALUES (?, ?, ?, ?)",
    )
    .bind(assessment_id)
    .bind(user_id)
    .bind(score)
    .bind(total)
    .execute(pool)
    .await?
    .last_insert_rowid();

    Ok(AssessmentResult {
        attempt_id,
        score,
        total,
    })
}
