use std::collections::HashMap;

use rocket::State;
use rocket::serde::{Deserialize, Serialize, json::Json};
use sqlx::{Pool, Sqlite};
use validator::{Validate, ValidationError};

use crate::auth::{Permission, User};
use crate::db::{
    create_resource, get_assessment_for_resource, get_resource, list_resources, submit_assessment,
};
use crate::envelope::{ApiResponse, ApiResult};
use crate::models::{
    Assessment, AssessmentResult, LearningResource, NewAssessment, NewQuestion, NewResource,
    ResourceFilter,
};
use crate::validation::{JsonValidateExt, not_blank, tags_not_blank};

#[derive(Debug, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OptionRequest {
    #[validate(custom(function = "not_blank"))]
    label: String,
    #[serde(default)]
    is_correct: bool,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct QuestionRequest {
    #[validate(custom(function = "not_blank"))]
    prompt: String,
    #[validate(
        length(min = 2, message = "A question needs at least two options"),
        custom(function = "has_correct_option"),
        nested
    )]
    options: Vec<OptionRequest>,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct AssessmentRequest {
    #[validate(custom(function = "not_blank"))]
    title: String,
    #[validate(length(min = 1, message = "An assessment needs at least one question"), nested)]
    questions: Vec<QuestionRequest>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateResourceRequest {
    #[validate(custom(function = "not_blank"))]
    title: String,
    #[serde(default)]
    description: String,
    #[validate(url(message = "Invalid resource URL"))]
    url: Option<String>,
    #[validate(custom(function = "not_blank"))]
    category: String,
    #[validate(custom(function = "not_blank"))]
    difficulty: String,
    #[serde(rename = "type")]
    #[validate(custom(function = "not_blank"))]
    resource_type: String,
    #[serde(default)]
    #[validate(custom(function = "tags_not_blank"))]
    tags: Vec<String>,
    #[validate(nested)]
    assessment: Option<AssessmentRequest>,
}

impl From<CreateResourceRequest> for NewResource {
    fn from(request: CreateResourceRequest) -> Self {
        Self {
            title: request.title,
            description: request.description,
            url: request.url,
            category: request.category,
            difficulty: request.difficulty,
            resource_type: request.resource_type,
            tags: request.tags,
            assessment: request.assessment.map(|assessment| NewAssessment {
                title: assessment.title,
                questions: assessment
                    .questions
                    .into_iter()
                    .map(|question| NewQuestion {
                        prompt: question.prompt,
                        options: question
                            .options
                            .into_iter()
                            .map(|option| (option.label, option.is_correct))
                            .collect(),
                    })
                    .collect(),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRequest {
    question_id: i64,
    option_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct SubmitAssessmentRequest {
    #[serde(default)]
    answers: Vec<AnswerRequest>,
}

fn has_correct_option(options: &[OptionRequest]) -> Result<(), ValidationError> {
    if options.iter().any(|option| option.is_correct) {
        return Ok(());
    }
    let mut error = ValidationError::new("no_correct_option");
    error.message = Some("At least one option must be correct".into());
    Err(error)
}

#[get("/resources?<filter..>")]
pub async fn api_list_resources(
    filter: ResourceFilter,
    _user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Vec<LearningResource>> {
    let resources = list_resources(db, &filter).await?;
    Ok(ApiResponse::ok(resources, "Resources fetched"))
}

#[post("/resources", data = "<resource>")]
pub async fn api_create_resource(
    resource: Json<CreateResourceRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<LearningResource> {
    user.require_permission(Permission::ManageResources)?;

    let resource = NewResource::from(resource.validated()?);
    let id = create_resource(db, user.id, &resource).await?;

    Ok(ApiResponse::ok(get_resource(db, id).await?, "Resource created"))
}

#[get("/resources/<id>")]
pub async fn api_get_resource(
    id: i64,
    _user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<LearningResource> {
    let resource = get_resource(db, id).await?;
    Ok(ApiResponse::ok(resource, "Resource fetched"))
}

#[get("/resources/<id>/assessment")]
pub async fn api_get_assessment(id: i64, _user: User, db: &State<Pool<Sqlite>>) -> ApiResult<Assessment> {
    get_resource(db, id).await?;

    let assessment = get_assessment_for_resource(db, id).await?;
    Ok(ApiResponse::ok(assessment, "Assessment fetched"))
}

/// Later answers to the same question replace earlier ones.
#[post("/assessments/<id>/submit", data = "<submission>")]
pub async fn api_submit_assessment(
    id: i64,
    submission: Json<SubmitAssessmentRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<AssessmentResult> {
    let answers: HashMap<i64, i64> = submission
        .into_inner()
        .answers
        .into_iter()
        .map(|answer| (answer.question_id, answer.option_id))
        .collect();

    let result = submit_assessment(db, id, user.id, &answers).await?;
    let message = format!("Scored {} out of {}", result.score, result.total);

    Ok(ApiResponse::ok(result, message))
}
