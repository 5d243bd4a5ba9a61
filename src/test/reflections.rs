#[cfg(test)]
mod tests {
    use rocket::http::Status;
    use serde_json::json;

    use crate::test::test_client::{get, login_test_user, patch, post, setup_test_client};
    use crate::test::test_db::create_standard_test_db;

    #[rocket::async_test]
    async fn test_members_cannot_create_reflections() {
        let (client, test_db) = setup_test_client(create_standard_test_db().await).await;
        let maya = login_test_user(&client, "maya@example.com").await;

        let (status, body) = post(
            &client,
            "/api/reflection",
            &maya,
            json!({ "reflectionQuestion": "Who helped you today?" }),
        )
        .await;

        assert_eq!(status, Status::Forbidden);
        assert!(body["data"].is_null());
        assert_eq!(test_db.count_rows("daily_reflections").await, 1);
    }

    #[rocket::async_test]
    async fn test_experts_create_reflections() {
        let (client, test_db) = setup_test_client(create_standard_test_db().await).await;
        let eli_id = test_db.user_id("eli@example.com").expect("expert exists");
        let eli = login_test_user(&client, "eli@example.com").await;

        let (status, body) = post(
            &client,
            "/api/reflection",
            &eli,
            json!({ "reflectionQuestion": "  Who helped you today?  " }),
        )
        .await;

        assert_eq!(status, Status::Ok);
        assert_eq!(body["data"]["reflectionQuestion"], "Who helped you today?");
        assert_eq!(body["data"]["userId"], eli_id);

        let (_, body) = get(&client, "/api/reflection/created", &eli).await;
        assert_eq!(body["data"].as_array().expect("reflections array").len(), 2);

        let (status, body) = post(&client, "/api/reflection", &eli, json!({ "reflectionQuestion": "" })).await;
        assert_eq!(status, Status::UnprocessableEntity);
        assert!(body["data"]["reflection_question"].is_array());
    }

    #[rocket::async_test]
    async fn test_only_the_creator_edits_a_reflection() {
        let (client, test_db) = setup_test_client(create_standard_test_db().await).await;
        let uri = format!("/api/reflection/{}", test_db.reflection_ids[0]);

        let ada = login_test_user(&client, "ada@example.com").await;
        let (status, body) = patch(&client, &uri, &ada, json!({ "reflectionQuestion": "Changed?" })).await;
        assert_eq!(status, Status::Forbidden);
        assert_eq!(body["message"], "Only the creator can edit this reflection");

        let (_, body) = get(&client, &uri, &ada).await;
        assert_eq!(body["data"]["reflectionQuestion"], "What made you smile today?");
    }

    #[rocket::async_test]
    async fn test_update_changes_only_the_question() {
        let (client, test_db) = setup_test_client(create_standard_test_db().await).await;
        let uri = format!("/api/reflection/{}", test_db.reflection_ids[0]);
        let eli = login_test_user(&client, "eli@example.com").await;

        let (_, before) = get(&client, &uri, &eli).await;
        let (status, after) = patch(
            &client,
            &uri,
            &eli,
            json!({ "reflectionQuestion": "What made you laugh today?" }),
        )
        .await;

        assert_eq!(status, Status::Ok);
        assert_eq!(after["data"]["reflectionQuestion"], "What made you laugh today?");
        assert_eq!(after["data"]["id"], before["data"]["id"]);
        assert_eq!(after["data"]["userId"], before["data"]["userId"]);
        assert_eq!(after["data"]["createdAt"], before["data"]["createdAt"]);
        assert!(after["data"]["updatedAt"].is_string());

        let (status, _) = patch(
            &client,
            "/api/reflection/999",
            &eli,
            json!({ "reflectionQuestion": "Anyone?" }),
        )
        .await;
        assert_eq!(status, Status::NotFound);
    }

    #[rocket::async_test]
    async fn test_response_marks_reflection_completed_for_the_submitter() {
        let (client, test_db) = setup_test_client(create_standard_test_db().await).await;
        let reflection_id = test_db.reflection_ids[0];
        let response_uri = format!("/api/reflection/{}/response", reflection_id);

        let maya = login_test_user(&client, "maya@example.com").await;
        let (status, body) = get(&client, &response_uri, &maya).await;
        assert_eq!(status, Status::Ok);
        assert!(body["data"].is_null());
        assert_eq!(body["message"], "No response yet");

        let (status, body) = post(&client, &response_uri, &maya, json!({ "response": "My dog" })).await;
        assert_eq!(status, Status::Ok);
        assert_eq!(body["data"]["response"], "My dog");
        assert_eq!(body["data"]["isCompleted"], true);

        let (_, body) = post(&client, &response_uri, &maya, json!({ "response": "My dog, twice" })).await;
        assert_eq!(body["data"]["response"], "My dog, twice");
        assert_eq!(test_db.count_rows("daily_reflection_responses").await, 1);

        let (_, body) = get(&client, &response_uri, &maya).await;
        assert_eq!(body["data"]["response"], "My dog, twice");

        let (_, body) = get(&client, "/api/reflection", &maya).await;
        let list = body["data"].as_array().expect("reflections array");
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["id"], reflection_id);
        assert_eq!(list[0]["isCompleted"], true);

        let noah = login_test_user(&client, "noah@example.com").await;
        let (_, body) = get(&client, "/api/reflection", &noah).await;
        assert_eq!(body["data"][0]["isCompleted"], false);

        let (status, _) = post(&client, "/api/reflection/999/response", &maya, json!({ "response": "?" })).await;
        assert_eq!(status, Status::NotFound);
    }
}
