#[cfg(test)]
mod tests {
    use rocket::http::{ContentType, Cookie, Method, Status};
    use serde_json::json;

    use crate::test::test_client::{get, login_test_user, patch, post, send, setup_test_client};
    use crate::test::test_db::create_standard_test_db;

    #[rocket::async_test]
    async fn test_health_is_public() {
        let (client, _) = setup_test_client(create_standard_test_db().await).await;

        let response = client.get("/api/health").dispatch().await;

        assert_eq!(response.status(), Status::Ok);
        assert_eq!(response.into_string().await.as_deref(), Some("OK"));
    }

    #[rocket::async_test]
    async fn test_register_and_login() {
        let (client, _) = setup_test_client(create_standard_test_db().await).await;

        let (status, body) = send(
            &client,
            Method::Post,
            "/api/auth/register",
            None,
            Some(json!({
                "email": "Zoe@Example.com",
                "password": "long-enough-pw",
                "fullName": "Zoe Zen"
            })),
        )
        .await;

        assert_eq!(status, Status::Ok);
        assert_eq!(body["status"], 200);
        assert_eq!(body["data"]["email"], "zoe@example.com");
        assert_eq!(body["data"]["role"], "member");
        assert_eq!(body["data"]["onboardingCompleted"], false);

        let response = client
            .post("/api/auth/login")
            .header(ContentType::JSON)
            .body(json!({ "email": "zoe@example.com", "password": "long-enough-pw" }).to_string())
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Ok);
        assert!(response.cookies().get_private("session_token").is_some());
    }

    #[rocket::async_test]
    async fn test_register_rejects_duplicates_and_bad_input() {
        let (client, test_db) = setup_test_client(create_standard_test_db().await).await;
        let users_before = test_db.count_rows("users").await;

        let (status, body) = send(
            &client,
            Method::Post,
            "/api/auth/register",
            None,
            Some(json!({
                "email": "maya@example.com",
                "password": "another-password",
                "fullName": "Maya Again"
            })),
        )
        .await;

        assert_eq!(status, Status::Conflict);
        assert_eq!(body["status"], 409);
        assert!(body["data"].is_null());
        assert_eq!(body["message"], "An account with this email already exists");

        let (status, body) = send(
            &client,
            Method::Post,
            "/api/auth/register",
            None,
            Some(json!({ "email": "not-an-email", "password": "short", "fullName": " " })),
        )
        .await;

        assert_eq!(status, Status::UnprocessableEntity);
        assert_eq!(body["message"], "Validation failed");
        assert_eq!(body["data"]["email"][0], "Invalid email format");
        assert!(body["data"]["password"].is_array());
        assert!(body["data"]["full_name"].is_array());

        assert_eq!(test_db.count_rows("users").await, users_before);
    }

    #[rocket::async_test]
    async fn test_login_with_wrong_password() {
        let (client, test_db) = setup_test_client(create_standard_test_db().await).await;

        let (status, body) = send(
            &client,
            Method::Post,
            "/api/auth/login",
            None,
            Some(json!({ "email": "maya@example.com", "password": "wrong_password" })),
        )
        .await;

        assert_eq!(status, Status::Unauthorized);
        assert_eq!(body["message"], "Invalid email or password");
        assert!(body["data"].is_null());
        assert_eq!(test_db.count_rows("user_sessions").await, 0);
    }

    #[rocket::async_test]
    async fn test_auth_required_apis() {
        let (client, _) = setup_test_client(create_standard_test_db().await).await;

        let endpoints = vec![
            "/api/auth/session",
            "/api/users/1",
            "/api/onboarding-status",
            "/api/roles",
            "/api/groups",
            "/api/groups/1",
            "/api/groups/1/posts",
            "/api/reflection",
            "/api/reflection/created",
            "/api/checkins",
            "/api/tags/checkins",
            "/api/tags/resources",
            "/api/resources",
        ];

        for endpoint in endpoints {
            let (status, body) = send(&client, Method::Get, endpoint, None, None).await;

            assert_eq!(status, Status::Unauthorized, "{} did not require a session", endpoint);
            assert_eq!(body["status"], 401);
            assert!(body["data"].is_null());
            assert_eq!(body["message"], "Authentication required");
        }
    }

    #[rocket::async_test]
    async fn test_unauthenticated_mutations_change_nothing() {
        let (client, test_db) = setup_test_client(create_standard_test_db().await).await;
        let group_id = test_db.group_id("Night Owls").expect("group exists");
        let reflection_id = test_db.reflection_ids[0];

        let mutations = vec![
            (
                "/api/checkins".to_string(),
                json!({ "emotion": "calm", "intensity": 4, "activities": ["walk"] }),
                "user_emotions",
            ),
            (
                format!("/api/groups/{}/posts", group_id),
                json!({ "content": "hello" }),
                "posts",
            ),
            (
                format!("/api/reflection/{}/response", reflection_id),
                json!({ "response": "My cat" }),
                "daily_reflection_responses",
            ),
            (
                "/api/reflection".to_string(),
                json!({ "reflectionQuestion": "Anything?" }),
                "daily_reflections",
            ),
        ];

        for (uri, body, table) in mutations {
            let before = test_db.count_rows(table).await;
            let (status, _) = send(&client, Method::Post, &uri, None, Some(body)).await;

            assert_eq!(status, Status::Unauthorized, "{} accepted an anonymous write", uri);
            assert_eq!(test_db.count_rows(table).await, before, "{} changed {}", uri, table);
        }
    }

    #[rocket::async_test]
    async fn test_forged_session_is_rejected() {
        let (client, _) = setup_test_client(create_standard_test_db().await).await;

        let forged_cookie = Cookie::build(("session_token", "fake_token")).build();
        let (status, body) = get(&client, "/api/auth/session", &forged_cookie).await;

        assert_eq!(status, Status::Unauthorized);
        assert_eq!(body["status"], 401);

        let session = login_test_user(&client, "maya@example.com").await;
        let (status, body) = get(&client, "/api/auth/session", &session).await;

        assert_eq!(status, Status::Ok);
        assert_eq!(body["data"]["email"], "maya@example.com");
    }

    #[rocket::async_test]
    async fn test_logout_ends_the_session() {
        let (client, test_db) = setup_test_client(create_standard_test_db().await).await;

        let session = login_test_user(&client, "maya@example.com").await;
        assert_eq!(test_db.count_rows("user_sessions").await, 1);

        let (status, body) = send(&client, Method::Post, "/api/auth/logout", Some(&session), None).await;
        assert_eq!(status, Status::Ok);
        assert!(body["data"].is_null());
        assert_eq!(body["message"], "Logged out");
        assert_eq!(test_db.count_rows("user_sessions").await, 0);

        let (status, _) = get(&client, "/api/auth/session", &session).await;
        assert_eq!(status, Status::Unauthorized);
    }

    #[rocket::async_test]
    async fn test_onboarding_status_flips_after_completion() {
        let (client, _) = setup_test_client(create_standard_test_db().await).await;
        let session = login_test_user(&client, "noah@example.com").await;

        let (status, body) = get(&client, "/api/onboarding-status", &session).await;
        assert_eq!(status, Status::Ok);
        assert_eq!(body["data"]["isCompleted"], false);

        let (status, body) = post(
            &client,
            "/api/onboarding",
            &session,
            json!({ "username": "noah.n", "expertise": "mindfulness" }),
        )
        .await;
        assert_eq!(status, Status::Ok);
        assert_eq!(body["data"]["username"], "noah.n");
        assert_eq!(body["data"]["onboardingCompleted"], true);

        let (_, body) = get(&client, "/api/onboarding-status", &session).await;
        assert_eq!(body["data"]["isCompleted"], true);
    }

    #[rocket::async_test]
    async fn test_onboarding_rejects_taken_and_malformed_usernames() {
        let (client, _) = setup_test_client(create_standard_test_db().await).await;

        let maya = login_test_user(&client, "maya@example.com").await;
        let (status, _) = post(&client, "/api/onboarding", &maya, json!({ "username": "shared_name" })).await;
        assert_eq!(status, Status::Ok);

        let noah = login_test_user(&client, "noah@example.com").await;
        let (status, body) = post(&client, "/api/onboarding", &noah, json!({ "username": "shared_name" })).await;
        assert_eq!(status, Status::Conflict);
        assert_eq!(body["message"], "Username is already taken");

        let (status, body) = post(&client, "/api/onboarding", &noah, json!({ "username": "a b" })).await;
        assert_eq!(status, Status::UnprocessableEntity);
        assert!(body["data"]["username"].is_array());

        let (_, body) = get(&client, "/api/onboarding-status", &noah).await;
        assert_eq!(body["data"]["isCompleted"], false);
    }

    #[rocket::async_test]
    async fn test_profiles_hide_email_from_other_members() {
        let (client, test_db) = setup_test_client(create_standard_test_db().await).await;
        let eli_id = test_db.user_id("eli@example.com").expect("expert exists");

        let maya = login_test_user(&client, "maya@example.com").await;
        let (status, body) = get(&client, &format!("/api/users/{}", eli_id), &maya).await;
        assert_eq!(status, Status::Ok);
        assert_eq!(body["data"]["fullName"], "Eli Expert");
        assert!(body["data"].get("email").is_none());

        let ada = login_test_user(&client, "ada@example.com").await;
        let (_, body) = get(&client, &format!("/api/users/{}", eli_id), &ada).await;
        assert_eq!(body["data"]["email"], "eli@example.com");

        let (status, body) = get(&client, "/api/users/9999", &ada).await;
        assert_eq!(status, Status::NotFound);
        assert_eq!(body["message"], "User 9999 not found");
    }

    #[rocket::async_test]
    async fn test_patch_user_is_limited_to_self_or_admin() {
        let (client, test_db) = setup_test_client(create_standard_test_db().await).await;
        let maya_id = test_db.user_id("maya@example.com").expect("member exists");
        let noah_id = test_db.user_id("noah@example.com").expect("member exists");

        let noah = login_test_user(&client, "noah@example.com").await;
        let (status, body) = patch(
            &client,
            &format!("/api/users/{}", maya_id),
            &noah,
            json!({ "fullName": "Hijacked" }),
        )
        .await;
        assert_eq!(status, Status::Forbidden);
        assert!(body["data"].is_null());

        let ada = login_test_user(&client, "ada@example.com").await;
        let (_, body) = get(&client, &format!("/api/users/{}", maya_id), &ada).await;
        assert_eq!(body["data"]["fullName"], "Maya Member");

        let (status, body) = patch(
            &client,
            &format!("/api/users/{}", noah_id),
            &noah,
            json!({ "expertise": "breathing" }),
        )
        .await;
        assert_eq!(status, Status::Ok);
        assert_eq!(body["data"]["expertise"], "breathing");
        assert_eq!(body["data"]["fullName"], "Noah Newcomer");

        let (status, body) = patch(
            &client,
            &format!("/api/users/{}", maya_id),
            &ada,
            json!({ "fullName": "Maya M." }),
        )
        .await;
        assert_eq!(status, Status::Ok);
        assert_eq!(body["data"]["fullName"], "Maya M.");
    }

    #[rocket::async_test]
    async fn test_only_admins_change_roles() {
        let (client, test_db) = setup_test_client(create_standard_test_db().await).await;
        let noah_id = test_db.user_id("noah@example.com").expect("member exists");
        let ada_id = test_db.user_id("ada@example.com").expect("admin exists");
        let noah_uri = format!("/api/users/{}", noah_id);

        let noah = login_test_user(&client, "noah@example.com").await;
        let (status, _) = patch(&client, &noah_uri, &noah, json!({ "role": "admin" })).await;
        assert_eq!(status, Status::Forbidden);

        let eli = login_test_user(&client, "eli@example.com").await;
        let (status, _) = patch(&client, &noah_uri, &eli, json!({ "role": "expert" })).await;
        assert_eq!(status, Status::Forbidden);

        let (_, body) = get(&client, &noah_uri, &noah).await;
        assert_eq!(body["data"]["role"], "member");

        let (status, _) = post(
            &client,
            "/api/reflection",
            &noah,
            json!({ "reflectionQuestion": "What helped you rest?" }),
        )
        .await;
        assert_eq!(status, Status::Forbidden);

        let ada = login_test_user(&client, "ada@example.com").await;
        let (status, body) = patch(
            &client,
            &noah_uri,
            &ada,
            json!({ "role": "expert", "expertise": "sleep" }),
        )
        .await;
        assert_eq!(status, Status::Ok);
        assert_eq!(body["data"]["role"], "expert");
        assert_eq!(body["data"]["expertise"], "sleep");

        // the existing session picks up the new role
        let (status, _) = post(
            &client,
            "/api/reflection",
            &noah,
            json!({ "reflectionQuestion": "What helped you rest?" }),
        )
        .await;
        assert_eq!(status, Status::Ok);

        let (status, body) = patch(
            &client,
            &format!("/api/users/{}", ada_id),
            &ada,
            json!({ "role": "member" }),
        )
        .await;
        assert_eq!(status, Status::Forbidden);
        assert_eq!(body["message"], "You cannot change your own role");

        let (status, _) = patch(&client, &noah_uri, &ada, json!({ "role": "coach" })).await;
        assert_eq!(status, Status::UnprocessableEntity);

        let (_, body) = get(&client, &noah_uri, &ada).await;
        assert_eq!(body["data"]["role"], "expert");
    }

    #[rocket::async_test]
    async fn test_roles_are_listed() {
        let (client, _) = setup_test_client(create_standard_test_db().await).await;
        let session = login_test_user(&client, "maya@example.com").await;

        let (status, body) = get(&client, "/api/roles", &session).await;

        assert_eq!(status, Status::Ok);
        let names: Vec<&str> = body["data"]
            .as_array()
            .expect("roles array")
            .iter()
            .filter_map(|role| role["name"].as_str())
            .collect();
        assert_eq!(names, vec!["member", "expert", "admin"]);
    }

    #[rocket::async_test]
    async fn test_unknown_routes_use_the_envelope() {
        let (client, _) = setup_test_client(create_standard_test_db().await).await;
        let session = login_test_user(&client, "maya@example.com").await;

        let (status, body) = get(&client, "/api/does-not-exist", &session).await;

        assert_eq!(status, Status::NotFound);
        assert_eq!(body["status"], 404);
        assert!(body["data"].is_null());

        let (status, body) = send(
            &client,
            Method::Post,
            "/api/auth/login",
            None,
            Some(json!({ "email": "maya@example.com" })),
        )
        .await;
        assert_eq!(status, Status::UnprocessableEntity);
        assert_eq!(body["status"], 422);
        assert!(body["data"].is_null());
    }
}
