#[cfg(test)]
pub mod test_db {
    use std::collections::HashMap;
    use std::sync::Once;

    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::{Pool, Sqlite};

    use crate::auth::Role;
    use crate::database::init_schema;
    use crate::db::{create_group, create_reflection, create_user, join_group};
    use crate::error::AppError;

    static INIT: Once = Once::new();
    pub static STANDARD_PASSWORD: &str = "password123";

    pub fn init_test_logging() {
        INIT.call_once(|| {
            let _ = env_logger::builder()
                .parse_filters("debug")
                .is_test(true)
                .try_init();
        });
    }

    /// One connection, never recycled, so every query sees the same
    /// in-memory database.
    pub async fn test_pool() -> Result<Pool<Sqlite>, AppError> {
        init_test_logging();

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        init_schema(&pool).await?;

        Ok(pool)
    }

    #[derive(Default)]
    pub struct TestDbBuilder {
        users: Vec<TestUser>,
        groups: Vec<TestGroup>,
        memberships: Vec<(String, String)>,
        reflections: Vec<(String, String)>,
    }

    pub struct TestUser {
        pub email: String,
        pub full_name: String,
        pub role: Role,
        pub password: String,
    }

    pub struct TestGroup {
        pub name: String,
        pub category: String,
        pub description: String,
    }

    impl TestDbBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn member(self, email: &str, full_name: &str) -> Self {
            self.user_with_password(email, full_name, Role::Member, STANDARD_PASSWORD)
        }

        pub fn expert(self, email: &str, full_name: &str) -> Self {
            self.user_with_password(email, full_name, Role::Expert, STANDARD_PASSWORD)
        }

        pub fn admin(self, email: &str, full_name: &str) -> Self {
            self.user_with_password(email, full_name, Role::Admin, STANDARD_PASSWORD)
        }

        pub fn user_with_password(
            mut self,
            email: &str,
            full_name: &str,
            role: Role,
            password: &str,
        ) -> Self {
            self.users.push(TestUser {
                email: email.to_string(),
                full_name: full_name.to_string(),
                role,
                password: password.to_string(),
            });
            self
        }

        pub fn group(mut self, name: &str, category: &str) -> Self {
            self.groups.push(TestGroup {
                name: name.to_string(),
                category: category.to_string(),
                description: format!("A space for {}", category),
            });
            self
        }

        pub fn membership(mut self, group_name: &str, email: &str) -> Self {
            self.memberships
                .push((group_name.to_string(), email.to_string()));
            self
        }

        pub fn reflection(mut self, author_email: &str, question: &str) -> Self {
            self.reflections
                .push((author_email.to_string(), question.to_string()));
            self
        }

        pub async fn build(self) -> Result<TestDb, AppError> {
            let pool = test_pool().await?;

            let mut user_id_map: HashMap<String, i64> = HashMap::new();
            let mut group_id_map: HashMap<String, i64> = HashMap::new();
            let mut reflection_ids = Vec::new();

            for user in &self.users {
                let user_id =
                    create_user(&pool, &user.email, &user.password, &user.full_name, user.role)
                        .await?;

                user_id_map.insert(user.email.clone(), user_id);
            }

            let group_owner = self
                .users
                .iter()
                .find(|u| matches!(u.role, Role::Admin))
                .or_else(|| self.users.first())
                .map(|u| user_id_map[&u.email]);

            for group in &self.groups {
                let owner = group_owner.ok_or_else(|| {
                    AppError::Internal("Test groups need at least one user".to_string())
                })?;

                let group_id = create_group(
                    &pool,
                    owner,
                    &group.category,
                    &group.name,
                    &group.description,
                    None,
                )
                .await?;

                group_id_map.insert(group.name.clone(), group_id);
            }

            for (group_name, email) in &self.memberships {
                if let (Some(group_id), Some(user_id)) =
                    (group_id_map.get(group_name), user_id_map.get(email))
                {
                    join_group(&pool, *group_id, *user_id).await?;
                }
            }

            for (email, question) in &self.reflections {
                if let Some(user_id) = user_id_map.get(email) {
                    reflection_ids.push(create_reflection(&pool, *user_id, question).await?);
                }
            }

            Ok(TestDb {
                pool,
                user_id_map,
                group_id_map,
                reflection_ids,
            })
        }
    }

    pub struct TestDb {
        pub pool: Pool<Sqlite>,
        pub user_id_map: HashMap<String, i64>,
        pub group_id_map: HashMap<String, i64>,
        pub reflection_ids: Vec<i64>,
    }

    impl TestDb {
        pub fn user_id(&self, email: &str) -> Option<i64> {
            self.user_id_map.get(email).copied()
        }

        pub fn group_id(&self, name: &str) -> Option<i64> {
            self.group_id_map.get(name).copied()
        }

        pub async fn count_rows(&self, table: &str) -> i64 {
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
                .fetch_one(&self.pool)
                .await
                .expect("Failed to count rows")
        }
    }

    /// Users of every role, two support groups with Maya in "Night Owls",
    /// and one reflection written by the expert.
    pub async fn create_standard_test_db() -> TestDb {
        TestDbBuilder::new()
            .member("maya@example.com", "Maya Member")
            .member("noah@example.com", "Noah Newcomer")
            .expert("eli@example.com", "Eli Expert")
            .admin("ada@example.com", "Ada Admin")
            .group("Night Owls", "sleep")
            .group("Steady Steps", "anxiety")
            .membership("Night Owls", "maya@example.com")
            .reflection("eli@example.com", "What made you smile today?")
            .build()
            .await
            .expect("Failed to build standard test database")
    }
}

#[cfg(test)]
pub mod test_client {
    use rocket::http::{ContentType, Cookie, Method, Status};
    use rocket::local::asynchronous::Client;
    use serde_json::{Value, json};

    use super::test_db::{STANDARD_PASSWORD, TestDb};
    use crate::auth::SESSION_COOKIE;
    use crate::env::AppConfig;
    use crate::init_rocket;

    pub async fn setup_test_client(test_db: TestDb) -> (Client, TestDb) {
        let rocket = init_rocket(test_db.pool.clone(), AppConfig::default());
        let client = Client::untracked(rocket)
            .await
            .expect("Failed to build Rocket client");

        (client, test_db)
    }

    /// Logs in with the standard password and returns the decrypted session
    /// cookie, ready to be re-attached with `private_cookie`.
    pub async fn login_test_user(client: &Client, email: &str) -> Cookie<'static> {
        let response = client
            .post("/api/auth/login")
            .header(ContentType::JSON)
            .body(json!({ "email": email, "password": STANDARD_PASSWORD }).to_string())
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Ok, "Login failed for {}", email);

        response
            .cookies()
            .get_private(SESSION_COOKIE)
            .expect("Login response should set a session cookie")
    }

    /// Sends a request and returns the status with the parsed envelope
    /// (`Value::Null` when the body is not JSON).
    pub async fn send(
        client: &Client,
        method: Method,
        uri: &str,
        session: Option<&Cookie<'static>>,
        body: Option<Value>,
    ) -> (Status, Value) {
        let mut request = client.req(method, uri);

        if let Some(cookie) = session {
            request = request.private_cookie(cookie.clone());
        }
        if let Some(body) = body {
            request = request.header(ContentType::JSON).body(body.to_string());
        }

        let response = request.dispatch().await;
        let status = response.status();
        let body = response.into_string().await.unwrap_or_default();

        (status, serde_json::from_str(&body).unwrap_or(Value::Null))
    }

    pub async fn get(client: &Client, uri: &str, session: &Cookie<'static>) -> (Status, Value) {
        send(client, Method::Get, uri, Some(session), None).await
    }

    pub async fn post(
        client: &Client,
        uri: &str,
        session: &Cookie<'static>,
        body: Value,
    ) -> (Status, Value) {
        send(client, Method::Post, uri, Some(session), Some(body)).await
    }

    pub async fn patch(
        client: &Client,
        uri: &str,
        session: &Cookie<'static>,
        body: Value,
    ) -> (Status, Value) {
        send(client, Method::Patch, uri, Some(session), Some(body)).await
    }
}
