#[cfg(test)]
pub mod test_db {
    use crate::auth::PasswordHasher;
    use crate::db::{close_room, create_question, create_room, create_subject, create_teacher};
    use crate::error::AppError;
    use crate::models::Room;
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::{Pool, Sqlite};
    use std::collections::HashMap;
    use std::sync::Once;
    use tracing_subscriber::EnvFilter;

    static INIT: Once = Once::new();
    pub static STANDARD_PASSWORD: &str = "password123";
    pub const TEST_BCRYPT_COST: u32 = 4;

    #[derive(Default)]
    pub struct TestDbBuilder {
        teachers: Vec<TestTeacher>,
        subjects: Vec<String>,
        rooms: Vec<TestRoom>,
        questions: Vec<TestQuestion>,
    }

    pub struct TestTeacher {
        pub name: String,
        pub email: String,
        pub password: String,
    }

    pub struct TestRoom {
        pub title: String,
        pub owner_email: String,
        pub subject: Option<String>,
        pub open: bool,
    }

    pub struct TestQuestion {
        pub room_title: String,
        pub title: String,
    }

    impl TestDbBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn teacher(self, name: &str, email: &str) -> Self {
            self.teacher_with_password(name, email, STANDARD_PASSWORD)
        }

        pub fn teacher_with_password(mut self, name: &str, email: &str, password: &str) -> Self {
            self.teachers.push(TestTeacher {
                name: name.to_string(),
                email: email.to_string(),
                password: password.to_string(),
            });
            self
        }

        pub fn subject(mut self, name: &str) -> Self {
            self.subjects.push(name.to_string());
            self
        }

        pub fn room(mut self, title: &str, owner_email: &str, subject: Option<&str>) -> Self {
            self.rooms.push(TestRoom {
                title: title.to_string(),
                owner_email: owner_email.to_string(),
                subject: subject.map(String::from),
                open: true,
            });
            self
        }

        pub fn closed_room(mut self, title: &str, owner_email: &str) -> Self {
            self.rooms.push(TestRoom {
                title: title.to_string(),
                owner_email: owner_email.to_string(),
                subject: None,
                open: false,
            });
            self
        }

        pub fn question(mut self, room_title: &str, title: &str) -> Self {
            self.questions.push(TestQuestion {
                room_title: room_title.to_string(),
                title: title.to_string(),
            });
            self
        }

        pub async fn build(self) -> Result<TestDb, AppError> {
            INIT.call_once(|| {
                let _ = tracing_subscriber::fmt()
                    .with_env_filter(EnvFilter::new("debug"))
                    .with_test_writer()
                    .try_init();
            });

            // A single connection that never expires keeps the in-memory database alive.
            let pool = SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect("sqlite::memory:")
                .await?;

            sqlx::migrate!("./migrations").run(&pool).await?;

            let hasher = PasswordHasher::new(TEST_BCRYPT_COST);

            let mut teacher_id_map: HashMap<String, i64> = HashMap::new();
            let mut subject_id_map: HashMap<String, i64> = HashMap::new();
            let mut room_map: HashMap<String, Room> = HashMap::new();
            let mut question_id_map: HashMap<String, i64> = HashMap::new();

            for teacher in &self.teachers {
                let created =
                    create_teacher(&pool, &hasher, &teacher.name, &teacher.email, &teacher.password)
                        .await?;
                teacher_id_map.insert(teacher.email.clone(), created.id);
            }

            for name in &self.subjects {
                let subject = create_subject(&pool, name).await?;
                subject_id_map.insert(name.clone(), subject.id);
            }

            for room in &self.rooms {
                let owner_id = teacher_id_map.get(&room.owner_email).copied().ok_or_else(|| {
                    AppError::NotFound(format!("No test teacher {}", room.owner_email))
                })?;
                let subject_id = room
                    .subject
                    .as_ref()
                    .and_then(|name| subject_id_map.get(name).copied());

                let created = create_room(&pool, owner_id, &room.title, subject_id).await?;
                room_map.insert(room.title.clone(), created);
            }

            // Questions go in before closing so closed rooms can still hold some.
            for question in &self.questions {
                let room = room_map.get(&question.room_title).ok_or_else(|| {
                    AppError::NotFound(format!("No test room {}", question.room_title))
                })?;

                let created = create_question(&pool, room.id, &question.title, None, None).await?;
                question_id_map.insert(question.title.clone(), created.id);
            }

            for room in self.rooms.iter().filter(|r| !r.open) {
                let owner_id = teacher_id_map[&room.owner_email];
                let room_id = room_map[&room.title].id;
                let closed = close_room(&pool, room_id, owner_id).await?;
                room_map.insert(room.title.clone(), closed);
            }

            Ok(TestDb {
                pool,
                hasher,
                teacher_id_map,
                subject_id_map,
                room_map,
                question_id_map,
            })
        }
    }

    pub struct TestDb {
        pub pool: Pool<Sqlite>,
        pub hasher: PasswordHasher,
        pub teacher_id_map: HashMap<String, i64>,
        pub subject_id_map: HashMap<String, i64>,
        pub room_map: HashMap<String, Room>,
        pub question_id_map: HashMap<String, i64>,
    }

    impl TestDb {
        pub fn teacher_id(&self, email: &str) -> Option<i64> {
            self.teacher_id_map.get(email).copied()
        }

        pub fn subject_id(&self, name: &str) -> Option<i64> {
            self.subject_id_map.get(name).copied()
        }

        pub fn room(&self, title: &str) -> Option<&Room> {
            self.room_map.get(title)
        }

        pub fn room_id(&self, title: &str) -> Option<i64> {
            self.room(title).map(|room| room.id)
        }

        pub fn question_id(&self, title: &str) -> Option<i64> {
            self.question_id_map.get(title).copied()
        }
    }

    /// Two teachers, one subject, an open and a closed room for Ada, an open room for Alan.
    pub async fn create_standard_test_db() -> TestDb {
        TestDbBuilder::new()
            .teacher("Ada Lovelace", "ada@example.com")
            .teacher("Alan Turing", "alan@example.com")
            .subject("Mathematics")
            .room("Algebra", "ada@example.com", Some("Mathematics"))
            .closed_room("Geometry", "ada@example.com")
            .room("Computing", "alan@example.com", None)
            .question("Algebra", "What is x?")
            .question("Geometry", "Why are angles?")
            .build()
            .await
            .expect("Failed to build standard test database")
    }
}

#[cfg(test)]
pub mod test_utils {
    use crate::api::auth::LoginResponse;
    use crate::env::{AdminLogin, Settings};
    use crate::init_rocket;
    use rocket::http::{ContentType, Header, Status};
    use rocket::local::asynchronous::{Client, LocalResponse};
    use serde_json::{Value, json};

    pub use super::test_db::{TestDb, TestDbBuilder, create_standard_test_db};

    pub const TEST_ADMIN_SECRET: &str = "test-admin-secret";
    pub const TEST_ADMIN_EMAIL: &str = "admin@example.com";
    pub const TEST_ADMIN_PASSWORD: &str = "admin123";

    pub fn test_settings() -> Settings {
        Settings {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 1,
            admin_secret: TEST_ADMIN_SECRET.to_string(),
            admin_login: Some(AdminLogin {
                email: TEST_ADMIN_EMAIL.to_string(),
                password: TEST_ADMIN_PASSWORD.to_string(),
            }),
            bcrypt_cost: super::test_db::TEST_BCRYPT_COST,
        }
    }

    pub async fn setup_test_client(test_db: TestDb) -> (Client, TestDb) {
        let rocket = init_rocket(test_db.pool.clone(), &test_settings());
        let client = Client::tracked(rocket)
            .await
            .expect("valid rocket instance");

        (client, test_db)
    }

    pub async fn login_test_teacher(client: &Client, email: &str, password: &str) -> String {
        let response = client
            .post("/auth/teachers/login")
            .header(ContentType::JSON)
            .body(json!({ "email": email, "password": password }).to_string())
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Ok);

        let body = response.into_string().await.expect("Response has no body");
        let login: LoginResponse =
            serde_json::from_str(&body).expect("Login did not succeed");

        login.token
    }

    pub fn bearer(token: &str) -> Header<'static> {
        Header::new("Authorization", format!("Bearer {}", token))
    }

    pub fn admin_secret() -> Header<'static> {
        Header::new("x-admin-secret", TEST_ADMIN_SECRET)
    }

    pub async fn json_body(response: LocalResponse<'_>) -> Value {
        let body = response.into_string().await.expect("Response has no body");
        serde_json::from_str(&body).expect("Response body is not JSON")
    }
}
