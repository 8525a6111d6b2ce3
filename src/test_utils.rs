#[cfg(test)]
pub mod test_utils {
    use std::sync::OnceLock;
    use std::time::Duration;

    use crate::auth::hash_password;
    use crate::router::create_router;
    use crate::schemas::AppState;
    use crate::session::SessionStore;
    use axum::http::{header, HeaderValue, StatusCode};
    use axum_test::{TestResponse, TestServer};
    use chrono::Utc;
    use migration::{Migrator, MigratorTrait};
    use model::entities::{car, driver, manufacturer};
    use sea_orm::{ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, Set};
    use serde::Serialize;
    use tracing::Level;
    use tracing_subscriber::FmtSubscriber;

    pub const TEST_USERNAME: &str = "test";
    pub const TEST_PASSWORD: &str = "test123-password";
    pub const TEST_LICENSE: &str = "ABC12345";

    /// Create an in-memory SQLite database for testing
    pub async fn setup_test_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to connect to in-memory database");

        db.execute_unprepared("PRAGMA foreign_keys = ON;")
            .await
            .expect("Failed to enable foreign keys");

        // Run migrations
        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        db
    }

    /// Create AppState for testing
    pub async fn setup_test_app_state() -> AppState {
        let db = setup_test_db().await;
        let sessions = SessionStore::new(Duration::from_secs(3600), 100);

        AppState { db, sessions }
    }

    /// Initialize tracing for tests with output to STDERR.
    ///
    /// The log level is determined by the RUST_LOG environment variable,
    /// defaulting to WARN if not set.
    pub fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
        let log_level = std::env::var("RUST_LOG")
            .ok()
            .and_then(|level| match level.to_uppercase().as_str() {
                "ERROR" => Some(Level::ERROR),
                "WARN" => Some(Level::WARN),
                "INFO" => Some(Level::INFO),
                "DEBUG" => Some(Level::DEBUG),
                "TRACE" => Some(Level::TRACE),
                _ => None,
            })
            .unwrap_or(Level::WARN);

        let subscriber = FmtSubscriber::builder()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    /// Hash of [`TEST_PASSWORD`], computed once per test binary.
    fn test_password_hash() -> String {
        static HASH: OnceLock<String> = OnceLock::new();
        HASH.get_or_init(|| hash_password(TEST_PASSWORD).expect("Failed to hash test password"))
            .clone()
    }

    /// Insert an active driver whose password is [`TEST_PASSWORD`].
    pub async fn create_test_driver(
        db: &DatabaseConnection,
        username: &str,
        license_number: &str,
    ) -> driver::Model {
        driver::ActiveModel {
            username: Set(username.to_string()),
            password: Set(test_password_hash()),
            first_name: Set("Test".to_string()),
            last_name: Set("Driver".to_string()),
            email: Set(format!("{username}@example.com")),
            is_active: Set(true),
            is_staff: Set(false),
            is_superuser: Set(false),
            date_joined: Set(Utc::now().naive_utc()),
            last_login: Set(None),
            license_number: Set(license_number.to_string()),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to create test driver")
    }

    pub async fn create_test_manufacturer(
        db: &DatabaseConnection,
        name: &str,
        country: &str,
    ) -> manufacturer::Model {
        manufacturer::ActiveModel {
            name: Set(name.to_string()),
            country: Set(country.to_string()),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to create test manufacturer")
    }

    pub async fn create_test_car(
        db: &DatabaseConnection,
        model: &str,
        manufacturer_id: i32,
    ) -> car::Model {
        car::ActiveModel {
            model: Set(model.to_string()),
            manufacturer_id: Set(manufacturer_id),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to create test car")
    }

    /// `Location` header of a redirect response.
    pub fn location(response: &TestResponse) -> String {
        response
            .headers()
            .get(header::LOCATION)
            .expect("Response has no Location header")
            .to_str()
            .expect("Location header is not valid UTF-8")
            .to_string()
    }

    /// Log in through the login form and return the `Cookie` header value
    /// carrying the new session.
    pub async fn login(server: &TestServer, username: &str, password: &str) -> HeaderValue {
        let response = server
            .post("/accounts/login/")
            .form(&[("username", username), ("password", password)])
            .await;
        response.assert_status(StatusCode::FOUND);

        let pair = response
            .headers()
            .get(header::SET_COOKIE)
            .expect("Login did not set a session cookie")
            .to_str()
            .expect("Set-Cookie header is not valid UTF-8")
            .split(';')
            .next()
            .expect("Set-Cookie header is empty")
            .to_string();
        HeaderValue::from_str(&pair).expect("Invalid cookie value")
    }

    /// A running test server with one logged-in driver.
    pub struct TestContext {
        pub server: TestServer,
        pub state: AppState,
        pub driver: driver::Model,
        pub cookie: HeaderValue,
        _tracing: tracing::subscriber::DefaultGuard,
    }

    impl TestContext {
        pub async fn new() -> Self {
            let tracing = init_test_tracing();

            let state = setup_test_app_state().await;
            let driver = create_test_driver(&state.db, TEST_USERNAME, TEST_LICENSE).await;
            let server = TestServer::new(create_router(state.clone())).unwrap();
            let cookie = login(&server, TEST_USERNAME, TEST_PASSWORD).await;

            Self {
                server,
                state,
                driver,
                cookie,
                _tracing: tracing,
            }
        }

        pub fn db(&self) -> &DatabaseConnection {
            &self.state.db
        }

        pub async fn get(&self, path: &str) -> TestResponse {
            self.server
                .get(path)
                .add_header(header::COOKIE, self.cookie.clone())
                .await
        }

        /// POST with an empty body, as the delete and logout buttons do.
        pub async fn post(&self, path: &str) -> TestResponse {
            self.server
                .post(path)
                .add_header(header::COOKIE, self.cookie.clone())
                .await
        }

        pub async fn post_form<F>(&self, path: &str, form: &F) -> TestResponse
        where
            F: Serialize + ?Sized,
        {
            self.server
                .post(path)
                .add_header(header::COOKIE, self.cookie.clone())
                .form(form)
                .await
        }
    }

    /// Test server with an empty database and nobody logged in.
    pub async fn setup_test_server() -> (TestServer, AppState) {
        let state = setup_test_app_state().await;
        let server = TestServer::new(create_router(state.clone())).unwrap();
        (server, state)
    }
}
