use campusgate::registry::{ClientRegistry, NewClient, PermissionEntry, PermissionPayload};
use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use tempfile::NamedTempFile;

/// Test database with automatic cleanup
pub struct TestDb {
    connection: DatabaseConnection,
    _temp_file: NamedTempFile,
}

impl TestDb {
    /// Create a new test database with migrations applied
    pub async fn new() -> Self {
        // Create temporary SQLite database file
        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        let db_path = temp_file.path().to_str().expect("Invalid temp file path");
        let db_url = format!("sqlite://{}?mode=rwc", db_path);

        // Connect to database
        let connection = Database::connect(&db_url)
            .await
            .expect("Failed to connect to test database");

        // Run migrations
        migration::Migrator::up(&connection, None)
            .await
            .expect("Failed to run migrations");

        Self {
            connection,
            _temp_file: temp_file,
        }
    }

    /// Get database connection
    pub fn connection(&self) -> &DatabaseConnection {
        &self.connection
    }

    /// Registry over this test database
    pub fn registry(&self) -> ClientRegistry {
        ClientRegistry::new(self.connection.clone())
    }
}

/// A fully configured client registration, the shape the admin panel submits
/// for a typical mobile-app key.
pub fn mobile_app_client(api_key: &str) -> NewClient {
    NewClient {
        api_key: Some(api_key.to_string()),
        api_secret: Some("app-secret".to_string()),
        description: "Campus mobile app".to_string(),
        oauth2_redirection_uri: "https://app.example.edu/callback".to_string(),
        consent_message: "The mobile app will access your courses and news.".to_string(),
        consent_message_active: true,
        permissions: PermissionPayload::Entries(vec![
            PermissionEntry {
                pattern: "/v1/courses".to_string(),
                verb: "GET".to_string(),
            },
            PermissionEntry {
                pattern: "/v1/news".to_string(),
                verb: "GET".to_string(),
            },
        ]),
        gt_authcode: true,
        gt_implicit: true,
        authcode_refresh_active: true,
        ..Default::default()
    }
}
