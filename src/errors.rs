use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum GateError {
    #[error("I/O error: {0}")]
    #[diagnostic(code(campusgate::io))]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    #[diagnostic(code(campusgate::config))]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(campusgate::serde))]
    Serde(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    #[diagnostic(code(campusgate::db))]
    Db(#[from] sea_orm::DbErr),

    #[error("No client matching {0} found")]
    #[diagnostic(code(campusgate::unknown_client))]
    UnknownClient(String),

    #[error("Update on client {id} failed: {reason}")]
    #[diagnostic(code(campusgate::update_failed))]
    UpdateFailed { id: i64, reason: String },

    #[error("No client with id {0} found, nothing deleted")]
    #[diagnostic(code(campusgate::delete_failed))]
    DeleteFailed(i64),

    #[error("Malformed permission payload: {0}")]
    #[diagnostic(code(campusgate::malformed_permissions))]
    MalformedPermissionPayload(String),

    #[error("No user matching {0} found")]
    #[diagnostic(code(campusgate::unknown_user))]
    UnknownUser(String),

    #[error("No object matching {0} found")]
    #[diagnostic(code(campusgate::unknown_object))]
    UnknownObject(String),

    #[error("Bad request: {0}")]
    #[diagnostic(code(campusgate::bad_request))]
    BadRequest(String),

    #[error("{0}")]
    #[diagnostic(code(campusgate::other))]
    Other(String),
}
