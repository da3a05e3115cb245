//! Lookup services backed by the host LMS.
//!
//! The registry itself never talks to LMS tables; route handlers and the
//! authentication core resolve users, object references and token contents
//! through these traits. Production wires them to the LMS database, tests
//! substitute in-memory fakes.

use crate::errors::GateError;
use async_trait::async_trait;

/// User repository of the host LMS.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Resolve a login name to the LMS user id.
    /// Fails with `UnknownUser` when no such login exists.
    async fn user_id(&self, login: &str) -> Result<i64, GateError>;

    /// Resolve a user id to the login name.
    /// Fails with `UnknownUser` when no such user exists.
    async fn user_name(&self, user_id: i64) -> Result<String, GateError>;

    /// Whether the user holds the LMS administrator role.
    async fn is_admin(&self, user_id: i64) -> Result<bool, GateError>;
}

/// Object-reference resolver of the host LMS. LMS objects are addressed both
/// by object id and by reference id; one object can carry several references.
#[async_trait]
pub trait ObjectDirectory: Send + Sync {
    /// Object id behind a reference id. Fails with `UnknownObject`.
    async fn object_id(&self, ref_id: i64) -> Result<i64, GateError>;

    /// One reference id of an object. Fails with `UnknownObject`.
    async fn reference_id(&self, obj_id: i64) -> Result<i64, GateError>;

    /// All reference ids of an object; empty when the object has none.
    async fn reference_ids(&self, obj_id: i64) -> Result<Vec<i64>, GateError>;
}

/// Decodes serialized token material without a live store.
pub trait TokenInspector: Send + Sync {
    /// The LMS tenant embedded in the raw token, if any.
    fn tenant_of(&self, raw_token: &str) -> Option<String>;
}
