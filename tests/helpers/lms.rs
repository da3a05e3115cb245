use async_trait::async_trait;
use campusgate::directory::{ObjectDirectory, TokenInspector, UserDirectory};
use campusgate::errors::GateError;
use std::collections::HashMap;

/// In-memory stand-in for the LMS user and object repositories.
pub struct InMemoryLms {
    users: HashMap<i64, String>,
    admins: Vec<i64>,
    references: HashMap<i64, i64>,
}

impl InMemoryLms {
    pub fn new() -> Self {
        let mut users = HashMap::new();
        users.insert(6, "root".to_string());
        users.insert(23, "jdoe".to_string());
        users.insert(42, "asmith".to_string());

        let mut references = HashMap::new();
        references.insert(301, 201);
        references.insert(302, 201);

        Self {
            users,
            admins: vec![6],
            references,
        }
    }
}

#[async_trait]
impl UserDirectory for InMemoryLms {
    async fn user_id(&self, login: &str) -> Result<i64, GateError> {
        self.users
            .iter()
            .find(|(_, name)| name.as_str() == login)
            .map(|(id, _)| *id)
            .ok_or_else(|| GateError::UnknownUser(format!("login `{login}`")))
    }

    async fn user_name(&self, user_id: i64) -> Result<String, GateError> {
        self.users
            .get(&user_id)
            .cloned()
            .ok_or_else(|| GateError::UnknownUser(format!("id {user_id}")))
    }

    async fn is_admin(&self, user_id: i64) -> Result<bool, GateError> {
        Ok(self.admins.contains(&user_id))
    }
}

#[async_trait]
impl ObjectDirectory for InMemoryLms {
    async fn object_id(&self, ref_id: i64) -> Result<i64, GateError> {
        self.references
            .get(&ref_id)
            .copied()
            .ok_or_else(|| GateError::UnknownObject(format!("ref_id {ref_id}")))
    }

    async fn reference_id(&self, obj_id: i64) -> Result<i64, GateError> {
        self.reference_ids(obj_id)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| GateError::UnknownObject(format!("obj_id {obj_id}")))
    }

    async fn reference_ids(&self, obj_id: i64) -> Result<Vec<i64>, GateError> {
        let mut refs: Vec<i64> = self
            .references
            .iter()
            .filter(|(_, obj)| **obj == obj_id)
            .map(|(r, _)| *r)
            .collect();
        refs.sort_unstable();
        Ok(refs)
    }
}

/// Token inspector for tokens of the shape `tenant:subject`.
pub struct SplitTokenInspector;

impl TokenInspector for SplitTokenInspector {
    fn tenant_of(&self, raw_token: &str) -> Option<String> {
        raw_token
            .split_once(':')
            .map(|(tenant, _)| tenant.to_string())
            .filter(|t| !t.is_empty())
    }
}
