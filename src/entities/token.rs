use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Issued-token records. Written by the authentication core; the registry
/// only deletes them when the owning client is removed.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tokens")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub client_id: i64,
    pub user_id: i64,
    pub token: String,
    pub kind: String,
    pub created_at: i64,
    pub expires_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
