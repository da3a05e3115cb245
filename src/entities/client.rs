use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "clients")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub api_key: String,
    pub api_secret: String,
    pub description: String,
    pub oauth2_redirection_uri: String,
    pub gt_client_credentials: i64,
    pub gt_authcode: i64,
    pub gt_implicit: i64,
    pub gt_resourceowner: i64,
    pub gt_client_credentials_user: Option<i64>,
    pub user_restriction_active: i64,
    pub ip_restriction_active: i64,
    pub consent_message_active: i64,
    pub consent_message: String,
    pub authcode_refresh_active: i64,
    pub resourceowner_refresh_active: i64,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
