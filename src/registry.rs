use crate::entities;
use crate::errors::GateError;
use base64ct::Encoding;
use chrono::Utc;
use rand::RngCore;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// A registered API client, as handed to callers.
///
/// Flags are stored as 0/1 integers (see the entity model) and exposed as
/// booleans here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: i64,
    pub api_key: String,
    pub api_secret: String,
    pub description: String,
    pub oauth2_redirection_uri: String,
    pub gt_client_credentials: bool,
    pub gt_authcode: bool,
    pub gt_implicit: bool,
    pub gt_resourceowner: bool,
    pub gt_client_credentials_user: Option<i64>,
    pub user_restriction_active: bool,
    pub ip_restriction_active: bool,
    pub consent_message_active: bool,
    pub consent_message: String,
    pub authcode_refresh_active: bool,
    pub resourceowner_refresh_active: bool,
    pub created_at: i64,
}

impl From<entities::client::Model> for Client {
    fn from(model: entities::client::Model) -> Self {
        Client {
            id: model.id,
            api_key: model.api_key,
            api_secret: model.api_secret,
            description: model.description,
            oauth2_redirection_uri: model.oauth2_redirection_uri,
            gt_client_credentials: model.gt_client_credentials != 0,
            gt_authcode: model.gt_authcode != 0,
            gt_implicit: model.gt_implicit != 0,
            gt_resourceowner: model.gt_resourceowner != 0,
            gt_client_credentials_user: model.gt_client_credentials_user,
            user_restriction_active: model.user_restriction_active != 0,
            ip_restriction_active: model.ip_restriction_active != 0,
            consent_message_active: model.consent_message_active != 0,
            consent_message: model.consent_message,
            authcode_refresh_active: model.authcode_refresh_active != 0,
            resourceowner_refresh_active: model.resourceowner_refresh_active != 0,
            created_at: model.created_at,
        }
    }
}

/// A route permission: this client may call `verb` on routes matching
/// `pattern`. Patterns are stored with trailing slashes stripped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: i64,
    pub client_id: i64,
    pub pattern: String,
    pub verb: String,
}

impl From<entities::permission::Model> for Permission {
    fn from(model: entities::permission::Model) -> Self {
        Permission {
            id: model.id,
            client_id: model.client_id,
            pattern: model.pattern,
            verb: model.verb,
        }
    }
}

/// One entry of a permission payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionEntry {
    pub pattern: String,
    pub verb: String,
}

/// Permission input, either already structured or as JSON text
/// (`[{"pattern": "/v1/courses", "verb": "GET"}, ...]`) as older admin
/// tooling submits it.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PermissionPayload {
    Entries(Vec<PermissionEntry>),
    Json(String),
}

impl Default for PermissionPayload {
    fn default() -> Self {
        PermissionPayload::Entries(Vec::new())
    }
}

impl PermissionPayload {
    /// Decode into a list of entries. Blank JSON text means "no permissions";
    /// any other text that does not decode to pattern/verb pairs is rejected.
    pub fn into_entries(self) -> Result<Vec<PermissionEntry>, GateError> {
        match self {
            PermissionPayload::Entries(entries) => Ok(entries),
            PermissionPayload::Json(text) => {
                let text = text.trim_start_matches('\u{feff}').trim();
                if text.is_empty() {
                    return Ok(Vec::new());
                }
                serde_json::from_str(text)
                    .map_err(|e| GateError::MalformedPermissionPayload(e.to_string()))
            }
        }
    }
}

/// Fields accepted when registering a client. `api_key`/`api_secret` are
/// generated when not supplied.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewClient {
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub description: String,
    pub oauth2_redirection_uri: String,
    pub consent_message: String,
    pub consent_message_active: bool,
    pub permissions: PermissionPayload,
    pub gt_client_credentials: bool,
    pub gt_authcode: bool,
    pub gt_implicit: bool,
    pub gt_resourceowner: bool,
    pub gt_client_credentials_user: Option<i64>,
    pub user_restriction_active: bool,
    pub access_user_csv: Option<String>,
    pub ip_restriction_active: bool,
    pub access_ip_csv: Option<String>,
    pub authcode_refresh_active: bool,
    pub resourceowner_refresh_active: bool,
}

/// A client entry of the administrative listing, with its dependent
/// collections joined in.
#[derive(Debug, Clone, Serialize)]
pub struct ClientListing {
    #[serde(flatten)]
    pub client: Client,
    pub permissions: Vec<Permission>,
    pub access_user_csv: String,
    pub access_ip_csv: String,
}

/// The four OAuth2 grant types a client can have enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantType {
    ClientCredentials,
    AuthorizationCode,
    Implicit,
    ResourceOwner,
}

/// Outcome of adding a single route permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionGrant {
    Added(i64),
    /// The client already holds an identical (pattern, verb) permission.
    Duplicate,
}

/// Who may authenticate against a client via the user-bound grant types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum AllowedUsers {
    Unrestricted,
    Restricted(Vec<i64>),
}

/// Client attributes reachable through `update_field`. Field names are
/// resolved against this closed list before any query is built; `id` and
/// `api_key` are immutable and deliberately absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClientField {
    ApiSecret,
    Description,
    RedirectionUri,
    ConsentMessage,
    ConsentMessageActive,
    GtClientCredentials,
    GtAuthcode,
    GtImplicit,
    GtResourceowner,
    GtClientCredentialsUser,
    UserRestrictionActive,
    IpRestrictionActive,
    AuthcodeRefreshActive,
    ResourceownerRefreshActive,
}

enum FieldKind {
    Text,
    Flag,
    UserRef,
}

impl ClientField {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "api_secret" => Some(Self::ApiSecret),
            "description" => Some(Self::Description),
            "oauth2_redirection_uri" => Some(Self::RedirectionUri),
            "consent_message" => Some(Self::ConsentMessage),
            "consent_message_active" => Some(Self::ConsentMessageActive),
            "gt_client_credentials" => Some(Self::GtClientCredentials),
            "gt_authcode" => Some(Self::GtAuthcode),
            "gt_implicit" => Some(Self::GtImplicit),
            "gt_resourceowner" => Some(Self::GtResourceowner),
            "gt_client_credentials_user" => Some(Self::GtClientCredentialsUser),
            "user_restriction_active" => Some(Self::UserRestrictionActive),
            "ip_restriction_active" => Some(Self::IpRestrictionActive),
            "authcode_refresh_active" => Some(Self::AuthcodeRefreshActive),
            "resourceowner_refresh_active" => Some(Self::ResourceownerRefreshActive),
            _ => None,
        }
    }

    fn column(self) -> entities::client::Column {
        use entities::client::Column;
        match self {
            Self::ApiSecret => Column::ApiSecret,
            Self::Description => Column::Description,
            Self::RedirectionUri => Column::Oauth2RedirectionUri,
            Self::ConsentMessage => Column::ConsentMessage,
            Self::ConsentMessageActive => Column::ConsentMessageActive,
            Self::GtClientCredentials => Column::GtClientCredentials,
            Self::GtAuthcode => Column::GtAuthcode,
            Self::GtImplicit => Column::GtImplicit,
            Self::GtResourceowner => Column::GtResourceowner,
            Self::GtClientCredentialsUser => Column::GtClientCredentialsUser,
            Self::UserRestrictionActive => Column::UserRestrictionActive,
            Self::IpRestrictionActive => Column::IpRestrictionActive,
            Self::AuthcodeRefreshActive => Column::AuthcodeRefreshActive,
            Self::ResourceownerRefreshActive => Column::ResourceownerRefreshActive,
        }
    }

    fn kind(self) -> FieldKind {
        match self {
            Self::ApiSecret | Self::Description | Self::RedirectionUri | Self::ConsentMessage => {
                FieldKind::Text
            }
            Self::GtClientCredentialsUser => FieldKind::UserRef,
            _ => FieldKind::Flag,
        }
    }
}

/// Registry of API clients and their route permissions, user and IP
/// allow-lists. All multi-row writes run inside a single transaction.
#[derive(Clone)]
pub struct ClientRegistry {
    db: DatabaseConnection,
}

impl ClientRegistry {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// All registered clients ordered by ascending id, each with its
    /// permission list and comma-joined allow-lists.
    pub async fn list_clients(&self) -> Result<Vec<ClientListing>, GateError> {
        let rows = entities::client::Entity::find()
            .order_by_asc(entities::client::Column::Id)
            .all(&self.db)
            .await?;

        let mut listings = Vec::with_capacity(rows.len());
        for row in rows {
            let permissions = self.permissions_of(row.id).await?;

            let users: Vec<String> = entities::allowed_user::Entity::find()
                .filter(entities::allowed_user::Column::ClientId.eq(row.id))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|r| r.user_id.to_string())
                .collect();

            let ips: Vec<String> = entities::allowed_ip::Entity::find()
                .filter(entities::allowed_ip::Column::ClientId.eq(row.id))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|r| r.ip)
                .collect();

            listings.push(ClientListing {
                client: row.into(),
                permissions,
                access_user_csv: users.join(","),
                access_ip_csv: ips.join(","),
            });
        }

        Ok(listings)
    }

    /// Register a new client and seed its permission set and allow-lists.
    /// Returns the generated id. Runs as one transaction; a failing step
    /// leaves nothing behind.
    pub async fn create_client(&self, input: NewClient) -> Result<i64, GateError> {
        let entries = input.permissions.into_entries()?;
        let users = parse_user_csv(input.access_user_csv.as_deref().unwrap_or(""))?;
        let ips = parse_ip_csv(input.access_ip_csv.as_deref().unwrap_or(""));

        let model = entities::client::ActiveModel {
            id: Default::default(),
            api_key: Set(input.api_key.unwrap_or_else(random_key)),
            api_secret: Set(input.api_secret.unwrap_or_else(random_key)),
            description: Set(input.description),
            oauth2_redirection_uri: Set(input.oauth2_redirection_uri),
            gt_client_credentials: Set(input.gt_client_credentials as i64),
            gt_authcode: Set(input.gt_authcode as i64),
            gt_implicit: Set(input.gt_implicit as i64),
            gt_resourceowner: Set(input.gt_resourceowner as i64),
            gt_client_credentials_user: Set(input.gt_client_credentials_user),
            user_restriction_active: Set(input.user_restriction_active as i64),
            ip_restriction_active: Set(input.ip_restriction_active as i64),
            consent_message_active: Set(input.consent_message_active as i64),
            consent_message: Set(input.consent_message),
            authcode_refresh_active: Set(input.authcode_refresh_active as i64),
            resourceowner_refresh_active: Set(input.resourceowner_refresh_active as i64),
            created_at: Set(Utc::now().timestamp()),
        };

        let id = self
            .db
            .transaction::<_, i64, GateError>(move |txn| {
                Box::pin(async move {
                    let inserted = model.insert(txn).await?;
                    replace_permissions(txn, inserted.id, &entries).await?;
                    replace_allowed_users(txn, inserted.id, &users).await?;
                    replace_allowed_ips(txn, inserted.id, &ips).await?;
                    Ok(inserted.id)
                })
            })
            .await
            .map_err(flatten_txn)?;

        tracing::info!(client_id = id, "registered api client");
        Ok(id)
    }

    /// Replace the full permission set of a client.
    pub async fn update_permissions(
        &self,
        client_id: i64,
        payload: PermissionPayload,
    ) -> Result<(), GateError> {
        let entries = payload.into_entries()?;
        let count = entries.len();
        self.db
            .transaction::<_, (), GateError>(move |txn| {
                Box::pin(async move { replace_permissions(txn, client_id, &entries).await })
            })
            .await
            .map_err(flatten_txn)?;
        tracing::debug!(client_id, count, "replaced route permissions");
        Ok(())
    }

    /// Replace the allowed-user set from a comma-separated id list. An empty
    /// string clears the set; the restriction flag is left untouched.
    pub async fn update_allowed_users(&self, client_id: i64, csv: &str) -> Result<(), GateError> {
        let users = parse_user_csv(csv)?;
        self.db
            .transaction::<_, (), GateError>(move |txn| {
                Box::pin(async move { replace_allowed_users(txn, client_id, &users).await })
            })
            .await
            .map_err(flatten_txn)?;
        tracing::debug!(client_id, "replaced allowed-user set");
        Ok(())
    }

    /// Replace the allowed-IP set from a comma-separated address list.
    /// Entries are trimmed; an empty string clears the set.
    pub async fn update_allowed_ips(&self, client_id: i64, csv: &str) -> Result<(), GateError> {
        let ips = parse_ip_csv(csv);
        self.db
            .transaction::<_, (), GateError>(move |txn| {
                Box::pin(async move { replace_allowed_ips(txn, client_id, &ips).await })
            })
            .await
            .map_err(flatten_txn)?;
        tracing::debug!(client_id, "replaced allowed-ip set");
        Ok(())
    }

    /// Add a single route permission for the client owning `api_key`.
    /// Reports `Duplicate` when an identical (pattern, verb) row exists.
    pub async fn add_permission(
        &self,
        api_key: &str,
        pattern: &str,
        verb: &str,
    ) -> Result<PermissionGrant, GateError> {
        let client_id = self.resolve_client_id(api_key).await?;
        let pattern = pattern.trim_end_matches('/');

        let existing = entities::permission::Entity::find()
            .filter(entities::permission::Column::ClientId.eq(client_id))
            .filter(entities::permission::Column::Pattern.eq(pattern))
            .filter(entities::permission::Column::Verb.eq(verb))
            .one(&self.db)
            .await?;
        if existing.is_some() {
            return Ok(PermissionGrant::Duplicate);
        }

        let inserted = entities::permission::ActiveModel {
            id: Default::default(),
            client_id: Set(client_id),
            pattern: Set(pattern.to_string()),
            verb: Set(verb.to_string()),
        }
        .insert(&self.db)
        .await?;

        tracing::debug!(client_id, permission_id = inserted.id, "added permission");
        Ok(PermissionGrant::Added(inserted.id))
    }

    /// Remove a permission by id. Returns the number of rows removed (0 or
    /// 1); removing a missing permission is not an error.
    pub async fn delete_permission(&self, permission_id: i64) -> Result<u64, GateError> {
        let result = entities::permission::Entity::delete_many()
            .filter(entities::permission::Column::Id.eq(permission_id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    /// Look up a permission by id. Callers must handle the `None` case.
    pub async fn get_permission(&self, permission_id: i64) -> Result<Option<Permission>, GateError> {
        let row = entities::permission::Entity::find_by_id(permission_id)
            .one(&self.db)
            .await?;
        Ok(row.map(Permission::from))
    }

    /// All permissions of the client owning `api_key`.
    pub async fn list_permissions(&self, api_key: &str) -> Result<Vec<Permission>, GateError> {
        let client_id = self.resolve_client_id(api_key).await?;
        self.permissions_of(client_id).await
    }

    /// Update a single client attribute. The names `permissions`,
    /// `access_user_csv` and `access_ip_csv` are redirected to the dedicated
    /// replace operations; everything else must resolve through the
    /// `ClientField` allow-list.
    pub async fn update_field(
        &self,
        client_id: i64,
        field_name: &str,
        value: &Value,
    ) -> Result<(), GateError> {
        match field_name.to_ascii_lowercase().as_str() {
            "permissions" => {
                let payload = permission_payload_from_value(value)?;
                return self.update_permissions(client_id, payload).await;
            }
            "access_user_csv" => {
                let csv = csv_value(value).ok_or_else(|| {
                    GateError::BadRequest("access_user_csv expects a string".to_string())
                })?;
                return self.update_allowed_users(client_id, &csv).await;
            }
            "access_ip_csv" => {
                let csv = csv_value(value).ok_or_else(|| {
                    GateError::BadRequest("access_ip_csv expects a string".to_string())
                })?;
                return self.update_allowed_ips(client_id, &csv).await;
            }
            name => {
                let field = ClientField::parse(name).ok_or_else(|| GateError::UpdateFailed {
                    id: client_id,
                    reason: format!("field `{field_name}` is not updatable"),
                })?;

                let expr = match field.kind() {
                    FieldKind::Text => text_value(value).map(Expr::value),
                    FieldKind::Flag => flag_value(value).map(Expr::value),
                    FieldKind::UserRef => user_ref_value(value).map(Expr::value),
                }
                .ok_or_else(|| {
                    GateError::BadRequest(format!("unusable value for field `{field_name}`"))
                })?;

                let result = entities::client::Entity::update_many()
                    .col_expr(field.column(), expr)
                    .filter(entities::client::Column::Id.eq(client_id))
                    .exec(&self.db)
                    .await?;

                if result.rows_affected == 0 {
                    return Err(GateError::UpdateFailed {
                        id: client_id,
                        reason: "no such client".to_string(),
                    });
                }
                tracing::debug!(client_id, field = field_name, "updated client field");
                Ok(())
            }
        }
    }

    /// Delete a client and everything hanging off it: permissions, both
    /// allow-lists, and issued-token records. Existence is checked first so
    /// a failed delete never removes dependent rows.
    pub async fn delete_client(&self, client_id: i64) -> Result<(), GateError> {
        let existing = entities::client::Entity::find_by_id(client_id)
            .one(&self.db)
            .await?;
        if existing.is_none() {
            return Err(GateError::DeleteFailed(client_id));
        }

        self.db
            .transaction::<_, (), GateError>(move |txn| {
                Box::pin(async move {
                    entities::client::Entity::delete_by_id(client_id)
                        .exec(txn)
                        .await?;
                    entities::permission::Entity::delete_many()
                        .filter(entities::permission::Column::ClientId.eq(client_id))
                        .exec(txn)
                        .await?;
                    entities::allowed_user::Entity::delete_many()
                        .filter(entities::allowed_user::Column::ClientId.eq(client_id))
                        .exec(txn)
                        .await?;
                    entities::allowed_ip::Entity::delete_many()
                        .filter(entities::allowed_ip::Column::ClientId.eq(client_id))
                        .exec(txn)
                        .await?;
                    entities::token::Entity::delete_many()
                        .filter(entities::token::Column::ClientId.eq(client_id))
                        .exec(txn)
                        .await?;
                    Ok(())
                })
            })
            .await
            .map_err(flatten_txn)?;

        tracing::info!(client_id, "deleted api client and dependent rows");
        Ok(())
    }

    /// Resolve an api_key to the surrogate client id.
    pub async fn resolve_client_id(&self, api_key: &str) -> Result<i64, GateError> {
        let row = self.find_by_api_key(api_key).await?;
        row.map(|c| c.id)
            .ok_or_else(|| GateError::UnknownClient(format!("api-key `{api_key}`")))
    }

    /// Resolve a client id back to its api_key.
    pub async fn resolve_api_key(&self, client_id: i64) -> Result<String, GateError> {
        let row = entities::client::Entity::find_by_id(client_id)
            .one(&self.db)
            .await?;
        row.map(|c| c.api_key)
            .ok_or_else(|| GateError::UnknownClient(format!("id {client_id}")))
    }

    /// Whether a grant type is enabled for the client owning `api_key`.
    /// An unknown key simply has every grant type off.
    pub async fn is_grant_type_enabled(
        &self,
        api_key: &str,
        grant: GrantType,
    ) -> Result<bool, GateError> {
        let Some(client) = self.find_by_api_key(api_key).await? else {
            return Ok(false);
        };
        let flag = match grant {
            GrantType::ClientCredentials => client.gt_client_credentials,
            GrantType::AuthorizationCode => client.gt_authcode,
            GrantType::Implicit => client.gt_implicit,
            GrantType::ResourceOwner => client.gt_resourceowner,
        };
        Ok(flag == 1)
    }

    pub async fn is_client_credentials_enabled(&self, api_key: &str) -> Result<bool, GateError> {
        self.is_grant_type_enabled(api_key, GrantType::ClientCredentials)
            .await
    }

    pub async fn is_auth_code_enabled(&self, api_key: &str) -> Result<bool, GateError> {
        self.is_grant_type_enabled(api_key, GrantType::AuthorizationCode)
            .await
    }

    pub async fn is_implicit_enabled(&self, api_key: &str) -> Result<bool, GateError> {
        self.is_grant_type_enabled(api_key, GrantType::Implicit).await
    }

    pub async fn is_resource_owner_enabled(&self, api_key: &str) -> Result<bool, GateError> {
        self.is_grant_type_enabled(api_key, GrantType::ResourceOwner)
            .await
    }

    /// Whether the consent page is shown during authcode/implicit
    /// authorization. Off for unknown keys.
    pub async fn is_consent_message_enabled(&self, api_key: &str) -> Result<bool, GateError> {
        let client = self.find_by_api_key(api_key).await?;
        Ok(client.map(|c| c.consent_message_active == 1).unwrap_or(false))
    }

    /// The consent message shown to end users; empty for unknown keys.
    pub async fn get_consent_message(&self, api_key: &str) -> Result<String, GateError> {
        let client = self.find_by_api_key(api_key).await?;
        Ok(client.map(|c| c.consent_message).unwrap_or_default())
    }

    /// Whether refresh tokens are minted for the authorization-code grant.
    pub async fn is_auth_code_refresh_enabled(&self, api_key: &str) -> Result<bool, GateError> {
        let client = self.find_by_api_key(api_key).await?;
        Ok(client.map(|c| c.authcode_refresh_active == 1).unwrap_or(false))
    }

    /// Whether refresh tokens are minted for the resource-owner grant.
    pub async fn is_resource_owner_refresh_enabled(
        &self,
        api_key: &str,
    ) -> Result<bool, GateError> {
        let client = self.find_by_api_key(api_key).await?;
        Ok(client
            .map(|c| c.resourceowner_refresh_active == 1)
            .unwrap_or(false))
    }

    /// The user impersonated by the client-credentials grant, `None` when
    /// not configured.
    pub async fn get_client_credentials_user(
        &self,
        api_key: &str,
    ) -> Result<Option<i64>, GateError> {
        let client = self
            .find_by_api_key(api_key)
            .await?
            .ok_or_else(|| GateError::UnknownClient(format!("api-key `{api_key}`")))?;
        Ok(client.gt_client_credentials_user)
    }

    /// Which users may authenticate via the user-bound grant types. With the
    /// restriction flag off every user may; with it on, exactly the stored
    /// set may (which can be empty, locking the user-bound grants entirely).
    pub async fn get_allowed_users(&self, api_key: &str) -> Result<AllowedUsers, GateError> {
        let client = self
            .find_by_api_key(api_key)
            .await?
            .ok_or_else(|| GateError::UnknownClient(format!("api-key `{api_key}`")))?;

        if client.user_restriction_active != 1 {
            return Ok(AllowedUsers::Unrestricted);
        }

        let users = entities::allowed_user::Entity::find()
            .filter(entities::allowed_user::Column::ClientId.eq(client.id))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|r| r.user_id)
            .collect();
        Ok(AllowedUsers::Restricted(users))
    }

    async fn find_by_api_key(
        &self,
        api_key: &str,
    ) -> Result<Option<entities::client::Model>, GateError> {
        Ok(entities::client::Entity::find()
            .filter(entities::client::Column::ApiKey.eq(api_key))
            .one(&self.db)
            .await?)
    }

    async fn permissions_of(&self, client_id: i64) -> Result<Vec<Permission>, GateError> {
        Ok(entities::permission::Entity::find()
            .filter(entities::permission::Column::ClientId.eq(client_id))
            .order_by_asc(entities::permission::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Permission::from)
            .collect())
    }
}

async fn replace_permissions<C: ConnectionTrait>(
    db: &C,
    client_id: i64,
    entries: &[PermissionEntry],
) -> Result<(), GateError> {
    entities::permission::Entity::delete_many()
        .filter(entities::permission::Column::ClientId.eq(client_id))
        .exec(db)
        .await?;

    // Duplicate (pattern, verb) pairs in the input collapse to one row
    let mut seen = HashSet::new();
    for entry in entries {
        let pattern = entry.pattern.trim_end_matches('/').to_string();
        if !seen.insert((pattern.clone(), entry.verb.clone())) {
            continue;
        }
        entities::permission::ActiveModel {
            id: Default::default(),
            client_id: Set(client_id),
            pattern: Set(pattern),
            verb: Set(entry.verb.clone()),
        }
        .insert(db)
        .await?;
    }
    Ok(())
}

async fn replace_allowed_users<C: ConnectionTrait>(
    db: &C,
    client_id: i64,
    users: &[i64],
) -> Result<(), GateError> {
    entities::allowed_user::Entity::delete_many()
        .filter(entities::allowed_user::Column::ClientId.eq(client_id))
        .exec(db)
        .await?;

    let mut seen = HashSet::new();
    for user_id in users {
        if !seen.insert(*user_id) {
            continue;
        }
        entities::allowed_user::ActiveModel {
            client_id: Set(client_id),
            user_id: Set(*user_id),
        }
        .insert(db)
        .await?;
    }
    Ok(())
}

async fn replace_allowed_ips<C: ConnectionTrait>(
    db: &C,
    client_id: i64,
    ips: &[String],
) -> Result<(), GateError> {
    entities::allowed_ip::Entity::delete_many()
        .filter(entities::allowed_ip::Column::ClientId.eq(client_id))
        .exec(db)
        .await?;

    let mut seen = HashSet::new();
    for ip in ips {
        if !seen.insert(ip.clone()) {
            continue;
        }
        entities::allowed_ip::ActiveModel {
            client_id: Set(client_id),
            ip: Set(ip.clone()),
        }
        .insert(db)
        .await?;
    }
    Ok(())
}

fn parse_user_csv(csv: &str) -> Result<Vec<i64>, GateError> {
    csv.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| {
            t.parse::<i64>()
                .map_err(|_| GateError::BadRequest(format!("`{t}` is not a user id")))
        })
        .collect()
}

fn parse_ip_csv(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn csv_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

fn permission_payload_from_value(value: &Value) -> Result<PermissionPayload, GateError> {
    match value {
        Value::Null => Ok(PermissionPayload::Entries(Vec::new())),
        Value::String(s) => Ok(PermissionPayload::Json(s.clone())),
        Value::Array(_) => {
            let entries: Vec<PermissionEntry> = serde_json::from_value(value.clone())
                .map_err(|e| GateError::MalformedPermissionPayload(e.to_string()))?;
            Ok(PermissionPayload::Entries(entries))
        }
        other => Err(GateError::MalformedPermissionPayload(format!(
            "expected a list of pattern/verb pairs, got {other}"
        ))),
    }
}

fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn flag_value(value: &Value) -> Option<i64> {
    match value {
        Value::Bool(b) => Some(*b as i64),
        Value::Number(n) => n.as_i64().map(|v| (v != 0) as i64),
        Value::String(s) => match s.trim() {
            "1" | "true" => Some(1),
            "0" | "false" => Some(0),
            _ => None,
        },
        _ => None,
    }
}

fn user_ref_value(value: &Value) -> Option<Option<i64>> {
    match value {
        Value::Null => Some(None),
        Value::Number(n) => n.as_i64().map(Some),
        Value::String(s) => s.trim().parse::<i64>().ok().map(Some),
        _ => None,
    }
}

fn flatten_txn(err: sea_orm::TransactionError<GateError>) -> GateError {
    match err {
        sea_orm::TransactionError::Connection(e) => GateError::Db(e),
        sea_orm::TransactionError::Transaction(e) => e,
    }
}

fn random_key() -> String {
    let mut bytes = [0u8; 24];
    rand::thread_rng().fill_bytes(&mut bytes);
    base64ct::Base64UrlUnpadded::encode_string(&bytes)
}
