mod helpers;

use campusgate::context;
use campusgate::directory::{ObjectDirectory, UserDirectory};
use campusgate::errors::GateError;
use campusgate::registry::{AllowedUsers, PermissionGrant, PermissionPayload};
use helpers::lms::{InMemoryLms, SplitTokenInspector};
use helpers::{db::mobile_app_client, TestDb};
use serde_json::json;
use std::collections::HashMap;

#[tokio::test]
async fn full_client_lifecycle() {
    let test_db = TestDb::new().await;
    let registry = test_db.registry();

    // Register the mobile-app key
    let id = registry
        .create_client(mobile_app_client("mobile-key"))
        .await
        .expect("Failed to create client");

    assert_eq!(registry.resolve_client_id("mobile-key").await.unwrap(), id);
    assert!(registry.is_auth_code_enabled("mobile-key").await.unwrap());
    assert!(registry.is_implicit_enabled("mobile-key").await.unwrap());
    assert!(!registry
        .is_client_credentials_enabled("mobile-key")
        .await
        .unwrap());
    assert!(registry
        .is_auth_code_refresh_enabled("mobile-key")
        .await
        .unwrap());

    // Grant one more route, then the same one again
    let granted = registry
        .add_permission("mobile-key", "/v1/calendar/", "GET")
        .await
        .expect("Failed to add permission");
    assert!(matches!(granted, PermissionGrant::Added(_)));
    assert_eq!(
        registry
            .add_permission("mobile-key", "/v1/calendar", "GET")
            .await
            .unwrap(),
        PermissionGrant::Duplicate
    );

    let perms = registry.list_permissions("mobile-key").await.unwrap();
    assert_eq!(perms.len(), 3);
    assert!(perms.iter().all(|p| !p.pattern.ends_with('/')));

    // Flip configuration field by field, as the admin panel does
    registry
        .update_field(id, "description", &json!("Campus mobile app v2"))
        .await
        .expect("Failed to update description");
    registry
        .update_field(id, "gt_implicit", &json!(0))
        .await
        .expect("Failed to disable implicit grant");
    registry
        .update_field(id, "access_ip_csv", &json!("10.0.0.1, 10.0.0.2"))
        .await
        .expect("Failed to set ip allow-list");

    assert!(!registry.is_implicit_enabled("mobile-key").await.unwrap());

    let listing = registry.list_clients().await.expect("Failed to list");
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].client.description, "Campus mobile app v2");
    assert_eq!(listing[0].access_ip_csv, "10.0.0.1,10.0.0.2");
    assert_eq!(listing[0].permissions.len(), 3);

    // Replace the permission set wholesale with the JSON-text form
    registry
        .update_permissions(
            id,
            PermissionPayload::Json(r#"[{"pattern": "/v2/courses/", "verb": "GET"}]"#.to_string()),
        )
        .await
        .expect("Failed to replace permissions");
    let perms = registry.list_permissions("mobile-key").await.unwrap();
    assert_eq!(perms.len(), 1);
    assert_eq!(perms[0].pattern, "/v2/courses");

    // Tear the client down; nothing may survive
    registry
        .delete_client(id)
        .await
        .expect("Failed to delete client");
    let err = registry.resolve_client_id("mobile-key").await.unwrap_err();
    assert!(matches!(err, GateError::UnknownClient(_)));
    assert!(registry.list_clients().await.unwrap().is_empty());
}

#[tokio::test]
async fn allow_list_built_from_directory_logins() {
    let test_db = TestDb::new().await;
    let registry = test_db.registry();
    let lms = InMemoryLms::new();

    let id = registry
        .create_client(mobile_app_client("mobile-key"))
        .await
        .expect("Failed to create client");
    registry
        .update_field(id, "user_restriction_active", &json!(true))
        .await
        .expect("Failed to enable user restriction");

    // The admin names users by login; resolve them before filling the list
    let mut user_ids = Vec::new();
    for login in ["jdoe", "asmith"] {
        user_ids.push(lms.user_id(login).await.expect("Unknown login"));
    }
    let csv = user_ids
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",");
    registry
        .update_allowed_users(id, &csv)
        .await
        .expect("Failed to set allowed users");

    assert_eq!(
        registry.get_allowed_users("mobile-key").await.unwrap(),
        AllowedUsers::Restricted(vec![23, 42])
    );

    // Only root carries the admin role
    assert!(lms.is_admin(6).await.unwrap());
    assert!(!lms.is_admin(23).await.unwrap());
    let err = lms.user_id("ghost").await.unwrap_err();
    assert!(matches!(err, GateError::UnknownUser(_)));
}

#[tokio::test]
async fn request_params_feed_feature_queries() {
    let test_db = TestDb::new().await;
    let registry = test_db.registry();

    registry
        .create_client(mobile_app_client("mobile-key"))
        .await
        .expect("Failed to create client");

    // Token names the tenant, query names the OAuth2 client
    let query: HashMap<String, String> = [("client_id".to_string(), "mobile-key".to_string())]
        .into_iter()
        .collect();
    let resolved = context::resolve_client_params(&query, &HashMap::new(), None);
    let api_key = resolved.api_key.expect("Missing api key");

    assert!(registry.is_auth_code_enabled(&api_key).await.unwrap());

    let tenant = context::tenant_from_token(
        &SplitTokenInspector,
        Some("campus-main:jdoe"),
        None,
    );
    assert_eq!(tenant, Some("campus-main".to_string()));
}

#[tokio::test]
async fn object_directory_resolves_references() {
    let lms = InMemoryLms::new();

    assert_eq!(lms.object_id(301).await.unwrap(), 201);
    assert_eq!(lms.reference_id(201).await.unwrap(), 301);
    assert_eq!(lms.reference_ids(201).await.unwrap(), vec![301, 302]);

    let err = lms.object_id(999).await.unwrap_err();
    assert!(matches!(err, GateError::UnknownObject(_)));
}
