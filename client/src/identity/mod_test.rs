use super::*;

#[test]
fn user_parses_provider_payload_and_keeps_unknown_metadata() {
    let raw = r#"{
        "id": "5d1c",
        "email": "mei@example.com",
        "aud": "authenticated",
        "user_metadata": {"username": "mei", "is_premium": true, "theme": "dark"}
    }"#;
    let user: User = serde_json::from_str(raw).unwrap();
    assert_eq!(user.id, "5d1c");
    assert_eq!(user.metadata.username.as_deref(), Some("mei"));
    assert_eq!(user.metadata.is_premium, Some(true));
    assert_eq!(user.metadata.extra.get("theme").and_then(|v| v.as_str()), Some("dark"));
}

#[test]
fn user_without_metadata_defaults_empty() {
    let user: User = serde_json::from_str(r#"{"id":"u1"}"#).unwrap();
    assert!(user.email.is_none());
    assert_eq!(user.metadata, UserMetadata::default());
}

#[test]
fn email_local_part_handles_edge_cases() {
    let mut user = User { id: "u1".into(), email: Some("li.wei@example.com".into()), metadata: UserMetadata::default() };
    assert_eq!(user.email_local_part(), Some("li.wei"));
    user.email = Some("@example.com".into());
    assert_eq!(user.email_local_part(), None);
    user.email = None;
    assert_eq!(user.email_local_part(), None);
}

#[test]
fn credential_failures_are_4xx_upstream() {
    let bad_login = IdentityError::Upstream { status: 400, message: "Invalid login credentials".into() };
    assert!(bad_login.is_credential_failure());
    assert_eq!(bad_login.to_string(), "Invalid login credentials");
    let outage = IdentityError::Upstream { status: 503, message: "unavailable".into() };
    assert!(!outage.is_credential_failure());
    assert!(!IdentityError::MissingSession.is_credential_failure());
}

#[test]
fn mistyped_metadata_fields_read_as_absent() {
    let raw = r#"{
        "id": "u1",
        "email": "a@b.c",
        "user_metadata": {"username": 42, "is_premium": "true", "premium_expires_at": false, "theme": "dark"}
    }"#;
    let user: User = serde_json::from_str(raw).unwrap();
    assert_eq!(user.metadata.username, None);
    assert_eq!(user.metadata.is_premium, None);
    assert_eq!(user.metadata.premium_expires_at, None);
    assert_eq!(user.metadata.extra.get("theme").and_then(|v| v.as_str()), Some("dark"));
}

#[test]
fn null_metadata_fields_read_as_absent() {
    let raw = r#"{"id":"u1","user_metadata":{"username":null,"is_premium":null}}"#;
    let user: User = serde_json::from_str(raw).unwrap();
    assert_eq!(user.metadata, UserMetadata::default());
}
