use super::*;
use crate::identity::UserMetadata;

fn user(username: Option<&str>, email: Option<&str>, is_premium: Option<bool>) -> User {
    User {
        id: "8f14e45f".into(),
        email: email.map(str::to_owned),
        metadata: UserMetadata {
            username: username.map(str::to_owned),
            is_premium,
            ..UserMetadata::default()
        },
    }
}

#[test]
fn default_state_is_signed_out_and_loading() {
    let state = EntitlementState::default();
    assert!(!state.is_authenticated);
    assert!(!state.is_premium);
    assert!(state.loading);
    assert!(state.username.is_empty());
    assert!(!state.is_entitled());
}

#[test]
fn premium_unset_maps_to_false() {
    assert!(!premium_of(&user(Some("a"), None, None)));
    assert!(!premium_of(&user(Some("a"), None, Some(false))));
    assert!(premium_of(&user(Some("a"), None, Some(true))));
}

#[test]
fn username_prefers_metadata() {
    assert_eq!(username_of(&user(Some("zhang"), Some("z@example.com"), None)), "zhang");
}

#[test]
fn username_falls_back_to_email_local_part() {
    assert_eq!(username_of(&user(None, Some("wang.fang@example.com"), None)), "wang.fang");
    assert_eq!(username_of(&user(Some(""), Some("wang.fang@example.com"), None)), "wang.fang");
}

#[test]
fn username_falls_back_to_id() {
    assert_eq!(username_of(&user(None, None, None)), "8f14e45f");
}

#[test]
fn entitled_requires_both_flags() {
    let state = EntitlementState { is_authenticated: true, is_premium: false, ..EntitlementState::default() };
    assert!(!state.is_entitled());
    let state = EntitlementState { is_premium: true, ..state };
    assert!(state.is_entitled());
}

#[test]
fn mistyped_metadata_maps_to_not_premium_and_email_username() {
    let raw = r#"{"id":"u1","email":"bob@b.c","user_metadata":{"username":42,"is_premium":"true"}}"#;
    let user: User = serde_json::from_str(raw).unwrap();
    assert!(!premium_of(&user));
    assert_eq!(username_of(&user), "bob");
}
