use super::*;
use crate::state::seed_users;

fn seeded() -> RwLock<Vec<MockUser>> {
    RwLock::new(seed_users())
}

#[tokio::test]
async fn register_assigns_count_plus_one() {
    let users = seeded();
    assert_eq!(register(&users, "alice", "pw").await, Ok(2));
    assert_eq!(register(&users, "bob", "pw").await, Ok(3));
    assert_eq!(users.read().await.len(), 3);
}

#[tokio::test]
async fn register_duplicate_is_rejected_without_insert() {
    let users = seeded();
    assert_eq!(register(&users, "demo", "other").await, Err(AccountError::UsernameTaken));
    assert_eq!(users.read().await.len(), 1);
}

#[tokio::test]
async fn register_empty_fields_rejected() {
    let users = seeded();
    assert_eq!(register(&users, "  ", "pw").await, Err(AccountError::MissingField));
    assert_eq!(register(&users, "carol", "").await, Err(AccountError::MissingField));
    assert_eq!(users.read().await.len(), 1);
}

#[tokio::test]
async fn login_seeded_demo_user() {
    let users = seeded();
    assert_eq!(login(&users, "demo", "demo").await.as_deref(), Ok("mock_jwt_token_1"));
}

#[tokio::test]
async fn login_after_register_uses_new_id() {
    let users = seeded();
    register(&users, "alice", "pw").await.unwrap();
    assert_eq!(login(&users, "alice", "pw").await, Ok(token_for(2)));
}

#[tokio::test]
async fn login_wrong_password_is_invalid() {
    let users = seeded();
    assert_eq!(login(&users, "demo", "nope").await, Err(AccountError::InvalidCredentials));
    assert_eq!(login(&users, "ghost", "demo").await, Err(AccountError::InvalidCredentials));
}

#[tokio::test]
async fn concurrent_duplicate_registration_admits_one() {
    let users = std::sync::Arc::new(seeded());
    let a = tokio::spawn({
        let users = users.clone();
        async move { register(&users, "race", "pw").await }
    });
    let b = tokio::spawn({
        let users = users.clone();
        async move { register(&users, "race", "pw").await }
    });
    let results = [a.await.unwrap(), b.await.unwrap()];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(users.read().await.len(), 2);
}
