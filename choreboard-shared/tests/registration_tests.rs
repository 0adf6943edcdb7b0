/// Integration tests for registration, login and profile updates

mod common;

use choreboard_shared::auth::password::verify_password;
use choreboard_shared::directory::invite_code::is_valid_invite_code;
use choreboard_shared::error::ServiceError;
use choreboard_shared::models::membership::{TeamMember, TeamRole};
use choreboard_shared::models::notification::{Notification, NotificationType};
use choreboard_shared::models::user::User;
use choreboard_shared::registration::{
    current_user, login, register, update_profile, ProfileUpdate, RegisterInput, RegistrationMode,
};
use common::{count, ctx, founder, joiner, reject_inserts, setup, PASSWORD};

#[tokio::test]
async fn test_create_mode_writes_user_team_and_admin_membership() {
    let pool = setup().await;

    let reg = founder(&pool, "alice", "Flat 4B").await;

    assert_eq!(count(&pool, "users").await, 1);
    assert_eq!(count(&pool, "teams").await, 1);
    assert_eq!(count(&pool, "team_members").await, 1);

    assert_eq!(reg.role, TeamRole::Admin);
    assert_eq!(reg.team.name, "Flat 4B");
    assert_eq!(reg.team.created_by, reg.user.id);
    assert!(is_valid_invite_code(&reg.team.invite_code));
    assert_eq!(reg.user.current_team_id, Some(reg.team.id));
    assert_eq!(reg.user.nickname, "alice");

    let role = TeamMember::get_role(&pool, reg.team.id, reg.user.id).await.unwrap();
    assert_eq!(role, Some(TeamRole::Admin));
}

#[tokio::test]
async fn test_join_mode_with_invalid_code_writes_nothing() {
    let pool = setup().await;
    founder(&pool, "alice", "Flat 4B").await;

    let result = register(
        &pool,
        RegisterInput {
            username: "bob".to_string(),
            password: PASSWORD.to_string(),
            nickname: None,
            mode: RegistrationMode::Join {
                invite_code: "ZZZZZZ".to_string(),
            },
        },
    )
    .await;

    assert!(matches!(result, Err(ServiceError::NotFound(_))));
    assert_eq!(count(&pool, "users").await, 1);
    assert_eq!(count(&pool, "teams").await, 1);
    assert_eq!(count(&pool, "team_members").await, 1);
    assert!(User::find_by_username(&pool, "bob").await.unwrap().is_none());
}

#[tokio::test]
async fn test_join_mode_adds_member_and_notifies_admin() {
    let pool = setup().await;
    let alice = founder(&pool, "alice", "Flat 4B").await;

    let code = alice.team.invite_code.to_lowercase();
    let bob = joiner(&pool, "bob", &format!("  {code} ")).await;

    assert_eq!(bob.role, TeamRole::Member);
    assert_eq!(bob.team.id, alice.team.id);
    assert_eq!(bob.user.current_team_id, Some(alice.team.id));
    assert_eq!(count(&pool, "teams").await, 1);

    let inbox = Notification::list_for_user(&pool, alice.user.id, false).await.unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].kind, NotificationType::TeamInvite);
    assert_eq!(inbox[0].created_by, Some(bob.user.id));
    assert!(inbox[0].content.contains("bob"));
}

#[tokio::test]
async fn test_duplicate_username_is_conflict() {
    let pool = setup().await;
    founder(&pool, "alice", "Flat 4B").await;

    let result = register(
        &pool,
        RegisterInput {
            username: "alice".to_string(),
            password: PASSWORD.to_string(),
            nickname: None,
            mode: RegistrationMode::Create {
                team_name: "Another".to_string(),
            },
        },
    )
    .await;

    assert!(matches!(result, Err(ServiceError::Conflict(_))));
    assert_eq!(count(&pool, "teams").await, 1);
}

#[tokio::test]
async fn test_create_mode_rolls_back_when_membership_insert_fails() {
    let pool = setup().await;
    reject_inserts(&pool, "team_members").await;

    let result = register(
        &pool,
        RegisterInput {
            username: "alice".to_string(),
            password: PASSWORD.to_string(),
            nickname: None,
            mode: RegistrationMode::Create {
                team_name: "Flat 4B".to_string(),
            },
        },
    )
    .await;

    assert!(matches!(result, Err(ServiceError::Dependency(_))));
    assert_eq!(count(&pool, "users").await, 0);
    assert_eq!(count(&pool, "teams").await, 0);
    assert_eq!(count(&pool, "team_members").await, 0);
}

#[tokio::test]
async fn test_join_mode_rolls_back_when_membership_insert_fails() {
    let pool = setup().await;
    let alice = founder(&pool, "alice", "Flat 4B").await;
    reject_inserts(&pool, "team_members").await;

    let result = register(
        &pool,
        RegisterInput {
            username: "bob".to_string(),
            password: PASSWORD.to_string(),
            nickname: None,
            mode: RegistrationMode::Join {
                invite_code: alice.team.invite_code.clone(),
            },
        },
    )
    .await;

    assert!(result.is_err());
    assert_eq!(count(&pool, "users").await, 1);
    assert_eq!(count(&pool, "team_members").await, 1);
    assert!(User::find_by_username(&pool, "bob").await.unwrap().is_none());
}

#[tokio::test]
async fn test_validation_happens_before_writes() {
    let pool = setup().await;

    let cases = [
        ("al", PASSWORD, RegistrationMode::Create { team_name: "Home".to_string() }),
        ("alice", "12345", RegistrationMode::Create { team_name: "Home".to_string() }),
        ("alice", PASSWORD, RegistrationMode::Create { team_name: "   ".to_string() }),
        ("alice", PASSWORD, RegistrationMode::Join { invite_code: " ".to_string() }),
    ];

    for (username, password, mode) in cases {
        let result = register(
            &pool,
            RegisterInput {
                username: username.to_string(),
                password: password.to_string(),
                nickname: None,
                mode,
            },
        )
        .await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    assert_eq!(count(&pool, "users").await, 0);
    assert_eq!(count(&pool, "teams").await, 0);
}

#[tokio::test]
async fn test_login() {
    let pool = setup().await;
    let alice = founder(&pool, "alice", "Flat 4B").await;

    let outcome = login(&pool, "alice", PASSWORD).await.unwrap();
    assert_eq!(outcome.user.id, alice.user.id);
    assert_eq!(outcome.team.map(|t| t.id), Some(alice.team.id));
    assert_eq!(outcome.role, Some(TeamRole::Admin));

    let wrong_password = login(&pool, "alice", "nope-nope").await.unwrap_err();
    let unknown_user = login(&pool, "mallory", PASSWORD).await.unwrap_err();
    assert!(matches!(wrong_password, ServiceError::Authentication(_)));
    assert_eq!(wrong_password.to_string(), unknown_user.to_string());
}

#[tokio::test]
async fn test_current_user() {
    let pool = setup().await;
    let alice = founder(&pool, "alice", "Flat 4B").await;

    let me = current_user(&pool, &ctx(&alice)).await.unwrap();
    assert_eq!(me.user.username, "alice");
    assert_eq!(me.team.unwrap().id, alice.team.id);
}

#[tokio::test]
async fn test_update_profile() {
    let pool = setup().await;
    let alice = founder(&pool, "alice", "Flat 4B").await;
    let ctx = ctx(&alice);

    let user = update_profile(
        &pool,
        &ctx,
        ProfileUpdate {
            nickname: Some("Ali".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(user.nickname, "Ali");

    let missing_current = update_profile(
        &pool,
        &ctx,
        ProfileUpdate {
            new_password: Some("brand-new".to_string()),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(missing_current, Err(ServiceError::Validation(_))));

    let wrong_current = update_profile(
        &pool,
        &ctx,
        ProfileUpdate {
            current_password: Some("not-it".to_string()),
            new_password: Some("brand-new".to_string()),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(wrong_current, Err(ServiceError::Authentication(_))));

    let user = update_profile(
        &pool,
        &ctx,
        ProfileUpdate {
            current_password: Some(PASSWORD.to_string()),
            new_password: Some("brand-new".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert!(verify_password("brand-new", &user.password_hash).unwrap());
    assert!(login(&pool, "alice", "brand-new").await.is_ok());
}
