/// Integration tests for the team directory and team operations

mod common;

use std::collections::HashSet;

use choreboard_shared::directory::invite_code::{generate_invite_code, is_valid_invite_code};
use choreboard_shared::directory::teams::{
    create_team, delete_team, join_team, list_members, list_teams, regenerate_invite_code,
    remove_member, set_member_role, switch_current_team, update_team,
};
use choreboard_shared::directory::{
    add_user_to_team, get_user_role, is_team_admin, is_team_member, remove_user_from_team,
    switch_team,
};
use choreboard_shared::error::ServiceError;
use choreboard_shared::models::membership::TeamRole;
use choreboard_shared::models::team::{CreateTeam, Team};
use choreboard_shared::models::user::User;
use common::{count, ctx, founder, joiner, setup, task};

#[tokio::test]
async fn test_invite_codes_are_unique_and_well_formed() {
    let pool = setup().await;
    let alice = founder(&pool, "alice", "Home").await;
    let ctx = ctx(&alice);

    let mut codes = HashSet::from([alice.team.invite_code.clone()]);
    for i in 0..20 {
        let team = create_team(&pool, &ctx, &format!("Team {i}")).await.unwrap();
        assert!(is_valid_invite_code(&team.invite_code));
        codes.insert(team.invite_code);
    }
    assert_eq!(codes.len(), 21);

    let mut conn = pool.acquire().await.unwrap();
    let code = generate_invite_code(&mut conn).await.unwrap();
    assert!(!codes.contains(&code));
}

#[tokio::test]
async fn test_invite_code_unique_index() {
    let pool = setup().await;
    let alice = founder(&pool, "alice", "Home").await;

    let result = Team::create(
        &pool,
        CreateTeam {
            name: "Copycat".to_string(),
            invite_code: alice.team.invite_code.clone(),
            created_by: alice.user.id,
        },
    )
    .await;

    let err = result.unwrap_err();
    assert!(choreboard_shared::db::is_unique_violation(&err));
}

#[tokio::test]
async fn test_membership_lookups() {
    let pool = setup().await;
    let alice = founder(&pool, "alice", "Home").await;
    let bob = founder(&pool, "bob", "Bob's place").await;

    assert!(is_team_member(&pool, alice.user.id, alice.team.id).await.unwrap());
    assert!(is_team_admin(&pool, alice.user.id, alice.team.id).await.unwrap());
    assert!(!is_team_member(&pool, bob.user.id, alice.team.id).await.unwrap());

    assert!(add_user_to_team(&pool, bob.user.id, alice.team.id, TeamRole::Member).await.unwrap());
    assert!(!add_user_to_team(&pool, bob.user.id, alice.team.id, TeamRole::Admin).await.unwrap());
    assert!(!is_team_admin(&pool, bob.user.id, alice.team.id).await.unwrap());

    assert_eq!(
        get_user_role(&pool, alice.user.id, alice.team.id).await.unwrap(),
        Some(TeamRole::Admin)
    );
    assert_eq!(
        get_user_role(&pool, bob.user.id, alice.team.id).await.unwrap(),
        Some(TeamRole::Member)
    );

    assert!(remove_user_from_team(&pool, bob.user.id, alice.team.id).await.unwrap());
    assert!(!remove_user_from_team(&pool, bob.user.id, alice.team.id).await.unwrap());
    assert_eq!(get_user_role(&pool, bob.user.id, alice.team.id).await.unwrap(), None);
}

#[tokio::test]
async fn test_switch_team_requires_membership() {
    let pool = setup().await;
    let alice = founder(&pool, "alice", "Home").await;
    let bob = founder(&pool, "bob", "Bob's place").await;

    let mut conn = pool.acquire().await.unwrap();
    let result = switch_team(&mut conn, alice.user.id, bob.team.id).await;
    assert!(matches!(result, Err(ServiceError::Authorization(_))));
    drop(conn);

    let second = create_team(&pool, &ctx(&alice), "Cabin").await.unwrap();
    let switched = switch_current_team(&pool, &ctx(&alice), alice.team.id).await.unwrap();
    assert_eq!(switched.id, alice.team.id);

    let user = User::find_by_id(&pool, alice.user.id).await.unwrap().unwrap();
    assert_eq!(user.current_team_id, Some(alice.team.id));
    assert_ne!(second.id, alice.team.id);
}

#[tokio::test]
async fn test_create_team_makes_caller_admin_and_switches() {
    let pool = setup().await;
    let alice = founder(&pool, "alice", "Home").await;

    let team = create_team(&pool, &ctx(&alice), "  Cabin  ").await.unwrap();
    assert_eq!(team.name, "Cabin");

    let user = User::find_by_id(&pool, alice.user.id).await.unwrap().unwrap();
    assert_eq!(user.current_team_id, Some(team.id));

    let teams = list_teams(&pool, &ctx(&alice)).await.unwrap();
    assert_eq!(teams.len(), 2);
    assert_eq!(teams[0].id, alice.team.id);
    assert!(teams.iter().all(|t| t.role == TeamRole::Admin && t.member_count == 1));
}

#[tokio::test]
async fn test_sole_team_cannot_be_deleted() {
    let pool = setup().await;
    let alice = founder(&pool, "alice", "Home").await;
    let ctx = ctx(&alice);

    let result = delete_team(&pool, &ctx, alice.team.id).await;
    assert!(matches!(result, Err(ServiceError::Validation(_))));
    assert_eq!(count(&pool, "teams").await, 1);

    let cabin = create_team(&pool, &ctx, "Cabin").await.unwrap();
    // current team is now the cabin; delete the original
    delete_team(&pool, &ctx, alice.team.id).await.unwrap();

    assert_eq!(count(&pool, "teams").await, 1);
    let user = User::find_by_id(&pool, alice.user.id).await.unwrap().unwrap();
    assert_eq!(user.current_team_id, Some(cabin.id));
}

#[tokio::test]
async fn test_delete_team_repoints_displaced_users() {
    let pool = setup().await;
    let alice = founder(&pool, "alice", "Home").await;
    let bob = joiner(&pool, "bob", &alice.team.invite_code).await;
    let ctx_alice = ctx(&alice);

    task(&pool, &ctx_alice, "Dishes").await;
    let cabin = create_team(&pool, &ctx_alice, "Cabin").await.unwrap();
    switch_current_team(&pool, &ctx_alice, alice.team.id).await.unwrap();

    delete_team(&pool, &ctx_alice, alice.team.id).await.unwrap();

    let alice_now = User::find_by_id(&pool, alice.user.id).await.unwrap().unwrap();
    let bob_now = User::find_by_id(&pool, bob.user.id).await.unwrap().unwrap();
    assert_eq!(alice_now.current_team_id, Some(cabin.id));
    assert_eq!(bob_now.current_team_id, None);
    assert_eq!(count(&pool, "tasks").await, 0);
    assert_eq!(count(&pool, "team_members").await, 1);
}

#[tokio::test]
async fn test_team_admin_operations_require_admin() {
    let pool = setup().await;
    let alice = founder(&pool, "alice", "Home").await;
    let bob = joiner(&pool, "bob", &alice.team.invite_code).await;
    let ctx_bob = ctx(&bob);

    assert!(matches!(
        update_team(&pool, &ctx_bob, alice.team.id, "Mine now").await,
        Err(ServiceError::Authorization(_))
    ));
    assert!(matches!(
        regenerate_invite_code(&pool, &ctx_bob, alice.team.id).await,
        Err(ServiceError::Authorization(_))
    ));
    assert!(matches!(
        remove_member(&pool, &ctx_bob, alice.team.id, alice.user.id).await,
        Err(ServiceError::Authorization(_))
    ));

    let renamed = update_team(&pool, &ctx(&alice), alice.team.id, "Flat 4B").await.unwrap();
    assert_eq!(renamed.name, "Flat 4B");
}

#[tokio::test]
async fn test_join_team() {
    let pool = setup().await;
    let alice = founder(&pool, "alice", "Home").await;
    let bob = founder(&pool, "bob", "Bob's place").await;
    let ctx_bob = ctx(&bob);

    assert!(matches!(
        join_team(&pool, &ctx_bob, "ZZZZZZ").await,
        Err(ServiceError::NotFound(_))
    ));

    let joined = join_team(&pool, &ctx_bob, &alice.team.invite_code.to_lowercase())
        .await
        .unwrap();
    assert_eq!(joined.id, alice.team.id);

    let bob_now = User::find_by_id(&pool, bob.user.id).await.unwrap().unwrap();
    assert_eq!(bob_now.current_team_id, Some(alice.team.id));

    assert!(matches!(
        join_team(&pool, &ctx_bob, &alice.team.invite_code).await,
        Err(ServiceError::Conflict(_))
    ));
}

#[tokio::test]
async fn test_regenerated_code_replaces_old_one() {
    let pool = setup().await;
    let alice = founder(&pool, "alice", "Home").await;
    let bob = founder(&pool, "bob", "Bob's place").await;

    let old_code = alice.team.invite_code.clone();
    let new_code = regenerate_invite_code(&pool, &ctx(&alice), alice.team.id).await.unwrap();
    assert!(is_valid_invite_code(&new_code));
    assert_ne!(old_code, new_code);

    assert!(matches!(
        join_team(&pool, &ctx(&bob), &old_code).await,
        Err(ServiceError::NotFound(_))
    ));
    join_team(&pool, &ctx(&bob), &new_code).await.unwrap();
}

#[tokio::test]
async fn test_members_listed_admins_first() {
    let pool = setup().await;
    let alice = founder(&pool, "alice", "Home").await;
    let bob = joiner(&pool, "bob", &alice.team.invite_code).await;
    let carol = joiner(&pool, "carol", &alice.team.invite_code).await;

    set_member_role(&pool, &ctx(&alice), alice.team.id, carol.user.id, TeamRole::Admin)
        .await
        .unwrap();

    let members = list_members(&pool, &ctx(&bob), alice.team.id).await.unwrap();
    let names: Vec<&str> = members.iter().map(|m| m.username.as_str()).collect();
    assert_eq!(names, vec!["alice", "carol", "bob"]);

    let outsider = founder(&pool, "dave", "Elsewhere").await;
    assert!(matches!(
        list_members(&pool, &ctx(&outsider), alice.team.id).await,
        Err(ServiceError::Authorization(_))
    ));
}

#[tokio::test]
async fn test_remove_member() {
    let pool = setup().await;
    let alice = founder(&pool, "alice", "Home").await;
    let bob = joiner(&pool, "bob", &alice.team.invite_code).await;
    let outsider = founder(&pool, "carol", "Elsewhere").await;
    let ctx_alice = ctx(&alice);

    assert!(matches!(
        remove_member(&pool, &ctx_alice, alice.team.id, outsider.user.id).await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        remove_member(&pool, &ctx_alice, alice.team.id, alice.user.id).await,
        Err(ServiceError::Validation(_))
    ));

    remove_member(&pool, &ctx_alice, alice.team.id, bob.user.id).await.unwrap();

    assert!(!is_team_member(&pool, bob.user.id, alice.team.id).await.unwrap());
    let bob_now = User::find_by_id(&pool, bob.user.id).await.unwrap().unwrap();
    assert_eq!(bob_now.current_team_id, None);
}

#[tokio::test]
async fn test_set_member_role() {
    let pool = setup().await;
    let alice = founder(&pool, "alice", "Home").await;
    let bob = joiner(&pool, "bob", &alice.team.invite_code).await;
    let ctx_alice = ctx(&alice);

    assert!(matches!(
        set_member_role(&pool, &ctx_alice, alice.team.id, alice.user.id, TeamRole::Member).await,
        Err(ServiceError::Validation(_))
    ));

    let member = set_member_role(&pool, &ctx_alice, alice.team.id, bob.user.id, TeamRole::Admin)
        .await
        .unwrap();
    assert_eq!(member.role, TeamRole::Admin);
    assert!(is_team_admin(&pool, bob.user.id, alice.team.id).await.unwrap());
}

#[tokio::test]
async fn test_self_targeting_non_admins_are_forbidden() {
    let pool = setup().await;
    let alice = founder(&pool, "alice", "Home").await;
    let bob = joiner(&pool, "bob", &alice.team.invite_code).await;
    let carol = founder(&pool, "carol", "Elsewhere").await;

    // a plain member aiming at themself
    assert!(matches!(
        remove_member(&pool, &ctx(&bob), alice.team.id, bob.user.id).await,
        Err(ServiceError::Authorization(_))
    ));
    assert!(matches!(
        set_member_role(&pool, &ctx(&bob), alice.team.id, bob.user.id, TeamRole::Admin).await,
        Err(ServiceError::Authorization(_))
    ));

    // an outsider aiming at themself
    assert!(matches!(
        remove_member(&pool, &ctx(&carol), alice.team.id, carol.user.id).await,
        Err(ServiceError::Authorization(_))
    ));
    assert!(matches!(
        set_member_role(&pool, &ctx(&carol), alice.team.id, carol.user.id, TeamRole::Admin).await,
        Err(ServiceError::Authorization(_))
    ));

    assert!(is_team_member(&pool, bob.user.id, alice.team.id).await.unwrap());
    assert!(!is_team_admin(&pool, bob.user.id, alice.team.id).await.unwrap());
}
