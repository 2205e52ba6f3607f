// Role graph behaviour as seen by the dispatcher.

mod common;

use common::{TestEngine, admin, alice, mallory, owner, restricted};
use wttp_core::{AccountId, DefineRequest, GetRequest, Role, Status};
use wttp_protocol::ProtocolError;

#[tokio::test]
async fn test_super_admin_holds_every_role() {
    let te = TestEngine::new().await;
    let roles = te.engine.roles();
    for role in [
        Role::new("anything"),
        Role::public(),
        Role::blacklist(),
        Role::site_admin(),
    ] {
        assert!(roles.has_role(&role, &owner()).await.unwrap(), "{role}");
    }

    te.engine
        .define(&admin(), &DefineRequest::new("/vault", restricted("vault-keepers")))
        .await
        .unwrap();
    let written = te.put(&owner(), "/vault", &[b"gold"]).await.unwrap();
    assert_eq!(written.status, Status::Created);
    assert!(matches!(
        te.put(&admin(), "/vault", &[b"lead"]).await,
        Err(ProtocolError::Forbidden { .. })
    ));
}

#[tokio::test]
async fn test_public_is_inverse_of_blacklist() {
    let te = TestEngine::new().await;
    let roles = te.engine.roles();
    te.put(&admin(), "/page", &[b"hello"]).await.unwrap();
    roles.blacklist(&owner(), &mallory()).await.unwrap();

    for account in [alice(), mallory(), AccountId::new("zed"), AccountId::anonymous()] {
        let public = roles.has_role(&Role::public(), &account).await.unwrap();
        let blacklisted = roles.has_role(&Role::blacklist(), &account).await.unwrap();
        assert_eq!(public, !blacklisted, "{account}");
    }

    assert!(te.read(&alice(), "/page").await.is_ok());
    let err = te.read(&mallory(), "/page").await.unwrap_err();
    assert!(matches!(
        err,
        ProtocolError::Forbidden { role, .. } if role.is_public()
    ));
}

#[tokio::test]
async fn test_blacklist_requires_super_admin() {
    let te = TestEngine::new().await;
    let err = te
        .engine
        .roles()
        .blacklist(&admin(), &mallory())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ProtocolError::Unauthorized { ref role, .. } if role.is_super_admin()
    ));
    assert_eq!(err.status(), 403);
}

#[tokio::test]
async fn test_resource_roles_gate_reads() {
    let te = TestEngine::new().await;
    let roles = te.engine.roles();
    let readers = Role::new("readers");
    roles.create_resource_role(&admin(), &readers).await.unwrap();

    te.engine
        .define(&admin(), &DefineRequest::new("/members", restricted("readers")))
        .await
        .unwrap();
    te.put(&owner(), "/members", &[b"welcome"]).await.unwrap();
    assert!(te.read(&alice(), "/members").await.is_err());

    // The site admin administers resource roles it created.
    assert!(roles.grant_role(&admin(), &readers, &alice()).await.unwrap());
    assert_eq!(te.read(&alice(), "/members").await.unwrap(), &b"welcome"[..]);

    // Blacklisting only removes public access.
    roles.blacklist(&owner(), &alice()).await.unwrap();
    assert!(te.read(&alice(), "/members").await.is_ok());

    assert!(roles.revoke_role(&admin(), &readers, &alice()).await.unwrap());
    assert!(matches!(
        te.engine.get(&alice(), &GetRequest::new("/members")).await,
        Err(ProtocolError::Forbidden { .. })
    ));
}

#[tokio::test]
async fn test_change_site_admin_moves_authority() {
    let te = TestEngine::new().await;
    let roles = te.engine.roles();
    let ops = Role::new("ops");

    assert_eq!(roles.site_admin_role().await.unwrap(), Role::site_admin());
    roles.change_site_admin(&owner(), &ops).await.unwrap();
    roles.grant_role(&owner(), &ops, &alice()).await.unwrap();

    assert!(!roles.is_site_admin(&admin()).await.unwrap());
    assert!(roles.is_site_admin(&alice()).await.unwrap());
    assert!(matches!(
        roles.create_resource_role(&admin(), &Role::new("x")).await,
        Err(ProtocolError::Unauthorized { .. })
    ));
    roles.create_resource_role(&alice(), &Role::new("x")).await.unwrap();
    assert_eq!(roles.role_admin(&Role::new("x")).await.unwrap(), Role::site_admin());

    // The swapped identifier can no longer be registered as a resource role.
    assert!(matches!(
        roles.create_resource_role(&alice(), &ops).await,
        Err(ProtocolError::InvalidRole(_))
    ));
}

#[tokio::test]
async fn test_site_admin_swap_revokes_default_header_writes() {
    let te = TestEngine::new().await;
    let roles = te.engine.roles();
    let ops = Role::new("ops");
    let editors = Role::new("editors");
    roles.create_resource_role(&admin(), &editors).await.unwrap();

    roles.change_site_admin(&owner(), &ops).await.unwrap();
    roles.grant_role(&owner(), &ops, &alice()).await.unwrap();

    let err = te.put(&admin(), "/page", &[b"stale"]).await.unwrap_err();
    assert!(matches!(err, ProtocolError::Forbidden { .. }));
    assert_eq!(err.status(), 403);
    let written = te.put(&alice(), "/page", &[b"fresh"]).await.unwrap();
    assert_eq!(written.status, Status::Created);

    assert!(matches!(
        roles.grant_role(&admin(), &editors, &mallory()).await,
        Err(ProtocolError::Unauthorized { .. })
    ));
    assert!(roles.grant_role(&alice(), &editors, &mallory()).await.unwrap());
}

#[tokio::test]
async fn test_owner_and_site_admins_bootstrapped() {
    let te = TestEngine::new().await;
    let roles = te.engine.roles();
    assert_eq!(roles.members(&Role::super_admin()).await.unwrap(), vec![owner()]);
    assert_eq!(
        roles.members(&Role::site_admin()).await.unwrap(),
        vec![admin()]
    );
    assert!(!roles.is_site_admin(&alice()).await.unwrap());
}
