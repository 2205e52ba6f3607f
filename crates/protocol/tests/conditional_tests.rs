// ETags and conditional reads.

mod common;

use common::{START, TestEngine, admin, alice, mallory, owner, restricted};
use wttp_core::{DefineRequest, GetRequest, HeadRequest, HeaderContent, Redirect, Role, Status};
use wttp_protocol::ProtocolError;

#[tokio::test]
async fn test_etag_is_deterministic() {
    let te = TestEngine::new().await;
    te.put(&admin(), "/a", &[b"same", b"bytes"]).await.unwrap();
    te.put(&admin(), "/b", &[b"same", b"bytes"]).await.unwrap();

    let a1 = te.head(&alice(), "/a").await.unwrap().etag;
    let a2 = te.head(&alice(), "/a").await.unwrap().etag;
    let b = te.head(&alice(), "/b").await.unwrap().etag;
    assert_eq!(a1, a2);
    // Identical state at a different path yields the same tag.
    assert_eq!(a1, b);
}

#[tokio::test]
async fn test_etag_tracks_every_change() {
    let te = TestEngine::new().await;
    let first = te.put(&admin(), "/a", &[b"v1"]).await.unwrap().etag;

    te.clock.advance(1);
    let rewritten = te.put(&admin(), "/a", &[b"v1"]).await.unwrap().etag;
    assert_ne!(first, rewritten);

    let redefined = te
        .engine
        .define(
            &admin(),
            &DefineRequest::new("/a", HeaderContent::public_read(Role::new("editors"))),
        )
        .await
        .unwrap()
        .etag;
    assert_ne!(rewritten, redefined);
    assert_eq!(te.head(&owner(), "/a").await.unwrap().etag, redefined);
}

#[tokio::test]
async fn test_if_none_match() {
    let te = TestEngine::new().await;
    let etag = te.put(&admin(), "/a", &[b"body"]).await.unwrap().etag;

    let request = GetRequest {
        head: HeadRequest::new("/a").if_none_match(etag),
        ..GetRequest::new("/a")
    };
    let response = te.engine.get(&alice(), &request).await.unwrap();
    assert_eq!(response.status(), Status::NotModified);
    assert_eq!(response.status().code(), 304);
    assert!(response.data.is_empty());
    assert_eq!(response.locate.head.etag, etag);

    te.clock.advance(5);
    te.put(&admin(), "/a", &[b"changed"]).await.unwrap();
    let response = te.engine.get(&alice(), &request).await.unwrap();
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(response.data, &b"changed"[..]);
}

#[tokio::test]
async fn test_if_modified_since_is_inclusive() {
    let te = TestEngine::new().await;
    te.put(&admin(), "/a", &[b"body"]).await.unwrap();

    let same_second = HeadRequest::new("/a").if_modified_since(START);
    let head = te.engine.head(&alice(), &same_second).await.unwrap();
    assert_eq!(head.status, Status::NotModified);

    let earlier = HeadRequest::new("/a").if_modified_since(START - 1);
    let head = te.engine.head(&alice(), &earlier).await.unwrap();
    assert_eq!(head.status, Status::Ok);
}

#[tokio::test]
async fn test_not_modified_only_after_authorization() {
    let te = TestEngine::new().await;
    te.engine
        .define(&admin(), &DefineRequest::new("/private", restricted("editors")))
        .await
        .unwrap();
    let etag = te.put(&owner(), "/private", &[b"secret"]).await.unwrap().etag;

    let conditional = HeadRequest::new("/private").if_none_match(etag);
    let err = te.engine.head(&alice(), &conditional).await.unwrap_err();
    assert!(matches!(err, ProtocolError::Forbidden { .. }));

    // A blacklisted caller loses public reads even with a matching tag.
    te.put(&admin(), "/public", &[b"open"]).await.unwrap();
    let etag = te.head(&alice(), "/public").await.unwrap().etag;
    te.engine
        .roles()
        .blacklist(&owner(), &mallory())
        .await
        .unwrap();
    let err = te
        .engine
        .head(&mallory(), &HeadRequest::new("/public").if_none_match(etag))
        .await
        .unwrap_err();
    assert_eq!(err.status(), 403);
}

#[tokio::test]
async fn test_conditional_wins_over_redirect() {
    let te = TestEngine::new().await;
    let header = HeaderContent::public_read(Role::site_admin())
        .with_redirect(Redirect::to(307, "/elsewhere"));
    te.engine
        .define(&admin(), &DefineRequest::new("/moved", header))
        .await
        .unwrap();
    let etag = te.put(&admin(), "/moved", &[b"x"]).await.unwrap().etag;

    let head = te
        .engine
        .head(&alice(), &HeadRequest::new("/moved").if_none_match(etag))
        .await
        .unwrap();
    assert_eq!(head.status, Status::NotModified);
    assert!(head.location.is_none());

    let head = te.head(&alice(), "/moved").await.unwrap();
    assert_eq!(head.status, Status::Redirect(307));
    assert_eq!(head.location.as_deref(), Some("/elsewhere"));
}
