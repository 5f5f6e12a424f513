#![forbid(unsafe_code)]

use sg_core::{IdentityId, PinOutcome, PostId, TargetKind, TargetRef};
use sg_storage::{ErrorKind, NewComment, SqliteStore, StoreConfig, StoreError};
use tempfile::TempDir;

fn open_store() -> (TempDir, SqliteStore) {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = SqliteStore::open(dir.path()).expect("open store");
    (dir, store)
}

fn user(store: &mut SqliteStore) -> IdentityId {
    store.register_identity(false).expect("register identity").id
}

fn post(store: &mut SqliteStore, author: IdentityId) -> TargetRef {
    TargetRef::Post(store.register_post(author).expect("register post"))
}

#[test]
fn like_toggles_between_liked_and_unliked() {
    let (_dir, mut store) = open_store();
    let author = user(&mut store);
    let fan = user(&mut store);
    let target = post(&mut store, author);

    assert!(store.like(target, fan).expect("like").is_none());

    let like = store.toggle_like(target, fan).expect("first toggle");
    assert!(like.is_liked);
    assert_eq!(store.like_count(target).expect("count"), 1);
    assert_eq!(store.list_active_likers(target).expect("likers"), vec![fan]);

    let like = store.toggle_like(target, fan).expect("second toggle");
    assert!(!like.is_liked);
    assert_eq!(store.like_count(target).expect("count"), 0);
    assert!(store.list_active_likers(target).expect("likers").is_empty());

    let stored = store.like(target, fan).expect("like").expect("row kept");
    assert!(!stored.is_liked);
}

#[test]
fn likes_are_tracked_per_target_kind() {
    let (_dir, mut store) = open_store();
    let author = user(&mut store);
    let fan = user(&mut store);
    let post_id = store.register_post(author).expect("post");
    let comment = store
        .register_comment(NewComment {
            author,
            post: post_id,
            parent: None,
        })
        .expect("comment");

    // Same raw id, different kinds.
    assert_eq!(post_id.get(), comment.get());
    store
        .toggle_like(TargetRef::Comment(comment), fan)
        .expect("like comment");

    assert_eq!(store.like_count(TargetRef::Post(post_id)).expect("count"), 0);
    assert_eq!(
        store.like_count(TargetRef::Comment(comment)).expect("count"),
        1
    );
}

#[test]
fn like_on_missing_target_is_not_found() {
    let (_dir, mut store) = open_store();
    let fan = user(&mut store);
    let missing = TargetRef::Post(PostId::try_new(42).expect("id"));

    let err = store.toggle_like(missing, fan).expect_err("missing target");
    assert!(matches!(err, StoreError::UnknownTarget(target) if target == missing));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn replies_must_stay_on_their_post() {
    let (_dir, mut store) = open_store();
    let author = user(&mut store);
    let first = store.register_post(author).expect("post");
    let second = store.register_post(author).expect("post");

    let root = store
        .register_comment(NewComment {
            author,
            post: first,
            parent: None,
        })
        .expect("root comment");
    let reply = store
        .register_comment(NewComment {
            author,
            post: first,
            parent: Some(root),
        })
        .expect("reply");

    assert_eq!(
        store
            .content_author(TargetRef::Comment(reply))
            .expect("author"),
        author
    );
    assert!(store.is_reply(reply).expect("is_reply"));
    assert!(!store.is_reply(root).expect("is_reply"));
    assert!(store.has_replies(root).expect("has_replies"));
    assert!(!store.has_replies(reply).expect("has_replies"));

    let err = store
        .register_comment(NewComment {
            author,
            post: second,
            parent: Some(root),
        })
        .expect_err("cross-post reply");
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[test]
fn post_pins_stop_at_the_limit() {
    let (_dir, mut store) = open_store();
    let author = user(&mut store);
    let posts: Vec<TargetRef> = (0..4).map(|_| post(&mut store, author)).collect();

    for target in &posts[..3] {
        let toggle = store.toggle_pin(*target, author).expect("pin");
        assert_eq!(toggle.outcome, PinOutcome::Pinned);
        assert!(toggle.created);
    }
    assert_eq!(
        store
            .active_pin_count(author, TargetKind::Post)
            .expect("count"),
        3
    );

    let err = store.toggle_pin(posts[3], author).expect_err("fourth pin");
    assert!(matches!(
        err,
        StoreError::PinLimitExceeded {
            kind: TargetKind::Post,
            limit: 3
        }
    ));
    assert_eq!(err.kind(), ErrorKind::LimitExceeded);
    assert!(store.pin(posts[3]).expect("pin").is_none());

    // Unpinning works at the limit and frees a slot.
    let toggle = store.toggle_pin(posts[0], author).expect("unpin");
    assert_eq!(toggle.outcome, PinOutcome::Unpinned);
    assert!(!toggle.created);
    assert!(!store.is_pinned(posts[0]).expect("is_pinned"));

    store.toggle_pin(posts[3], author).expect("pin after unpin");
    assert!(store.is_pinned(posts[3]).expect("is_pinned"));
}

#[test]
fn repinning_an_existing_record_skips_the_limit() {
    let (_dir, mut store) = open_store();
    let author = user(&mut store);
    let posts: Vec<TargetRef> = (0..4).map(|_| post(&mut store, author)).collect();

    for target in &posts[..3] {
        store.toggle_pin(*target, author).expect("pin");
    }
    store.toggle_pin(posts[0], author).expect("unpin");
    store.toggle_pin(posts[3], author).expect("pin fourth");

    let toggle = store.toggle_pin(posts[0], author).expect("re-pin");
    assert_eq!(toggle.outcome, PinOutcome::Pinned);
    assert_eq!(
        store
            .active_pin_count(author, TargetKind::Post)
            .expect("count"),
        4
    );
}

#[test]
fn comment_pins_use_their_own_limit() {
    let (_dir, mut store) = open_store();
    let author = user(&mut store);
    let post_id = store.register_post(author).expect("post");
    store
        .toggle_pin(TargetRef::Post(post_id), author)
        .expect("pin post");

    let mut comments = Vec::new();
    for _ in 0..2 {
        let comment = store
            .register_comment(NewComment {
                author,
                post: post_id,
                parent: None,
            })
            .expect("comment");
        comments.push(TargetRef::Comment(comment));
    }

    store.toggle_pin(comments[0], author).expect("pin comment");
    let err = store
        .toggle_pin(comments[1], author)
        .expect_err("second comment pin");
    assert!(matches!(
        err,
        StoreError::PinLimitExceeded {
            kind: TargetKind::Comment,
            limit: 1
        }
    ));

    let pins = store
        .active_pins(author, TargetKind::Comment)
        .expect("active pins");
    assert_eq!(pins.len(), 1);
    assert_eq!(pins[0].target, comments[0]);
}

#[test]
fn only_the_author_may_pin() {
    let (_dir, mut store) = open_store();
    let author = user(&mut store);
    let other = user(&mut store);
    let target = post(&mut store, author);

    let err = store.toggle_pin(target, other).expect_err("foreign pin");
    assert!(matches!(err, StoreError::NotAuthor(denied) if denied == target));
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    assert!(!store.is_pinned(target).expect("is_pinned"));
}

#[test]
fn configured_pin_limit_applies() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = StoreConfig::default().with_pin_limit(TargetKind::Post, 1);
    let mut store = SqliteStore::open_with_config(dir.path(), config).expect("open store");
    assert_eq!(store.pin_limits().post, 1);

    let author = user(&mut store);
    let first = post(&mut store, author);
    let second = post(&mut store, author);

    store.toggle_pin(first, author).expect("pin");
    let err = store.toggle_pin(second, author).expect_err("over limit");
    assert!(matches!(err, StoreError::PinLimitExceeded { limit: 1, .. }));
}
