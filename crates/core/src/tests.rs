use super::*;
use crate::guards::first_denial;
use crate::visibility::{ProfileAccess, can_view_full_profile};
use std::collections::BTreeMap;

fn uid(value: i64) -> IdentityId {
    IdentityId::try_new(value).unwrap()
}

type Edges = BTreeMap<(IdentityId, IdentityId), RelationState>;

#[test]
fn row_ids_must_be_positive() {
    assert_eq!(IdentityId::try_new(0).unwrap_err(), IdError::NotPositive);
    assert_eq!(PostId::try_new(-4).unwrap_err(), IdError::NotPositive);
    assert_eq!(CommentId::try_new(7).unwrap().get(), 7);
    assert_eq!(uid(12).to_string(), "u:12");
}

#[test]
fn target_ref_rebuilds_from_columns() {
    let post = TargetRef::from_parts("post", 3).unwrap();
    assert_eq!(post, TargetRef::Post(PostId::try_new(3).unwrap()));
    assert_eq!(post.kind(), TargetKind::Post);
    assert_eq!(post.to_string(), "post:3");

    let comment = TargetRef::from_parts("comment", 9).unwrap();
    assert_eq!(comment.kind(), TargetKind::Comment);
    assert_eq!(comment.raw_id(), 9);

    assert_eq!(
        TargetRef::from_parts("story", 1).unwrap_err(),
        target::TargetError::UnknownKind
    );
    assert_eq!(
        TargetRef::from_parts("post", 0).unwrap_err(),
        target::TargetError::InvalidId(IdError::NotPositive)
    );
}

#[test]
fn target_ref_serializes_as_tagged_pair() {
    let target = TargetRef::Comment(CommentId::try_new(5).unwrap());
    let json = serde_json::to_value(target).unwrap();
    assert_eq!(json, serde_json::json!({"kind": "comment", "id": 5}));
}

#[test]
fn relation_state_names_are_stable() {
    for state in [
        RelationState::Follows,
        RelationState::Blocks,
        RelationState::Requested,
    ] {
        assert_eq!(RelationState::parse(state.as_str()).unwrap(), state);
    }
    assert!(RelationState::parse("follows").is_err());
    assert_eq!(RelationState::for_follow(true), RelationState::Requested);
    assert_eq!(RelationState::for_follow(false), RelationState::Follows);
}

#[test]
fn follow_is_denied_for_self_and_blocked_pairs() {
    let (a, b) = (uid(1), uid(2));
    let mut edges = Edges::new();

    assert_eq!(
        RelationAction::Follow.first_denial(&edges, a, a).unwrap(),
        Some(Guard::NotIdentical)
    );
    assert_eq!(RelationAction::Follow.first_denial(&edges, a, b).unwrap(), None);

    edges.insert((b, a), RelationState::Blocks);
    assert_eq!(
        RelationAction::Follow.first_denial(&edges, a, b).unwrap(),
        Some(Guard::NotBlocked)
    );

    edges.clear();
    edges.insert((a, b), RelationState::Follows);
    assert_eq!(
        RelationAction::Follow.first_denial(&edges, a, b).unwrap(),
        Some(Guard::StateNotAlreadySet(RelationState::Follows))
    );

    edges.insert((a, b), RelationState::Blocks);
    assert_eq!(
        RelationAction::Follow.first_denial(&edges, a, b).unwrap(),
        Some(Guard::NotAlreadyBlocked)
    );
}

#[test]
fn pending_request_passes_follow_guards() {
    // The store itself rejects the duplicate request.
    let (a, b) = (uid(1), uid(2));
    let mut edges = Edges::new();
    edges.insert((a, b), RelationState::Requested);
    assert_eq!(RelationAction::Follow.first_denial(&edges, a, b).unwrap(), None);
}

#[test]
fn unblock_requires_an_active_block() {
    let (a, b) = (uid(1), uid(2));
    let mut edges = Edges::new();
    assert_eq!(
        RelationAction::Unblock.first_denial(&edges, a, b).unwrap(),
        Some(Guard::AlreadyBlocked)
    );
    edges.insert((a, b), RelationState::Blocks);
    assert_eq!(RelationAction::Unblock.first_denial(&edges, a, b).unwrap(), None);
}

#[test]
fn accept_and_decline_look_at_the_reverse_edge() {
    let (owner, requester) = (uid(1), uid(2));
    let mut edges = Edges::new();
    edges.insert((owner, requester), RelationState::Requested);
    assert_eq!(
        RelationAction::Accept
            .first_denial(&edges, owner, requester)
            .unwrap(),
        Some(Guard::IsRequested)
    );

    edges.clear();
    edges.insert((requester, owner), RelationState::Requested);
    for action in [RelationAction::Accept, RelationAction::Decline] {
        assert_eq!(action.first_denial(&edges, owner, requester).unwrap(), None);
    }
}

#[test]
fn guards_short_circuit_left_to_right() {
    let a = uid(1);
    let mut edges = Edges::new();
    edges.insert((a, a), RelationState::Blocks);
    let denial = first_denial(
        &[Guard::NotIdentical, Guard::NotBlocked, Guard::NotAlreadyBlocked],
        &edges,
        a,
        a,
    )
    .unwrap();
    assert_eq!(denial, Some(Guard::NotIdentical));
}

#[test]
fn every_action_has_a_guard_list_and_a_name() {
    for action in RelationAction::ALL {
        assert!(!action.guards().is_empty());
        assert_eq!(RelationAction::parse(action.as_str()), Some(action));
    }
    assert_eq!(
        Guard::StateNotAlreadySet(RelationState::Blocks).to_string(),
        "state_not_already_set(BLOCKS)"
    );
}

#[test]
fn pin_limits_default_and_partial_json() {
    let limits = PinLimits::default();
    assert_eq!(limits.limit(TargetKind::Post), 3);
    assert_eq!(limits.limit(TargetKind::Comment), 1);
    assert!(limits.admits(TargetKind::Comment, 0));
    assert!(!limits.admits(TargetKind::Comment, 1));

    let parsed: PinLimits = serde_json::from_str(r#"{"post": 10}"#).unwrap();
    assert_eq!(parsed.post, 10);
    assert_eq!(parsed.comment, 1);
    assert!(serde_json::from_str::<PinLimits>(r#"{"story": 1}"#).is_err());
}

#[test]
fn profile_visibility_rules() {
    let public = ProfileAccess::default();
    assert!(can_view_full_profile(public));

    let private = ProfileAccess {
        owner_is_private: true,
        ..ProfileAccess::default()
    };
    assert!(!can_view_full_profile(private));
    assert!(can_view_full_profile(ProfileAccess {
        viewer_follows_owner: true,
        ..private
    }));
}

#[test]
fn target_kinds_parse_their_own_names() {
    for kind in TargetKind::ALL {
        assert_eq!(TargetKind::parse(kind.as_str()), Ok(kind));
        assert_eq!(kind.to_string(), kind.as_str());
    }
    assert!(TargetKind::parse("story").is_err());
}
