//! Access resolution: library checks, enumerations and premium gating

mod common;

use common::setup;
use libgate::{AccessError, AccessResolver, Library, LibraryCatalog, MemoryDirectory, NewPermission, Role};

// ============================================================================
// Reference scenarios
// ============================================================================

#[test]
fn admin_enumeration_bypasses_bindings() {
    let f = setup();
    f.user("alice", Role::Admin).library("a", true).library("b", true).library("c", false);
    let all = f.permission(NewPermission::named("all-libraries").wildcard());
    f.store.assign_permission_to_role(Role::Admin, all.id).unwrap();

    assert_eq!(f.resolver().get_accessible_libraries_for_user("alice").unwrap(), ["a", "b"]);
}

#[test]
fn direct_binding_grants_only_bound_library() {
    let f = setup();
    f.user("bob", Role::Reader).library("fantasy", true).library("scifi", true);
    let p = f.bound("fantasy-reader", &["fantasy"]);
    f.store.assign_permission_to_user("bob", p.id).unwrap();

    let r = f.resolver();
    assert!(r.user_has_library_access("bob", "fantasy").unwrap());
    assert!(!r.user_has_library_access("bob", "scifi").unwrap());
}

#[test]
fn anonymous_without_permissions_sees_every_enabled_library() {
    let f = setup();
    f.library("a", true).library("b", true).library("hidden", false);

    assert_eq!(f.resolver().get_accessible_libraries_for_anonymous().unwrap(), ["a", "b"]);
}

#[test]
fn premium_through_role() {
    let f = setup();
    f.user("carol", Role::Premium);
    let p = f.permission(NewPermission::named("premium-chapters").premium());
    f.store.assign_permission_to_role(Role::Premium, p.id).unwrap();

    assert!(f.resolver().user_has_premium_chapter_access("carol").unwrap());
}

// ============================================================================
// Single library check
// ============================================================================

#[test]
fn wildcard_grants_unbound_libraries() {
    let f = setup();
    f.user("bob", Role::Reader).user("dana", Role::Reader);
    let all = f.permission(NewPermission::named("all").wildcard());
    f.store.assign_permission_to_user("bob", all.id).unwrap();
    f.store.assign_permission_to_role(Role::Reader, all.id).unwrap();

    let r = f.resolver();
    assert!(r.user_has_library_access("bob", "anything").unwrap());
    assert!(r.user_has_library_access("dana", "anything").unwrap());
}

#[test]
fn role_path_grants_when_direct_does_not() {
    let f = setup();
    f.user("bob", Role::Reader);
    let direct = f.bound("direct", &["fantasy"]);
    let via_role = f.bound("via-role", &["scifi"]);
    f.store.assign_permission_to_user("bob", direct.id).unwrap();
    f.store.assign_permission_to_role(Role::Reader, via_role.id).unwrap();

    let r = f.resolver();
    assert!(r.user_has_library_access("bob", "fantasy").unwrap());
    assert!(r.user_has_library_access("bob", "scifi").unwrap());
    assert!(!r.user_has_library_access("bob", "manga").unwrap());
}

#[test]
fn another_roles_permissions_do_not_apply() {
    let f = setup();
    f.user("bob", Role::Reader);
    let p = f.bound("premium-shelf", &["gold"]);
    f.store.assign_permission_to_role(Role::Premium, p.id).unwrap();

    assert!(!f.resolver().user_has_library_access("bob", "gold").unwrap());
}

#[test]
fn disabled_permissions_grant_nothing() {
    let f = setup();
    f.user("bob", Role::Reader);
    let wild = f.permission(NewPermission::named("wild").wildcard());
    let bound = f.bound("bound", &["fantasy"]);
    f.store.assign_permission_to_user("bob", wild.id).unwrap();
    f.store.assign_permission_to_role(Role::Reader, bound.id).unwrap();
    f.disable(&wild);
    f.disable(&bound);

    let r = f.resolver();
    assert!(!r.user_has_library_access("bob", "fantasy").unwrap());
    assert!(!r.user_has_library_access("bob", "other").unwrap());
}

#[test]
fn reenabling_restores_access() {
    let f = setup();
    f.user("bob", Role::Reader);
    let p = f.bound("p", &["fantasy"]);
    f.store.assign_permission_to_user("bob", p.id).unwrap();
    f.disable(&p);
    assert!(!f.resolver().user_has_library_access("bob", "fantasy").unwrap());

    let mut upd = libgate::PermissionUpdate::from(&p);
    upd.is_enabled = true;
    f.store.update_permission(p.id, upd).unwrap();
    assert!(f.resolver().user_has_library_access("bob", "fantasy").unwrap());
}

#[test]
fn unknown_user_is_denied_not_an_error() {
    let f = setup();
    let all = f.permission(NewPermission::named("all").wildcard());
    f.store.assign_permission_to_user("ghost", all.id).unwrap();

    // bindings exist, but the directory does not know the user
    assert!(!f.resolver().user_has_library_access("ghost", "a").unwrap());
}

#[test]
fn admin_single_check_has_no_bypass() {
    let f = setup();
    f.user("alice", Role::Admin).library("a", true);

    let r = f.resolver();
    assert!(!r.user_has_library_access("alice", "a").unwrap());
    assert_eq!(r.get_accessible_libraries_for_user("alice").unwrap(), ["a"]);
}

#[test]
fn deleting_a_permission_revokes_access() {
    let f = setup();
    f.user("bob", Role::Reader);
    let p = f.bound("p", &["fantasy"]);
    f.store.assign_permission_to_user("bob", p.id).unwrap();
    f.store.delete_permission(p.id).unwrap();

    assert!(!f.resolver().user_has_library_access("bob", "fantasy").unwrap());
}

#[test]
fn anonymous_single_check() {
    let f = setup();
    let r = f.resolver();
    // no fail-open on the single check
    assert!(!r.anonymous_has_library_access("a").unwrap());

    let p = f.bound("public", &["a"]);
    f.store.assign_permission_to_role(Role::Anonymous, p.id).unwrap();
    assert!(r.anonymous_has_library_access("a").unwrap());
    assert!(!r.anonymous_has_library_access("b").unwrap());

    let all = f.permission(NewPermission::named("open").wildcard());
    f.store.assign_permission_to_role(Role::Anonymous, all.id).unwrap();
    assert!(r.anonymous_has_library_access("b").unwrap());
}

// ============================================================================
// Enumeration for users
// ============================================================================

#[test]
fn enumeration_unions_direct_and_role_grants() {
    let f = setup();
    f.user("bob", Role::Reader);
    for (slug, enabled) in [("fantasy", true), ("scifi", true), ("manga", true), ("retired", false)] {
        f.library(slug, enabled);
    }
    let direct = f.bound("direct", &["scifi", "retired"]);
    let via_role = f.bound("via-role", &["fantasy", "scifi", "not-a-library"]);
    f.store.assign_permission_to_user("bob", direct.id).unwrap();
    f.store.assign_permission_to_role(Role::Reader, via_role.id).unwrap();

    assert_eq!(
        f.resolver().get_accessible_libraries_for_user("bob").unwrap(),
        ["fantasy", "scifi"]
    );
}

#[test]
fn enumeration_with_wildcard_returns_every_enabled_library() {
    let f = setup();
    f.user("bob", Role::Reader).library("a", true).library("b", true).library("c", false);
    let all = f.permission(NewPermission::named("all").wildcard());
    f.store.assign_permission_to_role(Role::Reader, all.id).unwrap();

    assert_eq!(f.resolver().get_accessible_libraries_for_user("bob").unwrap(), ["a", "b"]);
}

#[test]
fn enumeration_ignores_disabled_wildcard() {
    let f = setup();
    f.user("bob", Role::Reader).library("a", true).library("b", true);
    let all = f.permission(NewPermission::named("all").wildcard());
    let some = f.bound("some", &["b"]);
    f.store.assign_permission_to_user("bob", all.id).unwrap();
    f.store.assign_permission_to_user("bob", some.id).unwrap();
    f.disable(&all);

    assert_eq!(f.resolver().get_accessible_libraries_for_user("bob").unwrap(), ["b"]);
}

#[test]
fn moderator_enumeration_bypasses_bindings() {
    let f = setup();
    f.user("mod", Role::Moderator).library("x", true).library("y", false);
    assert_eq!(f.resolver().get_accessible_libraries_for_user("mod").unwrap(), ["x"]);
}

#[test]
fn enumeration_without_grants_is_empty() {
    let f = setup();
    f.user("bob", Role::Reader).library("a", true);
    assert!(f.resolver().get_accessible_libraries_for_user("bob").unwrap().is_empty());
}

#[test]
fn enumeration_for_unknown_user_is_an_error() {
    let f = setup();
    f.library("a", true);
    let e = f.resolver().get_accessible_libraries_for_user("nobody").unwrap_err();
    assert!(matches!(e, AccessError::UserNotFound(ref u) if u == "nobody"));
}

// ============================================================================
// Enumeration for anonymous visitors
// ============================================================================

#[test]
fn anonymous_enumeration_with_bindings() {
    let f = setup();
    f.library("public", true).library("members", true);
    let p = f.bound("public-shelf", &["public"]);
    f.store.assign_permission_to_role(Role::Anonymous, p.id).unwrap();

    assert_eq!(f.resolver().get_accessible_libraries_for_anonymous().unwrap(), ["public"]);
}

#[test]
fn anonymous_enumeration_with_wildcard() {
    let f = setup();
    f.library("a", true).library("b", false);
    let all = f.permission(NewPermission::named("open").wildcard());
    f.store.assign_permission_to_role(Role::Anonymous, all.id).unwrap();

    assert_eq!(f.resolver().get_accessible_libraries_for_anonymous().unwrap(), ["a"]);
}

#[test]
fn anonymous_bindings_to_disabled_libraries_only_yield_nothing() {
    let f = setup();
    f.library("open", true).library("closed", false);
    let p = f.bound("closed-shelf", &["closed"]);
    f.store.assign_permission_to_role(Role::Anonymous, p.id).unwrap();

    assert!(f.resolver().get_accessible_libraries_for_anonymous().unwrap().is_empty());
}

#[test]
fn anonymous_with_only_disabled_permissions_falls_open() {
    let f = setup();
    f.library("a", true).library("b", true);
    let p = f.bound("public-shelf", &["a"]);
    f.store.assign_permission_to_role(Role::Anonymous, p.id).unwrap();
    f.disable(&p);

    assert_eq!(f.resolver().get_accessible_libraries_for_anonymous().unwrap(), ["a", "b"]);
}

#[test]
fn anonymous_grants_do_not_reach_users() {
    let f = setup();
    f.user("bob", Role::Reader).library("public", true);
    let p = f.bound("public-shelf", &["public"]);
    f.store.assign_permission_to_role(Role::Anonymous, p.id).unwrap();

    assert!(!f.resolver().user_has_library_access("bob", "public").unwrap());
}

// ============================================================================
// Premium chapters
// ============================================================================

#[test]
fn premium_direct_grant() {
    let f = setup();
    f.user("erin", Role::Reader);
    let p = f.permission(NewPermission::named("gift").premium());
    f.store.assign_permission_to_user("erin", p.id).unwrap();

    assert!(f.resolver().user_has_premium_chapter_access("erin").unwrap());
}

#[test]
fn premium_requires_the_flag() {
    let f = setup();
    f.user("bob", Role::Reader);
    let wild = f.permission(NewPermission::named("all").wildcard());
    f.store.assign_permission_to_user("bob", wild.id).unwrap();
    f.store.assign_permission_to_role(Role::Reader, wild.id).unwrap();

    let r = f.resolver();
    assert!(!r.user_has_premium_chapter_access("bob").unwrap());
    assert!(!r.role_has_access(Role::Reader).unwrap());
}

#[test]
fn premium_ignores_enabled_flag() {
    let f = setup();
    f.user("carol", Role::Premium);
    let p = f.permission(NewPermission::named("premium-chapters").premium());
    f.store.assign_permission_to_role(Role::Premium, p.id).unwrap();
    f.disable(&p);

    let r = f.resolver();
    assert!(r.role_has_access(Role::Premium).unwrap());
    assert!(r.user_has_premium_chapter_access("carol").unwrap());
}

#[test]
fn premium_role_check_is_per_role() {
    let f = setup();
    let p = f.permission(NewPermission::named("premium-chapters").premium());
    f.store.assign_permission_to_role(Role::Premium, p.id).unwrap();

    let r = f.resolver();
    assert!(r.role_has_access(Role::Premium).unwrap());
    assert!(!r.role_has_access(Role::Admin).unwrap());
    assert!(!r.role_has_access(Role::Anonymous).unwrap());
}

#[test]
fn premium_for_unknown_user_is_false() {
    let f = setup();
    let p = f.permission(NewPermission::named("gift").premium());
    f.store.assign_permission_to_user("ghost", p.id).unwrap();
    assert!(!f.resolver().user_has_premium_chapter_access("ghost").unwrap());
}

// ============================================================================
// Collaborator failures
// ============================================================================

struct BrokenCatalog;

impl LibraryCatalog for BrokenCatalog {
    fn list_libraries(&self) -> libgate::Result<Vec<Library>> {
        Err(AccessError::Collaborator("library table unavailable".into()))
    }
}

#[test]
fn library_listing_errors_propagate() {
    let f = setup();
    f.user("bob", Role::Reader);
    let r = AccessResolver::new(&f.store, &f.directory, &BrokenCatalog);

    assert!(matches!(r.get_accessible_libraries_for_user("bob"), Err(AccessError::Collaborator(_))));
    assert!(matches!(r.get_accessible_libraries_for_anonymous(), Err(AccessError::Collaborator(_))));
    // single checks never consult the listing
    assert!(!r.user_has_library_access("bob", "a").unwrap());
}

#[test]
fn directory_seed_drives_decisions() {
    let f = setup();
    let dir = MemoryDirectory::from_json(
        r#"{"users": [{"username": "bob", "role": "reader"}],
            "libraries": [{"slug": "fantasy", "enabled": true}, {"slug": "scifi", "enabled": true}]}"#,
    )
    .unwrap();
    let p = f.bound("fantasy-reader", &["fantasy"]);
    f.store.assign_permission_to_role(Role::Reader, p.id).unwrap();

    let r = AccessResolver::new(&f.store, &dir, &dir);
    assert_eq!(r.get_accessible_libraries_for_user("bob").unwrap(), ["fantasy"]);
}
