//! Synchronization tests: every role holds exactly one permission per
//! registered controller, and the admin role always holds all of them.

use rolegate::*;
use std::sync::{MutexGuard, OnceLock};
use tempfile::TempDir;

static TEST_DIR: OnceLock<TempDir> = OnceLock::new();

fn setup(registry: &ControllerRegistry) -> (MutexGuard<'static, ()>, Bootstrap) {
    let lock = test_lock();
    let dir = TEST_DIR.get_or_init(|| TempDir::new().unwrap());
    init(dir.path().to_str().unwrap()).unwrap();
    clear_all().unwrap();
    let b = bootstrap(registry).unwrap();
    (lock, b)
}

fn registry() -> ControllerRegistry {
    ControllerRegistry::new(["UserController", "RoleController"])
}

fn form(label: &str) -> RoleForm {
    RoleForm { label: label.into(), color: "000000".into(), icon: String::new(), active: true }
}

fn create(actor: u64, registry: &ControllerRegistry, label: &str) -> Role {
    match roles::create(actor, registry, Some(&form(label))).unwrap() {
        FormOutcome::Saved(role) => role,
        other => panic!("expected saved role, got {other:?}"),
    }
}

fn labels(role: &Role) -> Vec<&str> {
    role.permissions.iter().map(|p| p.controller_label.as_str()).collect()
}

// ============================================================================
// New roles
// ============================================================================

#[test]
fn new_role_gets_one_permission_per_controller() {
    let reg = registry();
    let (_lock, b) = setup(&reg);

    let editor = create(b.admin.id, &reg, "editor");
    let stored = get_role(editor.id).unwrap().unwrap();

    assert_eq!(stored.permissions.len(), 2);
    assert_eq!(labels(&stored), vec!["UserController", "RoleController"]);
    assert!(stored.permissions.iter().all(|p| p.access == NONE));
    assert_eq!(stored, editor);

    let controllers = list_controllers().unwrap();
    let names: Vec<_> = controllers.iter().map(|c| c.attrs.label.as_str()).collect();
    assert_eq!(names, vec!["UserController", "RoleController"]);
    for p in &stored.permissions {
        assert!(controllers.iter().any(|c| c.id == p.controller));
    }
}

#[test]
fn new_admin_role_gets_all_access() {
    let reg = registry();
    let (_lock, b) = setup(&reg);

    assert_eq!(b.admin.permissions.len(), 2);
    assert!(b.admin.permissions.iter().all(|p| p.access == ALL));
    assert!(b.user.permissions.iter().all(|p| p.access == NONE));

    // A second role named admin cannot exist; the label index is unique per kind.
    match roles::create(b.admin.id, &reg, Some(&form("admin"))).unwrap() {
        FormOutcome::Invalid { role, errors } => {
            assert_eq!(errors, vec!["label: 'admin' is already in use"]);
            assert!(role.permissions.iter().all(|p| p.access == ALL));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn permission_count_tracks_registry_size() {
    for n in [1usize, 3, 6] {
        let mut names = vec!["RoleController".to_string()];
        names.extend((1..n).map(|i| format!("Controller{i}")));
        let reg = ControllerRegistry::new(names);
        let (_lock, b) = setup(&reg);

        let role = create(b.admin.id, &reg, "editor");
        assert_eq!(role.permissions.len(), n);
        assert_eq!(labels(&role), reg.iter().collect::<Vec<_>>());
        assert_eq!(list_controllers().unwrap().len(), n);
    }
}

#[test]
fn controllers_are_shared_between_roles() {
    let reg = registry();
    let (_lock, b) = setup(&reg);

    let a = create(b.admin.id, &reg, "editor");
    let c = create(b.admin.id, &reg, "viewer");
    let ids = |r: &Role| r.permissions.iter().map(|p| p.controller).collect::<Vec<_>>();
    assert_eq!(ids(&a), ids(&c));
    assert_eq!(list_controllers().unwrap().len(), 2);

    let user = find_controller("UserController").unwrap().unwrap();
    // admin, ROLE_USER, editor, viewer
    assert_eq!(list_for_controller(user.id).unwrap().len(), 4);
}

// ============================================================================
// Idempotence
// ============================================================================

#[test]
fn synchronizing_twice_creates_nothing() {
    let reg = registry();
    let (_lock, b) = setup(&reg);

    let editor = create(b.admin.id, &reg, "editor");
    let mut role = get_role(editor.id).unwrap().unwrap();

    let created = transact(|tx| synchronize(tx, &mut role, &reg)).unwrap();
    assert_eq!(created, 0);
    let created = transact(|tx| synchronize(tx, &mut role, &reg)).unwrap();
    assert_eq!(created, 0);

    assert_eq!(role.permissions.len(), 2);
    assert_eq!(get_role(editor.id).unwrap().unwrap(), editor);
}

#[test]
fn synchronizing_keeps_granted_access() {
    let reg = registry();
    let (_lock, b) = setup(&reg);

    let editor = create(b.admin.id, &reg, "editor");
    roles::set_access(b.admin.id, editor.id, "UserController", VIEW | EDIT).unwrap();

    let mut role = get_role(editor.id).unwrap().unwrap();
    transact(|tx| synchronize(tx, &mut role, &reg)).unwrap();
    assert_eq!(get_access(editor.id, "UserController").unwrap(), VIEW | EDIT);
    assert_eq!(get_access(editor.id, "RoleController").unwrap(), NONE);
}

// ============================================================================
// Admin override and registry growth
// ============================================================================

#[test]
fn editing_admin_resets_every_permission_to_all() {
    let reg = registry();
    let (_lock, b) = setup(&reg);

    // The workflow refuses to reduce admin, so drift is staged directly.
    transact(|tx| {
        let ctrl = tx.find_id(StatusKind::Controller, "UserController")?.unwrap();
        tx.set_access(b.admin.id, ctrl, VIEW)
    })
    .unwrap();
    assert_eq!(get_access(b.admin.id, "UserController").unwrap(), VIEW);

    let admin = get_role(b.admin.id).unwrap().unwrap();
    let outcome = roles::edit(b.admin.id, &reg, admin.id, Some(&RoleForm::from_role(&admin))).unwrap();
    assert!(outcome.is_saved());

    let admin = get_role(b.admin.id).unwrap().unwrap();
    assert!(admin.permissions.iter().all(|p| p.access == ALL));
}

#[test]
fn renaming_a_role_to_admin_grants_all() {
    let reg = registry();
    let (_lock, b) = setup(&reg);

    // Free the admin label first; the old admin keeps its rows.
    let old = get_role(b.admin.id).unwrap().unwrap();
    let mut f = RoleForm::from_role(&old);
    f.label = "root".into();
    assert!(roles::edit(b.admin.id, &reg, old.id, Some(&f)).unwrap().is_saved());
    assert_eq!(get_access(old.id, "RoleController").unwrap(), ALL);

    let editor = create(old.id, &reg, "editor");
    let outcome = roles::edit(old.id, &reg, editor.id, Some(&form("admin"))).unwrap();
    assert!(outcome.is_saved());
    assert!(get_role(editor.id).unwrap().unwrap().permissions.iter().all(|p| p.access == ALL));
}

#[test]
fn creating_admin_grants_all_on_every_controller() {
    let reg = registry();
    let (_lock, b) = setup(&reg);

    let mut f = RoleForm::from_role(&b.admin);
    f.label = "root".into();
    assert!(roles::edit(b.admin.id, &reg, b.admin.id, Some(&f)).unwrap().is_saved());

    let admin = create(b.admin.id, &reg, "admin");
    assert_eq!(admin.permissions.len(), 2);
    assert!(admin.permissions.iter().all(|p| p.access == ALL));
    assert_eq!(labels(&admin), vec!["UserController", "RoleController"]);
    assert!(is_bootstrapped().unwrap());
}

#[test]
fn edit_backfills_newly_registered_controllers() {
    let reg = registry();
    let (_lock, b) = setup(&reg);

    let editor = create(b.admin.id, &reg, "editor");
    roles::set_access(b.admin.id, editor.id, "UserController", VIEW).unwrap();

    let grown = ControllerRegistry::new(["UserController", "RoleController", "AuditController"]);

    // Displaying the edit form synchronizes in memory only.
    let shown = roles::edit(b.admin.id, &grown, editor.id, None).unwrap();
    assert_eq!(shown.role().permissions.len(), 3);
    assert_eq!(get_role(editor.id).unwrap().unwrap().permissions.len(), 2);
    assert!(find_controller("AuditController").unwrap().is_none());

    let saved = roles::edit(b.admin.id, &grown, editor.id, Some(&form("editor"))).unwrap();
    assert!(saved.is_saved());

    let stored = get_role(editor.id).unwrap().unwrap();
    assert_eq!(labels(&stored), vec!["UserController", "RoleController", "AuditController"]);
    assert_eq!(get_access(editor.id, "UserController").unwrap(), VIEW);
    assert_eq!(get_access(editor.id, "AuditController").unwrap(), NONE);

    // Roles not edited since keep the old shape.
    assert_eq!(get_role(b.user.id).unwrap().unwrap().permissions.len(), 2);
}
