mod common;

use common::{T0, add_issue, add_project, add_user, audit, history_rows, open_store, raw_connection};
use std::sync::{Arc, Barrier};
use std::thread;
use time::Duration;
use time::macros::date;
use tk_core::model::{AssignedProject, IssuePriority, IssueStatus, ProjectDraft, UserDraft};
use tk_storage::{ProjectDeletion, SqliteStore, StoreConfig};

#[test]
fn failed_operation_keeps_earlier_work_of_the_unit() {
    let (_dir, mut store) = open_store();
    let admin = add_user(&mut store, "admin");

    let mut uow = store.unit_of_work().expect("begin");
    let dev = uow
        .insert_user(UserDraft::new("Dev", "dev"), date!(2024 - 02 - 01))
        .expect("first insert");
    let err = uow
        .insert_user(UserDraft::new("Dev again", "dev"), date!(2024 - 02 - 01))
        .expect_err("duplicate username");
    assert_eq!(err.code(), "CONSTRAINT_VIOLATION");
    let project = uow
        .insert_project(ProjectDraft::new("Apollo", date!(2024 - 12 - 31)), &audit(&admin, T0))
        .expect("later insert");
    assert_eq!(uow.read().user(dev.user_id).expect("lookup"), Some(dev.clone()));
    uow.commit().expect("commit");

    assert_eq!(store.read().user(dev.user_id).expect("lookup"), Some(dev));
    assert_eq!(store.read().project(project.project_id).expect("lookup"), Some(project));
}

#[test]
fn dropping_a_unit_of_work_rolls_it_back() {
    let (_dir, mut store) = open_store();
    {
        let mut uow = store.unit_of_work().expect("begin");
        uow.insert_user(UserDraft::new("Temp", "temp"), date!(2024 - 02 - 01))
            .expect("insert");
    }
    assert!(store.read().user_by_username("temp").expect("lookup").is_none());

    let mut uow = store.unit_of_work().expect("begin");
    uow.insert_user(UserDraft::new("Temp", "temp"), date!(2024 - 02 - 01))
        .expect("insert");
    uow.rollback().expect("rollback");
    assert!(store.read().user_by_username("temp").expect("lookup").is_none());
}

#[test]
fn transact_rolls_back_everything_on_error() {
    let (_dir, mut store) = open_store();
    let admin = add_user(&mut store, "admin");

    let err = store
        .transact(|uow| {
            uow.insert_project(ProjectDraft::new("Apollo", date!(2024 - 12 - 31)), &audit(&admin, T0))?;
            uow.insert_user(UserDraft::new("Imposter", "admin"), date!(2024 - 02 - 01))
        })
        .expect_err("second operation fails");
    assert_eq!(err.code(), "CONSTRAINT_VIOLATION");
    assert!(store.read().list_projects().expect("list").is_empty());
}

#[test]
fn writer_lock_timeout_is_a_retryable_transaction_failure() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = StoreConfig {
        busy_timeout_ms: 50,
        ..StoreConfig::in_dir(dir.path())
    };
    let mut holder = SqliteStore::open(config.clone()).expect("first store");
    let mut waiter = SqliteStore::open(config).expect("second store");
    let admin = add_user(&mut holder, "admin");

    let mut held = holder.unit_of_work().expect("first writer takes the lock");
    held.insert_user(UserDraft::new("Held", "held"), date!(2024 - 02 - 01))
        .expect("insert under the lock");

    let err = waiter
        .transact(|uow| {
            uow.insert_project(
                ProjectDraft::new("Blocked", date!(2024 - 12 - 31)),
                &audit(&admin, T0),
            )
        })
        .expect_err("second writer must time out");
    assert_eq!(err.code(), "TRANSACTION_FAILURE");
    assert!(err.is_retryable());

    held.rollback().expect("release the lock");
    assert!(waiter.read().list_projects().expect("list").is_empty());
    assert!(waiter.read().user_by_username("held").expect("lookup").is_none());

    let project = waiter
        .transact(|uow| {
            uow.insert_project(
                ProjectDraft::new("Unblocked", date!(2024 - 12 - 31)),
                &audit(&admin, T0),
            )
        })
        .expect("retry succeeds once the lock is free");
    assert_eq!(project.project_name, "Unblocked");
}

#[test]
fn deleting_a_project_cascades_to_issues_history_and_assignments() {
    let (dir, mut store) = open_store();
    let admin = add_user(&mut store, "admin");
    let project = add_project(&mut store, &admin, "Apollo");
    let other = add_project(&mut store, &admin, "Gemini");
    let first = add_issue(&mut store, &admin, project.project_id, "First");
    let second = add_issue(&mut store, &admin, project.project_id, "Second");
    let survivor = add_issue(&mut store, &admin, other.project_id, "Survivor");

    store
        .transact(|uow| {
            uow.insert_assignment(&AssignedProject::try_new(
                admin.user_id,
                project.project_id,
                "owner",
            )?)?;
            for issue in [&first, &second, &survivor] {
                let mut next = issue.clone();
                next.status = IssueStatus::InProgress;
                next.priority = IssuePriority::Low;
                uow.update_issue(&next, &audit(&admin, T0 + Duration::hours(2)))?;
            }
            Ok(())
        })
        .expect("setup");

    let deletion = store
        .transact(|uow| uow.delete_project(project.project_id))
        .expect("delete project");
    assert_eq!(
        deletion,
        ProjectDeletion {
            issues: 2,
            history_entries: 4,
            assignments: 1,
        }
    );

    assert!(store.read().project(project.project_id).expect("lookup").is_none());
    assert!(store.read().project_members(project.project_id).expect("members").is_empty());
    for issue in [&first, &second] {
        assert!(store.read().issue(issue.issue_id).expect("lookup").is_none());

        let err = store
            .transact(|uow| uow.update_issue(issue, &audit(&admin, T0)))
            .expect_err("update after cascade");
        assert_eq!(err.code(), "NOT_FOUND");
        let err = store
            .transact(|uow| uow.delete_issue(issue.issue_id))
            .expect_err("delete after cascade");
        assert_eq!(err.code(), "NOT_FOUND");
    }
    assert!(store.read().issue(survivor.issue_id).expect("lookup").is_some());

    let conn = raw_connection(&dir);
    assert_eq!(history_rows(&conn, first.issue_id.get()), 0);
    assert_eq!(history_rows(&conn, second.issue_id.get()), 0);
    assert_eq!(history_rows(&conn, survivor.issue_id.get()), 2);

    let err = store
        .transact(|uow| uow.delete_project(project.project_id))
        .expect_err("second delete");
    assert_eq!(err.code(), "NOT_FOUND");
}

#[test]
fn concurrent_writers_both_commit_their_history() {
    let (dir, mut store) = open_store();
    let alice = add_user(&mut store, "alice");
    let bob = add_user(&mut store, "bob");
    let project = add_project(&mut store, &alice, "Apollo");
    let issue = add_issue(&mut store, &alice, project.project_id, "Race me");
    drop(store);

    let barrier = Arc::new(Barrier::new(2));
    let workers = [(alice.clone(), true), (bob.clone(), false)].map(|(actor, closes)| {
        let barrier = Arc::clone(&barrier);
        let path = dir.path().to_path_buf();
        let issue_id = issue.issue_id;
        thread::spawn(move || {
            let mut store = SqliteStore::open(StoreConfig::in_dir(&path)).expect("open per thread");
            barrier.wait();
            store
                .transact(|uow| {
                    let mut next = uow.read().issue(issue_id)?.expect("issue exists");
                    if closes {
                        next.status = IssueStatus::Closed;
                    } else {
                        next.priority = IssuePriority::Critical;
                    }
                    uow.update_issue(&next, &audit(&actor, T0 + Duration::minutes(5)))
                })
                .expect("both writers commit")
        })
    });
    for worker in workers {
        worker.join().expect("worker thread");
    }

    let store = SqliteStore::open(StoreConfig::in_dir(dir.path())).expect("reopen");
    let stored = store
        .read()
        .issue(issue.issue_id)
        .expect("lookup")
        .expect("issue exists");
    assert_eq!(stored.status, IssueStatus::Closed);
    assert_eq!(stored.priority, IssuePriority::Critical);

    let entries = store
        .read()
        .history_for(issue.issue_id)
        .expect("history")
        .collect::<Result<Vec<_>, _>>()
        .expect("rows");
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().any(|entry| {
        entry.changed_by == alice.user_id && entry.new_value.as_deref() == Some("closed")
    }));
    assert!(entries.iter().any(|entry| {
        entry.changed_by == bob.user_id && entry.new_value.as_deref() == Some("critical")
    }));
}
