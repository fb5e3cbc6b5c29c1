use super::*;
use crate::ValidationError;
use crate::ids::{IssueId, ProjectId, UserId};
use crate::views::Projection;
use time::macros::{date, datetime};

fn audit() -> Audit {
    Audit::new(UserId::new(1), datetime!(2024-03-01 10:00 UTC))
}

fn issue() -> Issue {
    IssueDraft::new(
        ProjectId::new(7),
        "Login button does nothing",
        IssueStatus::Open,
        IssuePriority::High,
    )
    .build(IssueId::new(3), &audit())
    .unwrap()
}

fn json_keys<T: serde::Serialize>(value: &T) -> Vec<String> {
    match serde_json::to_value(value).unwrap() {
        serde_json::Value::Object(map) => map.keys().cloned().collect(),
        other => panic!("expected object, got {other}"),
    }
}

#[test]
fn issue_draft_reports_first_missing_field() {
    let draft = IssueDraft {
        issue_summary: Some("crash on save".to_string()),
        status: Some("open".to_string()),
        project: Some(ProjectId::new(1)),
        ..IssueDraft::default()
    };
    assert_eq!(
        draft.build(IssueId::new(1), &audit()).unwrap_err(),
        ValidationError::MissingField("priority")
    );

    let blank = IssueDraft {
        issue_summary: Some("   ".to_string()),
        ..IssueDraft::new(ProjectId::new(1), "x", IssueStatus::Open, IssuePriority::Low)
    };
    assert_eq!(
        blank.build(IssueId::new(1), &audit()).unwrap_err(),
        ValidationError::BlankField("issue_summary")
    );
}

#[test]
fn issue_draft_rejects_unknown_enumerations() {
    let draft = IssueDraft {
        priority: Some("urgent".to_string()),
        ..IssueDraft::new(ProjectId::new(1), "x", IssueStatus::Open, IssuePriority::Low)
    };
    let err = draft.build(IssueId::new(1), &audit()).unwrap_err();
    assert_eq!(
        err,
        ValidationError::InvalidValue {
            field: "priority",
            value: "urgent".to_string()
        }
    );
    assert_eq!(err.field(), "priority");

    assert!("reopened".parse::<IssueStatus>().is_err());
    assert_eq!(" in_progress ".parse::<IssueStatus>(), Ok(IssueStatus::InProgress));
}

#[test]
fn issue_draft_stamps_creation_and_modification() {
    let issue = issue();
    assert_eq!(issue.created_on, date!(2024 - 03 - 01));
    assert_eq!(issue.created_by, UserId::new(1));
    assert_eq!(issue.last_modification_on, issue.created_on);
    assert_eq!(issue.last_modification_by, issue.created_by);
}

#[test]
fn issue_draft_deserializes_from_partial_json() {
    let draft: IssueDraft = serde_json::from_value(serde_json::json!({
        "issue_summary": "Broken link",
        "status": "open",
        "priority": "low",
        "project": 4,
        "target_resolution_date": "2024-05-01"
    }))
    .unwrap();
    let issue = draft.build(IssueId::new(9), &audit()).unwrap();
    assert_eq!(issue.project, ProjectId::new(4));
    assert_eq!(issue.target_resolution_date, Some(date!(2024 - 05 - 01)));
    assert_eq!(issue.issue_description, None);
}

#[test]
fn diff_lists_changed_fields_in_declaration_order() {
    let before = issue();
    let mut after = before.clone();
    after.priority = IssuePriority::Low;
    after.status = IssueStatus::Closed;
    after.assigned_to = Some(UserId::new(5));

    let changes = before.diff(&after);
    assert_eq!(
        changes,
        vec![
            FieldChange {
                field: IssueField::AssignedTo,
                old_value: None,
                new_value: Some("5".to_string()),
            },
            FieldChange {
                field: IssueField::Status,
                old_value: Some("open".to_string()),
                new_value: Some("closed".to_string()),
            },
            FieldChange {
                field: IssueField::Priority,
                old_value: Some("high".to_string()),
                new_value: Some("low".to_string()),
            },
        ]
    );
    assert!(before.diff(&before).is_empty());
}

#[test]
fn diff_ignores_audit_fields() {
    let before = issue();
    let mut after = before.clone();
    after.created_by = UserId::new(99);
    after.last_modification_on = date!(2030 - 01 - 01);
    assert!(before.diff(&after).is_empty());
}

#[test]
fn revised_keeps_identity_and_creation_stamp() {
    let before = issue();
    let mut edited = before.clone();
    edited.issue_id = IssueId::new(100);
    edited.created_by = UserId::new(42);
    edited.resolution_summary = Some("fixed".to_string());

    let later = Audit::new(UserId::new(2), datetime!(2024-04-02 08:30 UTC));
    let revised = before.revised(&edited, &later);
    assert_eq!(revised.issue_id, before.issue_id);
    assert_eq!(revised.created_by, before.created_by);
    assert_eq!(revised.last_modification_by, UserId::new(2));
    assert_eq!(revised.last_modification_on, date!(2024 - 04 - 02));
    assert_eq!(revised.resolution_summary.as_deref(), Some("fixed"));
}

#[test]
fn issue_field_names_round_trip() {
    for field in IssueField::TRACKED {
        assert_eq!(field.as_str().parse::<IssueField>(), Ok(field));
    }
    assert!("created_by".parse::<IssueField>().is_err());
}

#[test]
fn issue_short_view_excludes_audit_metadata() {
    let keys = json_keys(&issue().short());
    for audit_key in [
        "created_on",
        "created_by",
        "last_modification_on",
        "last_modification_by",
    ] {
        assert!(!keys.iter().any(|key| key == audit_key), "{audit_key} leaked");
    }
    assert_eq!(keys.len(), 12);
}

#[test]
fn issue_long_view_has_every_declared_field() {
    let mut keys = json_keys(&issue().long());
    keys.sort();
    let mut expected = vec![
        "issue_id",
        "issue_summary",
        "issue_description",
        "assigned_to",
        "status",
        "label",
        "priority",
        "target_resolution_date",
        "actual_resolution_date",
        "progress",
        "resolution_summary",
        "created_on",
        "created_by",
        "last_modification_on",
        "last_modification_by",
        "project",
    ];
    expected.sort();
    assert_eq!(keys, expected);

    let value = serde_json::to_value(issue().long()).unwrap();
    assert_eq!(value["status"], "open");
    assert_eq!(value["created_on"], "2024-03-01");
}

#[test]
fn project_views_split_editable_and_audit_fields() {
    let project = ProjectDraft {
        label: Some(serde_json::json!({"colors": ["red", "blue"], "tags": {"ui": true}})),
        ..ProjectDraft::new("Website", date!(2024 - 12 - 31))
    }
    .build(ProjectId::new(2), &audit())
    .unwrap();

    let short = project.short();
    assert_eq!(short.label, project.label);
    assert_eq!(json_keys(&short).len(), 5);

    let long = project.long();
    assert_eq!(long.created_by, UserId::new(1));
    assert_eq!(long.modified_on, None);
    assert_eq!(json_keys(&long).len(), 9);
}

#[test]
fn user_and_assignment_views() {
    let user = UserDraft::new("Ada Lovelace", "ada")
        .build(UserId::new(4), date!(2024 - 01 - 15))
        .unwrap();
    assert_eq!(json_keys(&user.short()), vec!["user_id", "user_name"]);
    assert_eq!(user.long().username, "ada");

    let assignment = AssignedProject::try_new(UserId::new(4), ProjectId::new(2), "owner").unwrap();
    assert_eq!(assignment.short(), assignment.long());
    assert_eq!(
        AssignedProject::try_new(UserId::new(4), ProjectId::new(2), " ").unwrap_err(),
        ValidationError::BlankField("user_role")
    );
}
