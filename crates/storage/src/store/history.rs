#![forbid(unsafe_code)]

use super::rows::{
    HISTORY_COLUMNS, ensure_user_ref_tx, exists_tx, from_unix_ms, history_from_row, to_sqlite_i64,
    unix_ms,
};
use super::{StoreError, UnitOfWork};
use rusqlite::{Connection, params};
use std::collections::VecDeque;
use tk_core::ids::IssueId;
use tk_core::model::{ChangeEntry, ChangeRecord};
use tracing::debug;

impl UnitOfWork<'_> {
    /// Appends one entry to an issue's change history.
    pub fn record_change(&mut self, record: ChangeRecord) -> Result<ChangeEntry, StoreError> {
        self.atomic("record_change", |conn| {
            if !exists_tx(conn, "issues", "issue_id", record.issue_id.get())? {
                return Err(StoreError::ConstraintViolation(format!(
                    "issue_id references missing issue {}",
                    record.issue_id
                )));
            }
            ensure_user_ref_tx(conn, "changed_by", record.changed_by)?;
            append_change_tx(conn, record)
        })
    }
}

pub(crate) fn append_change_tx(
    conn: &Connection,
    mut record: ChangeRecord,
) -> Result<ChangeEntry, StoreError> {
    let changed_on_ms = unix_ms(record.changed_on);
    // Stored precision is milliseconds; hand back exactly what was written.
    record.changed_on = from_unix_ms(changed_on_ms)
        .map_err(|_| StoreError::InvalidInput("changed_on out of range"))?;

    conn.execute(
        r#"
        INSERT INTO change_history(issue_id, changed_field, old_value, new_value,
                                   changed_on_ms, changed_by)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
        params![
            record.issue_id.get(),
            record.changed_field.as_str(),
            record.old_value,
            record.new_value,
            changed_on_ms,
            record.changed_by.get(),
        ],
    )?;
    let entry_id = conn.last_insert_rowid();
    debug!(
        issue_id = %record.issue_id,
        field = record.changed_field.as_str(),
        entry_id,
        "change recorded"
    );
    Ok(ChangeEntry::from_record(entry_id, record))
}

pub(crate) fn delete_issue_history_tx(
    conn: &Connection,
    issue_id: IssueId,
) -> Result<usize, StoreError> {
    Ok(conn.execute(
        "DELETE FROM change_history WHERE issue_id=?1",
        params![issue_id.get()],
    )?)
}

/// Lazy, restartable iterator over an issue's change history ordered by
/// `(changed_on, entry_id)`. Rows are fetched one page at a time behind a
/// keyset cursor.
#[derive(Debug)]
pub struct IssueHistory<'conn> {
    conn: &'conn Connection,
    issue_id: IssueId,
    page_size: usize,
    cursor: Option<(i64, i64)>,
    buffer: VecDeque<ChangeEntry>,
    exhausted: bool,
}

impl<'conn> IssueHistory<'conn> {
    pub(crate) fn new(conn: &'conn Connection, issue_id: IssueId, page_size: usize) -> Self {
        Self {
            conn,
            issue_id,
            page_size: page_size.max(1),
            cursor: None,
            buffer: VecDeque::new(),
            exhausted: false,
        }
    }

    pub fn issue_id(&self) -> IssueId {
        self.issue_id
    }

    /// Starts over from the oldest entry.
    pub fn restart(&mut self) {
        self.cursor = None;
        self.buffer.clear();
        self.exhausted = false;
    }

    fn fetch_page(&mut self) -> Result<(), StoreError> {
        let (after_ms, after_id) = self.cursor.unwrap_or((i64::MIN, i64::MIN));
        let limit = to_sqlite_i64(self.page_size)?;
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {HISTORY_COLUMNS} FROM change_history \
             WHERE issue_id=?1 AND (changed_on_ms > ?2 OR (changed_on_ms = ?2 AND entry_id > ?3)) \
             ORDER BY changed_on_ms ASC, entry_id ASC \
             LIMIT ?4"
        ))?;
        let rows = stmt.query_map(
            params![self.issue_id.get(), after_ms, after_id, limit],
            history_from_row,
        )?;
        let page = rows.collect::<Result<Vec<_>, _>>()?;

        if page.len() < self.page_size {
            self.exhausted = true;
        }
        if let Some(last) = page.last() {
            self.cursor = Some((unix_ms(last.changed_on), last.entry_id));
        }
        self.buffer.extend(page);
        Ok(())
    }
}

impl Iterator for IssueHistory<'_> {
    type Item = Result<ChangeEntry, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() && !self.exhausted {
            if let Err(err) = self.fetch_page() {
                self.exhausted = true;
                return Some(Err(err));
            }
        }
        self.buffer.pop_front().map(Ok)
    }
}
