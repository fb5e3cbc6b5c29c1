#![forbid(unsafe_code)]

use super::{Reader, StoreError};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use tracing::{debug, warn};

/// A write transaction. Released by `commit`, `rollback` or drop; drop rolls
/// back. Each operation runs in its own savepoint, so a failed call leaves
/// the earlier work of the unit in place.
#[derive(Debug)]
pub struct UnitOfWork<'conn> {
    tx: Transaction<'conn>,
    history_page_size: usize,
}

impl<'conn> UnitOfWork<'conn> {
    pub(crate) fn begin(
        conn: &'conn mut Connection,
        history_page_size: usize,
    ) -> Result<Self, StoreError> {
        // IMMEDIATE takes the writer lock up front so concurrent units of
        // work queue here instead of failing at their first write.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        debug!("unit of work started");
        Ok(Self {
            tx,
            history_page_size,
        })
    }

    pub fn commit(self) -> Result<(), StoreError> {
        match self.tx.commit() {
            Ok(()) => {
                debug!("unit of work committed");
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "unit of work commit failed");
                Err(StoreError::TransactionFailure(err))
            }
        }
    }

    pub fn rollback(self) -> Result<(), StoreError> {
        self.tx.rollback()?;
        debug!("unit of work rolled back");
        Ok(())
    }

    /// Reads see the uncommitted writes of this unit of work.
    pub fn read(&self) -> Reader<'_> {
        Reader::new(&self.tx, self.history_page_size)
    }

    pub(crate) fn atomic<T>(
        &mut self,
        op: &'static str,
        f: impl FnOnce(&Connection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let savepoint = self.tx.savepoint()?;
        match f(&savepoint) {
            Ok(value) => {
                savepoint.commit()?;
                Ok(value)
            }
            Err(err) => {
                debug!(op, code = err.code(), error = %err, "operation rolled back");
                Err(err)
            }
        }
    }
}
