use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex,
};

use async_trait::async_trait;

use crate::{error::SheetsError, SheetStore};

/// Worksheet kept in process memory.
#[derive(Debug, Default)]
pub struct MemorySheetStore {
    rows: Mutex<Vec<Vec<String>>>,
    worksheet_created: AtomicBool,
    reject_appends: Mutex<Option<String>>,
}

impl MemorySheetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<Vec<String>>) -> Self {
        Self {
            rows: Mutex::new(rows),
            ..Self::default()
        }
    }

    pub fn rows(&self) -> Vec<Vec<String>> {
        self.rows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn worksheet_created(&self) -> bool {
        self.worksheet_created.load(Ordering::SeqCst)
    }

    /// Makes every following append fail with `reason`; `None` restores writes.
    pub fn reject_appends(&self, reason: Option<&str>) {
        *self
            .reject_appends
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = reason.map(str::to_string);
    }
}

#[async_trait]
impl SheetStore for MemorySheetStore {
    async fn ensure_worksheet(&self) -> Result<(), SheetsError> {
        self.worksheet_created.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn first_row(&self) -> Result<Vec<String>, SheetsError> {
        Ok(self
            .rows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .first()
            .cloned()
            .unwrap_or_default())
    }

    async fn append_row(&self, row: &[String]) -> Result<(), SheetsError> {
        if let Some(reason) = self
            .reject_appends
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
        {
            return Err(SheetsError::Rejected(reason));
        }
        self.rows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(row.to_vec());
        Ok(())
    }
}
