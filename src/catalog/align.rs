//! Forward-only merge-join cursors over ordered source lists.
//!
//! Every list handed to the aligner is sorted by the same composite identity
//! key as its base list and holds at most one row per key. A cursor only
//! moves when the row under it matches the object currently being built, so
//! an auxiliary list that is out of order or carries keys the base list does
//! not have stops contributing from that row on. That under-matching is
//! silent; nothing here re-sorts, searches ahead or rewinds.
use super::id::{RowTuple, SourceRecord, decode_row};
use anyhow::{Context, Result};
use std::marker::PhantomData;

pub struct Cursor<'a, T> {
    rows: &'a [RowTuple],
    position: usize,
    _record: PhantomData<T>,
}

impl<'a, T: SourceRecord> Cursor<'a, T> {
    pub fn new(rows: &'a [RowTuple]) -> Self {
        Self {
            rows,
            position: 0,
            _record: PhantomData,
        }
    }

    /// Index of the next row that has not been attached yet
    pub fn position(&self) -> usize {
        self.position
    }

    /// Rows not attached so far
    pub fn remaining(&self) -> usize {
        self.rows.len() - self.position
    }

    /// Decode the row under the cursor without consuming it.
    pub fn peek(&self) -> Result<Option<T>> {
        match self.rows.get(self.position) {
            None => Ok(None),
            Some(row) => decode_row::<T>(row)
                .with_context(|| format!("Failed to decode {} row {}", T::SOURCE, self.position))
                .map(Some),
        }
    }

    /// Consume the row under the cursor if its identity key equals `key`.
    pub fn take_if_key(&mut self, key: &T::Key) -> Result<Option<T>> {
        match self.peek()? {
            Some(record) if record.key() == *key => {
                self.position += 1;
                Ok(Some(record))
            }
            _ => Ok(None),
        }
    }

    /// Consume the run of consecutive rows whose identity key equals `key`.
    ///
    /// Used for one-to-many sources such as primary key columns, where
    /// several rows share the key of the object they belong to.
    pub fn take_run(&mut self, key: &T::Key) -> Result<Vec<T>> {
        let mut run = Vec::new();
        while let Some(record) = self.take_if_key(key)? {
            run.push(record);
        }
        Ok(run)
    }
}

/// Decode every row of a base list, in order.
///
/// Base rows define the objects being built, so a row that does not match the
/// declared shape aborts the whole alignment.
pub fn decode_base<T: SourceRecord>(rows: &[RowTuple]) -> impl Iterator<Item = Result<T>> + '_ {
    rows.iter().enumerate().map(|(index, row)| {
        decode_row::<T>(row)
            .with_context(|| format!("Failed to decode base {} row {}", T::SOURCE, index))
    })
}
