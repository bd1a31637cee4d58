// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Materializes due occurrences of recurring definitions.
//!
//! One call handles every due definition inside a single immediate
//! transaction: either all occurrences are written and every due date is
//! advanced, or nothing changes. Occurrences are dated on their due date,
//! not on the reference date, and each definition is caught up to the
//! reference date so a second call with the same date finds nothing.

use chrono::NaiveDate;
use rusqlite::{Connection, TransactionBehavior, params};

use crate::error::{LedgerError, Result};
use crate::ledger::{RECURRING_COLUMNS, recurring_from_row, recurring_row};
use crate::models::RecurringDefinition;

pub const AUTO_NOTE_TAG: &str = "[auto]";

/// Note stored on a materialized transaction.
pub fn annotate(note: &str) -> String {
    let note = note.trim();
    if note.is_empty() {
        AUTO_NOTE_TAG.to_string()
    } else {
        format!("{note} {AUTO_NOTE_TAG}")
    }
}

/// Runs the scheduler and reports how many transactions were written.
///
/// Failures roll the batch back, are logged, and count as zero processed.
pub fn process_due(conn: &mut Connection, reference: NaiveDate) -> usize {
    match try_process_due(conn, reference) {
        Ok(n) => n,
        Err(e) => {
            tracing::error!(error = %e, %reference, "recurring batch rolled back");
            0
        }
    }
}

/// Same as [`process_due`] but surfaces the failure.
pub fn try_process_due(conn: &mut Connection, reference: NaiveDate) -> Result<usize> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let due = {
        let mut stmt = tx.prepare(&format!(
            "SELECT {RECURRING_COLUMNS} FROM recurring_transactions
             WHERE is_active=1 AND next_due_date<=?1
               AND (end_date IS NULL OR next_due_date<=end_date)
             ORDER BY next_due_date ASC, id ASC"
        ))?;
        let rows = stmt.query_map(params![reference.to_string()], recurring_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(recurring_from_row(row?)?);
        }
        out
    };

    let mut processed = 0;
    for def in &due {
        processed += materialize(&tx, def, reference)?;
    }

    tx.commit()?;
    if processed > 0 {
        tracing::info!(processed, definitions = due.len(), %reference, "materialized recurring transactions");
    }
    Ok(processed)
}

/// Writes every occurrence of `def` due on or before `reference` and moves
/// its due date past them.
fn materialize(conn: &Connection, def: &RecurringDefinition, reference: NaiveDate) -> Result<usize> {
    let note = annotate(&def.note);
    let mut insert = conn.prepare_cached(
        "INSERT INTO transactions(category_id, amount, note, date, recurring_transaction_id)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;

    let mut next_due = def.next_due_date;
    let mut written = 0;
    while next_due <= reference && def.covers(next_due) {
        insert.execute(params![
            def.category_id,
            def.amount.to_string(),
            note,
            next_due.to_string(),
            def.id
        ])?;
        written += 1;
        next_due = def
            .frequency
            .advance(next_due)
            .ok_or_else(|| LedgerError::invalid("next due date", next_due.to_string()))?;
    }
    if written == 0 {
        return Ok(0);
    }

    // Only advance from the date we read; anything else means another run
    // already handled these occurrences.
    let changed = conn.execute(
        "UPDATE recurring_transactions SET next_due_date=?1
         WHERE id=?2 AND next_due_date=?3 AND is_active=1",
        params![
            next_due.to_string(),
            def.id,
            def.next_due_date.to_string()
        ],
    )?;
    if changed != 1 {
        return Err(LedgerError::ConcurrentAdvance(def.id));
    }
    tracing::debug!(definition = def.id, written, %next_due, "advanced recurring definition");
    Ok(written)
}
