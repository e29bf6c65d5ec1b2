//! Terminal rendering of the published [`ViewState`].

use std::io::{self, Write};

use client_core::{AnswerView, ViewState};
use serde_json::Value;
use shared::domain::NormalizedTable;

const MISSING_CELL: &str = "—";
const COLUMN_SEPARATOR: &str = " | ";

pub fn render(state: &ViewState, out: &mut impl Write) -> io::Result<()> {
    match state {
        ViewState::Idle => Ok(()),
        ViewState::Loading => writeln!(out, "Processing..."),
        ViewState::Success(view) => render_answer(view, out),
        ViewState::Failure { message } => writeln!(out, "Error: {message}"),
    }
}

pub fn render_json(state: &ViewState, out: &mut impl Write) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, state)?;
    writeln!(out)
}

fn render_answer(view: &AnswerView, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "Answer")?;
    writeln!(out, "{}", view.answer)?;
    writeln!(out, "Tokens used: {}", view.tokens_used)?;
    writeln!(out)?;
    writeln!(out, "Generated SQL Query")?;
    writeln!(out, "{}", view.query)?;

    if !view.table.is_empty() {
        writeln!(out)?;
        writeln!(out, "Query Results ({} rows)", view.table.row_count())?;
        render_table(&view.table, out)?;
    }
    Ok(())
}

pub fn render_table(table: &NormalizedTable, out: &mut impl Write) -> io::Result<()> {
    let body: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| {
            table
                .columns
                .iter()
                .map(|column| cell_text(NormalizedTable::cell(row, column)))
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = table.columns.iter().map(|c| c.chars().count()).collect();
    for row in &body {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    write_line(out, &table.columns, &widths)?;
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    writeln!(out, "{}", rule.join("-+-"))?;
    for row in &body {
        write_line(out, row, &widths)?;
    }
    Ok(())
}

fn write_line(out: &mut impl Write, cells: &[String], widths: &[usize]) -> io::Result<()> {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect();
    writeln!(out, "{}", padded.join(COLUMN_SEPARATOR).trim_end())
}

pub fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => MISSING_CELL.to_string(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
