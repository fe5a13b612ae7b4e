// Result formatting
// Markdown tables and number rendering for command output


use itertools::Itertools;

use crate::catalog::Entity;

/// Integers print without decimals, everything else with up to three
#[inline]
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.0}", value)
    } else {
        let text = format!("{:.3}", value);
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Column-projected table rendered as a GitHub pipe table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    #[inline]
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row, padding or truncating it to the header width
    #[inline]
    pub fn push_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut row: Vec<String> = cells.into_iter().map(Into::into).collect();
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
    }

    /// Append an entity projected onto the given columns
    #[inline]
    pub fn push_entity(&mut self, entity: &Entity, columns: &[&str], id_column: &str) {
        self.push_row(entity_row(entity, columns, id_column));
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    #[inline]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    #[inline]
    pub fn to_markdown(&self) -> String {
        let widths: Vec<usize> = self
            .headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                self.rows
                    .iter()
                    .map(|row| row[i].chars().count())
                    .chain(std::iter::once(header.chars().count()))
                    .max()
                    .unwrap_or(0)
                    .max(3)
            })
            .collect();

        let render = |cells: &[String]| {
            let inner = cells
                .iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{:<width$}", cell, width = width))
                .join(" | ");
            format!("| {} |", inner)
        };

        let separator = format!(
            "|{}|",
            widths.iter().map(|w| "-".repeat(w + 2)).join("|")
        );

        std::iter::once(render(&self.headers))
            .chain(std::iter::once(separator))
            .chain(self.rows.iter().map(|row| render(row)))
            .join("\n")
    }
}

/// Cells of `entity` for `columns`; the id column is taken from `Entity::id`
#[inline]
pub fn entity_row(entity: &Entity, columns: &[&str], id_column: &str) -> Vec<String> {
    columns
        .iter()
        .map(|column| {
            if *column == id_column {
                entity.id.clone()
            } else {
                entity_cell(entity, column)
            }
        })
        .collect()
}

fn entity_cell(entity: &Entity, column: &str) -> String {
    entity
        .label(column)
        .map(str::to_string)
        .or_else(|| entity.attribute(column).map(format_number))
        .unwrap_or_default()
}

/// Project entities onto `columns`, one row each, in the given order
#[inline]
pub fn entity_table<'a, I>(entities: I, columns: &[&str], id_column: &str) -> Table
where
    I: IntoIterator<Item = &'a Entity>,
{
    let mut table = Table::new(columns.iter().copied());
    for entity in entities {
        table.push_entity(entity, columns, id_column);
    }
    table
}
