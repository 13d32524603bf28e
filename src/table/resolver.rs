//! Column-role classification for simulator artifacts.
//!
//! Artifacts either follow the naming convention (`t`, `x<k>`, `y<k>`,
//! `v<k>`, `lam<k>`) or the legacy positional layout `time position
//! velocity`. The resolver runs once per table and its [`Schema`] is passed
//! to every consumer afterwards.

use crate::error::{Error, Result};

use super::Table;

/// How column roles were assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Roles taken from header names.
    Named,
    /// Roles taken from column positions (time, position, velocity).
    Positional,
}

/// Resolved column roles for one table.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    /// Time axis column.
    pub time: usize,
    /// X-coordinate column per body, in table order.
    pub x: Vec<usize>,
    /// Y-coordinate column per body; empty for 1-D tables.
    pub y: Vec<usize>,
    /// Velocity columns, in table order.
    pub velocity: Vec<usize>,
    /// Every remaining column by name, in table order.
    pub extra: Vec<(String, usize)>,
    /// Body id (the `k` suffix) for each entry of `x`.
    pub bodies: Vec<usize>,
    pub layout: Layout,
}

/// Split `name` into `prefix` and a numeric suffix, e.g. `x12` -> 12.
fn indexed(name: &str, prefix: &str) -> Option<usize> {
    let rest = name.strip_prefix(prefix)?;
    if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    rest.parse().ok()
}

impl Schema {
    /// Classify the table's columns.
    pub fn resolve(table: &Table) -> Result<Self> {
        let names = table.column_names();
        let has_conventional = names
            .iter()
            .any(|n| n == "t" || indexed(n, "x").is_some() || indexed(n, "y").is_some());

        if !table.has_header() || !has_conventional {
            return Self::positional(table);
        }

        let time = table.column_index("t").ok_or_else(|| {
            Error::SchemaMismatch(format!(
                "{}: no 't' column among {:?}",
                table.source().display(),
                names
            ))
        })?;

        let mut x = Vec::new();
        let mut y = Vec::new();
        let mut x_ids = Vec::new();
        let mut y_ids = Vec::new();
        let mut velocity = Vec::new();
        let mut extra = Vec::new();

        for (i, name) in names.iter().enumerate() {
            if i == time {
                continue;
            }
            if let Some(k) = indexed(name, "x") {
                x.push(i);
                x_ids.push(k);
            } else if let Some(k) = indexed(name, "y") {
                y.push(i);
                y_ids.push(k);
            } else if indexed(name, "v").is_some() {
                velocity.push(i);
            } else {
                extra.push((name.clone(), i));
            }
        }

        if !y.is_empty() {
            if x.len() != y.len() {
                return Err(Error::SchemaMismatch(format!(
                    "{}: {} x columns but {} y columns",
                    table.source().display(),
                    x.len(),
                    y.len()
                )));
            }
            if let Some(k) = x_ids.iter().zip(&y_ids).position(|(a, b)| a != b) {
                return Err(Error::SchemaMismatch(format!(
                    "{}: body {} pairs x{} with y{}",
                    table.source().display(),
                    k,
                    x_ids[k],
                    y_ids[k]
                )));
            }
        }

        Ok(Self {
            time,
            x,
            y,
            velocity,
            extra,
            bodies: x_ids,
            layout: Layout::Named,
        })
    }

    fn positional(table: &Table) -> Result<Self> {
        let count = table.column_count();
        if count < 3 {
            return Err(Error::SchemaMismatch(format!(
                "{}: positional layout needs time, position and velocity columns, found {}",
                table.source().display(),
                count
            )));
        }
        let names = table.column_names();
        Ok(Self {
            time: 0,
            x: vec![1],
            y: Vec::new(),
            velocity: vec![2],
            extra: (3..count).map(|i| (names[i].clone(), i)).collect(),
            bodies: vec![0],
            layout: Layout::Positional,
        })
    }

    /// Number of bodies (x-coordinate columns).
    pub fn body_count(&self) -> usize {
        self.x.len()
    }

    /// True when every body has both coordinates.
    pub fn is_planar(&self) -> bool {
        !self.x.is_empty() && self.x.len() == self.y.len()
    }

    /// Constraint-force (`lam*`) columns.
    pub fn force_columns(&self) -> impl Iterator<Item = &(String, usize)> {
        self.extra.iter().filter(|(name, _)| name.starts_with("lam"))
    }

    /// Extra column by name.
    pub fn extra(&self, name: &str) -> Option<usize> {
        self.extra.iter().find(|(n, _)| n == name).map(|(_, i)| *i)
    }

    /// (position, velocity) columns used by phase and energy views.
    pub fn phase_pair(&self) -> Result<(usize, usize)> {
        match (self.x.first(), self.velocity.first()) {
            (Some(&x), Some(&v)) => Ok((x, v)),
            _ => Err(Error::SchemaMismatch(
                "phase coordinates need a position and a velocity column".to_string(),
            )),
        }
    }
}
