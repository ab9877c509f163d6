//! Safe construction of the optional `WHERE` predicate shared by the lot
//! listing and counting queries.
//!
//! Filters arrive as text. Every present filter becomes exactly one
//! `AND <column> <op> $<n>` clause and its value is carried as a typed bind
//! argument, never spliced into the SQL text.

use crate::error::LotsError;
use serde::Deserialize;

/// Positional argument bound to a `$<n>` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindArg {
    Int(i32),
    BigInt(i64),
    Text(String),
}

/// Search filters as received from the caller, an empty string means absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LotFilters {
    pub brand: String,
    pub model: String,
    pub min_price: String,
    pub max_price: String,
    pub min_year: String,
    pub max_year: String,
}

impl LotFilters {
    /// Values in the fixed order of [`FILTER_COLUMNS`].
    fn values(&self) -> [&str; 6] {
        [
            &self.brand,
            &self.model,
            &self.min_price,
            &self.max_price,
            &self.min_year,
            &self.max_year,
        ]
    }

    pub fn is_empty(&self) -> bool {
        FILTER_COLUMNS
            .iter()
            .zip(self.values())
            .all(|(column, value)| !column.is_present(value))
    }
}

#[derive(Debug, Clone, Copy)]
enum ValueKind {
    Text,
    Int,
}

struct FilterColumn {
    name: &'static str,
    column: &'static str,
    op: &'static str,
    kind: ValueKind,
    /// `"0"` historically means "no bound" for this filter.
    zero_is_unbounded: bool,
}

impl FilterColumn {
    fn is_present(&self, value: &str) -> bool {
        !value.is_empty() && !(self.zero_is_unbounded && value == "0")
    }

    fn bind_arg(&self, value: &str) -> Result<BindArg, LotsError> {
        match self.kind {
            ValueKind::Text => Ok(BindArg::Text(value.to_string())),
            ValueKind::Int => value
                .trim()
                .parse::<i32>()
                .map(BindArg::Int)
                .map_err(|_| LotsError::InvalidFilter {
                    name: self.name,
                    value: value.to_string(),
                }),
        }
    }
}

const FILTER_COLUMNS: [FilterColumn; 6] = [
    FilterColumn {
        name: "brand",
        column: "b.brand_name",
        op: "=",
        kind: ValueKind::Text,
        zero_is_unbounded: false,
    },
    FilterColumn {
        name: "model",
        column: "m.model_name",
        op: "=",
        kind: ValueKind::Text,
        zero_is_unbounded: false,
    },
    FilterColumn {
        name: "minPrice",
        column: "sl.sale_price",
        op: ">=",
        kind: ValueKind::Int,
        zero_is_unbounded: false,
    },
    FilterColumn {
        name: "maxPrice",
        column: "sl.sale_price",
        op: "<=",
        kind: ValueKind::Int,
        zero_is_unbounded: true,
    },
    FilterColumn {
        name: "minYear",
        column: "c.made_year",
        op: ">=",
        kind: ValueKind::Int,
        zero_is_unbounded: true,
    },
    FilterColumn {
        name: "maxYear",
        column: "c.made_year",
        op: "<=",
        kind: ValueKind::Int,
        zero_is_unbounded: true,
    },
];

/// Accumulates `AND` clauses and their arguments, numbering placeholders from
/// an externally supplied counter so parameters bound ahead of the filters
/// (the viewer id) keep their positions.
#[derive(Debug)]
pub struct PredicateBuilder {
    next_placeholder: usize,
    clauses: Vec<String>,
    args: Vec<BindArg>,
}

impl PredicateBuilder {
    pub fn starting_at(first_placeholder: usize) -> Self {
        Self {
            next_placeholder: first_placeholder,
            clauses: Vec::new(),
            args: Vec::new(),
        }
    }

    /// Appends `AND <column> <op> $<n>` and returns `n`.
    pub fn push(&mut self, column: &str, op: &str, arg: BindArg) -> usize {
        let placeholder = self.next_placeholder;
        self.clauses.push(format!("AND {column} {op} ${placeholder}"));
        self.args.push(arg);
        self.next_placeholder += 1;
        placeholder
    }

    /// Reserves the next placeholder for `arg` without emitting a clause,
    /// used for `LIMIT`/`OFFSET`.
    pub fn push_raw(&mut self, arg: BindArg) -> usize {
        let placeholder = self.next_placeholder;
        self.args.push(arg);
        self.next_placeholder += 1;
        placeholder
    }

    pub fn filters(mut self, filters: &LotFilters) -> Result<Self, LotsError> {
        for (column, value) in FILTER_COLUMNS.iter().zip(filters.values()) {
            if column.is_present(value) {
                let arg = column.bind_arg(value)?;
                self.push(column.column, column.op, arg);
            }
        }
        Ok(self)
    }

    pub fn finish(self) -> Predicate {
        Predicate {
            clauses: self.clauses,
            args: self.args,
            next_placeholder: self.next_placeholder,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub clauses: Vec<String>,
    pub args: Vec<BindArg>,
    /// First placeholder number not used by this predicate.
    pub next_placeholder: usize,
}

impl Predicate {
    pub fn sql(&self) -> String {
        self.clauses.join("\n")
    }
}

pub fn build_predicate(
    filters: &LotFilters,
    first_placeholder: usize,
) -> Result<Predicate, LotsError> {
    Ok(PredicateBuilder::starting_at(first_placeholder)
        .filters(filters)?
        .finish())
}
