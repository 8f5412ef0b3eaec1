//! Metadata filter expressions over station tables
//!
//! Expressions use the dataframe query form, e.g.
//! `lat > 50 and station_name.str.contains('HCN')`.

pub mod lexer;
pub mod parser;

pub use parser::{Expr, Literal, Operand, StrMethod};

use crate::error::{Result, SeastersError};
use crate::models::{FieldValue, StationRecord, StationTable};
use lexer::CmpOp;
use std::cmp::Ordering;
use std::fmt;

/// A parsed filter condition
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    condition: String,
    expr: Expr,
}

impl Filter {
    pub fn parse(condition: &str) -> Result<Self> {
        let expr = lexer::tokenize(condition)
            .and_then(parser::parse)
            .map_err(|message| SeastersError::Filter {
                condition: condition.to_string(),
                message,
            })?;
        Ok(Self {
            condition: condition.to_string(),
            expr,
        })
    }

    pub fn condition(&self) -> &str {
        &self.condition
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Evaluate the condition for one station
    pub fn matches(&self, station: &StationRecord) -> Result<bool> {
        self.check_fields(|name| station.field(name).is_some())?;
        eval(&self.expr, station).map_err(|message| self.error(message))
    }

    /// Keep the stations of `table` that satisfy the condition
    ///
    /// Every referenced field must be a column of the table, even when no
    /// row needs it or the table is empty.
    pub fn apply(&self, mut table: StationTable) -> Result<StationTable> {
        self.check_table(&table)?;
        table.try_retain(|station| {
            eval(&self.expr, station).map_err(|message| self.error(message))
        })?;
        Ok(table)
    }

    /// Fail when the condition names a field that is not a column of `table`
    pub fn check_table(&self, table: &StationTable) -> Result<()> {
        self.check_fields(|name| table.has_field(name))
    }

    fn check_fields<F: Fn(&str) -> bool>(&self, defined: F) -> Result<()> {
        match self.expr.fields().into_iter().find(|name| !defined(name)) {
            Some(name) => Err(self.error(format!("name '{}' is not defined", name))),
            None => Ok(()),
        }
    }

    fn error(&self, message: String) -> SeastersError {
        SeastersError::Filter {
            condition: self.condition.clone(),
            message,
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.condition)
    }
}

impl std::str::FromStr for Filter {
    type Err = SeastersError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

// Fields were checked up front; a station without an extra holds null there
fn resolve(operand: &Operand, station: &StationRecord) -> FieldValue {
    match operand {
        Operand::Field(name) => station.field(name).unwrap_or(FieldValue::Null),
        Operand::Literal(lit) => literal_value(lit),
    }
}

fn literal_value(lit: &Literal) -> FieldValue {
    match lit {
        Literal::Number(n) => FieldValue::Number(*n),
        Literal::Text(s) => FieldValue::Text(s.clone()),
    }
}

fn type_name(value: &FieldValue) -> &'static str {
    match value {
        FieldValue::Number(_) => "number",
        FieldValue::Text(_) => "string",
        FieldValue::Null => "null",
    }
}

fn compare(left: &FieldValue, op: CmpOp, right: &FieldValue) -> std::result::Result<bool, String> {
    let ordering = match (left, right) {
        // Missing values only satisfy `!=`
        (FieldValue::Null, _) | (_, FieldValue::Null) => return Ok(op == CmpOp::Ne),
        (FieldValue::Number(a), FieldValue::Number(b)) => match a.partial_cmp(b) {
            Some(ordering) => ordering,
            None => return Ok(op == CmpOp::Ne),
        },
        (FieldValue::Text(a), FieldValue::Text(b)) => a.cmp(b),
        (a, b) => {
            return Err(format!(
                "'{}' not supported between {} and {}",
                op,
                type_name(a),
                type_name(b)
            ))
        }
    };
    Ok(match op {
        CmpOp::Eq => ordering == Ordering::Equal,
        CmpOp::Ne => ordering != Ordering::Equal,
        CmpOp::Lt => ordering == Ordering::Less,
        CmpOp::Le => ordering != Ordering::Greater,
        CmpOp::Gt => ordering == Ordering::Greater,
        CmpOp::Ge => ordering != Ordering::Less,
    })
}

fn eval(expr: &Expr, station: &StationRecord) -> std::result::Result<bool, String> {
    match expr {
        Expr::And(a, b) => Ok(eval(a, station)? && eval(b, station)?),
        Expr::Or(a, b) => Ok(eval(a, station)? || eval(b, station)?),
        Expr::Not(inner) => Ok(!eval(inner, station)?),
        Expr::Compare { left, op, right } => {
            compare(&resolve(left, station), *op, &resolve(right, station))
        }
        Expr::InList {
            operand,
            values,
            negated,
        } => {
            let value = resolve(operand, station);
            let found = values.iter().any(|lit| literal_value(lit) == value);
            Ok(found != *negated)
        }
        Expr::Str {
            field,
            method,
            pattern,
        } => match station.field(field).unwrap_or(FieldValue::Null) {
            FieldValue::Text(s) => Ok(method.apply(&s, pattern)),
            FieldValue::Null => Ok(false),
            FieldValue::Number(_) => Err(format!(
                "can only use .str accessor with string values, '{}' is a number",
                field
            )),
        },
    }
}
