//! Compiles upsert update rules into dialect-specific `SET` fragments.
//!
//! An expression field is written in a small mini-language:
//!
//! * `col` - overwrite with the incoming value
//! * `col+ref`, `col-ref`, `col*ref`, `col/ref` - combine the incoming value with the
//!   existing row's `ref` column
//! * `col|ref|d` - `CONCAT_WS` the incoming value and the existing `ref` column with the
//!   single character delimiter `d`

use std::str::FromStr;

use crate::database::error::ConfigurationError;

const OPERATOR_SYMBOLS: [char; 5] = ['+', '-', '*', '/', '|'];

/// How a conflict-resolution clause refers to the incoming (not yet written) row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// `EXCLUDED.col` (PostgreSQL, SQLite).
    Excluded,
    /// `VALUES(col)` (MySQL, MariaDB).
    Values,
}

impl Dialect {
    /// Reference to the incoming value of `column`.
    pub fn incoming_ref(&self, column: &str) -> String {
        match self {
            Dialect::Excluded => format!("EXCLUDED.{}", column),
            Dialect::Values => format!("VALUES({})", column),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Concat { delimiter: char },
    Replace,
}

impl Operator {
    /// Maps an operator symbol to its rule. `|` additionally needs the concat delimiter.
    pub fn from_symbol(symbol: char, delimiter: Option<&str>) -> Result<Self, ConfigurationError> {
        match symbol {
            '+' => Ok(Operator::Add),
            '-' => Ok(Operator::Subtract),
            '*' => Ok(Operator::Multiply),
            '/' => Ok(Operator::Divide),
            '|' => {
                let mut chars = delimiter.unwrap_or_default().chars();
                match (chars.next(), chars.next()) {
                    (Some(delimiter), None) => Ok(Operator::Concat { delimiter }),
                    _ => Err(ConfigurationError::MissingConcatDelimiter(
                        delimiter.unwrap_or_default().to_string(),
                    )),
                }
            }
            other => Err(ConfigurationError::UnsupportedOperator(other)),
        }
    }

    fn arithmetic_symbol(&self) -> Option<char> {
        match self {
            Operator::Add => Some('+'),
            Operator::Subtract => Some('-'),
            Operator::Multiply => Some('*'),
            Operator::Divide => Some('/'),
            Operator::Concat { .. } | Operator::Replace => None,
        }
    }
}

/// A parsed expression field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpressionRule {
    column: String,
    operator: Operator,
    operand: Option<String>,
}

impl ExpressionRule {
    pub fn parse(raw: &str) -> Result<Self, ConfigurationError> {
        if raw.trim().is_empty() {
            return Err(ConfigurationError::EmptyExpression);
        }

        let Some(position) = raw.find(OPERATOR_SYMBOLS) else {
            return Ok(ExpressionRule {
                column: raw.to_string(),
                operator: Operator::Replace,
                operand: None,
            });
        };

        // every operator symbol is a single byte
        let column = &raw[..position];
        let symbol = raw[position..].chars().next().unwrap_or_default();
        let rest = &raw[position + 1..];

        if column.is_empty() {
            return Err(ConfigurationError::MalformedExpression(
                raw.to_string(),
                "missing target column",
            ));
        }

        let (operand, operator) = if symbol == '|' {
            let Some((operand, delimiter)) = rest.split_once('|') else {
                return Err(ConfigurationError::MissingConcatDelimiter(raw.to_string()));
            };
            let operator = Operator::from_symbol(symbol, Some(delimiter))
                .map_err(|_| ConfigurationError::MissingConcatDelimiter(raw.to_string()))?;
            (operand, operator)
        } else {
            (rest, Operator::from_symbol(symbol, None)?)
        };

        if operand.is_empty() {
            return Err(ConfigurationError::MalformedExpression(
                raw.to_string(),
                "missing reference column",
            ));
        }

        if operand.contains(OPERATOR_SYMBOLS) {
            return Err(ConfigurationError::MalformedExpression(
                raw.to_string(),
                "only one operator is allowed",
            ));
        }

        Ok(ExpressionRule {
            column: column.to_string(),
            operator,
            operand: Some(operand.to_string()),
        })
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// The existing-row column referenced by arithmetic and concat rules.
    pub fn operand(&self) -> Option<&str> {
        self.operand.as_deref()
    }

    /// Renders `col = <expr>` for `dialect`, qualifying the existing-row operand with `table`.
    pub fn to_sql(&self, dialect: Dialect, table: &str) -> String {
        let incoming = dialect.incoming_ref(&self.column);

        match (self.operator, self.operand.as_deref()) {
            (Operator::Concat { delimiter }, Some(operand)) => format!(
                "{} = CONCAT_WS('{}', {}, {}.{})",
                self.column,
                escape_literal(delimiter, dialect),
                incoming,
                table,
                operand
            ),
            (operator, Some(operand)) => match operator.arithmetic_symbol() {
                Some(symbol) => {
                    format!("{} = {} {} {}.{}", self.column, incoming, symbol, table, operand)
                }
                None => format!("{} = {}", self.column, incoming),
            },
            (_, None) => format!("{} = {}", self.column, incoming),
        }
    }
}

impl FromStr for ExpressionRule {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExpressionRule::parse(s)
    }
}

// MySQL string literals also treat `\` as an escape character.
fn escape_literal(delimiter: char, dialect: Dialect) -> String {
    match (delimiter, dialect) {
        ('\'', _) => "''".to_string(),
        ('\\', Dialect::Values) => "\\\\".to_string(),
        (other, _) => other.to_string(),
    }
}

/// Compiles every expression field into its `SET` fragment, in order.
pub fn compile_expressions(
    expression_fields: &[String],
    dialect: Dialect,
    table: &str,
) -> Result<Vec<String>, ConfigurationError> {
    expression_fields
        .iter()
        .map(|raw| ExpressionRule::parse(raw).map(|rule| rule.to_sql(dialect, table)))
        .collect()
}
