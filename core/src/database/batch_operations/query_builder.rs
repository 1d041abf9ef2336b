//! SQL text generation for batched multi-row statements.
//!
//! The buffered writer asks a [`StatementBuilder`] for statement text twice in its life
//! cycle: once at configuration for the full batch size, and again on every partial
//! flush for exactly the number of rows buffered.

use crate::database::{
    error::ConfigurationError,
    executor::PlaceholderStyle,
    expression::{compile_expressions, Dialect},
    fields::{ensure_column_names, FieldSet},
};

/// The statement a batch writer emits, fixed at configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementVariant {
    /// `INSERT INTO .. VALUES .. ON CONFLICT DO NOTHING [RETURNING ..]`
    InsertDoNothing { returning: Vec<String> },
    /// `INSERT IGNORE INTO .. VALUES ..`
    InsertIgnore,
    /// `INSERT INTO .. VALUES .. ON CONFLICT (..) DO UPDATE SET ..`
    UpsertExcluded,
    /// `INSERT INTO .. VALUES .. ON DUPLICATE KEY UPDATE ..`
    UpsertValues,
}

impl StatementVariant {
    pub fn insert_do_nothing() -> Self {
        StatementVariant::InsertDoNothing { returning: Vec::new() }
    }

    pub fn dialect(&self) -> Dialect {
        match self {
            StatementVariant::InsertDoNothing { .. } | StatementVariant::UpsertExcluded => {
                Dialect::Excluded
            }
            StatementVariant::InsertIgnore | StatementVariant::UpsertValues => Dialect::Values,
        }
    }

    pub fn is_upsert(&self) -> bool {
        matches!(self, StatementVariant::UpsertExcluded | StatementVariant::UpsertValues)
    }

    pub fn name(&self) -> &'static str {
        match self {
            StatementVariant::InsertDoNothing { .. } => "insert do nothing",
            StatementVariant::InsertIgnore => "insert ignore",
            StatementVariant::UpsertExcluded => "upsert excluded",
            StatementVariant::UpsertValues => "upsert values",
        }
    }
}

/// Formats `(?, ?), (?, ?)` for `row_count` rows of `field_count` columns.
pub fn build_values_clause(
    field_count: usize,
    row_count: usize,
    placeholder_style: PlaceholderStyle,
) -> String {
    (0..row_count)
        .map(|row| {
            let base = row * field_count;
            let placeholders = (0..field_count)
                .map(|column| placeholder_style.placeholder(base + column))
                .collect::<Vec<_>>()
                .join(", ");
            format!("({})", placeholders)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Builds the `INSERT [IGNORE] INTO table (a, b) VALUES ..` head shared by every variant.
pub fn build_insert_body(
    table: &str,
    columns: &[String],
    ignore: bool,
    values_clause: &str,
) -> String {
    format!(
        "INSERT {}INTO {} ({}) VALUES {}",
        if ignore { "IGNORE " } else { "" },
        table,
        columns.join(", "),
        values_clause
    )
}

/// Renders statement text for a configured table, field set and variant.
#[derive(Debug, Clone)]
pub struct StatementBuilder {
    table: String,
    fields: FieldSet,
    variant: StatementVariant,
    placeholder_style: PlaceholderStyle,
    update_clauses: Vec<String>,
}

impl StatementBuilder {
    pub fn new(
        table: impl Into<String>,
        fields: FieldSet,
        variant: StatementVariant,
        placeholder_style: PlaceholderStyle,
    ) -> Result<Self, ConfigurationError> {
        let table = table.into();

        if table.trim().is_empty() {
            return Err(ConfigurationError::EmptyTableName);
        }

        match &variant {
            StatementVariant::UpsertExcluded | StatementVariant::UpsertValues => {
                if fields.conflict_fields().is_empty() {
                    return Err(ConfigurationError::MissingConflictFields(variant.name()));
                }
                if fields.expression_fields().is_empty() {
                    return Err(ConfigurationError::MissingExpressionFields(variant.name()));
                }
            }
            StatementVariant::InsertDoNothing { returning } => {
                if !fields.expression_fields().is_empty() {
                    return Err(ConfigurationError::ExpressionsNotSupported(variant.name()));
                }
                ensure_column_names("return", returning)?;
            }
            StatementVariant::InsertIgnore => {
                if !fields.expression_fields().is_empty() {
                    return Err(ConfigurationError::ExpressionsNotSupported(variant.name()));
                }
            }
        }

        let update_clauses = if variant.is_upsert() {
            compile_expressions(fields.expression_fields(), variant.dialect(), &table)?
        } else {
            Vec::new()
        };

        Ok(StatementBuilder { table, fields, variant, placeholder_style, update_clauses })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    pub fn variant(&self) -> &StatementVariant {
        &self.variant
    }

    pub fn placeholder_style(&self) -> PlaceholderStyle {
        self.placeholder_style
    }

    /// The compiled `SET` fragments, empty for non-upsert variants.
    pub fn update_clauses(&self) -> &[String] {
        &self.update_clauses
    }

    /// Statement text with exactly `row_count` value tuples.
    pub fn build_statement_text(&self, row_count: usize) -> String {
        let values_clause =
            build_values_clause(self.fields.arity(), row_count, self.placeholder_style);
        let insert_fields = self.fields.insert_fields();

        match &self.variant {
            StatementVariant::InsertDoNothing { returning } => {
                let mut query =
                    build_insert_body(&self.table, insert_fields, false, &values_clause);
                query.push_str(" ON CONFLICT DO NOTHING");
                if !returning.is_empty() {
                    query.push_str(&format!(" RETURNING {}", returning.join(", ")));
                }
                query
            }
            StatementVariant::InsertIgnore => {
                build_insert_body(&self.table, insert_fields, true, &values_clause)
            }
            StatementVariant::UpsertExcluded => {
                let mut query =
                    build_insert_body(&self.table, insert_fields, false, &values_clause);
                query.push_str(&format!(
                    " ON CONFLICT ({}) DO UPDATE SET {}",
                    self.fields.conflict_fields().join(", "),
                    self.update_clauses.join(", ")
                ));
                query
            }
            StatementVariant::UpsertValues => {
                let mut query =
                    build_insert_body(&self.table, insert_fields, false, &values_clause);
                query.push_str(&format!(
                    " ON DUPLICATE KEY UPDATE {}",
                    self.update_clauses.join(", ")
                ));
                query
            }
        }
    }
}
