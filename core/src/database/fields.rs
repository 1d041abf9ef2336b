use crate::database::error::ConfigurationError;

/// The column lists a batch writer is configured with.
///
/// * `insert_fields` - columns written for every row, in parameter order
/// * `conflict_fields` - the uniqueness constraint an upsert resolves against
/// * `expression_fields` - raw update rules, see [`crate::ExpressionRule`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSet {
    insert_fields: Vec<String>,
    conflict_fields: Vec<String>,
    expression_fields: Vec<String>,
}

impl FieldSet {
    pub fn new<I, C, E>(
        insert_fields: I,
        conflict_fields: C,
        expression_fields: E,
    ) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator,
        I::Item: Into<String>,
        C: IntoIterator,
        C::Item: Into<String>,
        E: IntoIterator,
        E::Item: Into<String>,
    {
        let insert_fields: Vec<String> = insert_fields.into_iter().map(Into::into).collect();
        let conflict_fields: Vec<String> = conflict_fields.into_iter().map(Into::into).collect();
        let expression_fields: Vec<String> =
            expression_fields.into_iter().map(Into::into).collect();

        if insert_fields.is_empty() {
            return Err(ConfigurationError::EmptyInsertFields);
        }

        ensure_column_names("insert", &insert_fields)?;
        ensure_column_names("conflict", &conflict_fields)?;

        Ok(FieldSet { insert_fields, conflict_fields, expression_fields })
    }

    /// Shorthand for a plain insert with no conflict or expression fields.
    pub fn insert_only<I>(insert_fields: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self::new(insert_fields, Vec::<String>::new(), Vec::<String>::new())
    }

    pub fn insert_fields(&self) -> &[String] {
        &self.insert_fields
    }

    pub fn conflict_fields(&self) -> &[String] {
        &self.conflict_fields
    }

    pub fn expression_fields(&self) -> &[String] {
        &self.expression_fields
    }

    /// Number of values every queued row must carry.
    pub fn arity(&self) -> usize {
        self.insert_fields.len()
    }
}

pub(crate) fn ensure_column_names(
    kind: &'static str,
    names: &[String],
) -> Result<(), ConfigurationError> {
    if names.iter().any(|name| name.trim().is_empty()) {
        return Err(ConfigurationError::EmptyColumnName(kind));
    }
    Ok(())
}
