use serde::{Deserialize, Serialize};

use crate::database::{
    batch_operations::StatementVariant, error::ConfigurationError, fields::FieldSet,
};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    InsertDoNothing,
    InsertIgnore,
    UpsertExcluded,
    UpsertValues,
}

/// Configuration for one batch writer.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BatchManifest {
    pub table: String,

    /// Rows written per full statement.
    pub operations_per_statement: usize,

    pub statement: StatementKind,

    pub insert_fields: Vec<String>,

    /// Required by the upsert statements, ignored by the others.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conflict_fields: Vec<String>,

    /// Update rules such as `name`, `balance+amount` or `tags|topic|,`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expression_fields: Vec<String>,

    /// Columns for a `RETURNING` clause, only valid with `insert_do_nothing`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub return_fields: Vec<String>,
}

impl BatchManifest {
    pub fn field_set(&self) -> Result<FieldSet, ConfigurationError> {
        FieldSet::new(
            self.insert_fields.clone(),
            self.conflict_fields.clone(),
            self.expression_fields.clone(),
        )
    }

    pub fn statement_variant(&self) -> Result<StatementVariant, ConfigurationError> {
        let variant = match self.statement {
            StatementKind::InsertDoNothing => {
                return Ok(StatementVariant::InsertDoNothing {
                    returning: self.return_fields.clone(),
                })
            }
            StatementKind::InsertIgnore => StatementVariant::InsertIgnore,
            StatementKind::UpsertExcluded => StatementVariant::UpsertExcluded,
            StatementKind::UpsertValues => StatementVariant::UpsertValues,
        };

        if !self.return_fields.is_empty() {
            return Err(ConfigurationError::ReturningNotSupported(variant.name()));
        }

        Ok(variant)
    }
}

#[cfg(test)]
mod tests {
    use serde_yaml;

    use super::*;

    #[test]
    fn test_manifest_simple() {
        let yaml = r#"
          table: users
          operations_per_statement: 500
          statement: insert_do_nothing
          insert_fields: [id, name]
          return_fields: [id]
        "#;

        let manifest: BatchManifest = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(manifest.table, "users");
        assert_eq!(manifest.operations_per_statement, 500);
        assert_eq!(manifest.statement, StatementKind::InsertDoNothing);
        assert!(manifest.conflict_fields.is_empty());
        assert_eq!(
            manifest.statement_variant().unwrap(),
            StatementVariant::InsertDoNothing { returning: vec!["id".to_string()] }
        );
    }

    #[test]
    fn test_manifest_upsert() {
        let yaml = r#"
          table: accounts
          operations_per_statement: 100
          statement: upsert_excluded
          insert_fields:
            - id
            - balance
            - tags
          conflict_fields:
            - id
          expression_fields:
            - balance+amount
            - tags|topic|,
        "#;

        let manifest: BatchManifest = serde_yaml::from_str(yaml).unwrap();
        let fields = manifest.field_set().unwrap();

        assert_eq!(manifest.statement_variant().unwrap(), StatementVariant::UpsertExcluded);
        assert_eq!(fields.conflict_fields(), ["id"]);
        assert_eq!(fields.expression_fields(), ["balance+amount", "tags|topic|,"]);
    }

    #[test]
    fn test_manifest_returning_only_on_insert_do_nothing() {
        let yaml = r#"
          table: users
          operations_per_statement: 10
          statement: insert_ignore
          insert_fields: [id]
          return_fields: [id]
        "#;

        let manifest: BatchManifest = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(
            manifest.statement_variant(),
            Err(ConfigurationError::ReturningNotSupported("insert ignore"))
        );
    }

    #[test]
    fn test_manifest_empty_insert_fields() {
        let yaml = r#"
          table: users
          operations_per_statement: 10
          statement: insert_ignore
          insert_fields: []
        "#;

        let manifest: BatchManifest = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(manifest.field_set(), Err(ConfigurationError::EmptyInsertFields));
    }

    #[test]
    fn test_manifest_unknown_statement() {
        let yaml = r#"
          table: users
          operations_per_statement: 10
          statement: merge
          insert_fields: [id]
        "#;

        assert!(serde_yaml::from_str::<BatchManifest>(yaml).is_err());
    }
}
