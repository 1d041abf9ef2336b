/// Raised while configuring a batch writer. Always fatal to construction.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("The number of operations per statement must be 1 or more")]
    InvalidBatchSize,

    #[error("The table name can not be empty")]
    EmptyTableName,

    #[error("The insert field list is empty")]
    EmptyInsertFields,

    #[error("The {0} field list contains an empty column name")]
    EmptyColumnName(&'static str),

    #[error("Conflict fields are required for {0} statements")]
    MissingConflictFields(&'static str),

    #[error("At least one expression field is required for {0} statements")]
    MissingExpressionFields(&'static str),

    #[error("Expression fields are not supported for {0} statements")]
    ExpressionsNotSupported(&'static str),

    #[error("Return fields are not supported for {0} statements")]
    ReturningNotSupported(&'static str),

    #[error("The expression field can not be empty")]
    EmptyExpression,

    #[error("Operator '{0}' not supported")]
    UnsupportedOperator(char),

    #[error("Expression '{0}' is malformed: {1}")]
    MalformedExpression(String, &'static str),

    #[error(
        "Expression '{0}' needs a single character concatenation delimiter, e.g. 'tags|topic|,'"
    )]
    MissingConcatDelimiter(String),
}
