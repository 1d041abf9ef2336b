use crate::database::sql_value::SqlValue;

/// How positional parameters are spelled in generated statement text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaceholderStyle {
    /// `?` for every parameter.
    #[default]
    QuestionMark,
    /// `$1, $2, ...` numbered across the whole statement.
    Numbered,
}

impl PlaceholderStyle {
    /// Placeholder for the parameter at zero-based `index`.
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            PlaceholderStyle::QuestionMark => "?".to_string(),
            PlaceholderStyle::Numbered => format!("${}", index + 1),
        }
    }
}

/// The database layer a batch writer executes through.
///
/// Calls are synchronous and blocking: `execute` either reports the number of affected
/// rows or fails with the driver's error, which the writer surfaces unchanged.
pub trait StatementExecutor {
    type Statement;
    type Error: std::error::Error + 'static;

    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::QuestionMark
    }

    fn prepare(&mut self, sql: &str) -> Result<Self::Statement, Self::Error>;

    /// Prepares a statement that is executed once and then dropped, such as a partial
    /// flush. Executors that cache prepared statements should not cache these.
    fn prepare_transient(&mut self, sql: &str) -> Result<Self::Statement, Self::Error> {
        self.prepare(sql)
    }

    fn execute(
        &mut self,
        statement: &mut Self::Statement,
        params: &[SqlValue],
    ) -> Result<u64, Self::Error>;
}

impl<T: StatementExecutor + ?Sized> StatementExecutor for &mut T {
    type Statement = T::Statement;
    type Error = T::Error;

    fn placeholder_style(&self) -> PlaceholderStyle {
        (**self).placeholder_style()
    }

    fn prepare(&mut self, sql: &str) -> Result<Self::Statement, Self::Error> {
        (**self).prepare(sql)
    }

    fn prepare_transient(&mut self, sql: &str) -> Result<Self::Statement, Self::Error> {
        (**self).prepare_transient(sql)
    }

    fn execute(
        &mut self,
        statement: &mut Self::Statement,
        params: &[SqlValue],
    ) -> Result<u64, Self::Error> {
        (**self).execute(statement, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders() {
        assert_eq!(PlaceholderStyle::QuestionMark.placeholder(4), "?");
        assert_eq!(PlaceholderStyle::Numbered.placeholder(0), "$1");
        assert_eq!(PlaceholderStyle::Numbered.placeholder(9), "$10");
        assert_eq!(PlaceholderStyle::default(), PlaceholderStyle::QuestionMark);
    }
}
