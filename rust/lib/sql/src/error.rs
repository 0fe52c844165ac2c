use thiserror::Error;

#[derive(Error, Debug)]
pub enum SQLError {
    #[error("query error: {0}")]
    Query(String),

    #[error("execution error: {0}")]
    Execution(String),

    /// A UNIQUE / CHECK constraint rejected the statement. The message is
    /// SQLite's, e.g. `UNIQUE constraint failed: machines.product_no`.
    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("connection error: {0}")]
    Connection(String),
}

impl SQLError {
    /// True when this is a constraint violation mentioning `column`
    /// (matched as `table.column` or bare `column`).
    pub fn violates(&self, column: &str) -> bool {
        match self {
            SQLError::Constraint(msg) => msg
                .split([':', ',', ' '])
                .map(str::trim)
                .any(|part| part == column || part.rsplit('.').next() == Some(column)),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn violates_matches_qualified_column() {
        let err = SQLError::Constraint("UNIQUE constraint failed: machines.product_no".into());
        assert!(err.violates("product_no"));
        assert!(!err.violates("block_no"));
    }

    #[test]
    fn violates_ignores_other_errors() {
        let err = SQLError::Execution("UNIQUE constraint failed: machines.product_no".into());
        assert!(!err.violates("product_no"));
    }
}
