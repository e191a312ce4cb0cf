pub mod error;
pub mod parser;
pub mod statement;
pub mod transaction;
pub mod types;

pub use error::{Error, Result};
pub use parser::{parse_statements, read_statements};
pub use statement::{Statement, StatementFields};
pub use transaction::Transaction;
