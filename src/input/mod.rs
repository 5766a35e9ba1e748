pub mod convert;
pub mod datalog;
pub mod schema;

pub use datalog::{DatalogLoader, ShortRowPolicy};
pub use schema::DatalogSchema;
