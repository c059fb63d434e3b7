pub mod datalake;
pub mod mongo;
pub mod store;

pub use datalake::{Datalake, DatabaseError};
pub use mongo::MongoStore;
pub use store::{DocumentStore, DocumentStream, FindOptions, StoreError};
