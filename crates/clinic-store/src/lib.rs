//! Clinic Store
//!
//! Independent, per-entity local record stores behind a uniform asynchronous
//! handle. Each store owns one kind of record (patients, doctors, appointments,
//! medicines, admins, logins) and is the sole mutator of its contents.
//!
//! # Core Concepts
//!
//! - [`Record`]: insertion-ordered mapping of field names to [`Value`]s
//! - [`Key`]: integer or string identity of a record within its store
//! - [`Schema`]: key field, key generation and indexed fields of a store
//! - [`StoreHandle`]: async get/get_all/put/add/delete/count contract
//! - [`MemoryStore`]: in-process implementation with mutation events
//! - [`Seeder`]: first-run population from static JSON sources
//!
//! # Consistency
//!
//! Every operation is atomic against its own store. There is no transaction
//! spanning two stores: a reader that visits store A and then store B may see B
//! at a later point in time than A.
//!
//! # Example
//!
//! ```rust,ignore
//! use clinic_store::{MemoryStore, Record, Schema, StoreHandle};
//!
//! # async fn example() -> Result<(), clinic_store::StoreError> {
//! let patients = MemoryStore::shared(Schema::new("patients").auto_increment());
//! let key = patients
//!     .add(Record::new().with("First", "John").with("Last", "Doe"))
//!     .await?;
//! assert_eq!(patients.count().await?, 1);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod handle;
pub mod memory;
pub mod schema;
pub mod seed;
pub mod value;

pub use error::{StoreError, StoreResult};
pub use handle::{MutationEvent, MutationKind, StoreHandle};
pub use memory::MemoryStore;
pub use schema::{IndexSpec, Schema};
pub use seed::{
    FieldMapping, FileSeedSource, HttpSeedSource, SeedMode, SeedPlan, SeedReport, SeedSource,
    Seeder,
};
pub use value::{Key, Record, Value};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with clinic stores
    pub use crate::{
        Key, MemoryStore, MutationEvent, MutationKind, Record, Schema, StoreError, StoreHandle,
        StoreResult, Value,
    };
}
