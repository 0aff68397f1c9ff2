//! Clinic View Layer
//!
//! Sits between independent record stores and the UI. Turns query results into
//! View Rows by resolving foreign keys across stores, and keeps render targets
//! (tables, dropdowns) in sync as stores change.
//!
//! # Architecture
//!
//! ```text
//! mutation → RenderBinder ─┬→ RecordQuery::fetch ──→ [Record]
//!                          ├→ JoinResolver ──→ ViewCache ──→ StoreHandle::get
//!                          └→ RenderTarget::replace_children([RenderUnit])
//! ```
//!
//! The query/resolve step ([`ViewDefinition::rows`]) is pure data; only the
//! binder touches a [`RenderTarget`].
//!
//! # Consistency
//!
//! A join reads the base store and then each target store separately. There is
//! no transaction across stores, so a View Row may combine a base record with a
//! referenced record observed at a later point in time (read skew). This is
//! accepted: every mutation schedules a fresh pass, and the newest pass wins.
//!
//! # Example
//!
//! ```rust,ignore
//! use clinic_view::{AllRecords, JoinBinding, JoinResolver, MemoryTarget, RenderBinder, ViewDefinition};
//!
//! # async fn example(appointments: StoreRef, patients: StoreRef) {
//! let resolver = JoinResolver::new(vec![
//!     JoinBinding::one("patient_id", patients, "patient")
//!         .with_label(["First", "Last"])
//!         .with_sentinel("Unknown Patient"),
//! ]);
//! let definition = ViewDefinition::new(AllRecords::new(appointments), resolver, |row| {
//!     format!("{} | {}", row.text("id"), row.label("patient"))
//! });
//!
//! let binder = RenderBinder::default();
//! let target = MemoryTarget::shared("appointmentsTableBody");
//! let view = binder.bind(target.clone(), definition).await;
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod binder;
pub mod cache;
pub mod config;
pub mod error;
pub mod query;
pub mod resolver;
pub mod row;
pub mod state;
pub mod target;

pub use binder::{BoundView, PassOutcome, RenderBinder, RowRenderer, ViewDefinition};
pub use cache::{CacheStats, ViewCache};
pub use config::ViewConfig;
pub use error::{ViewError, ViewResult};
pub use query::{AllRecords, IndexedRecords, RecordQuery, TextSearch};
pub use resolver::{Cardinality, JoinBinding, JoinResolver};
pub use row::{JoinedField, Resolved, ResolvedRef, ViewRow};
pub use state::{allowed_transitions, validate_transition, ViewState};
pub use target::{MemoryTarget, RenderTarget, RenderUnit, TargetSnapshot};

/// Shared handle to a store
pub type StoreRef = std::sync::Arc<dyn clinic_store::StoreHandle>;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for building bound views
    pub use crate::{
        AllRecords, BoundView, IndexedRecords, JoinBinding, JoinResolver, MemoryTarget,
        PassOutcome, RecordQuery, RenderBinder, RenderTarget, RenderUnit, Resolved, StoreRef,
        TextSearch, ViewConfig, ViewDefinition, ViewRow, ViewState,
    };
}
