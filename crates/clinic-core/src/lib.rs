//! Clinic Core
//!
//! Wires the stores, the view layer and credentials into one clinic:
//!
//! - [`Clinic`]: explicit store connections, render binder and configuration
//! - [`Entity`]: catalog of store schemas and seed plans
//! - [`views`]: the standard appointment joins and page view definitions
//! - [`ClinicConfig`]: TOML configuration with defaults for every field
//!
//! # Example
//!
//! ```rust,ignore
//! use clinic_core::{Clinic, ClinicConfig, Entity};
//! use clinic_view::MemoryTarget;
//!
//! # async fn example() -> clinic_core::ClinicResult<()> {
//! let clinic = Clinic::in_memory(ClinicConfig::load("clinic.toml")?);
//! clinic.seed_from_config().await?;
//!
//! let table = MemoryTarget::shared("appointmentsTableBody");
//! let definition = clinic.table(Entity::Appointments).expect("appointments have a table");
//! clinic.bind(table.clone(), definition).await;
//! println!("{}", table.render_text());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod catalog;
pub mod clinic;
pub mod config;
pub mod error;
pub mod views;

pub use catalog::{new_patient, Entity};
pub use clinic::{Clinic, ClinicStores, DashboardCounts};
pub use config::{AuthConfig, ClinicConfig, SeedConfig, SentinelConfig};
pub use error::{ClinicError, ClinicResult};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with a clinic
    pub use crate::{Clinic, ClinicConfig, ClinicError, ClinicResult, ClinicStores, Entity};
}
