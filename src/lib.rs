//! teeshot - Scheduled tee-time claimer
//!
//! Logs into the Golfzon County reservation service ahead of the moment a
//! booking window opens, keeps the session alive, corrects for the service's
//! clock offset, and at the exact instant fetches the tee-time listing and
//! claims the best matching slot.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and the club table
//! - [`client`] - HTTP session, headers and login
//! - [`parser`] - Listing and form extraction from HTML
//! - [`scheduler`] - Clock sync, precision waits and session keep-alive
//! - [`booking`] - Listing fetch, ranking, claim attempts and the run itself
//! - [`models`] - Core data structures and types
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use teeshot::booking::Orchestrator;
//! use teeshot::config::{credentials_from_env, Config};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let target = config.target_config()?;
//!     let credentials = credentials_from_env().expect("credentials in env");
//!
//!     let outcome = Orchestrator::from_config(&config)
//!         .run(&target, credentials, CancellationToken::new())
//!         .await;
//!     println!("{outcome}");
//!     Ok(())
//! }
//! ```

pub mod booking;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod parser;
pub mod scheduler;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::booking::{Orchestrator, RunOutcome, RunSettings, RunStep};
    pub use crate::client::CountySession;
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorCategory, Result, TeeshotErrorTrait};
    pub use crate::models::{
        Candidate, CategoryFilter, Credentials, SortOrder, TargetConfig, TimeWindow,
    };
}

// Direct re-exports for convenience
pub use models::{Candidate, TargetConfig};
