//! Display formatting functions and result types.
//!
//! Domain models implement [`std::fmt::Display`] directly (see [`models`]);
//! this module adds newtype wrappers for collections and for operation
//! results, so the CLI and the MCP server print identical markdown.
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │  Domain Models  │    │ Wrappers &      │    │   Markdown      │
//! │ (Process, ...)  │───▶│ Result Types    │───▶│  (Terminal/MCP) │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`collections`]: Collection wrapper types (Processes, Steps, Forms)
//! - [`results`]: Operation result types (CreateResult, UpdateResult, DeleteResult)
//! - [`status`]: Status and confirmation messages (OperationStatus)
//! - [`datetime`]: Date/time formatting utilities
//! - [`models`]: Display implementations for domain models
//!
//! ```rust
//! use formflow_core::display::OperationStatus;
//!
//! let done = OperationStatus::success("Published process 3".to_string());
//! assert_eq!(done.to_string(), "Success: Published process 3\n");
//! ```

pub mod collections;
pub mod datetime;
pub mod models;
pub mod results;
pub mod status;

pub use collections::{AbandonedList, FieldSummaries, Forms, Processes, Steps};
pub use datetime::LocalDateTime;
pub use results::{CreateResult, DeleteResult, Resource, UpdateResult};
pub use status::OperationStatus;
