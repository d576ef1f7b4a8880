//! # Vapor Game Store Client
//!
//! A fixed catalog of store operations, each bound to a server-side stored
//! procedure, driven by an interactive console and a JSON HTTP API.
//!
//! ## Invocation Pipeline
//!
//! ```text
//! token
//!     ↓
//! [Catalog::lookup]             → Action
//!     ↓
//! [Parameter::validate]         → raw strings accepted or re-prompted
//!     ↓
//! [invoke::bind]                → PreparedCall (typed positional slots)
//!     ↓
//! [invoke::execute]             → Connection (memory or postgres)
//!     ↓
//! Outcome: Rows | Empty | Success(generated id?) | Failure
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vapor::backend::memory::{MemoryDatabase, Response};
//! use vapor::{invoke, Arguments, Catalog};
//!
//! let catalog = Catalog::game_store();
//! let db = MemoryDatabase::new();
//! db.respond("vapor.insert_user", Response::GeneratedId(17));
//!
//! let action = catalog.lookup("ca").unwrap();
//! let mut arguments = Arguments::new();
//! arguments.insert("username".into(), "alice".into());
//! arguments.insert("join_date".into(), "2024-01-01".into());
//!
//! let mut conn = db.connection();
//! let outcome = invoke(action, &arguments, &mut conn).await?;
//! ```

pub mod action;
pub mod backend;
pub mod config;
pub mod console;
pub mod error;
pub mod invoke;
pub mod logging;
pub mod server;
pub mod value;

pub use action::requirement::{Rejection, Requirement};
pub use action::{Action, Catalog, CatalogError, Classification, Parameter, StatementKind};
pub use backend::{Connection, ConnectionProvider, PreparedCall};
pub use config::Config;
pub use error::{BindingError, ConfigError, ExecutionFailure, VaporError, VaporResult};
pub use invoke::{invoke, Arguments, Outcome, ResultTable};
pub use value::{SemanticType, SqlValue};
