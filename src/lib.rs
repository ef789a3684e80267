//! Database Schema Tool
//!
//! One hand-edited YAML schema definition is the source of truth; spreadsheet
//! documentation, SQL DDL, entity-relationship diagrams and arbitrary
//! template output are derived from it.
//!
//! ## Pipeline
//!
//! ```text
//! source (.yml / .xlsx)
//!   -> parse        model::parse
//!   -> link         link          reverse foreign keys per target table
//!   -> expand       fixed         fixed columns into every table
//!   -> verify       verify        names, data types, foreign keys
//!   -> filter       filter        schema/table/column wildcard patterns
//!   -> render       render        yaml | xlsx | plantuml | template | sql
//! ```
//!
//! ## Source format
//!
//! ```yaml
//! fixed:
//!   - {na: created_at, ty: datetime, nu: Y}
//! schemas:
//!   - name: shop
//!     tables:
//!       - name: orders
//!         title: Orders
//!         columns:
//!           - {na: id, ty: int, id: Y}
//!           - [user_id, int, ~, Y, ~, ~, users.id, "*:1"]
//! ```

pub mod config;
pub mod error;
pub mod filter;
pub mod fixed;
pub mod link;
pub mod model;
pub mod pattern;
pub mod pipeline;
pub mod render;
pub mod verify;

pub use config::DstConfig;
pub use error::{Result, SchemaError};
pub use filter::{filter, Selection};
pub use fixed::{compact_fixed_columns, expand_fixed_columns};
pub use link::{derive_references, link_references, LinkWarning};
pub use model::{Column, DataDef, ForeignColumn, Reference, Schema, Table};
pub use pattern::{wildcard_match, WildcardPattern};
pub use render::{renderer_for, resolve_output, write_output, DdlOperation, Renderer};
pub use verify::{verify, Diagnostic, DiagnosticCode, Diagnostics};
