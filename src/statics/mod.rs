//! Static catalog: categories of partially fixed records and their members.
//!
//! A category declares which fields are fixed (set once per member) and
//! which are mutable (set per instance). Members are registered under their
//! category and instances are built from members. Both levels are looked up
//! by case-insensitive name and enumerate in registration order.

mod category;
pub mod document;
mod error;
mod member;
mod registry;
mod table;

pub use category::{Category, CategoryBuilder};
pub use document::{CatalogDocument, CategoryEntry, MemberEntry, load_catalog_from_path};
pub use error::StaticError;
pub use member::{Instance, Member, MemberBuilder};
pub use registry::StaticRegistry;
