//! Push Storage Layer
//!
//! Identity verification and device token lookups, backed either by a
//! Supabase project over REST or by a local SQLite database.

mod models;
mod schema;
mod sqlite;
mod supabase;
mod traits;

pub use models::*;
pub use sqlite::SqliteStorage;
pub use supabase::SupabaseStore;
pub use traits::*;

use diesel_migrations::{EmbeddedMigrations, embed_migrations};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");
