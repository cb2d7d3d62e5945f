//! PostgreSQL persistence for the Showrunner generation engine.
//!
//! [`PgGenerationStore`] implements the four store contracts from
//! `showrunner-core` over one connection pool; [`PgChangeFeed`] delivers
//! change notifications over `LISTEN`/`NOTIFY`.

pub mod feed;
pub mod pg_store;
pub mod schema;

pub use feed::{CHANGE_CHANNEL, ChangeEnvelope, PgChangeFeed};
pub use pg_store::PgGenerationStore;
