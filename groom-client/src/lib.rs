//! Groom Client - persistence adapter for the grooming admin engine
//!
//! Exposes the [`Persistence`] trait (select/insert/update/upsert/delete
//! over named tables plus remote function calls) with two backends:
//! [`RestClient`] speaking PostgREST conventions over HTTP, and
//! [`MemoryStore`] keeping tables in process.

pub mod config;
pub mod error;
pub mod memory;
pub mod persistence;
pub mod query;
pub mod rest;

pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use memory::{MemoryStore, Operation};
pub use persistence::{Persistence, decode_row, decode_rows, encode_rows};
pub use query::{Direction, Filter, FilterOp, Order, Select};
pub use rest::RestClient;
