//!  Storage is organized through [repository::EntryStorage] and [repository::RateStorage].
//!  The basic idea is:
//!   - There is a data directory with 2 json documents, one for entries and one for rates.
//!   - Every change reads the whole document, mutates it in memory and rewrites it.
//!   - Anything that implements the traits can be used instead, statistics never touch files.

pub mod entities;
pub mod json_store;
pub mod repository;
