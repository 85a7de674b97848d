//! Types shared between the database and API representations.

pub mod ballot;
pub mod election;
