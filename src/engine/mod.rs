//! Core engine: the poll → quote → gate → swap loop.

pub mod scheduler;
pub mod cycle;
pub mod outcome;
