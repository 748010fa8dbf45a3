pub mod aggregate;
pub mod api;
pub mod config;
pub mod constants;
pub mod emit;
pub mod error;
pub mod io;
pub mod parse;
pub mod planner;
pub mod reconcile;
pub mod reduce;
pub mod runtime;
pub mod stats;
pub mod utils;
pub mod worker;

pub use aggregate::{Aggregate, AggregateMap};
pub use api::Merge;
pub use config::{MalformedPolicy, RunConfig};
pub use emit::{render, render_into, render_string};
pub use error::{CalcError, ParseFailure};
pub use planner::ByteRange;
pub use reduce::{GlobalResult, ReduceStrategy};
pub use runtime::{aggregate_bytes, aggregate_ranges, RunOutcome, RuntimePipeline};
pub use stats::RunStats;
