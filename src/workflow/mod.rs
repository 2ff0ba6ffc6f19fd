pub mod address_flow;
pub mod aggregation;
pub mod lookup_ctx;

pub use address_flow::{AddressFlow, LookupOutcome, RetryPolicy};
pub use aggregation::{
    count_addresses, marker_size, AggregationEngine, FaultPolicy, LookupStatus, MAX_MARKER_SIZE,
    SIZE_MULTIPLIER,
};
pub use lookup_ctx::LookupCtx;
