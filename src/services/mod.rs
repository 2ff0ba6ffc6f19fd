pub mod geocoding;
pub mod projection;
pub mod report_writer;

pub use geocoding::{GeocodingClient, NominatimClient};
pub use report_writer::ReportWriter;
