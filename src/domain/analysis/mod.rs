pub mod csv_export;
pub mod latency_analysis;
