// Diagnostics: per-session frame counters and rates.

pub mod stats;
