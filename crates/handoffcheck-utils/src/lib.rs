pub mod error;
pub mod exit_codes;
pub mod logging;
pub mod ring_buffer;
pub mod trace_id;
