//! Services layer (ports + adapters).
//!
//! - `ports`: contracts/types the kernel and app depend on.
//! - `adapters`: OS specific implementations (IO, resource lookup, settings).

pub mod adapters;
pub mod ports;
