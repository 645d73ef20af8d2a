//! Utility functions shared across modules.

mod naming;

pub use naming::is_valid_name;
