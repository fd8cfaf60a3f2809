//! Utility modules
//! 
//! This module contains common utilities used throughout the engine,
//! including error handling, logging setup, clocks and helper functions.

pub mod errors;
pub mod logging;
pub mod helpers;
pub mod clock;

pub use errors::{EventDeskError, Result};
pub use clock::{Clock, SystemClock, FixedClock};
