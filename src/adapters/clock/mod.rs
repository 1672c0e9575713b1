//! Clock adapters.
//!
//! - **SystemClock** - Host wall clock
//! - **ManualClock** - Test clock advanced by hand

mod manual_clock;
mod system_clock;

pub use manual_clock::ManualClock;
pub use system_clock::SystemClock;
