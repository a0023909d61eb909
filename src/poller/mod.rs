//! Source polling and change detection
//!
//! ```text
//! ┌──────────┐   ┌─────────┐   ┌────────────┐   ┌───────────┐
//! │ FETCHING │──►│ DIFFING │──►│ PUBLISHING │──►│ IDLE-WAIT │──┐
//! └──────────┘   └─────────┘   └────────────┘   └───────────┘  │
//!      ▲   └── source error ───────────────────────►▲          │
//!      └───────────────────────────────────────────────────────┘
//! ```
//!
//! IDLE-WAIT broadcasts `{}` when nothing was published for the keep-alive
//! interval, then sleeps the poll interval.

mod detector;
mod poll_loop;

pub use detector::{ChangeDetector, Classification};
pub use poll_loop::{CycleReport, PollLoop};
