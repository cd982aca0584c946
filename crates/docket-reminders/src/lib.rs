//! Reminder scheduling for Docket action items.
//!
//! Two layers live here:
//!
//! - [`ReminderPolicy`]: pure lead-time arithmetic. Given a priority and a
//!   travel flag it says how many minutes before the due time an alert fires,
//!   and for deadline-style items the full escalation sequence.
//! - [`CalendarBuilder`]: turns action items into [`ReminderArtifact`]s, each
//!   an iCalendar document with one `VALARM` per lead time, ready to be sent
//!   as a file through a message channel.
//!
//! Nothing in this crate performs I/O. The current time is always passed in
//! so results are reproducible.

pub mod calendar;
pub mod ics;
pub mod scheduler;

pub use calendar::{CalendarBuilder, ReminderArtifact};
pub use ics::{CalendarEvent, EventTiming};
pub use scheduler::{ReminderPolicy, default_due};
