pub mod calendar;
pub mod error;
pub mod money;
pub mod numbering;

pub use calendar::BusinessCalendar;
pub use error::{AppError, Result};
pub use money::Percent;
pub use numbering::{DocumentKind, NumberSequence};
