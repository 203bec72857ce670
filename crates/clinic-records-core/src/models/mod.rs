//! Domain models for the clinic records system.

mod appointment;
mod diagnosis;
mod illness_history;
mod medicine;
mod person;
mod report;
mod role;
mod sick_leave;
mod specialization;

pub use appointment::*;
pub use diagnosis::*;
pub use illness_history::*;
pub use medicine::*;
pub use person::*;
pub use report::*;
pub use role::*;
pub use sick_leave::*;
pub use specialization::*;
