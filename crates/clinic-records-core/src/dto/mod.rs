//! Transfer records exchanged with callers.
//!
//! Records carry ids instead of embedded entities. Converting an entity into
//! its record is pure; turning a record back into an entity needs lookups and
//! is done by the services.

mod appointment;
mod diagnosis;
mod illness_history;
mod medicine;
mod person;
mod role;
mod sick_leave;
mod specialization;

pub use appointment::*;
pub use diagnosis::*;
pub use illness_history::*;
pub use medicine::*;
pub use person::*;
pub use role::*;
pub use sick_leave::*;
pub use specialization::*;
