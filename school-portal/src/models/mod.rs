pub mod action;
pub mod fees;
pub mod user;

pub use action::ActionResult;
pub use fees::{to_minor_units, AmountError};
pub use user::{Session, User, UserRow};
