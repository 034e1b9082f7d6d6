pub mod user;
pub mod event;
pub mod feedback;

pub use user::*;
pub use event::*;
pub use feedback::*;
