pub mod authentication;
pub mod password;
pub mod policy;
pub mod teacher;

pub use authentication::*;
pub use password::*;
pub use policy::*;
pub use teacher::*;
