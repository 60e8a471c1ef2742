pub mod answers;
pub mod questions;
pub mod rooms;
pub mod teachers;
pub mod votes;

pub use answers::*;
pub use questions::*;
pub use rooms::*;
pub use teachers::*;
pub use votes::*;
