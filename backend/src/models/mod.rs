pub mod directory;
pub mod finance;
pub mod ids;
pub mod macros;
pub mod partner;
pub mod scholarship;
pub mod time;
pub mod timetable;

pub use directory::*;
pub use finance::*;
pub use ids::*;
pub use partner::*;
pub use scholarship::*;
pub use time::*;
pub use timetable::*;
