// Domain value objects
pub mod scan_state;
pub mod identifiers;
pub mod scan_category;

pub use scan_state::*;
pub use identifiers::*;
pub use scan_category::*;
