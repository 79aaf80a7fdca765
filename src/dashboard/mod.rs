pub mod snapshot;
pub mod summary;

pub use snapshot::{SiteSnapshot, build_all};
pub use summary::Distribution;
