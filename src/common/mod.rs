pub mod messages;
pub mod options;
pub mod parsing;

pub use self::options::{HttpOptions, MappingOptions, OpenOptions, SearchOptions};
