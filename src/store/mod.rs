pub mod codec;
pub mod content;
pub mod library;
pub mod record;

pub use content::{ContentStore, LoadReport};
pub use library::LibraryFile;
pub use record::Record;
