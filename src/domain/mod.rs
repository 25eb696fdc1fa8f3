pub mod chapter;
pub mod series;

pub use chapter::{parse_chapter_number, Chapter, Pane, UserStatus};
pub use series::Series;
