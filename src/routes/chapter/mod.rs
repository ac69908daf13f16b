mod handler;

pub use handler::{create_chapter, update_chapter, update_video};
