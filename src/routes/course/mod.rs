mod handler;

pub use handler::{create_course, get_course, list_courses, publish_course, update_course};
