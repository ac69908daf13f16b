mod handler;

pub use handler::{login, logout, me, refresh_token, register};
