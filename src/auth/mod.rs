pub mod demo;
pub mod sessions;
pub mod users;

pub use demo::{DemoMode, DEMO_PASSWORD, DEMO_USER_ID, HEADLESS_ENV};
pub use sessions::{SessionManager, SessionRecord, SESSIONS_FILE};
pub use users::{hash_password, verify_password, UserStore, USERS_FILE};
