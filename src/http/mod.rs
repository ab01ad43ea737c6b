pub mod body;
pub mod client;

pub use body::{Payload, RequestBody, Upload};
pub use client::{ApiClient, LOGIN_PATH, PROFILE_PATH, REFRESH_PATH};
