pub mod session;
pub mod tokens;

pub use session::{Credentials, Session, UserProfile};
pub use tokens::{FileTokenStore, MemoryTokenStore, TokenPair, TokenStore};
