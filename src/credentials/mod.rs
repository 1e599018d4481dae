pub mod acquirer;
pub mod cookies;
pub mod webdriver;

pub use acquirer::{CredentialAcquirer, ProfileCookieAcquirer};
pub use cookies::{Credential, CredentialSet};
pub use webdriver::WebDriverCookieAcquirer;
