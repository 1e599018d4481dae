pub mod images;

pub use images::{find_og_image, MediaFetcher};
