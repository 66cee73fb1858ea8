pub mod constants;
pub mod string_utils;
pub mod url_utils;

pub use constants::*;
pub use string_utils::{log_excerpt, safe_truncate_chars};
pub use url_utils::{
    Authority, collapse_slashes, percent_decode_lossy, quote_path, split_authority, split_scheme,
};
