pub mod url_filters;

pub use url_filters::{is_js_url, is_static_asset, merge_unique, STATIC_EXTENSIONS};
