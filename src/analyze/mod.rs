pub mod cache_headers;
