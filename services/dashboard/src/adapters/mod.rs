pub mod admin;
pub mod http;
pub mod ocr;
pub mod token_store;

pub use admin::AdminApiAdapter;
pub use http::HttpClient;
pub use ocr::OcrApiAdapter;
pub use token_store::FileCredentialStore;
