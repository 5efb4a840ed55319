pub mod logging;
pub mod request_id;
pub mod version;

pub use logging::log_requests;
pub use request_id::{request_id, RequestId};
pub use version::version_header;
