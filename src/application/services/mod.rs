pub mod fallback_resolver;
pub mod image_request_manager;
pub mod pending_requests;
pub mod profile_request_manager;

pub use fallback_resolver::resolve_fallback;
pub use image_request_manager::{
    ImageRequestConfig, ImageRequestManager, ImageTicket, PendingImage,
};
pub use pending_requests::{PendingRequest, PendingRequests, PersistTarget};
pub use profile_request_manager::ProfileRequestManager;
