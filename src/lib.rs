pub mod audio;
pub mod config;
mod logging;
pub mod model;
pub mod note;
pub mod session;
pub mod stt;
mod telemetry;

pub use logging::{init_logging, log_debug, log_file_path};
pub use session::{SessionEvent, SessionHandle, SessionState};
pub use telemetry::init_tracing;
