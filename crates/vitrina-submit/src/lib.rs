pub mod coordinator;
pub mod error;
pub mod session;

pub use coordinator::{SubmissionCoordinator, SubmissionState};
pub use error::{SessionError, SubmitError, SubmitStage, ValidationError};
pub use session::EditSession;
