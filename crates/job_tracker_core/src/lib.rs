pub mod ai;
pub mod applications;
pub mod attachments;
pub mod domain;
pub mod ownership;
pub mod ports;
pub mod validation;

pub use ai::{AiGateway, CoverLetterRequest, FitAnalysisRequest, FollowUpRequest};
pub use applications::ApplicationService;
pub use attachments::DocumentAttachmentManager;
pub use domain::{
    Application, ApplicationFields, ApplicationInput, ApplicationStatus, DocumentRef, DocumentSlot,
    FileUpload, User, UserCredentials,
};
pub use ports::{
    ApplicationStore, CredentialStore, ObjectStorage, PortError, PortResult, TextGenerationService,
};
