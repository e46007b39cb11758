pub mod answer_pipeline;
pub mod classifier;
pub mod collaborator;
pub mod http_collaborator;
pub mod ledger;
pub mod llm_service;
pub mod pacer;
pub mod report_writer;
pub mod unprepared_writer;

pub use answer_pipeline::{Answer, AnswerPipeline, AnswerSource};
pub use classifier::{classify, Category, ResponseType};
pub use collaborator::{Collaborator, CollaboratorError};
pub use http_collaborator::HttpCollaborator;
pub use ledger::Ledger;
pub use llm_service::LlmService;
pub use pacer::Pacer;
pub use report_writer::ReportWriter;
pub use unprepared_writer::UnpreparedWriter;
