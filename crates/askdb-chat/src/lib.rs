//! Question answering over a configured database.
//!
//! Turns one inbound message into one response envelope: free-form chat goes
//! straight to the completion service, database questions run through query
//! generation, guarded execution and answer synthesis. The per-connection
//! session loop lives in [`orchestrator`].

mod call;
pub mod error;
pub mod generator;
pub mod orchestrator;
pub mod pipeline;
pub mod prompts;
pub mod synthesizer;
pub mod types;

pub use error::ChatError;
pub use generator::QueryGenerator;
pub use orchestrator::{MessageTransport, SessionOrchestrator, SessionState};
pub use pipeline::ExchangePipeline;
pub use synthesizer::AnswerSynthesizer;
pub use types::{
    ExchangeData, InboundMessage, Mode, ResponseEnvelope, ResponseStatus, SessionExchange,
};
