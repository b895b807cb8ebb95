pub mod client;
pub mod dispatcher;
mod errors;

pub use client::{
    ChatCompletionsBackend, PromptTemplate, RevisionBackend, RevisionClient, ServiceSettings,
    DEFAULT_ENDPOINT, DEFAULT_MODEL, DEFAULT_TIMEOUT,
};
pub use dispatcher::{
    CancellationToken, Dispatcher, Progress, ProgressObserver, RevisionTable, SilentProgress,
    DEFAULT_POOL_SIZE,
};
pub use errors::RevisionError;
