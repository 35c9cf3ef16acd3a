pub mod completion;
pub mod dispatcher;
pub mod prompts;
pub mod response;

pub use completion::{ChatCompletionClient, CompletionBackend};
pub use dispatcher::{Dispatcher, PromptJob};
pub use prompts::{AgentType, resolve_agent};
