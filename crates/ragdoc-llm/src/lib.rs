//! Language-model collaborators: chat message normalization, provider
//! selection, an OpenAI-compatible chat-completions client and web search.
pub mod messages;
pub mod openai;
pub mod provider;
pub mod search;

pub use messages::{compose_messages, last_user_message, normalize_messages, ChatMessage, RawMessage};
pub use provider::{GroqModel, LanguageModel, ModelFactory, OpenAiModel, Provider, ProviderRegistry};
pub use search::{search_context, SearchResult, TavilySearch, WebSearch};
