//! # Chef Core
//!
//! State and model access for the meal-planning assistant.
//!
//! ## Core Concepts
//! - **Provider**: Trait-based access to the hosted model (Gemini)
//! - **Preferences**: Dietary restrictions, allergies, likes and dislikes
//! - **Pantry**: Tracked ingredients with quantities
//! - **History**: The last approved meal plans
//! - **Session**: One user's bundle of the above

pub mod history;
pub mod pantry;
pub mod preferences;
pub mod provider;
pub mod session;

pub use history::{HistoryEntry, MealHistory, MAX_HISTORY};
pub use pantry::{Pantry, PantryItem, PantryOutcome, DEFAULT_QUANTITY};
pub use preferences::{
    extract_keywords, extract_pantry_items, PreferenceCategory, PreferenceUpdate, Preferences,
};
pub use provider::gemini::ModelInfo;
pub use provider::{
    ChatMessage, CompletionRequest, CompletionResponse, FinishReason, GeminiProvider,
    LlmProvider, ProviderConfig, ProviderError, Role, StreamChunk, StreamReceiver, ToolCall,
    ToolDefinition, Usage, UsageTracker, GEMINI_BASE_URL, GEMINI_DEFAULT_MODEL,
};
pub use session::{Session, SessionManager, MAX_CONVERSATION_LINES};
