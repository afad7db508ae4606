//! The resolved, ready-to-use form of `council_config::RoleConfig`.

use std::collections::HashMap;

use council_config::{ProviderSelection, ReasoningConfig};

/// A role, fully resolved: canonical name, the mode it was resolved with
/// (if any), and a system prompt that already includes the mode fragment
/// and the Council Deliberation Protocol text.
#[derive(Debug, Clone)]
pub struct Role {
    pub name: String,
    pub mode: Option<String>,
    pub system_prompt: String,
    pub model_pack: Option<String>,
    pub models: HashMap<String, String>,
    pub providers: ProviderSelection,
    pub reasoning: ReasoningConfig,
    pub temperature: f32,
    pub schema: Option<String>,
}
