//! Builds the `ActionType -> ActionTool` dispatch table from config,
//! mirroring `vc-providers`' match-on-`kind` factory shape.

use std::collections::HashMap;
use std::sync::Arc;

use vc_domain::config::{ActionsConfig, AuthConfig};
use vc_domain::types::ActionType;

use crate::tools::{ActionTool, WebhookActionTool};

fn resolve_bearer(auth: &AuthConfig) -> Option<String> {
    if let Some(key) = &auth.key {
        return Some(key.clone());
    }
    auth.env.as_ref().and_then(|var| std::env::var(var).ok())
}

/// One [`WebhookActionTool`] per action type with a configured URL. Types
/// with no entry are left unregistered; a plan step that reaches one fails
/// with "no tool registered" rather than panicking at startup.
pub fn build_dispatch_table(config: &ActionsConfig) -> HashMap<ActionType, Arc<dyn ActionTool>> {
    let bearer = resolve_bearer(&config.auth);
    let mut table: HashMap<ActionType, Arc<dyn ActionTool>> = HashMap::new();
    for action_type in ActionType::ALL {
        if let Some(url) = config.webhooks.get(action_type.as_str()) {
            table.insert(*action_type, Arc::new(WebhookActionTool::new(url.clone(), action_type.as_str(), bearer.clone())));
        }
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_configured_action_types_get_a_tool() {
        let mut config = ActionsConfig::default();
        config.webhooks.insert("book_meeting".into(), "https://example.com/book".into());
        let table = build_dispatch_table(&config);
        assert!(table.contains_key(&ActionType::BookMeeting));
        assert!(!table.contains_key(&ActionType::SendSms));
    }

    #[test]
    fn no_webhooks_configured_yields_an_empty_table() {
        let table = build_dispatch_table(&ActionsConfig::default());
        assert!(table.is_empty());
    }
}
