//! Bundled adapter tools
//!
//! Each tool is a thin translation layer: validated arguments in, one
//! vendor call (or a start-then-poll sequence) out, wrapped in the uniform
//! envelope. Tools hold their clients and credential store by injection;
//! nothing here is process-global.

pub mod datetime;
pub mod design;
pub mod mail;

pub use datetime::ParseDatetimeTool;
pub use design::{ExportDesignTool, ExportStatusTool};
pub use mail::{ListMessagesTool, SendMessageTool};

use crate::clients::{AdapterConfig, DesignClient, MailClient};
use crate::poll::PollConfig;
use crate::server::Tool;
use courier_auth::CredentialStore;
use std::sync::Arc;

/// Build all bundled tools against one adapter configuration.
///
/// # Example
///
/// ```rust,no_run
/// use courier_auth::{CredentialStore, Provider, ProviderConfig};
/// use courier_mcp::clients::AdapterConfig;
/// use courier_mcp::tools::all_tools;
/// use std::sync::Arc;
///
/// let provider = ProviderConfig::new(Provider::Google, "id", "secret", "http://localhost/cb");
/// let store = Arc::new(CredentialStore::new("token.json", provider));
/// let tools = all_tools(&AdapterConfig::default(), store);
/// println!("Available tools: {}", tools.len());
/// ```
pub fn all_tools(config: &AdapterConfig, store: Arc<CredentialStore>) -> Vec<Arc<dyn Tool>> {
    let timeout = config.timeout();
    let mail = MailClient::new(config.mail.clone(), timeout);
    let design = DesignClient::new(config.design.clone(), timeout);
    let poll = PollConfig::from_millis(config.poll_interval_ms, config.poll_deadline_ms);

    vec![
        Arc::new(ListMessagesTool::new(mail.clone(), store.clone())),
        Arc::new(SendMessageTool::new(mail, store.clone())),
        Arc::new(ExportDesignTool::new(design.clone(), store.clone(), poll)),
        Arc::new(ExportStatusTool::new(design, store)),
        Arc::new(ParseDatetimeTool),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_auth::{Provider, ProviderConfig};

    fn store() -> Arc<CredentialStore> {
        let provider =
            ProviderConfig::new(Provider::Custom, "id", "secret", "http://localhost/cb");
        Arc::new(CredentialStore::new("/tmp/courier-test-token.json", provider))
    }

    #[test]
    fn test_all_tools_count() {
        let tools = all_tools(&AdapterConfig::default(), store());
        assert_eq!(tools.len(), 5);
    }

    #[test]
    fn test_all_tools_unique_names() {
        let tools = all_tools(&AdapterConfig::default(), store());
        let mut names = std::collections::HashSet::new();

        for tool in tools {
            let def = tool.definition();
            assert!(
                names.insert(def.name.clone()),
                "Duplicate tool name: {}",
                def.name
            );
        }
    }
}
