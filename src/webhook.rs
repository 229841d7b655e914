//! Slash command webhook payload
//!
//! Mattermost posts the command as form fields. Any key may in principle
//! repeat, so the raw payload is kept as `key -> [values]` and normalized
//! once into an [`InboundCommand`].

use std::collections::HashMap;

/// Raw webhook arguments, every key mapped to all of its values in arrival order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WebhookArgs(HashMap<String, Vec<String>>);

impl WebhookArgs {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut args: HashMap<String, Vec<String>> = HashMap::new();
        for (key, value) in pairs {
            args.entry(key.into()).or_default().push(value.into());
        }
        Self(args)
    }

    /// First value of `key`, which is the authoritative one.
    pub fn first(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }
}

/// A slash command after normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboundCommand {
    pub token: Option<String>,
    pub channel_name: Option<String>,
    pub command_name: Option<String>,
    pub text: Option<String>,
}

impl From<&WebhookArgs> for InboundCommand {
    fn from(args: &WebhookArgs) -> Self {
        let first = |key: &str| args.first(key).map(String::from);
        Self {
            token: first("token"),
            channel_name: first("channel_name"),
            command_name: first("command"),
            text: first("text"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_value_is_authoritative() {
        let args = WebhookArgs::from_pairs([
            ("text", "repo-a"),
            ("token", "T"),
            ("text", "repo-b"),
        ]);

        assert_eq!(args.first("text"), Some("repo-a"));
        assert_eq!(args.0["text"], ["repo-a", "repo-b"]);
        assert_eq!(args.first("missing"), None);
    }

    #[test]
    fn test_inbound_command_from_args() {
        let args = WebhookArgs::from_pairs([
            ("token", "T"),
            ("channel_name", "ci"),
            ("command", "/build"),
            ("text", "myrepo dev"),
            ("user_name", "alice"),
        ]);
        let cmd = InboundCommand::from(&args);

        assert_eq!(cmd.token.as_deref(), Some("T"));
        assert_eq!(cmd.channel_name.as_deref(), Some("ci"));
        assert_eq!(cmd.command_name.as_deref(), Some("/build"));
        assert_eq!(cmd.text.as_deref(), Some("myrepo dev"));
    }

    #[test]
    fn test_inbound_command_missing_fields() {
        let cmd = InboundCommand::from(&WebhookArgs::default());
        assert_eq!(cmd, InboundCommand::default());
    }
}
