use fastpass_core::ResponsePayload;

use crate::dispatch_texts::{
    DispatchTexts, DISABLE_AUTO_REPLY_COMMAND, ENABLE_AUTO_REPLY_COMMAND, ORDER_FORM_PREFIX,
};
use crate::keyword_catalog::KeywordCatalog;

#[derive(Debug, Clone, PartialEq, Eq)]
/// How an entry recognizes inbound text.
pub enum MatchRule {
    /// Whole text equals the literal.
    Exact(String),
    /// Text starts with the literal; the rest is captured unvalidated.
    Prefix(String),
    /// Like `Exact`, but only for managers. Everyone else falls through.
    PrivilegedExact(String),
}

impl MatchRule {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Exact(_) => "exact",
            Self::Prefix(_) => "prefix",
            Self::PrivilegedExact(_) => "privileged_exact",
        }
    }

    fn capture<'t>(&self, text: &'t str, sender_is_manager: bool) -> Option<&'t str> {
        match self {
            Self::Exact(literal) => (text == literal).then_some(""),
            Self::Prefix(prefix) => text.strip_prefix(prefix.as_str()),
            Self::PrivilegedExact(literal) => {
                (sender_is_manager && text == literal).then_some("")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandAction {
    SetAutoReply {
        enabled: bool,
        acknowledgement: String,
    },
    OneShotForm {
        form_template: String,
        already_submitted: String,
    },
    Static(ResponsePayload),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandEntry {
    pub name: String,
    pub rule: MatchRule,
    pub action: CommandAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandMatch<'a> {
    pub entry: &'a CommandEntry,
    /// Text after a prefix rule's literal; empty for exact rules.
    pub remainder: &'a str,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Command entries in evaluation order. Order is fixed at construction and
/// the first match wins.
pub struct CommandTable {
    entries: Vec<CommandEntry>,
}

impl CommandTable {
    pub fn new(entries: Vec<CommandEntry>) -> Self {
        Self { entries }
    }

    /// Privileged auto-reply switches, then the order form prefix, then the
    /// keyword catalog in declaration order.
    pub fn standard(texts: &DispatchTexts, keywords: &KeywordCatalog) -> Self {
        let mut entries = vec![
            CommandEntry {
                name: "auto-reply-enable".to_string(),
                rule: MatchRule::PrivilegedExact(ENABLE_AUTO_REPLY_COMMAND.to_string()),
                action: CommandAction::SetAutoReply {
                    enabled: true,
                    acknowledgement: texts.auto_reply_enabled_ack.clone(),
                },
            },
            CommandEntry {
                name: "auto-reply-disable".to_string(),
                rule: MatchRule::PrivilegedExact(DISABLE_AUTO_REPLY_COMMAND.to_string()),
                action: CommandAction::SetAutoReply {
                    enabled: false,
                    acknowledgement: texts.auto_reply_disabled_ack.clone(),
                },
            },
            CommandEntry {
                name: "order-form".to_string(),
                rule: MatchRule::Prefix(ORDER_FORM_PREFIX.to_string()),
                action: CommandAction::OneShotForm {
                    form_template: texts.order_form_template.clone(),
                    already_submitted: texts.order_already_submitted.clone(),
                },
            },
        ];
        entries.extend(keywords.entries().iter().map(|entry| CommandEntry {
            name: format!("keyword:{}", entry.keyword),
            rule: MatchRule::Exact(entry.keyword.clone()),
            action: CommandAction::Static(entry.reply.clone()),
        }));
        Self { entries }
    }

    pub fn entries(&self) -> &[CommandEntry] {
        &self.entries
    }

    /// Returns the first entry matching `text`. Later entries are never
    /// consulted once one matches.
    pub fn find_match<'a>(
        &'a self,
        text: &'a str,
        sender_is_manager: bool,
    ) -> Option<CommandMatch<'a>> {
        self.entries.iter().find_map(|entry| {
            entry
                .rule
                .capture(text, sender_is_manager)
                .map(|remainder| CommandMatch { entry, remainder })
        })
    }
}
