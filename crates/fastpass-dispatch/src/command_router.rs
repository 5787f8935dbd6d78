use std::sync::Arc;

use fastpass_access::{IdentityStore, PrivilegeGuard};
use fastpass_core::{ResponsePayload, UserId};

use crate::auto_reply::AutoReplyFlag;
use crate::command_table::{CommandAction, CommandTable};
use crate::consent_gate::{ConsentGate, GateDecision};
use crate::dispatch_texts::{DispatchTexts, TermsConfig};
use crate::keyword_catalog::KeywordCatalog;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Which rule produced a routing outcome.
pub enum RouteRule {
    TermsPrompt,
    ConsentAccepted,
    Privileged,
    OneShotForm,
    Keyword,
    Fallback,
}

impl RouteRule {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TermsPrompt => "terms_prompt",
            Self::ConsentAccepted => "consent_accepted",
            Self::Privileged => "privileged",
            Self::OneShotForm => "one_shot_form",
            Self::Keyword => "keyword",
            Self::Fallback => "fallback",
        }
    }

    /// True for outcomes decided by the consent gate.
    pub fn is_gate(self) -> bool {
        matches!(self, Self::TermsPrompt | Self::ConsentAccepted)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteOutcome {
    pub rule: RouteRule,
    pub command: Option<String>,
    /// `None` means no reply is sent.
    pub response: Option<ResponsePayload>,
    /// Auto-reply flag as observed once routing finished.
    pub auto_reply_enabled: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RouterConfig {
    pub terms: TermsConfig,
    pub texts: DispatchTexts,
    pub keywords: KeywordCatalog,
}

/// Turns one inbound message into exactly one routing outcome.
///
/// Routing is synchronous: it only touches in-memory state (plus the
/// identity store's optional state-file write).
#[derive(Debug)]
pub struct CommandRouter {
    identity: Arc<IdentityStore>,
    guard: PrivilegeGuard,
    auto_reply: Arc<AutoReplyFlag>,
    gate: ConsentGate,
    table: CommandTable,
    away_message: String,
}

impl CommandRouter {
    pub fn new(
        identity: Arc<IdentityStore>,
        guard: PrivilegeGuard,
        auto_reply: Arc<AutoReplyFlag>,
        config: &RouterConfig,
    ) -> Self {
        Self::with_table(
            identity,
            guard,
            auto_reply,
            ConsentGate::new(&config.terms, &config.texts),
            CommandTable::standard(&config.texts, &config.keywords),
            config.texts.away_message.clone(),
        )
    }

    pub fn with_table(
        identity: Arc<IdentityStore>,
        guard: PrivilegeGuard,
        auto_reply: Arc<AutoReplyFlag>,
        gate: ConsentGate,
        table: CommandTable,
        away_message: String,
    ) -> Self {
        Self {
            identity,
            guard,
            auto_reply,
            gate,
            table,
            away_message,
        }
    }

    pub fn identity(&self) -> &IdentityStore {
        &self.identity
    }

    pub fn auto_reply(&self) -> &AutoReplyFlag {
        &self.auto_reply
    }

    pub fn terms_prompt(&self) -> ResponsePayload {
        self.gate.terms_prompt()
    }

    pub fn route(&self, sender: &UserId, text: &str) -> RouteOutcome {
        let text = text.trim();
        match self.gate.evaluate(&self.identity, sender, text) {
            GateDecision::Prompt(prompt) => {
                return self.outcome(RouteRule::TermsPrompt, None, Some(prompt));
            }
            GateDecision::Accepted {
                newly_recorded,
                response,
            } => {
                tracing::info!(user_id = %sender, newly_recorded, "terms consent accepted");
                return self.outcome(RouteRule::ConsentAccepted, None, Some(response));
            }
            GateDecision::Proceed => {}
        }

        let sender_is_manager = self.guard.is_manager(sender);
        let Some(matched) = self.table.find_match(text, sender_is_manager) else {
            return self.fallback();
        };
        tracing::debug!(
            user_id = %sender,
            command = matched.entry.name.as_str(),
            match_rule = matched.entry.rule.kind(),
            "command matched"
        );
        let command = Some(matched.entry.name.clone());
        match &matched.entry.action {
            CommandAction::SetAutoReply {
                enabled,
                acknowledgement,
            } => {
                let previous = self.auto_reply.set(*enabled);
                tracing::info!(
                    user_id = %sender,
                    enabled = *enabled,
                    previous,
                    "auto-reply flag updated by manager"
                );
                self.outcome(
                    RouteRule::Privileged,
                    command,
                    Some(ResponsePayload::text(acknowledgement.clone())),
                )
            }
            CommandAction::OneShotForm {
                form_template,
                already_submitted,
            } => {
                let accepted = !self.identity.has_submitted(sender)
                    && self.identity.try_record_submission(sender);
                tracing::debug!(
                    user_id = %sender,
                    accepted,
                    remainder = matched.remainder,
                    "order form requested"
                );
                let reply = if accepted {
                    form_template
                } else {
                    already_submitted
                };
                self.outcome(
                    RouteRule::OneShotForm,
                    command,
                    Some(ResponsePayload::text(reply.clone())),
                )
            }
            CommandAction::Static(payload) => {
                self.outcome(RouteRule::Keyword, command, Some(payload.clone()))
            }
        }
    }

    fn fallback(&self) -> RouteOutcome {
        let response = self
            .auto_reply
            .is_enabled()
            .then(|| ResponsePayload::text(self.away_message.clone()));
        self.outcome(RouteRule::Fallback, None, response)
    }

    fn outcome(
        &self,
        rule: RouteRule,
        command: Option<String>,
        response: Option<ResponsePayload>,
    ) -> RouteOutcome {
        RouteOutcome {
            rule,
            command,
            response,
            auto_reply_enabled: self.auto_reply.is_enabled(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{CommandRouter, RouteOutcome, RouteRule, RouterConfig};
    use crate::auto_reply::AutoReplyFlag;
    use crate::command_table::{CommandAction, CommandEntry, CommandTable, MatchRule};
    use crate::consent_gate::ConsentGate;
    use crate::dispatch_texts::{
        DispatchTexts, TermsConfig, DISABLE_AUTO_REPLY_COMMAND, ENABLE_AUTO_REPLY_COMMAND,
        ORDER_FORM_PREFIX,
    };
    use crate::keyword_catalog::CONCERT_CATALOG_KEYWORD;
    use fastpass_access::{IdentityStore, PrivilegeGuard};
    use fastpass_core::{ResponsePayload, UserId};

    const MANAGER: &str = "Uboss";

    fn test_router() -> CommandRouter {
        CommandRouter::new(
            Arc::new(IdentityStore::in_memory()),
            PrivilegeGuard::new([MANAGER]),
            Arc::new(AutoReplyFlag::default()),
            &RouterConfig::default(),
        )
    }

    fn consented(router: &CommandRouter, user: &str) -> UserId {
        let user = UserId::new(user);
        router.identity().record_consent(&user);
        user
    }

    fn reply_text(outcome: &RouteOutcome) -> Option<&str> {
        match outcome.response.as_ref()? {
            ResponsePayload::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    #[test]
    fn functional_new_user_journey_prompt_then_consent_then_routing() {
        let router = test_router();
        let user = UserId::new("U-new");
        let texts = DispatchTexts::default();

        let outcome = router.route(&user, "hello");
        assert_eq!(outcome.rule, RouteRule::TermsPrompt);
        assert_eq!(outcome.response, Some(router.terms_prompt()));

        let outcome = router.route(&user, "  我同意票速通條款v1 ");
        assert_eq!(outcome.rule, RouteRule::ConsentAccepted);
        assert_eq!(
            reply_text(&outcome),
            Some(texts.consent_acknowledgement.as_str())
        );
        assert!(router.identity().has_consented(&user));

        let outcome = router.route(&user, "hello");
        assert_eq!(outcome.rule, RouteRule::Fallback);
        assert_eq!(outcome.response, None);
    }

    #[test]
    fn functional_unconsented_user_never_reaches_command_table() {
        let router = test_router();
        let user = UserId::new(MANAGER);
        for text in [
            ENABLE_AUTO_REPLY_COMMAND,
            CONCERT_CATALOG_KEYWORD,
            "我要預訂：TWICE",
            "anything",
        ] {
            let outcome = router.route(&user, text);
            assert_eq!(outcome.rule, RouteRule::TermsPrompt, "text: {text}");
        }
        assert!(!router.auto_reply().is_enabled());
        assert!(!router.identity().has_submitted(&user));
    }

    #[test]
    fn functional_manager_toggles_auto_reply_with_acknowledgements() {
        let router = test_router();
        let manager = consented(&router, MANAGER);
        let texts = DispatchTexts::default();

        let outcome = router.route(&manager, ENABLE_AUTO_REPLY_COMMAND);
        assert_eq!(outcome.rule, RouteRule::Privileged);
        assert_eq!(reply_text(&outcome), Some(texts.auto_reply_enabled_ack.as_str()));
        assert!(outcome.auto_reply_enabled);
        assert!(router.auto_reply().is_enabled());

        let outcome = router.route(&manager, DISABLE_AUTO_REPLY_COMMAND);
        assert_eq!(reply_text(&outcome), Some(texts.auto_reply_disabled_ack.as_str()));
        assert!(!outcome.auto_reply_enabled);
        assert!(!router.auto_reply().is_enabled());
    }

    #[test]
    fn functional_non_manager_privileged_text_falls_through_without_mutation() {
        let router = test_router();
        let customer = consented(&router, "U-customer");

        let outcome = router.route(&customer, ENABLE_AUTO_REPLY_COMMAND);
        assert_eq!(outcome.rule, RouteRule::Fallback);
        assert_eq!(outcome.response, None);
        assert!(!router.auto_reply().is_enabled());

        router.auto_reply().set(true);
        let outcome = router.route(&customer, DISABLE_AUTO_REPLY_COMMAND);
        assert_eq!(outcome.rule, RouteRule::Fallback);
        assert_eq!(
            reply_text(&outcome),
            Some(DispatchTexts::default().away_message.as_str())
        );
        assert!(router.auto_reply().is_enabled());
    }

    #[test]
    fn functional_order_form_is_granted_once_regardless_of_remainder() {
        let router = test_router();
        let user = consented(&router, "U-order");
        let texts = DispatchTexts::default();

        let first = router.route(&user, &format!("{ORDER_FORM_PREFIX}TWICE"));
        assert_eq!(first.rule, RouteRule::OneShotForm);
        assert_eq!(reply_text(&first), Some(texts.order_form_template.as_str()));

        for remainder in ["TWICE", "BLACKPINK", ""] {
            let again = router.route(&user, &format!("{ORDER_FORM_PREFIX}{remainder}"));
            assert_eq!(
                reply_text(&again),
                Some(texts.order_already_submitted.as_str())
            );
        }
        assert!(router.identity().has_submitted(&user));
    }

    #[test]
    fn functional_concurrent_order_requests_yield_one_form() {
        let router = test_router();
        let user = consented(&router, "U-race");
        let form = DispatchTexts::default().order_form_template;
        let text = format!("{ORDER_FORM_PREFIX}TWICE");

        let granted = std::thread::scope(|scope| {
            let handles = (0..12)
                .map(|_| scope.spawn(|| router.route(&user, &text)))
                .collect::<Vec<_>>();
            handles
                .into_iter()
                .map(|handle| handle.join().expect("join"))
                .filter(|outcome| reply_text(outcome) == Some(form.as_str()))
                .count()
        });
        assert_eq!(granted, 1);
    }

    #[test]
    fn functional_keyword_reply_has_no_side_effects() {
        let router = test_router();
        let user = consented(&router, "U-browse");
        let outcome = router.route(&user, CONCERT_CATALOG_KEYWORD);
        assert_eq!(outcome.rule, RouteRule::Keyword);
        assert!(matches!(outcome.response, Some(ResponsePayload::Card(_))));
        assert!(!router.identity().has_submitted(&user));
        assert!(!router.auto_reply().is_enabled());
    }

    #[test]
    fn functional_privileged_literal_shadowing_keyword_depends_on_sender() {
        let texts = DispatchTexts::default();
        let table = CommandTable::new(vec![
            CommandEntry {
                name: "auto-reply-enable".to_string(),
                rule: MatchRule::PrivilegedExact("away".to_string()),
                action: CommandAction::SetAutoReply {
                    enabled: true,
                    acknowledgement: "enabled".to_string(),
                },
            },
            CommandEntry {
                name: "keyword:away".to_string(),
                rule: MatchRule::Exact("away".to_string()),
                action: CommandAction::Static(ResponsePayload::text("we are here")),
            },
        ]);
        let router = CommandRouter::with_table(
            Arc::new(IdentityStore::in_memory()),
            PrivilegeGuard::new([MANAGER]),
            Arc::new(AutoReplyFlag::default()),
            ConsentGate::new(&TermsConfig::default(), &texts),
            table,
            texts.away_message.clone(),
        );
        let customer = consented(&router, "U-customer");
        let manager = consented(&router, MANAGER);

        let outcome = router.route(&customer, "away");
        assert_eq!(outcome.rule, RouteRule::Keyword);
        assert_eq!(reply_text(&outcome), Some("we are here"));
        assert!(!router.auto_reply().is_enabled());

        let outcome = router.route(&manager, "away");
        assert_eq!(outcome.rule, RouteRule::Privileged);
        assert_eq!(reply_text(&outcome), Some("enabled"));
        assert!(router.auto_reply().is_enabled());
    }

    #[test]
    fn regression_manager_disable_silences_other_users_fallback() {
        let router = test_router();
        let manager = consented(&router, MANAGER);
        let customer = consented(&router, "U-customer");
        router.auto_reply().set(true);

        let outcome = router.route(&manager, DISABLE_AUTO_REPLY_COMMAND);
        assert_eq!(outcome.rule, RouteRule::Privileged);

        let outcome = router.route(&customer, "are you there?");
        assert_eq!(outcome.rule, RouteRule::Fallback);
        assert_eq!(outcome.response, None);
    }

    #[test]
    fn regression_consented_user_resending_phrase_is_routed_normally() {
        let router = test_router();
        let user = consented(&router, "U-again");
        let outcome = router.route(&user, "我同意票速通條款v1");
        assert_eq!(outcome.rule, RouteRule::Fallback);
        assert!(!outcome.rule.is_gate());
    }
}
