use fastpass_access::IdentityStore;
use fastpass_core::{CardAction, CardPanel, CardPayload, ResponsePayload, UserId};

use crate::dispatch_texts::{DispatchTexts, TermsConfig};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Result of running an inbound message through the consent gate.
pub enum GateDecision {
    /// Sender has consented; routing continues.
    Proceed,
    /// Message was the confirmation phrase. Routing stops here.
    Accepted {
        newly_recorded: bool,
        response: ResponsePayload,
    },
    /// Sender has not consented; only the terms prompt is returned.
    Prompt(ResponsePayload),
}

#[derive(Debug, Clone)]
/// Blocks every interaction until a user has sent the confirmation phrase.
///
/// Per-user state only moves `Unconsented -> Consented`.
pub struct ConsentGate {
    confirmation_phrase: String,
    acknowledgement: String,
    terms_prompt: CardPayload,
}

impl ConsentGate {
    pub fn new(terms: &TermsConfig, texts: &DispatchTexts) -> Self {
        let confirmation_phrase = terms.confirmation_phrase();
        let terms_prompt = CardPayload {
            alt_text: texts.terms_prompt_alt_text.clone(),
            panels: vec![CardPanel {
                title: Some(texts.terms_prompt_title.clone()),
                actions: vec![
                    CardAction::OpenUri {
                        label: texts.terms_open_label.clone(),
                        uri: terms.document_url.clone(),
                    },
                    CardAction::SendText {
                        label: texts.terms_agree_label.clone(),
                        text: confirmation_phrase.clone(),
                    },
                ],
                ..CardPanel::default()
            }],
        };
        Self {
            confirmation_phrase,
            acknowledgement: texts.consent_acknowledgement.clone(),
            terms_prompt,
        }
    }

    pub fn confirmation_phrase(&self) -> &str {
        self.confirmation_phrase.as_str()
    }

    pub fn terms_prompt(&self) -> ResponsePayload {
        ResponsePayload::Card(self.terms_prompt.clone())
    }

    /// `text` must already be trimmed; the phrase is otherwise compared
    /// byte for byte.
    pub fn evaluate(&self, identity: &IdentityStore, sender: &UserId, text: &str) -> GateDecision {
        if identity.has_consented(sender) {
            return GateDecision::Proceed;
        }
        if text != self.confirmation_phrase {
            return GateDecision::Prompt(self.terms_prompt());
        }
        let newly_recorded = identity.record_consent(sender);
        GateDecision::Accepted {
            newly_recorded,
            response: ResponsePayload::text(self.acknowledgement.clone()),
        }
    }
}
