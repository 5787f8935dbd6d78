//! Fixed literals and reply texts used by the dispatcher.

pub const DEFAULT_TERMS_VERSION: &str = "v1";
pub const DEFAULT_TERMS_URL: &str =
    "https://fticket-botv1.onrender.com/static/%E7%A5%A8%E9%80%9F%E9%80%9A%20Ticket%20FastPass.pdf";
pub const CONSENT_PHRASE_PREFIX: &str = "我同意票速通條款";
pub const ENABLE_AUTO_REPLY_COMMAND: &str = "[系統]開啟自動回應";
pub const DISABLE_AUTO_REPLY_COMMAND: &str = "[系統]關閉自動回應";
pub const ORDER_FORM_PREFIX: &str = "我要預訂：";

#[derive(Debug, Clone, PartialEq, Eq)]
/// Terms-of-service document the consent gate points at.
pub struct TermsConfig {
    pub version: String,
    pub document_url: String,
}

impl Default for TermsConfig {
    fn default() -> Self {
        Self {
            version: DEFAULT_TERMS_VERSION.to_string(),
            document_url: DEFAULT_TERMS_URL.to_string(),
        }
    }
}

impl TermsConfig {
    /// Literal a user must send (or echo via the prompt button) to consent.
    pub fn confirmation_phrase(&self) -> String {
        format!("{CONSENT_PHRASE_PREFIX}{}", self.version.trim())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchTexts {
    pub consent_acknowledgement: String,
    pub terms_prompt_title: String,
    pub terms_prompt_alt_text: String,
    pub terms_open_label: String,
    pub terms_agree_label: String,
    pub auto_reply_enabled_ack: String,
    pub auto_reply_disabled_ack: String,
    pub order_form_template: String,
    pub order_already_submitted: String,
    pub away_message: String,
}

impl Default for DispatchTexts {
    fn default() -> Self {
        Self {
            consent_acknowledgement: "✅ 已收到您的同意，歡迎使用票速通！".to_string(),
            terms_prompt_title: "請先詳閱《票速通服務條款》".to_string(),
            terms_prompt_alt_text: "請先詳閱票速通服務條款".to_string(),
            terms_open_label: "開啟 PDF".to_string(),
            terms_agree_label: "✅ 我同意".to_string(),
            auto_reply_enabled_ack: "✅ 自動回應已開啟".to_string(),
            auto_reply_disabled_ack: "🛑 自動回應已關閉".to_string(),
            order_form_template: [
                "請填寫以下訂單資訊：",
                "演唱會節目：",
                "演唱會日期：",
                "票價：",
                "張數（上限為四張）：",
            ]
            .join("\n"),
            order_already_submitted: "⚠️ 您已填寫過訂單，如需修改請聯絡客服。".to_string(),
            away_message: [
                "[@票速通 通知您] 小編 7/12–7/17 不在，若有任何事情請先留言。",
                "問題傳送一次即可，馬上回來回覆您！",
                "",
                "再次強調，洗頻三次將封鎖！",
            ]
            .join("\n"),
        }
    }
}
