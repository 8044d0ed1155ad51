//! Farming Q&A: keyword-routed templates, optionally backed by a hosted model.

#![allow(async_fn_in_trait)]

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use agriguru_core::serde::to_rfc3339_ms;

use crate::domain::repository::LanguageModel;
use crate::error::ApiError;
use crate::infra::llm::GroqClient;

pub const DEFAULT_USER_NAME: &str = "Farmer";
pub const HISTORY_CAPACITY: usize = 100;

// ── Language detection ───────────────────────────────────────────────────────

fn devanagari(c: char) -> bool {
    ('\u{0900}'..='\u{097F}').contains(&c)
}

/// ळ is written in Marathi but not Hindi; each one tips a Devanagari tie towards Marathi.
const MARATHI_MARKER: char = '\u{0933}';

fn range(lo: char, hi: char) -> impl Fn(char) -> bool {
    move |c| (lo..=hi).contains(&c)
}

struct Script {
    language: &'static str,
    region: &'static str,
    crops: &'static [&'static str],
}

const SCRIPTS: [Script; 9] = [
    Script {
        language: "hindi",
        region: "North India (UP, Bihar, MP, Rajasthan, Haryana)",
        crops: &["गेहूं (wheat)", "धान (rice)", "मक्का (maize)", "बाजरा (millet)"],
    },
    Script {
        language: "tamil",
        region: "Tamil Nadu (Rice, Sugarcane)",
        crops: &["அரிசி (rice)", "கரும்பு (sugarcane)", "மிளகாய் (chili)"],
    },
    Script {
        language: "telugu",
        region: "Andhra Pradesh, Telangana (Cotton, Rice)",
        crops: &["వరి (rice)", "పత్తి (cotton)", "మిర్చి (chili)"],
    },
    Script {
        language: "punjabi",
        region: "Punjab, Haryana (Wheat Belt)",
        crops: &["ਕਣਕ (wheat)", "ਚੌਲ (rice)", "ਕਪਾਹ (cotton)"],
    },
    Script {
        language: "bengali",
        region: "West Bengal (Rice, Jute)",
        crops: &["ধান (rice)", "পাট (jute)", "আলু (potato)"],
    },
    Script {
        language: "marathi",
        region: "Maharashtra (Cotton, Sugarcane, Onion)",
        crops: &["कापूस (cotton)", "ऊस (sugarcane)", "कांदा (onion)"],
    },
    Script {
        language: "gujarati",
        region: "Gujarat (Cotton, Groundnut)",
        crops: &["કપાસ (cotton)", "મગફળી (groundnut)", "બાજરી (millet)"],
    },
    Script {
        language: "kannada",
        region: "Karnataka (Coffee, Ragi, Cotton)",
        crops: &["ಅಕ್ಕಿ (rice)", "ಕಾಫಿ (coffee)", "ರಾಗಿ (ragi)"],
    },
    Script {
        language: "malayalam",
        region: "Kerala (Spices, Coconut, Rice)",
        crops: &["നെൽ (rice)", "തേങ്ങ (coconut)", "കുരുമുളക് (pepper)"],
    },
];

fn script_matcher(language: &str) -> Box<dyn Fn(char) -> bool> {
    match language {
        "hindi" | "marathi" => Box::new(devanagari),
        "tamil" => Box::new(range('\u{0B80}', '\u{0BFF}')),
        "telugu" => Box::new(range('\u{0C00}', '\u{0C7F}')),
        "punjabi" => Box::new(range('\u{0A00}', '\u{0A7F}')),
        "bengali" => Box::new(range('\u{0980}', '\u{09FF}')),
        "gujarati" => Box::new(range('\u{0A80}', '\u{0AFF}')),
        "kannada" => Box::new(range('\u{0C80}', '\u{0CFF}')),
        "malayalam" => Box::new(range('\u{0D00}', '\u{0D7F}')),
        _ => Box::new(|_| false),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageInfo {
    pub language: &'static str,
    /// Characters of the winning script found in the text.
    pub confidence: usize,
    pub region: &'static str,
    pub common_crops: &'static [&'static str],
    pub is_indian_language: bool,
    pub script_detected: bool,
}

/// Pick the script with the most characters in `text`; English when none appear.
pub fn detect_language(text: &str) -> LanguageInfo {
    let mut best: Option<(&Script, usize)> = None;
    for script in &SCRIPTS {
        let matches = script_matcher(script.language);
        let count = text.chars().filter(|&c| matches(c)).count()
            + if script.language == "marathi" {
                text.chars().filter(|&c| c == MARATHI_MARKER).count()
            } else {
                0
            };
        if count > best.map_or(0, |(_, n)| n) {
            best = Some((script, count));
        }
    }
    match best {
        Some((script, confidence)) => LanguageInfo {
            language: script.language,
            confidence,
            region: script.region,
            common_crops: script.crops,
            is_indian_language: true,
            script_detected: true,
        },
        None => LanguageInfo {
            language: "english",
            confidence: 0,
            region: "Pan-India",
            common_crops: &["rice", "wheat", "cotton", "sugarcane"],
            is_indian_language: false,
            script_detected: false,
        },
    }
}

// ── Topic rules ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    Weather,
    PestDisease,
    Market,
    Fertilizer,
    Irrigation,
    Seeds,
    Schemes,
    Soil,
    Organic,
    General,
}

/// Ordered rule table; the first bucket with a matching keyword wins.
const RULES: [(Topic, &[&str]); 9] = [
    (
        Topic::Weather,
        &["weather", "rain", "temperature", "humidity", "climate", "forecast", "मौसम", "बारिश"],
    ),
    (
        Topic::PestDisease,
        &[
            "disease", "pest", "fungus", "bacteria", "virus", "spots", "wilting", "yellowing",
            "insects", "बीमारी", "कीट",
        ],
    ),
    (
        Topic::Market,
        &[
            "price", "market", "sell", "mandi", "rate", "cost", "profit", "income", "कीमत",
            "बाजार", "भाव",
        ],
    ),
    (
        Topic::Fertilizer,
        &[
            "fertilizer", "fertiliser", "nutrition", "npk", "urea", "compost", "manure", "खाद",
            "उर्वरक",
        ],
    ),
    (
        Topic::Irrigation,
        &[
            "irrigation", "water", "drip", "sprinkler", "drought", "pump", "सिंचाई", "पानी",
        ],
    ),
    (
        Topic::Seeds,
        &[
            "seed", "variety", "varieties", "hybrid", "planting", "sowing", "germination", "बीज",
            "किस्म",
        ],
    ),
    (
        Topic::Schemes,
        &[
            "subsidy", "scheme", "government", "govt", "loan", "insurance", "msp", "योजना",
            "सब्सिडी", "सरकार",
        ],
    ),
    (
        Topic::Soil,
        &["soil", "testing", "ph", "erosion", "मिट्टी", "भूमि"],
    ),
    (
        Topic::Organic,
        &["organic", "natural", "sustainable", "chemical free", "bio", "जैविक", "प्राकृतिक"],
    ),
];

pub fn classify(message: &str) -> Topic {
    let message = message.to_lowercase();
    RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| message.contains(k)))
        .map_or(Topic::General, |(topic, _)| *topic)
}

fn render(topic: Topic, name: &str) -> String {
    match topic {
        Topic::Weather => format!(
            "🌤️ **Weather Advisory for {name}**\n\n\
             **Plan around the forecast:**\n\
             • Sunny spells: harvest and prepare land\n\
             • Rainy spells: clear drainage channels, watch for disease\n\
             • High humidity: delay fungicide sprays\n\
             • Wind: postpone spraying\n\n\
             **Season watch:** monsoon onset for kharif, frost for rabi, water saving in summer.\n\n\
             📍 Share your location for local conditions."
        ),
        Topic::PestDisease => format!(
            "🦠 **Pest & Disease Help for {name}**\n\n\
             **Identify first:**\n\
             • Yellow spots or streaks: bacterial blight, use a copper spray\n\
             • Powdery coating: mildew, use sulphur\n\
             • Curling leaves: sucking pests such as aphids or whitefly\n\n\
             **Integrated management:**\n\
             1. Remove and destroy infected plants\n\
             2. Use neem oil (5 ml per litre) as a first spray\n\
             3. Set pheromone and yellow sticky traps\n\
             4. Spray chemicals only past the threshold, in the evening\n\n\
             📸 A photo of the affected plant helps with diagnosis."
        ),
        Topic::Market => format!(
            "💰 **Market Guidance for {name}**\n\n\
             • Compare mandi rates on eNAM before selling\n\
             • Grade and clean produce to get a better rate\n\
             • Store grain in a warehouse and use the receipt for credit when prices are low\n\
             • Join an FPO to sell in bulk\n\n\
             📊 Tell me your crop and district for a price outlook."
        ),
        Topic::Fertilizer => format!(
            "🧪 **Fertilizer Plan for {name}**\n\n\
             **Base it on a soil test.** General NPK guide per acre:\n\
             • Rice: 40:20:20 kg\n\
             • Wheat: 50:25:20 kg\n\
             • Vegetables: 40:30:30 kg\n\n\
             **Tips:**\n\
             • Split nitrogen into 2-3 doses\n\
             • Add 2-3 tonnes of compost or FYM every season\n\
             • Apply zinc sulphate where zinc is deficient\n\n\
             🌱 Neem-coated urea reduces nitrogen loss."
        ),
        Topic::Irrigation => format!(
            "💧 **Irrigation Advice for {name}**\n\n\
             • Drip saves 40-60% water in vegetables and orchards\n\
             • Sprinklers suit wheat, pulses and groundnut\n\
             • Water early morning or evening to cut evaporation\n\
             • Check soil moisture 10 cm deep before watering\n\n\
             **Critical stages:** flowering and grain filling must not go dry.\n\n\
             🏦 Micro-irrigation subsidies are available under PMKSY."
        ),
        Topic::Seeds => format!(
            "🌱 **Seed Selection for {name}**\n\n\
             • Buy certified seed from government or registered dealers\n\
             • Choose varieties released for your state and season\n\
             • Treat seed with Trichoderma or a fungicide before sowing\n\
             • Run a germination test on 100 seeds first\n\n\
             📅 Sow on time: late sowing cuts yield sharply."
        ),
        Topic::Schemes => format!(
            "🏛️ **Government Support for {name}**\n\n\
             • PM-KISAN: ₹6,000 a year in three instalments\n\
             • PMFBY: crop insurance at low premium\n\
             • Kisan Credit Card: short-term loans at concessional interest\n\
             • Soil Health Card: free soil testing\n\
             • MSP procurement for notified crops\n\n\
             📝 Visit your nearest Krishi Vigyan Kendra or CSC to apply."
        ),
        Topic::Soil => format!(
            "🌍 **Soil Health for {name}**\n\n\
             • Test soil every 2-3 years for pH, NPK and organic carbon\n\
             • Acidic soil (pH < 6): apply lime\n\
             • Alkaline soil (pH > 8): apply gypsum\n\
             • Grow green manure such as dhaincha before the main crop\n\
             • Contour bunds and mulching reduce erosion\n\n\
             🧪 Soil Health Card testing is free."
        ),
        Topic::Organic => format!(
            "🍃 **Organic Farming for {name}**\n\n\
             • Build soil with compost, vermicompost and green manure\n\
             • Use jeevamrut and biofertilizers for nutrition\n\
             • Manage pests with neem, traps and beneficial insects\n\
             • Rotate crops with legumes\n\n\
             **Certification:** PGS-India suits small farmer groups.\n\n\
             🌱 Start small, on one or two acres."
        ),
        Topic::General => format!(
            "🌾 **AgriGuru - Your Farming Assistant**\n\n\
             Hello {name}! 👋 I can help with:\n\
             • Weather and crop planning\n\
             • Pest and disease control\n\
             • Fertilizer and soil health\n\
             • Irrigation\n\
             • Seeds and varieties\n\
             • Market prices and government schemes\n\
             • Organic farming\n\n\
             Ask me about your crop, for example: \"How do I control pests in tomato?\""
        ),
    }
}

/// Templated answer for `message`.
pub fn rule_advice(message: &str, user_name: &str) -> String {
    render(classify(message), user_name)
}

// ── Responders ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Advice {
    pub text: String,
    pub provider: &'static str,
    pub fallback_used: bool,
}

/// Something that answers a farming question.
pub trait AdvisoryResponder: Send + Sync {
    fn provider(&self) -> &'static str;

    fn model(&self) -> Option<&str>;

    async fn respond(&self, message: &str, user_name: &str, language: &LanguageInfo) -> Advice;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RuleResponder;

impl AdvisoryResponder for RuleResponder {
    fn provider(&self) -> &'static str {
        "rules"
    }

    fn model(&self) -> Option<&str> {
        None
    }

    async fn respond(&self, message: &str, user_name: &str, _language: &LanguageInfo) -> Advice {
        Advice {
            text: rule_advice(message, user_name),
            provider: self.provider(),
            fallback_used: false,
        }
    }
}

const SYSTEM_PROMPT: &str = "You are AgriGuru, an agricultural expert helping Indian farmers. \
Give practical, accurate advice on crops, soil, pests, irrigation, markets and government schemes. \
Answer in the same language the farmer used, and prefer local crop names, units and practices.";

pub fn llm_prompt(message: &str, user_name: &str, language: &LanguageInfo) -> String {
    format!(
        "Farmer: {user_name}\n\
         Detected language: {language}\n\
         Region: {region}\n\
         Common regional crops: {crops}\n\n\
         Question: {message}\n\n\
         Reply entirely in {language}, with advice suited to {region}.",
        language = language.language,
        region = language.region,
        crops = language.common_crops.join(", "),
    )
}

/// Hosted-model answers, falling back to the rule table on any provider failure.
#[derive(Clone)]
pub struct LlmResponder<L: LanguageModel> {
    pub model: L,
}

impl<L: LanguageModel> AdvisoryResponder for LlmResponder<L> {
    fn provider(&self) -> &'static str {
        "groq"
    }

    fn model(&self) -> Option<&str> {
        Some(self.model.model_name())
    }

    async fn respond(&self, message: &str, user_name: &str, language: &LanguageInfo) -> Advice {
        let prompt = llm_prompt(message, user_name, language);
        match self.model.complete(SYSTEM_PROMPT, &prompt).await {
            Ok(text) => Advice {
                text,
                provider: self.provider(),
                fallback_used: false,
            },
            Err(e) => {
                warn!(error = %e, "language model failed, answering from rules");
                Advice {
                    text: rule_advice(message, user_name),
                    provider: RuleResponder.provider(),
                    fallback_used: true,
                }
            }
        }
    }
}

/// Responder chosen once at startup.
#[derive(Clone)]
pub enum Responder {
    Rules(RuleResponder),
    Llm(LlmResponder<GroqClient>),
}

impl AdvisoryResponder for Responder {
    fn provider(&self) -> &'static str {
        match self {
            Self::Rules(r) => r.provider(),
            Self::Llm(r) => r.provider(),
        }
    }

    fn model(&self) -> Option<&str> {
        match self {
            Self::Rules(r) => r.model(),
            Self::Llm(r) => r.model(),
        }
    }

    async fn respond(&self, message: &str, user_name: &str, language: &LanguageInfo) -> Advice {
        match self {
            Self::Rules(r) => r.respond(message, user_name, language).await,
            Self::Llm(r) => r.respond(message, user_name, language).await,
        }
    }
}

// ── History ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ConversationEntry {
    pub user_message: String,
    pub response: String,
    pub language: &'static str,
    pub provider: &'static str,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub timestamp: DateTime<Utc>,
}

/// Process-wide Q&A log holding the newest [`HISTORY_CAPACITY`] entries.
#[derive(Clone, Default)]
pub struct ConversationHistory {
    entries: Arc<Mutex<VecDeque<ConversationEntry>>>,
}

impl ConversationHistory {
    pub async fn push(&self, entry: ConversationEntry) {
        let mut entries = self.entries.lock().await;
        if entries.len() == HISTORY_CAPACITY {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// The newest `limit` entries, oldest first.
    pub async fn recent(&self, limit: usize) -> Vec<ConversationEntry> {
        let entries = self.entries.lock().await;
        let skip = entries.len().saturating_sub(limit);
        entries.iter().skip(skip).cloned().collect()
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    pub async fn count(&self) -> usize {
        self.entries.lock().await.len()
    }
}

// ── Advise ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct AdviceOutput {
    pub advice: Advice,
    pub language_info: LanguageInfo,
    pub timestamp: DateTime<Utc>,
}

pub struct AdviseUseCase<R: AdvisoryResponder> {
    pub responder: R,
    pub history: ConversationHistory,
}

impl<R: AdvisoryResponder> AdviseUseCase<R> {
    pub async fn execute(&self, message: &str, user_name: Option<&str>) -> Result<AdviceOutput, ApiError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ApiError::validation("Message is required"));
        }
        let user_name = user_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_USER_NAME);

        let language_info = detect_language(message);
        let advice = self.responder.respond(message, user_name, &language_info).await;
        let timestamp = Utc::now();
        info!(
            provider = advice.provider,
            fallback = advice.fallback_used,
            language = language_info.language,
            "advice generated"
        );

        self.history
            .push(ConversationEntry {
                user_message: message.to_owned(),
                response: advice.text.clone(),
                language: language_info.language,
                provider: advice.provider,
                timestamp,
            })
            .await;
        Ok(AdviceOutput {
            advice,
            language_info,
            timestamp,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub provider: &'static str,
    pub model: Option<String>,
    pub conversation_count: usize,
}

pub async fn model_info<R: AdvisoryResponder>(responder: &R, history: &ConversationHistory) -> ModelInfo {
    ModelInfo {
        provider: responder.provider(),
        model: responder.model().map(str::to_owned),
        conversation_count: history.count().await,
    }
}
