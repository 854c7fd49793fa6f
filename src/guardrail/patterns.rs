//! Static guardrail configuration
//!
//! Pattern and keyword tables are process-wide, read-only, and built once
//! on first use. Nothing in here is mutated after initialization.

use lazy_static::lazy_static;
use regex::Regex;

/// A weighted topic the chatbot considers in scope.
pub struct TopicDefinition {
    pub name: &'static str,
    pub keywords: &'static [&'static str],
    pub patterns: Vec<Regex>,
    pub priority: u32,
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("static pattern must compile"))
        .collect()
}

lazy_static! {
    /// Instruction-override phrasing. First match blocks with high
    /// severity.
    pub static ref JAILBREAK_PATTERNS: Vec<Regex> = compile(&[
        r"(?i)ignore\s+(all\s+)?(previous|prior|your)\s+instructions",
        r"(?i)disregard\s+(all\s+)?(previous|prior|your)\s+(instructions|guidelines|rules)",
        r"(?i)forget\s+(all\s+)?(previous|prior|your)\s+instructions",
        r"(?i)you\s+are\s+now\s+(an?\s+)?unrestricted",
        r"(?i)bypass\s+(your|the|all)\s+(filters?|safety|restrictions?|guardrails?)",
        r"(?i)pretend\s+(you\s+are|to\s+be)\s+(an?\s+)?(ai|assistant|bot)?\s*(with(out)?|no)\s+(rules|restrictions|filters)",
        r"(?i)act\s+as\s+(if\s+you\s+have\s+no|an?\s+unfiltered)",
        r"(?i)\bjailbreak\b",
        r"(?i)enable\s+developer\s+mode",
        r"(?i)(reveal|show|print)\s+(your\s+)?system\s+prompt",
    ]);

    /// Requests for credentials or identity numbers.
    pub static ref PII_PATTERNS: Vec<Regex> = compile(&[
        r"(?i)social\s+security\s+number",
        r"(?i)\bssn\b",
        r"(?i)(credit|debit)\s*card\s*(number|details|info)",
        r"(?i)bank\s+account\s+(number|details|login)",
        r"(?i)routing\s+number",
        r"(?i)\bpassword\b",
        r"(?i)\bpin\s*(code|number)\b",
        r"(?i)security\s+question",
    ]);

    /// Profanity, violence/self-harm, and illegal-activity terms.
    pub static ref INAPPROPRIATE_PATTERNS: Vec<Regex> = compile(&[
        r"(?i)\b(fuck|shit|bitch|asshole|bastard)\b",
        r"(?i)\b(kill|hurt|harm)\s+(myself|yourself|someone|him|her|them)\b",
        r"(?i)\b(suicide|self.?harm)\b",
        r"(?i)\b(make|build)\s+(a\s+)?(bomb|weapon)\b",
        r"(?i)\b(launder(ing)?\s+money|money\s+launder)",
        r"(?i)\b(steal|rob)\s+(a\s+)?(bank|money|cash)\b",
        r"(?i)\bcounterfeit\b",
        r"(?i)\b(buy|sell|score)\s+(illegal\s+)?drugs\b",
        r"(?i)evade\s+(taxes|tax)",
    ]);

    /// Explicit buy/sell/stock-pick phrasing. Allowed through, but the
    /// caller appends a disclaimer.
    pub static ref ADVICE_PATTERNS: Vec<Regex> = compile(&[
        r"(?i)should\s+i\s+(buy|sell|short)",
        r"(?i)(what|which)\s+(stocks?|shares?|coins?|funds?|etfs?)\s+(should|do)\s+i\s+buy",
        r"(?i)(buy|sell)\s+(this\s+)?(stock|stocks|shares|bitcoin|crypto|ethereum)",
        r"(?i)stock\s+(pick|tip)s?",
        r"(?i)(best|hot)\s+(stock|investment)\s+(right\s+now|today|tip)",
        r"(?i)tell\s+me\s+(what|which)\s+to\s+(buy|sell|invest\s+in)",
    ]);

    /// In-scope topics and their weights.
    pub static ref TOPICS: Vec<TopicDefinition> = vec![
        TopicDefinition {
            name: "savings",
            keywords: &["save", "saving", "savings", "deposit", "emergency fund", "nest egg"],
            patterns: compile(&[r"(?i)how\s+(much|do|can)\s+.{0,30}\bsave\b"]),
            priority: 3,
        },
        TopicDefinition {
            name: "retirement",
            keywords: &["retire", "retirement", "pension", "401k", "ira"],
            patterns: compile(&[r"(?i)when\s+can\s+i\s+retire"]),
            priority: 3,
        },
        TopicDefinition {
            name: "investing",
            keywords: &["invest", "investment", "portfolio", "compound", "interest", "return", "stock", "bond", "etf"],
            patterns: compile(&[r"(?i)compound\s+(interest|growth)"]),
            priority: 3,
        },
        TopicDefinition {
            name: "budgeting",
            keywords: &["budget", "income", "expense", "spending", "debt", "loan"],
            patterns: compile(&[r"(?i)(cut|reduce|track)\s+.{0,20}(spending|expenses)"]),
            priority: 2,
        },
        TopicDefinition {
            name: "projection",
            keywords: &["projection", "milestone", "wealth", "bonus", "growth", "net worth"],
            patterns: compile(&[r"(?i)(my|the)\s+projection", r"(?i)at\s+age\s+\d+"]),
            priority: 2,
        },
    ];

    /// Per-intent rules, evaluated top to bottom; order is part of the
    /// contract.
    pub static ref INTENT_RULES: Vec<(crate::models::Intent, Regex)> = {
        use crate::models::Intent::*;
        vec![
            (Restart, Regex::new(r"(?i)\b(start\s+over|restart|begin\s+again|reset|new\s+profile)\b").unwrap()),
            (ProductInfo, Regex::new(r"(?i)(how\s+does\s+(this|the)\s+(app|product|bonus|feature)\s+work|round.?ups?|spending\s+control|what\s+is\s+the\s+bonus)").unwrap()),
            (Education, Regex::new(r"(?i)\b(what\s+is|what\s+are|what\s+does|explain|define|meaning\s+of)\b").unwrap()),
            (Retirement, Regex::new(r"(?i)\b(retire|retirement|pension|401k)\b").unwrap()),
            (SavingsTips, Regex::new(r"(?i)(save\s+more|saving\s+tips?|how\s+(can|do)\s+i\s+save|cut\s+(costs|expenses)|emergency\s+fund)").unwrap()),
            (Investment, Regex::new(r"(?i)\b(invest|investment|investing|stocks?|bonds?|etfs?|portfolio|compound)\b").unwrap()),
            (Closing, Regex::new(r"(?i)\b(bye|goodbye|thanks|thank\s+you|see\s+you|that.?s\s+all)\b").unwrap()),
            (Help, Regex::new(r"(?i)\b(help|what\s+can\s+you\s+do|options|commands)\b").unwrap()),
        ]
    };
}

/// Vocabulary that pulls a message off topic. Spans programming, weather,
/// sports, entertainment, politics, food, travel, non-financial health,
/// relationships, and general-knowledge/homework requests.
pub const OFF_TOPIC_KEYWORDS: &[&str] = &[
    // programming
    "python", "javascript", "java", "rust", "code", "coding", "programming", "software", "compiler", "algorithm",
    // weather
    "weather", "rain", "snow", "sunny", "cloudy", "storm",
    // sports
    "football", "soccer", "basketball", "cricket", "tennis", "baseball", "championship", "tournament",
    // entertainment
    "movie", "film", "music", "song", "celebrity", "concert", "netflix", "anime",
    // politics
    "politics", "election", "president", "government", "senator", "congress",
    // food
    "recipe", "cook", "cooking", "restaurant", "pizza", "dinner",
    // travel
    "travel", "vacation", "flight", "hotel", "itinerary",
    // health (non-financial)
    "doctor", "medicine", "symptom", "workout", "diet", "disease",
    // relationships
    "girlfriend", "boyfriend", "dating", "marriage", "breakup",
    // general knowledge / homework
    "homework", "essay", "poem", "translate", "history", "geography", "language",
];

/// Generic financial vocabulary; each hit adds one point to the topic
/// score.
pub const FINANCIAL_INDICATORS: &[&str] = &[
    "money", "dollar", "save", "invest", "rich", "wealth", "retire", "income", "budget", "percent",
    "growth", "return", "interest", "compound", "year",
];

pub const JAILBREAK_REDIRECT: &str = "I'm here to help you plan your financial future, and I \
     can't change how I work. Is there anything about your savings plan or wealth projection \
     you'd like to look at?";

pub const PII_REDIRECT: &str = "I can't help with personal credentials or account numbers. I'm \
     happy to answer questions about your savings plan or the projection we computed.";

pub const INAPPROPRIATE_REDIRECT: &str = "Let's keep this constructive. I can help with your \
     savings, investments, or anything about your wealth projection.";
