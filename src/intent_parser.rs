use std::sync::Arc;

use crate::generation::IntentGenerator;
use crate::intent::{canonical_category, normalize_intent, Category, Intent, Route, SubKeywords};

/// Ordered category keyword groups. Group order is the category enumeration
/// order and is part of the contract: the first group with a substring hit
/// wins, no scoring.
const CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::Food,
        &[
            "food", "restaurant", "cafe", "bakery", "beverage", "pizza", "burger", "juice",
            "cloud kitchen", "ice cream", "qsr", "snack", "coffee",
        ],
    ),
    (
        Category::Retail,
        &[
            "retail", "supermarket", "grocery", "apparel", "fashion", "boutique", "store",
            "convenience",
        ],
    ),
    (
        Category::SportsEquipment,
        &["sport", "gym", "fitness", "equipment", "athletic"],
    ),
];

/// Lowercase aliases (misspellings, old names, metro shorthand) resolved in
/// fixed order before the canonical-name scan.
const LOCATION_ALIASES: &[(&str, &str)] = &[
    ("bengaluru", "Bangalore"),
    ("bengalore", "Bangalore"),
    ("banglore", "Bangalore"),
    ("blr", "Bangalore"),
    ("bombay", "Mumbai"),
    ("new delhi", "Delhi"),
    ("delhi ncr", "Delhi"),
    ("gurgaon", "Gurugram"),
    ("madras", "Chennai"),
    ("calcutta", "Kolkata"),
    ("kolkatta", "Kolkata"),
    ("secunderabad", "Hyderabad"),
    ("cochin", "Kochi"),
];

const CANONICAL_CITIES: &[&str] = &[
    "Bangalore",
    "Mumbai",
    "Delhi",
    "Hyderabad",
    "Chennai",
    "Kolkata",
    "Pune",
    "Ahmedabad",
    "Jaipur",
    "Surat",
    "Lucknow",
    "Gurugram",
    "Noida",
    "Chandigarh",
    "Indore",
    "Kochi",
];

/// An amount token: optional currency marker, digits with commas, optional
/// lakh/crore shorthand.
const AMOUNT: &str =
    r"(?:rs\.?\s*|₹\s*|\$\s*)?\d[\d,]*(?:\.\d+)?\s*(?:lakhs|lakh|crores|crore|l|cr)?\b";

pub struct IntentParser {
    generator: Option<Arc<dyn IntentGenerator>>,
}

impl IntentParser {
    pub fn new(generator: Option<Arc<dyn IntentGenerator>>) -> Self {
        Self { generator }
    }

    /// Parse a free-text query into an Intent.
    ///
    /// Tries the model-backed strategy when a generation backend is
    /// configured; any failure on that path is logged and recovered by the
    /// rule-based extractor, never surfaced to the caller.
    pub async fn parse(&self, query: &str) -> Intent {
        if let Some(generator) = &self.generator {
            match self.parse_with_model(generator.as_ref(), query).await {
                Ok(intent) => return intent,
                Err(e) => {
                    tracing::warn!("model intent strategy failed, using rule-based extractor: {e:#}");
                }
            }
        }

        self.parse_rule_based(query)
    }

    /// Model-backed strategy: prompt the generation backend for JSON and
    /// validate the reply. Errors here mean "fall back", nothing more.
    async fn parse_with_model(
        &self,
        generator: &dyn IntentGenerator,
        query: &str,
    ) -> anyhow::Result<Intent> {
        let prompt = build_intent_prompt(query);
        let raw = generator.generate(&prompt).await?;
        let json_text = strip_code_fences(raw.trim());

        let parsed: serde_json::Value = serde_json::from_str(json_text)?;

        // A reply without a route field is a malformed intent, not a usable
        // partial answer.
        let route = parsed
            .get("route")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow::anyhow!("model reply has no route field"))?
            .to_string();

        let sub = parsed
            .get("subKeywords")
            .map(extract_model_sub_keywords)
            .unwrap_or_else(SubKeywords::null_shape);

        Ok(normalize_intent(Some(&route), sub))
    }

    /// Deterministic extractor over the lower-cased query text. Always
    /// resolves to the franchise opportunities route: the rules have no way
    /// to infer navigation intent beyond franchise discovery.
    pub fn parse_rule_based(&self, query: &str) -> Intent {
        let text = query.to_lowercase();

        let (min_investment, max_investment) = extract_investment_range(&text);
        let sub = SubKeywords {
            category: extract_category(&text),
            roi: extract_roi(&text),
            location: extract_location(&text),
            min_investment,
            max_investment,
        };

        normalize_intent(Some(Route::FranchiseOpportunities.as_str()), sub)
    }
}

fn build_intent_prompt(query: &str) -> String {
    let routes = Route::ALL
        .iter()
        .map(|r| r.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"You route user queries for a franchise discovery site. Map the query to a destination route and extract any filters.

Query: "{}"

Valid routes (pick exactly one): {}
Default route when unsure: {}
Valid categories: Food, Retail, Sports & Equipment

Return ONLY valid JSON, no other text:
{{
  "route": "/franchise/oppurtunties",
  "subKeywords": {{
    "category": null or "Food" | "Retail" | "Sports & Equipment",
    "roi": null or number (percentage),
    "location": null or city name,
    "minInvestment": null or number,
    "maxInvestment": null or number
  }}
}}"#,
        query,
        routes,
        Route::FranchiseOpportunities.as_str()
    )
}

/// LLM replies often wrap JSON in markdown code fences; strip them.
fn strip_code_fences(text: &str) -> &str {
    if let Some(rest) = text.strip_prefix("```json") {
        rest.strip_suffix("```").unwrap_or(rest).trim()
    } else if let Some(rest) = text.strip_prefix("```") {
        rest.strip_suffix("```").unwrap_or(rest).trim()
    } else {
        text
    }
}

/// Pull sub-keywords out of the model's loose JSON. Numbers may arrive as
/// strings; categories may arrive as synonyms. Anything unusable becomes
/// null rather than an error.
fn extract_model_sub_keywords(value: &serde_json::Value) -> SubKeywords {
    let number = |v: &serde_json::Value| -> Option<f64> {
        v.as_f64()
            .or_else(|| v.as_str().and_then(parse_currency))
            .filter(|n| *n >= 0.0)
    };

    SubKeywords {
        category: value
            .get("category")
            .and_then(|v| v.as_str())
            .and_then(canonical_category),
        roi: value.get("roi").and_then(&number),
        location: value
            .get("location")
            .and_then(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        min_investment: value.get("minInvestment").and_then(&number),
        max_investment: value.get("maxInvestment").and_then(&number),
    }
}

/// First keyword group with a substring hit wins, in enumeration order.
fn extract_category(text: &str) -> Option<Category> {
    for (category, keywords) in CATEGORY_KEYWORDS {
        if keywords.iter().any(|kw| text.contains(kw)) {
            return Some(*category);
        }
    }
    None
}

/// First decimal number (up to 3 integer digits) immediately followed by a
/// percent sign.
fn extract_roi(text: &str) -> Option<f64> {
    let re = regex::Regex::new(r"\b(\d{1,3}(?:\.\d+)?)%").ok()?;
    let caps = re.captures(text)?;
    caps.get(1)?.as_str().parse().ok()
}

/// Alias table first, then literal canonical city names; first hit wins.
fn extract_location(text: &str) -> Option<String> {
    for (alias, canonical) in LOCATION_ALIASES {
        if text.contains(alias) {
            return Some((*canonical).to_string());
        }
    }
    for city in CANONICAL_CITIES {
        if text.contains(&city.to_lowercase()) {
            return Some((*city).to_string());
        }
    }
    None
}

/// Investment range, three tiers in priority order:
/// (a) "between A and B" / "between A - B";
/// (b) independent upper-bound and lower-bound phrases, both may fire;
/// (c) a bare currency-like number anywhere in the text becomes the
///     minimum. A lone number with no qualifying phrase is read as "at
///     least this much", a heuristic carried over from the original
///     parser rather than a claim about what users always mean.
fn extract_investment_range(text: &str) -> (Option<f64>, Option<f64>) {
    if let Some(re) = regex::Regex::new(&format!(
        r"between\s+({AMOUNT})\s*(?:and|-)\s*({AMOUNT})"
    ))
    .ok()
    {
        if let Some(caps) = re.captures(text) {
            let min = caps.get(1).and_then(|m| parse_currency(m.as_str()));
            let max = caps.get(2).and_then(|m| parse_currency(m.as_str()));
            if min.is_some() || max.is_some() {
                return (min, max);
            }
        }
    }

    let mut min = None;
    let mut max = None;

    if let Some(re) =
        regex::Regex::new(&format!(r"\b(?:up\s*to|less\s+than|under)\s*({AMOUNT})")).ok()
    {
        if let Some(caps) = re.captures(text) {
            max = caps.get(1).and_then(|m| parse_currency(m.as_str()));
        }
    }

    if let Some(re) =
        regex::Regex::new(&format!(r"\b(?:at\s+least|minimum|min)\s*({AMOUNT})")).ok()
    {
        if let Some(caps) = re.captures(text) {
            min = caps.get(1).and_then(|m| parse_currency(m.as_str()));
        }
    }

    if min.is_none() && max.is_none() {
        min = find_bare_amount(text);
    }

    (min, max)
}

/// A number counts as currency-like when it carries a currency marker, a
/// lakh/crore suffix, or is large enough (>= 1000 or comma-grouped) to read
/// as an amount. Percentages never qualify.
fn find_bare_amount(text: &str) -> Option<f64> {
    let re = regex::Regex::new(
        r"(rs\.?\s*|₹\s*|\$\s*)?(\d[\d,]*(?:\.\d+)?)\s*(lakhs|lakh|crores|crore|l|cr)?\b",
    )
    .ok()?;

    for caps in re.captures_iter(text) {
        let whole = caps.get(0)?;
        if text[whole.end()..].starts_with('%') {
            continue;
        }

        let has_symbol = caps.get(1).is_some();
        let has_suffix = caps.get(3).is_some();
        let digits = caps.get(2)?.as_str();
        let plain: f64 = digits.replace(',', "").parse().ok()?;
        let currency_like = has_symbol || has_suffix || digits.contains(',') || plain >= 1000.0;

        if currency_like {
            return parse_currency(whole.as_str());
        }
    }
    None
}

/// Parse a currency amount: strips symbols, commas and whitespace, expands
/// lakh (x100,000) and crore (x10,000,000) shorthand, otherwise reads a
/// plain number. Unparsable input yields None.
pub fn parse_currency(raw: &str) -> Option<f64> {
    let mut s = raw.trim().to_lowercase();

    for prefix in ["rs.", "rs", "inr", "₹", "$"] {
        if let Some(rest) = s.strip_prefix(prefix) {
            s = rest.to_string();
            break;
        }
    }
    s.retain(|c| c != ',' && !c.is_whitespace());

    let (digits, multiplier) = if let Some(rest) = s.strip_suffix("crores") {
        (rest, 10_000_000.0)
    } else if let Some(rest) = s.strip_suffix("crore") {
        (rest, 10_000_000.0)
    } else if let Some(rest) = s.strip_suffix("cr") {
        (rest, 10_000_000.0)
    } else if let Some(rest) = s.strip_suffix("lakhs") {
        (rest, 100_000.0)
    } else if let Some(rest) = s.strip_suffix("lakh") {
        (rest, 100_000.0)
    } else if let Some(rest) = s.strip_suffix('l') {
        (rest, 100_000.0)
    } else {
        (s.as_str(), 1.0)
    };

    if digits.is_empty() {
        return None;
    }

    digits
        .parse::<f64>()
        .ok()
        .filter(|n| *n >= 0.0)
        .map(|n| n * multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct CannedGenerator {
        reply: String,
    }

    #[async_trait]
    impl IntentGenerator for CannedGenerator {
        async fn generate(&self, _prompt: &str) -> anyhow::Result<String> {
            Ok(self.reply.clone())
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl IntentGenerator for FailingGenerator {
        async fn generate(&self, _prompt: &str) -> anyhow::Result<String> {
            anyhow::bail!("connection refused")
        }
    }

    fn rule_parser() -> IntentParser {
        IntentParser::new(None)
    }

    fn with_generator(reply: &str) -> IntentParser {
        IntentParser::new(Some(Arc::new(CannedGenerator {
            reply: reply.to_string(),
        })))
    }

    #[test]
    fn parse_currency_lakh_and_crore() {
        assert_eq!(parse_currency("5l"), Some(500_000.0));
        assert_eq!(parse_currency("2cr"), Some(20_000_000.0));
        assert_eq!(parse_currency("abc"), None);
        assert_eq!(parse_currency("10 lakhs"), Some(1_000_000.0));
        assert_eq!(parse_currency("1.5 crore"), Some(15_000_000.0));
        assert_eq!(parse_currency("rs 5,00,000"), Some(500_000.0));
        assert_eq!(parse_currency("₹25000"), Some(25_000.0));
        assert_eq!(parse_currency(""), None);
        assert_eq!(parse_currency("l"), None);
    }

    #[test]
    fn food_franchise_scenario() {
        let intent = rule_parser().parse_rule_based("food franchise in Bangalore with 8% ROI");

        assert_eq!(intent.route, Route::FranchiseOpportunities);
        assert_eq!(intent.sub_keywords.category, Some(Category::Food));
        assert_eq!(intent.sub_keywords.roi, Some(8.0));
        assert_eq!(intent.sub_keywords.location.as_deref(), Some("Bangalore"));
        assert_eq!(intent.sub_keywords.min_investment, None);
        assert_eq!(intent.sub_keywords.max_investment, None);
    }

    #[test]
    fn sports_shop_scenario() {
        let intent =
            rule_parser().parse_rule_based("sports shop in bengaluru between 5l and 10l");

        assert_eq!(intent.sub_keywords.category, Some(Category::SportsEquipment));
        assert_eq!(intent.sub_keywords.location.as_deref(), Some("Bangalore"));
        assert_eq!(intent.sub_keywords.min_investment, Some(500_000.0));
        assert_eq!(intent.sub_keywords.max_investment, Some(1_000_000.0));
    }

    #[test]
    fn category_group_order_is_first_match_wins() {
        // "retail food court" hits both groups; Food is enumerated first.
        let intent = rule_parser().parse_rule_based("retail food court");
        assert_eq!(intent.sub_keywords.category, Some(Category::Food));

        let intent = rule_parser().parse_rule_based("retail fitness gear");
        assert_eq!(intent.sub_keywords.category, Some(Category::Retail));
    }

    #[test]
    fn no_category_keyword_yields_null() {
        let intent = rule_parser().parse_rule_based("franchise under 20000 in pune");
        assert_eq!(intent.sub_keywords.category, None);
    }

    #[test]
    fn roi_takes_first_percentage() {
        let intent = rule_parser().parse_rule_based("roi of 12.5% or maybe 20%");
        assert_eq!(intent.sub_keywords.roi, Some(12.5));
    }

    #[test]
    fn roi_ignores_numbers_without_percent_sign() {
        let intent = rule_parser().parse_rule_based("food franchise with good returns");
        assert_eq!(intent.sub_keywords.roi, None);
    }

    #[test]
    fn location_alias_beats_canonical_scan() {
        let intent = rule_parser().parse_rule_based("bakery in banglore or mumbai");
        assert_eq!(intent.sub_keywords.location.as_deref(), Some("Bangalore"));
    }

    #[test]
    fn location_falls_back_to_canonical_names() {
        let intent = rule_parser().parse_rule_based("cafe franchise in Hyderabad");
        assert_eq!(intent.sub_keywords.location.as_deref(), Some("Hyderabad"));
    }

    #[test]
    fn upper_and_lower_bounds_fire_independently() {
        let intent =
            rule_parser().parse_rule_based("franchise at least 2l and up to 10l in delhi");
        assert_eq!(intent.sub_keywords.min_investment, Some(200_000.0));
        assert_eq!(intent.sub_keywords.max_investment, Some(1_000_000.0));
    }

    #[test]
    fn upper_bound_alone_sets_only_max() {
        let intent = rule_parser().parse_rule_based("food franchise under 50,000");
        assert_eq!(intent.sub_keywords.min_investment, None);
        assert_eq!(intent.sub_keywords.max_investment, Some(50_000.0));

        let intent = rule_parser().parse_rule_based("options upto 1cr");
        assert_eq!(intent.sub_keywords.max_investment, Some(10_000_000.0));
    }

    #[test]
    fn bare_amount_defaults_to_minimum() {
        let intent = rule_parser().parse_rule_based("food franchise with 5l budget");
        assert_eq!(intent.sub_keywords.min_investment, Some(500_000.0));
        assert_eq!(intent.sub_keywords.max_investment, None);
    }

    #[test]
    fn bare_amount_ignores_percentages_and_small_numbers() {
        let intent = rule_parser().parse_rule_based("food franchise with 8% roi");
        assert_eq!(intent.sub_keywords.min_investment, None);

        let intent = rule_parser().parse_rule_based("top 10 food franchises");
        assert_eq!(intent.sub_keywords.min_investment, None);
    }

    #[test]
    fn between_with_hyphen_separator() {
        let intent = rule_parser().parse_rule_based("stores between 50,000 - 2,00,000");
        assert_eq!(intent.sub_keywords.min_investment, Some(50_000.0));
        assert_eq!(intent.sub_keywords.max_investment, Some(200_000.0));
    }

    #[test]
    fn extractor_is_deterministic() {
        let parser = rule_parser();
        let query = "sports shop in bengaluru between 5l and 10l with 15% roi";
        let first = parser.parse_rule_based(query);
        for _ in 0..5 {
            assert_eq!(parser.parse_rule_based(query), first);
        }
    }

    #[test]
    fn strip_code_fences_handles_json_fence() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("{\"a\":1}"), "{\"a\":1}");
    }

    #[tokio::test]
    async fn model_strategy_parses_valid_reply() {
        let parser = with_generator(
            r#"```json
{"route": "/research", "subKeywords": {"category": "Food", "roi": 8}}
```"#,
        );
        let intent = parser.parse("research on market trends").await;

        // Non-opportunities route keeps no sub-keywords, whatever the model said.
        assert_eq!(intent.route, Route::Research);
        assert_eq!(intent.sub_keywords, SubKeywords::null_shape());
    }

    #[tokio::test]
    async fn model_strategy_canonicalizes_category_synonyms() {
        let parser = with_generator(
            r#"{"route": "/franchise/oppurtunties", "subKeywords": {"category": "Sports Equipment", "location": "Pune"}}"#,
        );
        let intent = parser.parse("sports gear in pune").await;

        assert_eq!(intent.sub_keywords.category, Some(Category::SportsEquipment));
        assert_eq!(intent.sub_keywords.location.as_deref(), Some("Pune"));
    }

    #[tokio::test]
    async fn model_strategy_defaults_unknown_route() {
        let parser = with_generator(r#"{"route": "/totally-made-up"}"#);
        let intent = parser.parse("anything").await;
        assert_eq!(intent.route, Route::FranchiseOpportunities);
    }

    #[tokio::test]
    async fn non_json_model_reply_falls_back_to_rules() {
        let parser = with_generator("Sorry, I cannot help with that.");
        let intent = parser.parse("food franchise in Bangalore with 8% ROI").await;

        assert_eq!(intent.route, Route::FranchiseOpportunities);
        assert_eq!(intent.sub_keywords.category, Some(Category::Food));
        assert_eq!(intent.sub_keywords.roi, Some(8.0));
    }

    #[tokio::test]
    async fn missing_route_field_falls_back_to_rules() {
        let parser = with_generator(r#"{"subKeywords": {"category": "Food"}}"#);
        let intent = parser.parse("sports shop in bengaluru").await;
        assert_eq!(intent.sub_keywords.category, Some(Category::SportsEquipment));
    }

    #[tokio::test]
    async fn transport_failure_falls_back_to_rules() {
        let parser = IntentParser::new(Some(Arc::new(FailingGenerator)));
        let intent = parser.parse("grocery store in chennai").await;

        assert_eq!(intent.route, Route::FranchiseOpportunities);
        assert_eq!(intent.sub_keywords.category, Some(Category::Retail));
        assert_eq!(intent.sub_keywords.location.as_deref(), Some("Chennai"));
    }

    #[tokio::test]
    async fn no_generator_uses_rules_immediately() {
        let intent = rule_parser().parse("bakery franchise in jaipur").await;
        assert_eq!(intent.sub_keywords.category, Some(Category::Food));
        assert_eq!(intent.sub_keywords.location.as_deref(), Some("Jaipur"));
    }
}
