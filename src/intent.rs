use serde::{Deserialize, Serialize};

/// Closed set of frontend destinations a parsed query can resolve to.
/// Anything outside this set normalizes to [`Route::default`].
///
/// The `/franchise/oppurtunties` spelling is the route the frontend actually
/// serves; do not "fix" it here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Route {
    #[serde(rename = "/franchise/oppurtunties")]
    FranchiseOpportunities,
    #[serde(rename = "/startups-zone-opportunities")]
    StartupsZoneOpportunities,
    #[serde(rename = "/startups-zone-investorhub")]
    StartupsZoneInvestorHub,
    #[serde(rename = "/government-scheme-listing")]
    GovernmentSchemeListing,
    #[serde(rename = "/product-category")]
    ProductCategory,
    #[serde(rename = "/software-hunt-home")]
    SoftwareHuntHome,
    #[serde(rename = "/research")]
    Research,
    #[serde(rename = "/expert-listing")]
    ExpertListing,
    #[serde(rename = "/project-reports-listing")]
    ProjectReportsListing,
    #[serde(rename = "/data-listing")]
    DataListing,
    #[serde(rename = "/coming-soon")]
    ComingSoon,
}

impl Default for Route {
    fn default() -> Self {
        Route::FranchiseOpportunities
    }
}

impl Route {
    pub const ALL: [Route; 11] = [
        Route::FranchiseOpportunities,
        Route::StartupsZoneOpportunities,
        Route::StartupsZoneInvestorHub,
        Route::GovernmentSchemeListing,
        Route::ProductCategory,
        Route::SoftwareHuntHome,
        Route::Research,
        Route::ExpertListing,
        Route::ProjectReportsListing,
        Route::DataListing,
        Route::ComingSoon,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Route::FranchiseOpportunities => "/franchise/oppurtunties",
            Route::StartupsZoneOpportunities => "/startups-zone-opportunities",
            Route::StartupsZoneInvestorHub => "/startups-zone-investorhub",
            Route::GovernmentSchemeListing => "/government-scheme-listing",
            Route::ProductCategory => "/product-category",
            Route::SoftwareHuntHome => "/software-hunt-home",
            Route::Research => "/research",
            Route::ExpertListing => "/expert-listing",
            Route::ProjectReportsListing => "/project-reports-listing",
            Route::DataListing => "/data-listing",
            Route::ComingSoon => "/coming-soon",
        }
    }

    /// Exact match against the closed set; anything else is unrecognized.
    pub fn parse(s: &str) -> Option<Route> {
        Route::ALL.iter().copied().find(|r| r.as_str() == s.trim())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Food,
    Retail,
    #[serde(rename = "Sports & Equipment")]
    SportsEquipment,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Retail => "Retail",
            Category::SportsEquipment => "Sports & Equipment",
        }
    }
}

/// Synonyms the model strategy (or a caller) may produce for a category,
/// resolved in fixed order. Unlisted strings normalize to no category.
const CATEGORY_ALIASES: &[(&str, Category)] = &[
    ("food", Category::Food),
    ("retail", Category::Retail),
    ("sports & equipment", Category::SportsEquipment),
    ("sports equipment", Category::SportsEquipment),
    ("sports and equipment", Category::SportsEquipment),
    ("sports", Category::SportsEquipment),
    ("equipment", Category::SportsEquipment),
];

pub fn canonical_category(raw: &str) -> Option<Category> {
    let needle = raw.trim().to_lowercase();
    CATEGORY_ALIASES
        .iter()
        .find(|(alias, _)| *alias == needle)
        .map(|(_, category)| *category)
}

/// Filter sub-fields of an Intent. Only meaningful on the franchise
/// opportunities route; every other route carries the all-null shape.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubKeywords {
    pub category: Option<Category>,
    pub roi: Option<f64>,
    pub location: Option<String>,
    pub min_investment: Option<f64>,
    pub max_investment: Option<f64>,
}

impl SubKeywords {
    pub fn null_shape() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Intent {
    pub route: Route,
    pub sub_keywords: SubKeywords,
}

/// Applied after either parsing strategy: coerce the route into the closed
/// set, canonicalize the category, and blank the sub-keywords on every
/// route except franchise opportunities.
pub fn normalize_intent(route: Option<&str>, mut sub: SubKeywords) -> Intent {
    let route = route.and_then(Route::parse).unwrap_or_default();

    if route == Route::FranchiseOpportunities {
        // Category already passed through `canonical_category` by this
        // point when it came from the rule-based path; model output gets
        // canonicalized by the caller before arriving here.
        Intent { route, sub_keywords: sub }
    } else {
        sub = SubKeywords::null_shape();
        Intent { route, sub_keywords: sub }
    }
}
