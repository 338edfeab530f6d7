use serde::de::{self, Deserializer};
use serde::Deserialize;

/// How a posting (or a search request) recruits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecruitType {
    Campus,
    Social,
    Internship,
    /// A request that wants both campus and social channels.
    Mixed,
}

impl RecruitType {
    pub fn label(&self) -> &'static str {
        match self {
            RecruitType::Campus => "校招",
            RecruitType::Social => "社招",
            RecruitType::Internship => "实习",
            RecruitType::Mixed => "社招/校招",
        }
    }

    pub fn from_label(label: &str) -> RecruitType {
        let label = label.trim();
        if label.contains('/') || (label.contains("校招") && label.contains("社招")) {
            RecruitType::Mixed
        } else if label.contains("实习") {
            RecruitType::Internship
        } else if label.contains("社招") {
            RecruitType::Social
        } else {
            RecruitType::Campus
        }
    }
}

impl<'de> Deserialize<'de> for RecruitType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(RecruitType::from_label(&s))
    }
}

/// Closed company-type vocabulary assigned by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompanyType {
    BigFour,
    BigEight,
    BigTech,
    StateOwned,
    Unknown,
}

impl CompanyType {
    pub fn label(&self) -> &'static str {
        match self {
            CompanyType::BigFour => "四大",
            CompanyType::BigEight => "八大",
            CompanyType::BigTech => "大厂",
            CompanyType::StateOwned => "央国企",
            CompanyType::Unknown => "未知",
        }
    }

    pub fn from_label(label: &str) -> CompanyType {
        match label.trim() {
            "四大" => CompanyType::BigFour,
            "八大" => CompanyType::BigEight,
            "大厂" => CompanyType::BigTech,
            "央国企" => CompanyType::StateOwned,
            _ => CompanyType::Unknown,
        }
    }
}

/// Company-type constraint a request may carry.
///
/// The catalog writes these as free-form Chinese labels (央国企, 国央企,
/// 广电央企, 大厂, 四大, 八大, ...); matching is by contained keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompanyTypeFilter {
    StateOwned,
    BigTech,
    BigFour,
    BigEight,
}

impl CompanyTypeFilter {
    pub fn parse(label: &str) -> Option<CompanyTypeFilter> {
        let label = label.trim();
        if label.is_empty() {
            return None;
        }
        if label.contains("央企") || label.contains("国企") || label.contains("央国") {
            Some(CompanyTypeFilter::StateOwned)
        } else if label.contains("大厂") || label.contains("大公司") {
            Some(CompanyTypeFilter::BigTech)
        } else if label.contains("四大") {
            Some(CompanyTypeFilter::BigFour)
        } else if label.contains("八大") {
            Some(CompanyTypeFilter::BigEight)
        } else {
            None
        }
    }

    pub fn target(&self) -> CompanyType {
        match self {
            CompanyTypeFilter::StateOwned => CompanyType::StateOwned,
            CompanyTypeFilter::BigTech => CompanyType::BigTech,
            CompanyTypeFilter::BigFour => CompanyType::BigFour,
            CompanyTypeFilter::BigEight => CompanyType::BigEight,
        }
    }
}

impl<'de> Deserialize<'de> for CompanyTypeFilter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        CompanyTypeFilter::parse(&s)
            .ok_or_else(|| de::Error::custom(format!("unrecognised company type: {s}")))
    }
}

/// Target graduation year(s) of a request: absent, one year, or a set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GradYears {
    #[default]
    Unspecified,
    Single(u16),
    Multiple(Vec<u16>),
}

impl GradYears {
    /// Renders the 招聘对象 column: `2026届`, `2025/2026届`, or `不限`.
    pub fn render(&self) -> String {
        match self {
            GradYears::Unspecified => "不限".to_string(),
            GradYears::Single(year) => format!("{year}届"),
            GradYears::Multiple(years) => {
                let joined = years
                    .iter()
                    .map(|y| y.to_string())
                    .collect::<Vec<_>>()
                    .join("/");
                format!("{joined}届")
            }
        }
    }

    pub fn is_set(&self) -> bool {
        !matches!(self, GradYears::Unspecified)
    }
}

fn de_grad_years<'de, D: Deserializer<'de>>(deserializer: D) -> Result<GradYears, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        One(u16),
        Many(Vec<u16>),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(GradYears::Unspecified),
        Some(Raw::One(year)) => Ok(GradYears::Single(year)),
        Some(Raw::Many(years)) if years.is_empty() => Ok(GradYears::Unspecified),
        Some(Raw::Many(years)) => Ok(GradYears::Multiple(years)),
    }
}

/// One row of the declarative search catalog. Immutable within a run.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
    pub keywords: Vec<String>,
    pub locations: Vec<String>,
    #[serde(default, deserialize_with = "de_grad_years")]
    pub grad_year: GradYears,
    pub recruit_type: RecruitType,
    #[serde(default, alias = "industry")]
    pub industries: Option<Vec<String>>,
    #[serde(default)]
    pub education: Option<String>,
    #[serde(default)]
    pub company_type: Option<CompanyTypeFilter>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl SearchRequest {
    /// Short label used for grouping and progress output.
    pub fn short_label(&self) -> String {
        self.keywords
            .iter()
            .take(3)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn notes_contain(&self, needle: &str) -> bool {
        self.notes.as_deref().is_some_and(|n| n.contains(needle))
    }
}

/// What an adapter yields per card, before normalisation. Optional fields
/// are filled with defaults by the posting builder, not here.
#[derive(Debug, Clone)]
pub struct RawPosting {
    pub title: String,
    pub company: Option<String>,
    pub location: Option<String>,
    pub salary: Option<String>,
    pub update_time: Option<String>,
    pub publish_time: Option<String>,
    pub url: String,
    pub site: &'static str,
    pub keyword: String,
    pub city: String,
}

/// Canonical posting schema shared by the sink, the store, and the digest.
#[derive(Debug, Clone)]
pub struct Posting {
    pub company_name: String,
    pub company_type: CompanyType,
    pub work_location: String,
    pub recruit_type: RecruitType,
    pub recruit_target: String,
    pub job_title: String,
    pub salary: String,
    pub update_time: String,
    pub publish_time: Option<String>,
    pub deadline: String,
    pub detail_url: String,
    pub apply_url: String,
    pub source_site: String,
    pub source_keyword: String,
    pub source_city: String,
}

impl Posting {
    /// Dedup identity within and across runs: the canonical apply URL.
    pub fn identity_key(&self) -> String {
        crate::normalize::canonical_url(&self.apply_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recruit_type_labels() {
        assert_eq!(RecruitType::from_label("校招"), RecruitType::Campus);
        assert_eq!(RecruitType::from_label("社招"), RecruitType::Social);
        assert_eq!(RecruitType::from_label("实习"), RecruitType::Internship);
        assert_eq!(RecruitType::from_label("社招/校招"), RecruitType::Mixed);
        assert_eq!(RecruitType::from_label("校招/社招"), RecruitType::Mixed);
    }

    #[test]
    fn test_company_type_filter_parse() {
        assert_eq!(
            CompanyTypeFilter::parse("央国企"),
            Some(CompanyTypeFilter::StateOwned)
        );
        assert_eq!(
            CompanyTypeFilter::parse("国央企"),
            Some(CompanyTypeFilter::StateOwned)
        );
        assert_eq!(
            CompanyTypeFilter::parse("广电央企"),
            Some(CompanyTypeFilter::StateOwned)
        );
        assert_eq!(
            CompanyTypeFilter::parse("大公司优先"),
            Some(CompanyTypeFilter::BigTech)
        );
        assert_eq!(
            CompanyTypeFilter::parse("四大"),
            Some(CompanyTypeFilter::BigFour)
        );
        assert_eq!(CompanyTypeFilter::parse(""), None);
        assert_eq!(CompanyTypeFilter::parse("随便"), None);
    }

    #[test]
    fn test_grad_years_render() {
        assert_eq!(GradYears::Single(2026).render(), "2026届");
        assert_eq!(GradYears::Multiple(vec![2025, 2026]).render(), "2025/2026届");
        assert_eq!(GradYears::Unspecified.render(), "不限");
    }

    #[test]
    fn test_search_request_from_json() {
        let json = r#"{
            "keywords": ["法务", "法律"],
            "locations": ["山西", "成都"],
            "grad_year": 2026,
            "recruit_type": "校招",
            "company_type": "央国企"
        }"#;
        let req: SearchRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.keywords.len(), 2);
        assert_eq!(req.grad_year, GradYears::Single(2026));
        assert_eq!(req.recruit_type, RecruitType::Campus);
        assert_eq!(req.company_type, Some(CompanyTypeFilter::StateOwned));
        assert!(req.notes.is_none());
    }

    #[test]
    fn test_search_request_grad_year_variants() {
        let multi: SearchRequest = serde_json::from_str(
            r#"{"keywords":["a"],"locations":["上海"],"grad_year":[2025,2026],"recruit_type":"校招"}"#,
        )
        .unwrap();
        assert_eq!(multi.grad_year, GradYears::Multiple(vec![2025, 2026]));

        let none: SearchRequest = serde_json::from_str(
            r#"{"keywords":["a"],"locations":["上海"],"grad_year":null,"recruit_type":"社招/校招"}"#,
        )
        .unwrap();
        assert_eq!(none.grad_year, GradYears::Unspecified);

        let absent: SearchRequest = serde_json::from_str(
            r#"{"keywords":["a"],"locations":["上海"],"recruit_type":"社招"}"#,
        )
        .unwrap();
        assert_eq!(absent.grad_year, GradYears::Unspecified);
    }
}
