//! Rule-based company-type classification and recruit-type inference.
//!
//! The classifier is a flat ordered rule list: the first matching rule
//! wins. The foreign-invested guard keeps bare substring hits on 中国 or
//! 集团 from mislabelling foreign subsidiaries as state-owned.

use crate::models::{CompanyType, CompanyTypeFilter, RecruitType};

/// Big-Four accounting firms, Chinese and latin spellings.
pub const FOUR_BIG: &[&str] = &[
    "普华永道", "德勤", "安永", "毕马威", "PwC", "Deloitte", "EY", "KPMG",
];

/// Big-Eight domestic accounting firms.
pub const EIGHT_BIG: &[&str] = &[
    "立信", "天健", "信永中和", "大华", "大信", "致同", "天职国际", "中审众环", "容诚",
];

/// Internet / tech majors used by the 大厂 filter.
pub const BIG_TECH: &[&str] = &[
    "阿里巴巴", "腾讯", "百度", "字节跳动", "华为", "京东", "美团", "滴滴",
    "小米", "网易", "新浪", "搜狐", "360", "拼多多", "快手", "B站", "爱奇艺",
    "蚂蚁集团", "腾讯云", "阿里云", "京东云", "华为云", "抖音", "今日头条",
    "西瓜视频", "懂车帝", "飞书", "钉钉", "企业微信",
];

/// State-owned markers: ownership words, central-enterprise groups, carriers.
pub const STATE_OWNED_KEYWORDS: &[&str] = &[
    "国有", "中国", "集团", "央企", "国企", "中建", "中交", "中铁", "中电",
    "中化", "中石油", "中石化", "中海油", "国家电网", "南方电网", "华能",
    "大唐", "华电", "国电", "中核", "中广核", "航天", "航空", "兵器",
    "船舶", "电子科技", "中国移动", "中国联通", "中国电信",
];

/// Names matching any of these are foreign-invested subsidiaries and must
/// not be labelled 央国企 even when a state-owned keyword hits.
const FOREIGN_GUARD: &[&str] = &["投资有限公司", "（中国）", "(中国)", "外资", "外企"];

fn contains_any(name: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| name.contains(kw))
}

fn contains_any_ci(name: &str, keywords: &[&str]) -> bool {
    let lower = name.to_lowercase();
    keywords.iter().any(|kw| lower.contains(&kw.to_lowercase()))
}

pub fn is_foreign_invested(name: &str) -> bool {
    contains_any(name, FOREIGN_GUARD)
}

/// Classifies a company name, falling back to the request's own
/// company-type filter when no keyword rule fires. Deterministic.
pub fn classify_company(name: &str, filter: Option<CompanyTypeFilter>) -> CompanyType {
    let name = name.trim();
    if name.is_empty() || name == "未知" {
        return CompanyType::Unknown;
    }

    if contains_any_ci(name, FOUR_BIG) {
        return CompanyType::BigFour;
    }
    if contains_any(name, EIGHT_BIG) {
        return CompanyType::BigEight;
    }
    if contains_any(name, BIG_TECH) {
        return CompanyType::BigTech;
    }
    let foreign = is_foreign_invested(name);
    if !foreign && contains_any(name, STATE_OWNED_KEYWORDS) {
        return CompanyType::StateOwned;
    }

    // The request context may allow defaulting: a 央国企-only search on a
    // state-owned channel can assume the label, except for foreign names.
    match filter {
        Some(CompanyTypeFilter::StateOwned) if !foreign => CompanyType::StateOwned,
        Some(CompanyTypeFilter::StateOwned) => CompanyType::Unknown,
        Some(f) => f.target(),
        None => CompanyType::Unknown,
    }
}

/// Infers the posting's own recruit type from its text. The request's
/// recruit type never overrides this; it only shapes 招聘对象.
pub fn infer_recruit_type(text: &str) -> RecruitType {
    if text.contains("实习") {
        RecruitType::Internship
    } else if text.contains("校招") || text.contains("应届") || text.contains("管培") {
        RecruitType::Campus
    } else {
        RecruitType::Social
    }
}
