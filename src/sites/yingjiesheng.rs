//! 应届生求职网, the campus-recruitment channel. Result lists are
//! usually table rows: title link, company, city, update time per column.

use crate::models::RecruitType;
use crate::normalize::urlencode;

use super::{SearchContext, Site, SiteConfig};

pub struct Yingjiesheng;

static CONFIG: SiteConfig = SiteConfig {
    name: "yingjiesheng",
    origin: "https://www.yingjiesheng.com",
    card_selectors: &[
        ".job-list-item",
        ".job-item",
        ".job-info",
        ".list-item",
        "tr",
    ],
    title_selectors: &[
        "td:first-child a",
        "a[href*=\"/job-\"]",
        ".job-name",
        ".job-title",
        ".title",
        "h3",
        "h4",
    ],
    company_selectors: &[
        "td:nth-child(2)",
        ".company-name",
        ".company",
        "[class*=\"company\"]",
        ".firm-name",
    ],
    location_selectors: &[
        "td:nth-child(3)",
        ".city",
        ".location",
        "[class*=\"city\"]",
        ".work-place",
    ],
    salary_selectors: &[".salary", "[class*=\"salary\"]"],
    time_selectors: &[
        "td:nth-child(4)",
        ".update-time",
        ".time",
        ".publish-time",
        "[class*=\"time\"]",
    ],
    link_selectors: &[
        "td:first-child a",
        "a[href*=\"/job-\"]",
        "a[href*=\"job\"]",
        "a",
    ],
    card_cap: 20,
    page_cap: 10,
    empty_page_threshold: 2,
    card_pause: (0.1, 0.3),
    page_pause: (0.8, 1.5),
    company_page_pattern: None,
};

impl Site for Yingjiesheng {
    fn config(&self) -> &SiteConfig {
        &CONFIG
    }

    fn search_url(&self, keyword: &str, city: &str, _ctx: &SearchContext, page: u32) -> String {
        format!(
            "https://www.yingjiesheng.com/job/?keyword={}&city={}&page={page}",
            urlencode(keyword),
            urlencode(city)
        )
    }

    fn supports(&self, recruit: RecruitType) -> bool {
        matches!(recruit, RecruitType::Campus | RecruitType::Mixed)
    }
}
