//! 实习僧, the internship channel.

use crate::models::RecruitType;
use crate::normalize::urlencode;

use super::{SearchContext, Site, SiteConfig};

pub struct Shixiseng;

static CONFIG: SiteConfig = SiteConfig {
    name: "shixiseng",
    origin: "https://www.shixiseng.com",
    card_selectors: &[
        ".intern-wrap",
        ".job-list-item",
        ".intern-detail",
        ".intern-list-item",
        "[class*=\"intern\"]",
        "[class*=\"job-item\"]",
        "article",
        ".position-item",
    ],
    title_selectors: &[
        ".job-name",
        ".intern-name",
        "[class*=\"job-name\"]",
        "a[href*=\"/intern/\"]",
        ".title",
        "h3",
        "h4",
    ],
    company_selectors: &[
        ".company-name",
        ".intern-company",
        "[class*=\"company\"]",
        ".company",
        ".firm-name",
    ],
    location_selectors: &[
        ".city",
        ".location",
        "[class*=\"city\"]",
        "[class*=\"location\"]",
        ".work-place",
    ],
    salary_selectors: &[".salary", ".intern-salary", "[class*=\"salary\"]"],
    time_selectors: &[
        ".update-time",
        ".time",
        ".publish-time",
        "[class*=\"time\"]",
    ],
    link_selectors: &["a[href*=\"/intern/\"]", "a"],
    card_cap: 20,
    page_cap: 10,
    empty_page_threshold: 2,
    card_pause: (0.1, 0.3),
    page_pause: (0.8, 1.5),
    company_page_pattern: None,
};

impl Site for Shixiseng {
    fn config(&self) -> &SiteConfig {
        &CONFIG
    }

    fn search_url(&self, keyword: &str, city: &str, _ctx: &SearchContext, page: u32) -> String {
        format!(
            "https://www.shixiseng.com/interns?k={}&c={}&p={page}",
            urlencode(keyword),
            urlencode(city)
        )
    }

    fn supports(&self, recruit: RecruitType) -> bool {
        matches!(recruit, RecruitType::Internship)
    }
}
