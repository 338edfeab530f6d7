//! 前程无忧 (51job), the social-recruitment channel. Search URLs carry a
//! numeric city code; unknown cities fall back to the national search.
//! Card links sometimes point at the company's listing page instead of a
//! posting; those are rewritten to a company+title search so the reader
//! still lands somewhere useful.

use crate::models::RecruitType;
use crate::normalize::urlencode;

use super::{SearchContext, Site, SiteConfig};

pub struct Job51;

const NATIONAL_CODE: &str = "000000";

const CITY_CODES: &[(&str, &str)] = &[
    ("北京", "010000"),
    ("上海", "020000"),
    ("广州", "030200"),
    ("深圳", "040000"),
    ("天津", "050000"),
    ("重庆", "060000"),
    ("南京", "070200"),
    ("苏州", "070300"),
    ("杭州", "080200"),
    ("成都", "090200"),
    ("武汉", "180200"),
    ("西安", "200200"),
];

static CONFIG: SiteConfig = SiteConfig {
    name: "51job",
    origin: "https://jobs.51job.com",
    card_selectors: &[
        ".el",
        ".joblist_item",
        "[class*=\"job-item\"]",
        "[class*=\"position-item\"]",
        "div[class*=\"job\"]",
        "li[class*=\"job\"]",
    ],
    title_selectors: &[
        ".t1",
        ".jobname",
        "a[href*=\"/job/\"]",
        "span[title]",
        ".job_title",
        "a",
    ],
    company_selectors: &[".t2", ".company", ".cname", "[class*=\"company\"]"],
    location_selectors: &[".t3", ".location", ".area", "[class*=\"location\"]"],
    salary_selectors: &[".t4", ".salary", "[class*=\"salary\"]"],
    time_selectors: &[".t5", ".time", ".pubtime", "[class*=\"time\"]"],
    link_selectors: &[".t1 a", ".jobname a", "a[href]"],
    card_cap: 25,
    page_cap: 10,
    empty_page_threshold: 2,
    card_pause: (0.1, 0.3),
    page_pause: (0.8, 1.5),
    company_page_pattern: Some("/all/co"),
};

fn city_code(city: &str) -> &'static str {
    CITY_CODES
        .iter()
        .find(|(name, _)| *name == city)
        .map(|(_, code)| *code)
        .unwrap_or(NATIONAL_CODE)
}

fn list_url(code: &str, query: &str, page: u32) -> String {
    format!(
        "https://search.51job.com/list/{code},000000,0000,00,9,99,{},2,{page}.html",
        urlencode(query)
    )
}

impl Site for Job51 {
    fn config(&self) -> &SiteConfig {
        &CONFIG
    }

    fn search_url(&self, keyword: &str, city: &str, _ctx: &SearchContext, page: u32) -> String {
        list_url(city_code(city), keyword, page)
    }

    fn supports(&self, recruit: RecruitType) -> bool {
        matches!(recruit, RecruitType::Social | RecruitType::Mixed)
    }

    fn company_search_url(&self, company: &str, title: &str) -> Option<String> {
        let query = format!("{company} {title}");
        Some(list_url(NATIONAL_CODE, query.trim(), 1))
    }
}
