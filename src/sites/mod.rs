//! Site adapters and the shared search engine.
//!
//! An adapter owns one site's URL shape and markup. Everything brittle
//! (which element is a posting card, where the title lives) is expressed
//! as an ordered selector cascade in [`SiteConfig`]: the first selector
//! that yields something non-empty wins. Sites change markup routinely;
//! the cascade is the robustness mechanism, not any single selector.

pub mod job51;
pub mod shixiseng;
pub mod yingjiesheng;

use std::sync::OnceLock;
use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use rand::Rng;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::browser::Session;
use crate::models::{GradYears, RawPosting, RecruitType};
use crate::normalize::collapse_ws;

pub use job51::Job51;
pub use shixiseng::Shixiseng;
pub use yingjiesheng::Yingjiesheng;

/// Request fields an adapter may need for URL construction.
#[derive(Debug, Clone)]
pub struct SearchContext {
    pub grad_year: GradYears,
    pub recruit_type: RecruitType,
    pub today_only: bool,
}

/// Declarative per-site configuration: selector cascades, caps, pacing.
pub struct SiteConfig {
    pub name: &'static str,
    pub origin: &'static str,
    pub card_selectors: &'static [&'static str],
    pub title_selectors: &'static [&'static str],
    pub company_selectors: &'static [&'static str],
    pub location_selectors: &'static [&'static str],
    pub salary_selectors: &'static [&'static str],
    pub time_selectors: &'static [&'static str],
    pub link_selectors: &'static [&'static str],
    /// Cards processed per page; bounds latency under extreme result sets.
    pub card_cap: usize,
    pub page_cap: u32,
    pub empty_page_threshold: u32,
    /// Jittered sleep windows in seconds.
    pub card_pause: (f64, f64),
    pub page_pause: (f64, f64),
    /// Path fragment marking a company-listing page rather than a posting.
    pub company_page_pattern: Option<&'static str>,
}

pub trait Site: Send + Sync {
    fn config(&self) -> &SiteConfig;
    fn search_url(&self, keyword: &str, city: &str, ctx: &SearchContext, page: u32) -> String;
    fn supports(&self, recruit: RecruitType) -> bool;

    /// Landing page to substitute when a card links to a company listing
    /// instead of a specific posting.
    fn company_search_url(&self, _company: &str, _title: &str) -> Option<String> {
        None
    }

    fn name(&self) -> &'static str {
        self.config().name
    }
}

pub fn all_sites() -> Vec<Box<dyn Site>> {
    vec![Box::new(Yingjiesheng), Box::new(Job51), Box::new(Shixiseng)]
}

/// One extracted posting card, before request context is attached.
#[derive(Debug, Clone)]
pub struct RawCard {
    pub title: String,
    pub company: Option<String>,
    pub location: Option<String>,
    pub salary: Option<String>,
    pub update_time: Option<String>,
    pub url: String,
}

pub async fn jitter_sleep(range: (f64, f64)) {
    let secs = rand::thread_rng().gen_range(range.0..=range.1);
    tokio::time::sleep(Duration::from_secs_f64(secs)).await;
}

/// Tracks pagination termination: a run of empty pages, or (in today-only
/// mode) a run of pages with nothing updated today, ends the loop before
/// the page cap is reached.
pub struct PageTally {
    empty_threshold: u32,
    today_only: bool,
    empty_streak: u32,
    stale_streak: u32,
}

impl PageTally {
    pub fn new(empty_threshold: u32, today_only: bool) -> Self {
        Self {
            empty_threshold: empty_threshold.max(1),
            today_only,
            empty_streak: 0,
            stale_streak: 0,
        }
    }

    /// Records one page; returns true when pagination should stop.
    pub fn record(&mut self, cards: usize, same_day: usize) -> bool {
        if cards == 0 {
            self.empty_streak += 1;
        } else {
            self.empty_streak = 0;
        }
        if self.today_only {
            if same_day == 0 {
                self.stale_streak += 1;
            } else {
                self.stale_streak = 0;
            }
        }
        self.empty_streak >= self.empty_threshold
            || (self.today_only && self.stale_streak >= self.empty_threshold)
    }
}

/// Drives one (keyword, city) search through paginated result pages.
/// Failures never propagate: network trouble ends the pair early with
/// whatever was collected.
pub async fn search_site(
    session: &Session,
    site: &dyn Site,
    keyword: &str,
    city: &str,
    ctx: &SearchContext,
    page_cap_override: Option<u32>,
) -> Vec<RawPosting> {
    let cfg = site.config();
    let page_cap = page_cap_override.unwrap_or(cfg.page_cap).max(1);
    let mut tally = PageTally::new(cfg.empty_page_threshold, ctx.today_only);
    let today = chrono::Local::now().date_naive();
    let mut collected = Vec::new();

    println!("    搜索 {}: {keyword} | {city}", cfg.name);

    for page in 1..=page_cap {
        let url = site.search_url(keyword, city, ctx, page);
        if let Err(err) = session.goto_with_retry(&url, 3).await {
            eprintln!("    ⚠ {} 访问受限，跳过本组: {err:#}", cfg.name);
            break;
        }
        // Idle inside the pacing window before touching the DOM.
        jitter_sleep(cfg.page_pause).await;

        // A source read that fails after a successful load counts as an
        // empty page, not an error.
        let html = session.page_source().await.unwrap_or_default();
        let cards = extract_cards(&html, site);

        let same_day = cards
            .iter()
            .filter(|card| {
                card.update_time
                    .as_deref()
                    .is_some_and(|t| is_same_day(t, today))
            })
            .count();
        if page == 1 {
            if cards.is_empty() {
                println!("    ⚠ 未找到职位列表");
            } else {
                println!("    ✓ 找到 {} 个职位", cards.len());
            }
        }

        let stop = tally.record(cards.len(), same_day);

        for card in cards {
            if ctx.today_only
                && !card
                    .update_time
                    .as_deref()
                    .is_some_and(|t| is_same_day(t, today))
            {
                continue;
            }
            collected.push(RawPosting {
                title: card.title,
                company: card.company,
                location: card.location,
                salary: card.salary,
                update_time: card.update_time,
                publish_time: None,
                url: card.url,
                site: cfg.name,
                keyword: keyword.to_string(),
                city: city.to_string(),
            });
            jitter_sleep(cfg.card_pause).await;
        }

        if stop {
            break;
        }
    }

    collected
}

/// Extracts posting cards from page HTML with the site's cascades.
/// Pure; unit-testable against fixture markup.
pub fn extract_cards(html: &str, site: &dyn Site) -> Vec<RawCard> {
    let cfg = site.config();
    let document = Html::parse_document(html);

    let mut cards: Vec<ElementRef> = Vec::new();
    for candidate in cfg.card_selectors {
        let Ok(selector) = Selector::parse(candidate) else {
            continue;
        };
        let found: Vec<ElementRef> = document.select(&selector).collect();
        if !found.is_empty() {
            cards = found;
            break;
        }
    }

    let mut out = Vec::new();
    for card in cards.into_iter().take(cfg.card_cap) {
        let Some(raw) = extract_card(card, site) else {
            continue;
        };
        out.push(raw);
    }
    out
}

fn extract_card(card: ElementRef, site: &dyn Site) -> Option<RawCard> {
    let cfg = site.config();

    let mut title = first_text(card, cfg.title_selectors);
    let mut href = first_href(card, cfg.link_selectors);

    // The card cascade may have matched the link element itself.
    if card.value().name() == "a" {
        if href.is_none() {
            href = card
                .value()
                .attr("href")
                .map(str::to_string)
                .filter(|h| !h.trim().is_empty());
        }
        if title.is_none() {
            let text = collapse_ws(&card.text().collect::<String>());
            if !text.is_empty() {
                title = Some(text);
            }
        }
    }

    // Title and apply link are mandatory; anything else degrades gracefully.
    let title = title?;
    if title.chars().count() < 2 {
        return None;
    }
    let href = href?;
    let mut url = resolve_link(&href, cfg.origin)?;

    let company = first_text(card, cfg.company_selectors);

    if let Some(pattern) = cfg.company_page_pattern {
        if url.contains(pattern) {
            let company_name = company.as_deref().unwrap_or("");
            if let Some(rewritten) = site.company_search_url(company_name, &title) {
                url = rewritten;
            }
        }
    }

    Some(RawCard {
        title,
        company,
        location: first_text(card, cfg.location_selectors),
        salary: first_text(card, cfg.salary_selectors),
        update_time: first_text(card, cfg.time_selectors),
        url,
    })
}

/// First non-empty text across the cascade.
fn first_text(card: ElementRef, cascade: &[&str]) -> Option<String> {
    for candidate in cascade {
        let Ok(selector) = Selector::parse(candidate) else {
            continue;
        };
        if let Some(element) = card.select(&selector).next() {
            let text = collapse_ws(&element.text().collect::<String>());
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

fn first_href(card: ElementRef, cascade: &[&str]) -> Option<String> {
    for candidate in cascade {
        let Ok(selector) = Selector::parse(candidate) else {
            continue;
        };
        for element in card.select(&selector) {
            if let Some(href) = element.value().attr("href") {
                if !href.trim().is_empty() {
                    return Some(href.trim().to_string());
                }
            }
        }
    }
    None
}

fn resolve_link(href: &str, origin: &str) -> Option<String> {
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }
    let base = Url::parse(origin).ok()?;
    base.join(href).ok().map(|u| u.to_string())
}

/// Loose same-day recognition over the free-text 更新时间 column.
pub fn is_same_day(text: &str, today: NaiveDate) -> bool {
    let text = text.trim();
    if text.is_empty() {
        return false;
    }
    if text.contains("今天")
        || text.contains("刚刚")
        || text.contains("分钟前")
        || text.contains("小时前")
    {
        return true;
    }

    static HHMM: OnceLock<Regex> = OnceLock::new();
    if HHMM
        .get_or_init(|| Regex::new(r"^\d{1,2}:\d{2}$").unwrap())
        .is_match(text)
    {
        return true;
    }

    static FULL_DATE: OnceLock<Regex> = OnceLock::new();
    if let Some(cap) = FULL_DATE
        .get_or_init(|| Regex::new(r"(\d{4})[-/](\d{1,2})[-/](\d{1,2})").unwrap())
        .captures(text)
    {
        return cap[1].parse() == Ok(today.year())
            && cap[2].parse() == Ok(today.month())
            && cap[3].parse() == Ok(today.day());
    }

    static MONTH_DAY: OnceLock<Regex> = OnceLock::new();
    if let Some(cap) = MONTH_DAY
        .get_or_init(|| Regex::new(r"^(\d{1,2})-(\d{1,2})$").unwrap())
        .captures(text)
    {
        return cap[1].parse() == Ok(today.month()) && cap[2].parse() == Ok(today.day());
    }

    static CN_DATE: OnceLock<Regex> = OnceLock::new();
    if let Some(cap) = CN_DATE
        .get_or_init(|| Regex::new(r"(\d{1,2})月(\d{1,2})日").unwrap())
        .captures(text)
    {
        return cap[1].parse() == Ok(today.month()) && cap[2].parse() == Ok(today.day());
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_page_tally_two_empty_pages_terminate() {
        // Pages with 8, 6, 0, 0 postings stop after the fourth page.
        let mut tally = PageTally::new(2, false);
        assert!(!tally.record(8, 0));
        assert!(!tally.record(6, 0));
        assert!(!tally.record(0, 0));
        assert!(tally.record(0, 0));
    }

    #[test]
    fn test_page_tally_streak_resets() {
        let mut tally = PageTally::new(2, false);
        assert!(!tally.record(0, 0));
        assert!(!tally.record(3, 0));
        assert!(!tally.record(0, 0));
        assert!(tally.record(0, 0));
    }

    #[test]
    fn test_page_tally_today_only_stale_pages() {
        let mut tally = PageTally::new(2, true);
        assert!(!tally.record(10, 4));
        assert!(!tally.record(10, 0));
        assert!(tally.record(10, 0));
    }

    #[test]
    fn test_is_same_day_forms() {
        let today = day(2025, 12, 8);
        assert!(is_same_day("今天", today));
        assert!(is_same_day("3分钟前", today));
        assert!(is_same_day("2小时前", today));
        assert!(is_same_day("14:32", today));
        assert!(is_same_day("2025-12-08", today));
        assert!(is_same_day("12-08", today));
        assert!(is_same_day("12月8日", today));

        assert!(!is_same_day("2025-12-07", today));
        assert!(!is_same_day("11-08", today));
        assert!(!is_same_day("昨天", today));
        assert!(!is_same_day("", today));
    }

    #[test]
    fn test_extract_cards_table_markup() {
        let html = r#"
        <html><body><table>
          <tr class="job-list-item">
            <td><a href="/job-1234.html">数据分析师</a></td>
            <td>腾讯科技有限公司</td>
            <td>深圳</td>
            <td>12-08</td>
          </tr>
          <tr class="job-list-item">
            <td><a href="/job-5678.html">商业数据分析</a></td>
            <td>阿里巴巴</td>
            <td>杭州</td>
            <td>今天</td>
          </tr>
        </table></body></html>"#;

        let cards = extract_cards(html, &Yingjiesheng);
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].title, "数据分析师");
        assert_eq!(cards[0].company.as_deref(), Some("腾讯科技有限公司"));
        assert_eq!(cards[0].location.as_deref(), Some("深圳"));
        assert_eq!(cards[0].update_time.as_deref(), Some("12-08"));
        // Relative links resolve against the site origin.
        assert_eq!(cards[0].url, "https://www.yingjiesheng.com/job-1234.html");
    }

    #[test]
    fn test_extract_cards_cascade_falls_back() {
        // No .job-list-item; the tr fallback selector picks the rows up.
        let html = r#"
        <html><body><table>
          <tr>
            <td><a href="/job-1.html">法务专员</a></td>
            <td>中国石油化工股份有限公司</td>
            <td>北京</td>
          </tr>
        </table></body></html>"#;

        let cards = extract_cards(html, &Yingjiesheng);
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].title, "法务专员");
        assert_eq!(
            cards[0].company.as_deref(),
            Some("中国石油化工股份有限公司")
        );
    }

    #[test]
    fn test_extract_cards_drops_card_missing_link() {
        let html = r#"
        <html><body>
          <div class="job-list-item"><span class="job-name">无链接岗位</span></div>
          <div class="job-list-item">
            <a class="job-name" href="https://www.yingjiesheng.com/job-2.html">有链接岗位</a>
          </div>
        </body></html>"#;

        let cards = extract_cards(html, &Yingjiesheng);
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].title, "有链接岗位");
    }

    #[test]
    fn test_extract_cards_respects_card_cap() {
        let mut html = String::from("<html><body><table>");
        for i in 0..40 {
            html.push_str(&format!(
                r#"<tr class="job-list-item"><td><a href="/job-{i}.html">岗位{i}号</a></td><td>公司</td></tr>"#
            ));
        }
        html.push_str("</table></body></html>");

        let cards = extract_cards(&html, &Yingjiesheng);
        assert_eq!(cards.len(), Yingjiesheng.config().card_cap);
    }

    #[test]
    fn test_extract_cards_empty_page() {
        assert!(extract_cards("<html><body></body></html>", &Yingjiesheng).is_empty());
        assert!(extract_cards("", &Yingjiesheng).is_empty());
    }
}
