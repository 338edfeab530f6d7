//! Run orchestration: catalog × keyword × city over the site adapters,
//! then normalise → classify → filter → dedup → sink → notify → persist.
//! Serial by design; the sites' anti-automation defences punish bursts.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Local;

use crate::browser::Session;
use crate::classify;
use crate::db::SeenStore;
use crate::filter;
use crate::locations::LocationExpander;
use crate::models::{Posting, RawPosting, SearchRequest};
use crate::normalize;
use crate::notify::{self, Notifier};
use crate::report;
use crate::sites::{self, SearchContext};

/// Jittered window between (keyword, city) pairs, in seconds.
const PAIR_PAUSE: (f64, f64) = (2.0, 5.0);

pub struct RunOptions {
    pub today_only: bool,
    pub append: bool,
    pub out: PathBuf,
    pub page_cap: Option<u32>,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub requests: usize,
    pub scraped: usize,
    pub kept: usize,
    pub new: usize,
    pub already_seen: usize,
    pub per_site: Vec<(String, usize)>,
    pub cancelled: bool,
}

impl RunSummary {
    pub fn print(&self, out: &std::path::Path) {
        println!("\n{}", "=".repeat(60));
        println!("📊 抓取结果摘要");
        println!("{}", "=".repeat(60));
        if self.cancelled {
            println!("⚠ 本次运行被中断，以下为已收集部分");
        }
        println!("处理配置数: {}", self.requests);
        println!("抓取岗位数: {}", self.scraped);
        println!("过滤后保留: {}", self.kept);
        println!("本次新增: {} | 已见过: {}", self.new, self.already_seen);
        for (site, count) in &self.per_site {
            println!("  {site}: {count}");
        }
        println!("输出文件: {}", out.display());
        println!("{}", "=".repeat(60));
    }
}

/// Raw card → canonical posting: defaults, classification, cleanup.
pub fn build_posting(raw: RawPosting, request: &SearchRequest) -> Posting {
    let company_name = raw
        .company
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| "未知".to_string());
    let company_type = classify::classify_company(&company_name, request.company_type);
    // The posting's own text decides its recruit type; the request only
    // shapes 招聘对象.
    let recruit_type = classify::infer_recruit_type(&format!("{} {}", raw.title, company_name));

    let mut posting = Posting {
        company_name,
        company_type,
        work_location: raw.location.unwrap_or_else(|| raw.city.clone()),
        recruit_type,
        recruit_target: request.grad_year.render(),
        job_title: raw.title,
        salary: raw.salary.unwrap_or_else(|| "面议".to_string()),
        update_time: raw.update_time.unwrap_or_else(|| "未知".to_string()),
        publish_time: raw.publish_time,
        deadline: "详见链接".to_string(),
        detail_url: raw.url.clone(),
        apply_url: raw.url,
        source_site: raw.site.to_string(),
        source_keyword: raw.keyword,
        source_city: raw.city,
    };
    normalize::normalize_posting(&mut posting);
    posting
}

/// Builds, filters, and in-run-dedups one batch of raw cards into `kept`.
pub fn absorb_batch(
    raws: Vec<RawPosting>,
    request: &SearchRequest,
    run_keys: &mut HashSet<String>,
    kept: &mut Vec<Posting>,
) {
    for raw in raws {
        let posting = build_posting(raw, request);
        if !filter::passes(&posting, request) {
            continue;
        }
        if !run_keys.insert(posting.identity_key()) {
            continue;
        }
        kept.push(posting);
    }
}

/// Splits kept postings into (new, already-seen count) against the keys
/// loaded from the store at run start.
pub fn split_new(kept: &[Posting], seen_at_start: &HashSet<String>) -> (Vec<Posting>, usize) {
    let mut new = Vec::new();
    let mut already = 0;
    for posting in kept {
        if seen_at_start.contains(&posting.identity_key()) {
            already += 1;
        } else {
            new.push(posting.clone());
        }
    }
    (new, already)
}

pub struct Driver {
    pub requests: Vec<SearchRequest>,
    pub expander: LocationExpander,
    pub store: SeenStore,
    pub state_dir: PathBuf,
    pub cancel: Arc<AtomicBool>,
}

impl Driver {
    pub async fn run_once(&mut self, session: &Session, opts: &RunOptions) -> Result<RunSummary> {
        let seen_at_start = self.store.load()?;
        let all_sites = sites::all_sites();

        let mut run_keys: HashSet<String> = HashSet::new();
        let mut kept: Vec<Posting> = Vec::new();
        let mut scraped = 0usize;
        let mut cancelled = false;

        let total = self.requests.len();
        'requests: for (idx, request) in self.requests.iter().enumerate() {
            println!("\n[{}/{total}] 处理配置: {}", idx + 1, request.short_label());

            let cities = self.expander.expand(&request.locations);
            let ctx = SearchContext {
                grad_year: request.grad_year.clone(),
                recruit_type: request.recruit_type,
                today_only: opts.today_only,
            };

            for keyword in &request.keywords {
                for city in &cities {
                    // Cooperative cancellation between units of work; no
                    // unit is aborted mid-extraction.
                    if self.cancel.load(Ordering::Relaxed) {
                        cancelled = true;
                        break 'requests;
                    }

                    for site in all_sites.iter().filter(|s| s.supports(request.recruit_type)) {
                        let raws = sites::search_site(
                            session,
                            site.as_ref(),
                            keyword,
                            city,
                            &ctx,
                            opts.page_cap,
                        )
                        .await;
                        scraped += raws.len();
                        absorb_batch(raws, request, &mut run_keys, &mut kept);
                    }

                    sites::jitter_sleep(PAIR_PAUSE).await;
                }
            }
        }

        let (new, already_seen) = split_new(&kept, &seen_at_start);

        // Today-only runs report just the fresh subset; a plain run keeps
        // everything collected this pass.
        let sheet_rows: Vec<Posting> = if opts.today_only {
            new.clone()
        } else {
            kept.clone()
        };
        let sheet_rows = if opts.append && opts.out.exists() {
            let existing = report::read_report(&opts.out)
                .with_context(|| format!("Failed to read existing sheet {}", opts.out.display()))?;
            report::merge_for_append(existing, &sheet_rows)
        } else {
            sheet_rows
        };
        report::write_report(&opts.out, &sheet_rows)?;
        println!("\n✓ 数据已保存至: {} ({} 条)", opts.out.display(), sheet_rows.len());

        self.send_digest(&new, opts).await;

        let now = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let new_keys: Vec<String> = new.iter().map(Posting::identity_key).collect();
        if let Err(err) = self.store.mark_seen(&new_keys, &now) {
            eprintln!("⚠ 保存已见记录时出错: {err:#}");
        }

        let mut per_site: Vec<(String, usize)> = Vec::new();
        for posting in &kept {
            match per_site.iter_mut().find(|(site, _)| *site == posting.source_site) {
                Some((_, count)) => *count += 1,
                None => per_site.push((posting.source_site.clone(), 1)),
            }
        }

        Ok(RunSummary {
            requests: total,
            scraped,
            kept: kept.len(),
            new: new.len(),
            already_seen,
            per_site,
            cancelled,
        })
    }

    /// Webhook failures are logged and discarded, never fatal to the run.
    async fn send_digest(&self, new: &[Posting], opts: &RunOptions) {
        let Some(notifier) = Notifier::resolve(&self.state_dir) else {
            println!("ℹ 未配置Webhook，跳过推送");
            return;
        };

        let period = if opts.today_only {
            "今日更新"
        } else {
            "最近一次抓取"
        };
        let tracked = self.store.total().unwrap_or(0) + new.len() as i64;
        let (title, text) = notify::build_digest(new, tracked, period, Local::now());
        match notifier.send_markdown(&title, &text).await {
            Ok(()) => println!("✓ 钉钉消息发送成功"),
            Err(err) => eprintln!("⚠ 推送失败(忽略): {err:#}"),
        }
    }
}
