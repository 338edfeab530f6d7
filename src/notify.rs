//! Incremental notification: a compact markdown digest of the run's new
//! postings, posted to a DingTalk-style chat webhook. Webhook trouble is
//! never fatal to the run.

use std::path::Path;

use anyhow::{bail, Result};
use chrono::{DateTime, Local};
use serde_json::json;

use crate::models::Posting;

/// Postings listed per digest before the "see the spreadsheet" cutoff.
const DIGEST_CAP: usize = 50;

pub struct Notifier {
    webhook: String,
    http: reqwest::Client,
}

impl Notifier {
    pub fn new(webhook: String) -> Self {
        Self {
            webhook,
            http: reqwest::Client::new(),
        }
    }

    /// Webhook URL from the environment, falling back to a secrets file
    /// next to the seen-key store. No secret lives in source.
    pub fn resolve(state_dir: &Path) -> Option<Notifier> {
        if let Ok(url) = std::env::var("DINGTALK_WEBHOOK") {
            let url = url.trim().to_string();
            if !url.is_empty() {
                return Some(Notifier::new(url));
            }
        }
        let secrets = state_dir.join("webhook.txt");
        let url = std::fs::read_to_string(secrets).ok()?;
        let url = url.trim().to_string();
        (!url.is_empty()).then(|| Notifier::new(url))
    }

    pub async fn send_markdown(&self, title: &str, text: &str) -> Result<()> {
        let payload = json!({
            "msgtype": "markdown",
            "markdown": { "title": title, "text": text },
        });

        let resp = self.http.post(&self.webhook).json(&payload).send().await?;
        if !resp.status().is_success() {
            bail!("webhook returned HTTP {}", resp.status());
        }

        // DingTalk answers 200 even on rejection; the body carries errcode.
        let body: serde_json::Value = resp.json().await.unwrap_or_default();
        let errcode = body.get("errcode").and_then(|v| v.as_i64()).unwrap_or(0);
        if errcode != 0 {
            let errmsg = body
                .get("errmsg")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown");
            bail!("webhook rejected message: errcode={errcode} ({errmsg})");
        }
        Ok(())
    }
}

/// Renders the digest: header with time, period and counts, then one
/// section per source site in processing order.
pub fn build_digest(
    new: &[Posting],
    total_tracked: i64,
    period: &str,
    now: DateTime<Local>,
) -> (String, String) {
    let title = format!("📢 招聘雷达 | 新增岗位 {} 个", new.len());

    let mut text = String::new();
    text.push_str("## 📢 招聘雷达\n\n");
    text.push_str(&format!(
        "**📅 生成时间**: {}\n\n",
        now.format("%Y-%m-%d %H:%M:%S")
    ));
    text.push_str(&format!("**📊 数据周期**: {period}\n\n"));
    text.push_str(&format!("**📈 本次新增**: {} 个岗位\n\n", new.len()));
    text.push_str(&format!("**💾 累计跟踪**: {total_tracked} 个岗位\n\n"));
    text.push_str("---\n\n");

    if new.is_empty() {
        text.push_str("本次无新增岗位。\n");
        return (title, text);
    }

    let shown = &new[..new.len().min(DIGEST_CAP)];
    for (site, postings) in group_by_site(shown) {
        text.push_str(&format!("### 📌 {site}（{} 个）\n\n", postings.len()));
        for (idx, posting) in postings.iter().enumerate() {
            text.push_str(&format!("{}. **{}**", idx + 1, posting.job_title));
            if !posting.company_name.is_empty() && posting.company_name != "未知" {
                text.push_str(&format!(" | {}", posting.company_name));
            }
            if !posting.work_location.is_empty() {
                text.push_str(&format!(" | 📍 {}", posting.work_location));
            }
            if posting.apply_url.is_empty() {
                text.push_str("  ⚠️ 链接缺失");
            } else {
                text.push_str(&format!("  🔗 [链接]({})", posting.apply_url));
            }
            text.push('\n');
        }
        text.push('\n');
    }

    let remaining = new.len().saturating_sub(DIGEST_CAP);
    if remaining > 0 {
        text.push_str("---\n\n");
        text.push_str(&format!(
            "**💡 提示**: 还有 {remaining} 个岗位未显示，完整数据见Excel文件\n"
        ));
    }

    (title, text)
}

/// Groups by source site, preserving processing order of sites and of
/// postings within a site.
fn group_by_site(postings: &[Posting]) -> Vec<(&str, Vec<&Posting>)> {
    let mut groups: Vec<(&str, Vec<&Posting>)> = Vec::new();
    for posting in postings {
        match groups.iter_mut().find(|(site, _)| *site == posting.source_site) {
            Some((_, members)) => members.push(posting),
            None => groups.push((posting.source_site.as_str(), vec![posting])),
        }
    }
    groups
}
