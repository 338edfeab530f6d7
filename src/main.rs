mod browser;
mod catalog;
mod classify;
mod db;
mod driver;
mod filter;
mod locations;
mod models;
mod normalize;
mod notify;
mod report;
mod sites;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};

use browser::Session;
use db::SeenStore;
use driver::{Driver, RunOptions};
use locations::LocationExpander;

#[derive(Parser)]
#[command(name = "jobradar")]
#[command(about = "Recruitment radar - scrape job postings, dedup, report, notify")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scraping pipeline
    Run {
        /// Single pass (the default when --schedule is absent)
        #[arg(long, conflicts_with = "schedule")]
        once: bool,

        /// Repeat at a fixed interval, e.g. 3h, 45m, 90s
        #[arg(long)]
        schedule: Option<String>,

        /// Keep only postings updated today; output is the new subset
        #[arg(long)]
        today_only: bool,

        /// Merge into the existing sheet instead of overwriting
        #[arg(long)]
        append: bool,

        /// Output spreadsheet path
        #[arg(long)]
        out: Option<PathBuf>,

        /// Search-request catalog file
        #[arg(long, default_value = "catalog.json")]
        catalog: PathBuf,

        /// Optional region→cities override file
        #[arg(long)]
        mapping: Option<PathBuf>,

        /// Seen-key store path (defaults to the platform data dir)
        #[arg(long)]
        state: Option<PathBuf>,

        /// WebDriver endpoint
        #[arg(long, default_value = "http://localhost:9515")]
        webdriver: String,

        /// Show the browser window (login-assisted sessions)
        #[arg(long)]
        no_headless: bool,

        /// Override every site's per-run page cap
        #[arg(long)]
        page_cap: Option<u32>,
    },

    /// Print catalog statistics
    Catalog {
        #[arg(long, default_value = "catalog.json")]
        catalog: PathBuf,

        #[arg(long)]
        mapping: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let code = match cli.command {
        Commands::Run {
            once: _,
            schedule,
            today_only,
            append,
            out,
            catalog,
            mapping,
            state,
            webdriver,
            no_headless,
            page_cap,
        } => {
            cmd_run(RunArgs {
                schedule,
                today_only,
                append,
                out,
                catalog,
                mapping,
                state,
                webdriver,
                headless: !no_headless,
                page_cap,
            })
            .await
        }
        Commands::Catalog { catalog, mapping } => cmd_catalog(&catalog, mapping.as_deref()),
    };

    std::process::exit(code);
}

struct RunArgs {
    schedule: Option<String>,
    today_only: bool,
    append: bool,
    out: Option<PathBuf>,
    catalog: PathBuf,
    mapping: Option<PathBuf>,
    state: Option<PathBuf>,
    webdriver: String,
    headless: bool,
    page_cap: Option<u32>,
}

fn default_out_path() -> PathBuf {
    PathBuf::from(format!(
        "job_hunting_results_{}.xlsx",
        chrono::Local::now().format("%Y-%m-%d")
    ))
}

async fn cmd_run(args: RunArgs) -> i32 {
    let interval = match &args.schedule {
        Some(spec) => match parse_schedule(spec) {
            Ok(interval) => Some(interval),
            Err(err) => {
                eprintln!("✗ 配置错误: {err:#}");
                return 1;
            }
        },
        None => None,
    };

    let state_path = args.state.clone().unwrap_or_else(SeenStore::default_path);
    let store = match SeenStore::open(&state_path) {
        Ok(store) => store,
        Err(err) => {
            eprintln!("✗ 配置错误: {err:#}");
            return 1;
        }
    };
    let state_dir = state_path
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\n收到停止信号，正在收尾...");
                cancel.store(true, Ordering::Relaxed);
            }
        });
    }

    let opts = RunOptions {
        today_only: args.today_only,
        append: args.append,
        out: args.out.clone().unwrap_or_else(default_out_path),
        page_cap: args.page_cap,
    };

    let mut driver = Driver {
        requests: Vec::new(),
        expander: LocationExpander::new(),
        store,
        state_dir,
        cancel: cancel.clone(),
    };

    loop {
        // The catalog is data, reloaded on every pass.
        driver.requests = match catalog::load_requests(&args.catalog) {
            Ok(requests) => requests,
            Err(err) => {
                eprintln!("✗ 配置错误: {err:#}");
                return 1;
            }
        };
        driver.expander = match &args.mapping {
            Some(path) => match LocationExpander::with_overrides(path) {
                Ok(expander) => expander,
                Err(err) => {
                    eprintln!("✗ 配置错误: {err:#}");
                    return 1;
                }
            },
            None => LocationExpander::new(),
        };

        println!("{}", "=".repeat(60));
        println!(
            "招聘雷达 - 开始抓取 ({} 个配置) - {}",
            driver.requests.len(),
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        println!("{}", "=".repeat(60));

        let session = match Session::connect(&args.webdriver, args.headless).await {
            Ok(session) => session,
            Err(err) => {
                eprintln!("✗ 浏览器启动失败: {err:#}");
                return 2;
            }
        };
        println!("✓ 浏览器启动成功");

        let result = driver.run_once(&session, &opts).await;

        // The browser is released on every exit path.
        if let Err(err) = session.quit().await {
            eprintln!("⚠ 关闭浏览器时出错: {err:#}");
        } else {
            println!("✓ 浏览器已关闭");
        }

        let cancelled = match result {
            Ok(summary) => {
                summary.print(&opts.out);
                summary.cancelled
            }
            Err(err) => {
                eprintln!("✗ 运行失败: {err:#}");
                if interval.is_none() {
                    return 1;
                }
                false
            }
        };

        if cancelled {
            return 0;
        }
        let Some(interval) = interval else {
            return 0;
        };
        if cancel.load(Ordering::Relaxed) {
            return 0;
        }

        println!(
            "\n等待 {} 后执行下一次抓取... (Ctrl+C 退出)",
            humanize(interval)
        );
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = tokio::signal::ctrl_c() => {
                println!("\n收到停止信号，程序退出");
                return 0;
            }
        }
    }
}

fn cmd_catalog(catalog_path: &std::path::Path, mapping: Option<&std::path::Path>) -> i32 {
    let requests = match catalog::load_requests(catalog_path) {
        Ok(requests) => requests,
        Err(err) => {
            eprintln!("✗ 配置错误: {err:#}");
            return 1;
        }
    };
    let expander = match mapping {
        Some(path) => match LocationExpander::with_overrides(path) {
            Ok(expander) => expander,
            Err(err) => {
                eprintln!("✗ 配置错误: {err:#}");
                return 1;
            }
        },
        None => LocationExpander::new(),
    };

    let stats = catalog::stats(&requests, &expander);

    println!("{}", "=".repeat(60));
    println!("搜索配置统计");
    println!("{}", "=".repeat(60));
    println!("总配置数: {}", stats.total_requests);
    println!("\n届数分布:");
    for (year, count) in &stats.grad_years {
        println!("  {year}届: {count}个配置");
    }
    println!("\n招聘类型分布:");
    for (recruit_type, count) in &stats.recruit_types {
        println!("  {recruit_type}: {count}个配置");
    }
    println!("\n总关键词数: {}", stats.keyword_count);
    println!("总城市数: {}", stats.city_count);

    println!("\n配置列表预览（前5个）:");
    println!("{}", "-".repeat(60));
    for (idx, request) in requests.iter().take(5).enumerate() {
        println!("\n配置 {}:", idx + 1);
        println!("  关键词: {}", request.keywords.join(", "));
        println!("  城市: {}", request.locations.join(", "));
        println!("  届数: {}", request.grad_year.render());
        println!("  类型: {}", request.recruit_type.label());
        if let Some(notes) = &request.notes {
            println!("  备注: {notes}");
        }
    }

    0
}

/// Interval spec: 3h, 45m, 90s; bare numbers mean hours.
fn parse_schedule(spec: &str) -> Result<Duration> {
    let spec = spec.trim();
    if spec.is_empty() {
        bail!("empty schedule spec");
    }

    let (number, unit) = match spec.chars().last() {
        Some(c) if c.is_ascii_digit() => (spec, 'h'),
        Some(c) => (&spec[..spec.len() - c.len_utf8()], c),
        None => unreachable!(),
    };
    let value: u64 = number
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid schedule spec: {spec}"))?;
    if value == 0 {
        bail!("schedule interval must be positive: {spec}");
    }

    let seconds = match unit {
        'h' | 'H' => value * 3600,
        'm' | 'M' => value * 60,
        's' | 'S' => value,
        other => bail!("unknown schedule unit '{other}' in: {spec}"),
    };
    Ok(Duration::from_secs(seconds))
}

fn humanize(interval: Duration) -> String {
    let secs = interval.as_secs();
    if secs % 3600 == 0 {
        format!("{} 小时", secs / 3600)
    } else if secs % 60 == 0 {
        format!("{} 分钟", secs / 60)
    } else {
        format!("{secs} 秒")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_schedule() {
        assert_eq!(parse_schedule("3h").unwrap(), Duration::from_secs(10800));
        assert_eq!(parse_schedule("45m").unwrap(), Duration::from_secs(2700));
        assert_eq!(parse_schedule("90s").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_schedule("3").unwrap(), Duration::from_secs(10800));
        assert!(parse_schedule("").is_err());
        assert!(parse_schedule("0h").is_err());
        assert!(parse_schedule("3d").is_err());
        assert!(parse_schedule("abc").is_err());
    }

    #[test]
    fn test_humanize() {
        assert_eq!(humanize(Duration::from_secs(10800)), "3 小时");
        assert_eq!(humanize(Duration::from_secs(2700)), "45 分钟");
        assert_eq!(humanize(Duration::from_secs(90)), "90 秒");
    }
}
