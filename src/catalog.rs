//! Declarative search-request catalog. The catalog is data, not code:
//! a JSON array of requests reloaded on every run, order preserved.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::locations::LocationExpander;
use crate::models::{GradYears, SearchRequest};

pub fn load_requests(path: &Path) -> Result<Vec<SearchRequest>> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog file: {}", path.display()))?;
    let requests: Vec<SearchRequest> = serde_json::from_str(&data)
        .with_context(|| format!("Invalid catalog file: {}", path.display()))?;

    for (idx, request) in requests.iter().enumerate() {
        if request.keywords.is_empty() {
            bail!("catalog entry {} has no keywords", idx + 1);
        }
        if request.locations.is_empty() {
            bail!("catalog entry {} has no locations", idx + 1);
        }
    }

    Ok(requests)
}

#[derive(Debug, Default)]
pub struct CatalogStats {
    pub total_requests: usize,
    pub grad_years: BTreeMap<u16, usize>,
    pub recruit_types: BTreeMap<String, usize>,
    pub keyword_count: usize,
    pub city_count: usize,
}

pub fn stats(requests: &[SearchRequest], expander: &LocationExpander) -> CatalogStats {
    let mut stats = CatalogStats {
        total_requests: requests.len(),
        ..Default::default()
    };

    let mut keywords: HashSet<&str> = HashSet::new();
    let mut cities: HashSet<String> = HashSet::new();

    for request in requests {
        match &request.grad_year {
            GradYears::Single(year) => *stats.grad_years.entry(*year).or_default() += 1,
            GradYears::Multiple(years) => {
                for year in years {
                    *stats.grad_years.entry(*year).or_default() += 1;
                }
            }
            GradYears::Unspecified => {}
        }

        *stats
            .recruit_types
            .entry(request.recruit_type.label().to_string())
            .or_default() += 1;

        keywords.extend(request.keywords.iter().map(String::as_str));
        cities.extend(expander.expand(&request.locations));
    }

    stats.keyword_count = keywords.len();
    stats.city_count = cities.len();
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp_catalog(content: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "jobradar_catalog_{}_{}.json",
            std::process::id(),
            content.len()
        ));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_requests_preserves_order() {
        let path = write_temp_catalog(
            r#"[
                {"keywords":["法务"],"locations":["北京"],"grad_year":2026,"recruit_type":"校招"},
                {"keywords":["审计"],"locations":["深圳","广州"],"grad_year":2026,"recruit_type":"校招","notes":"四大"}
            ]"#,
        );
        let requests = load_requests(&path).unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].keywords, vec!["法务"]);
        assert_eq!(requests[1].notes.as_deref(), Some("四大"));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_requests_rejects_empty_keywords() {
        let path = write_temp_catalog(
            r#"[{"keywords":[],"locations":["北京"],"recruit_type":"校招"}]"#,
        );
        assert!(load_requests(&path).is_err());
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_requests_missing_file_is_error() {
        assert!(load_requests(Path::new("/nonexistent/catalog.json")).is_err());
    }

    #[test]
    fn test_stats_counts_grad_years_and_cities() {
        let requests: Vec<SearchRequest> = serde_json::from_str(
            r#"[
                {"keywords":["a","b"],"locations":["一线城市"],"grad_year":2026,"recruit_type":"校招"},
                {"keywords":["b"],"locations":["上海"],"grad_year":[2025,2026],"recruit_type":"社招"}
            ]"#,
        )
        .unwrap();
        let stats = stats(&requests, &LocationExpander::new());
        assert_eq!(stats.total_requests, 2);
        assert_eq!(stats.grad_years.get(&2026), Some(&2));
        assert_eq!(stats.grad_years.get(&2025), Some(&1));
        assert_eq!(stats.keyword_count, 2);
        // 一线城市 expands to 北京/上海/广州/深圳; 上海 collapses into it.
        assert_eq!(stats.city_count, 4);
    }
}
