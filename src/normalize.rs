//! Text and URL normalisation. All operations here are idempotent.

use url::Url;

use crate::models::Posting;

/// Query keys that only carry tracking state and never identify a posting.
const TRACKING_KEYS: &[&str] = &["spm", "from", "tk", "src", "source", "refid", "trackingid"];

/// Trims and collapses internal whitespace runs to single spaces.
pub fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Company names come with stray trailing punctuation from list markup.
pub fn clean_company_name(s: &str) -> String {
    collapse_ws(s)
        .trim_end_matches(['。', '，', '、', '；', '：', ',', '.', ';', ':', '-', '|'])
        .trim()
        .to_string()
}

fn is_tracking_key(key: &str) -> bool {
    let key = key.to_lowercase();
    key.starts_with("utm_") || TRACKING_KEYS.contains(&key.as_str())
}

/// Canonical URL form used as the identity key: lowercased scheme and
/// host, path preserved, query pairs sorted with tracking keys removed,
/// fragment dropped. Unparseable input falls back to whitespace cleanup.
pub fn canonical_url(raw: &str) -> String {
    let raw = raw.trim();
    let Ok(mut url) = Url::parse(raw) else {
        return collapse_ws(raw);
    };

    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| !is_tracking_key(k))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    pairs.sort();

    url.set_fragment(None);
    if pairs.is_empty() {
        url.set_query(None);
    } else {
        let query = pairs
            .iter()
            .map(|(k, v)| {
                if v.is_empty() {
                    urlencode(k)
                } else {
                    format!("{}={}", urlencode(k), urlencode(v))
                }
            })
            .collect::<Vec<_>>()
            .join("&");
        url.set_query(Some(&query));
    }

    url.to_string()
}

pub fn urlencode(s: &str) -> String {
    url::form_urlencoded::byte_serialize(s.as_bytes()).collect()
}

/// Identity key of a posting URL. Alias kept separate so call sites read
/// as dedup, not as formatting.
pub fn identity_key(url: &str) -> String {
    canonical_url(url)
}

/// In-place cleanup of an assembled posting.
pub fn normalize_posting(posting: &mut Posting) {
    posting.company_name = clean_company_name(&posting.company_name);
    posting.job_title = collapse_ws(&posting.job_title);
    posting.work_location = collapse_ws(&posting.work_location);
    posting.salary = collapse_ws(&posting.salary);
    posting.update_time = collapse_ws(&posting.update_time);
    posting.deadline = collapse_ws(&posting.deadline);
    if let Some(publish) = posting.publish_time.take() {
        let publish = collapse_ws(&publish);
        if !publish.is_empty() {
            posting.publish_time = Some(publish);
        }
    }
    posting.detail_url = canonical_url(&posting.detail_url);
    posting.apply_url = canonical_url(&posting.apply_url);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_ws() {
        assert_eq!(collapse_ws("  数据  分析师 \n 上海 "), "数据 分析师 上海");
        assert_eq!(collapse_ws(""), "");
    }

    #[test]
    fn test_clean_company_name() {
        assert_eq!(clean_company_name("腾讯科技有限公司，"), "腾讯科技有限公司");
        assert_eq!(clean_company_name(" 美团 | "), "美团");
    }

    #[test]
    fn test_canonical_url_strips_tracking_and_sorts_query() {
        let url = "HTTPS://WWW.Example.com/job/123?utm_source=mail&b=2&a=1&spm=xyz";
        assert_eq!(canonical_url(url), "https://www.example.com/job/123?a=1&b=2");
    }

    #[test]
    fn test_canonical_url_drops_fragment_and_empty_query() {
        assert_eq!(
            canonical_url("https://example.com/job/1?utm_campaign=x#apply"),
            "https://example.com/job/1"
        );
    }

    #[test]
    fn test_canonical_url_unparseable_falls_back() {
        assert_eq!(canonical_url("  not a url  "), "not a url");
    }

    #[test]
    fn test_canonical_url_is_idempotent() {
        let inputs = [
            "https://www.Example.com/a/b?z=9&y=8&utm_x=1#f",
            "https://jobs.51job.com/shanghai/123.html",
            "https://www.shixiseng.com/interns?k=%E6%95%B0%E6%8D%AE&c=%E4%B8%8A%E6%B5%B7",
        ];
        for input in inputs {
            let once = canonical_url(input);
            assert_eq!(canonical_url(&once), once, "not idempotent for {input}");
        }
    }

    #[test]
    fn test_same_posting_different_tracking_shares_identity() {
        let a = identity_key("https://example.com/job/55?refId=aa&trackingId=bb");
        let b = identity_key("https://example.com/job/55");
        assert_eq!(a, b);
    }
}
