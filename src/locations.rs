use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};

/// Fixed region → cities table. Tokens not found here are treated as
/// concrete city names and pass through unchanged.
const CITY_MAPPING: &[(&str, &[&str])] = &[
    (
        "非偏远地区",
        &[
            "北京", "上海", "广州", "深圳", "杭州", "南京", "苏州", "成都", "重庆",
            "武汉", "西安", "天津", "青岛", "大连", "宁波", "无锡", "长沙", "郑州",
            "济南", "合肥", "福州", "厦门", "昆明", "南宁", "石家庄", "哈尔滨", "长春",
            "沈阳",
        ],
    ),
    (
        "南方城市",
        &[
            "上海", "广州", "深圳", "杭州", "南京", "苏州", "成都", "重庆", "武汉",
            "长沙", "福州", "厦门", "昆明", "南宁", "海口", "三亚", "珠海", "东莞",
            "佛山", "中山", "惠州", "宁波", "无锡", "合肥", "南昌", "贵阳",
        ],
    ),
    (
        "珠三角",
        &["广州", "深圳", "珠海", "东莞", "佛山", "中山", "惠州", "江门", "肇庆"],
    ),
    ("一线城市", &["北京", "上海", "广州", "深圳"]),
    ("北上广深", &["北京", "上海", "广州", "深圳"]),
    ("北上广深杭", &["北京", "上海", "广州", "深圳", "杭州"]),
    ("江浙沪", &["江苏", "浙江", "上海"]),
    ("东三省", &["哈尔滨", "长春", "沈阳", "大连"]),
    (
        "北方二线城市",
        &[
            "天津", "青岛", "大连", "济南", "石家庄", "太原", "郑州", "西安", "哈尔滨",
            "长春", "沈阳",
        ],
    ),
    (
        "广东",
        &[
            "广州", "深圳", "珠海", "东莞", "佛山", "中山", "惠州", "江门", "肇庆",
            "汕头", "湛江",
        ],
    ),
];

/// Resolves coarse region tokens into concrete city lists.
pub struct LocationExpander {
    table: HashMap<String, Vec<String>>,
}

impl LocationExpander {
    pub fn new() -> Self {
        let table = CITY_MAPPING
            .iter()
            .map(|(region, cities)| {
                (
                    region.to_string(),
                    cities.iter().map(|c| c.to_string()).collect(),
                )
            })
            .collect();
        Self { table }
    }

    /// Built-in table with entries from a JSON override file merged on top.
    /// File entries replace same-named built-ins.
    pub fn with_overrides(path: &Path) -> Result<Self> {
        let mut expander = Self::new();
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read city mapping file: {}", path.display()))?;
        let overrides: HashMap<String, Vec<String>> = serde_json::from_str(&data)
            .with_context(|| format!("Invalid city mapping file: {}", path.display()))?;
        expander.table.extend(overrides);
        Ok(expander)
    }

    /// Expands region tokens, preserving first-occurrence order and
    /// collapsing duplicates across tokens.
    pub fn expand(&self, tokens: &[String]) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut result = Vec::new();
        for token in tokens {
            match self.table.get(token.as_str()) {
                Some(cities) => {
                    for city in cities {
                        if seen.insert(city.clone()) {
                            result.push(city.clone());
                        }
                    }
                }
                None => {
                    if seen.insert(token.clone()) {
                        result.push(token.clone());
                    }
                }
            }
        }
        result
    }
}

impl Default for LocationExpander {
    fn default() -> Self {
        Self::new()
    }
}
