//! Request-constraint filter applied after normalisation. Conjunctive:
//! a posting must pass every active constraint of its originating request.

use crate::models::{CompanyType, CompanyTypeFilter, Posting, SearchRequest};

pub fn passes(posting: &Posting, request: &SearchRequest) -> bool {
    if let Some(filter) = request.company_type {
        if posting.company_type != filter.target() {
            return false;
        }
    }

    if (request.notes_contain("大厂") || request.notes_contain("大公司"))
        && posting.company_type != CompanyType::BigTech
    {
        return false;
    }
    if request.notes_contain("四大") && posting.company_type != CompanyType::BigFour {
        return false;
    }
    if request.notes_contain("八大") && posting.company_type != CompanyType::BigEight {
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GradYears, RecruitType};

    fn posting(company_type: CompanyType) -> Posting {
        Posting {
            company_name: "测试公司".to_string(),
            company_type,
            work_location: "上海".to_string(),
            recruit_type: RecruitType::Campus,
            recruit_target: "2026届".to_string(),
            job_title: "测试岗位".to_string(),
            salary: "面议".to_string(),
            update_time: "未知".to_string(),
            publish_time: None,
            deadline: "详见链接".to_string(),
            detail_url: "https://example.com/job/1".to_string(),
            apply_url: "https://example.com/job/1".to_string(),
            source_site: "yingjiesheng".to_string(),
            source_keyword: "测试".to_string(),
            source_city: "上海".to_string(),
        }
    }

    fn request(company_type: Option<CompanyTypeFilter>, notes: Option<&str>) -> SearchRequest {
        SearchRequest {
            keywords: vec!["测试".to_string()],
            locations: vec!["上海".to_string()],
            grad_year: GradYears::Single(2026),
            recruit_type: RecruitType::Campus,
            industries: None,
            education: None,
            company_type,
            notes: notes.map(|n| n.to_string()),
        }
    }

    #[test]
    fn test_no_constraints_passes_everything() {
        let req = request(None, None);
        assert!(passes(&posting(CompanyType::Unknown), &req));
        assert!(passes(&posting(CompanyType::BigTech), &req));
    }

    #[test]
    fn test_state_owned_filter() {
        let req = request(Some(CompanyTypeFilter::StateOwned), None);
        assert!(passes(&posting(CompanyType::StateOwned), &req));
        assert!(!passes(&posting(CompanyType::BigTech), &req));
        assert!(!passes(&posting(CompanyType::Unknown), &req));
    }

    #[test]
    fn test_big_tech_note() {
        let req = request(None, Some("大公司优先"));
        assert!(passes(&posting(CompanyType::BigTech), &req));
        assert!(!passes(&posting(CompanyType::StateOwned), &req));
    }

    #[test]
    fn test_four_big_note() {
        let req = request(None, Some("四大"));
        assert!(passes(&posting(CompanyType::BigFour), &req));
        assert!(!passes(&posting(CompanyType::BigEight), &req));
    }

    #[test]
    fn test_filters_are_conjunctive() {
        // Notes naming both 大厂 and 八大 leave no satisfiable label.
        let req = request(None, Some("大厂, 八大"));
        assert!(!passes(&posting(CompanyType::BigTech), &req));
        assert!(!passes(&posting(CompanyType::BigEight), &req));
    }
}
