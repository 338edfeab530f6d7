//! Spreadsheet sink: fixed column order, styled header row, preset
//! widths. Overwrite mode replaces the file; append mode merges with the
//! existing sheet, deduplicating by identity key and keeping the newer row.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use calamine::{open_workbook, Data, Reader, Xlsx};
use rust_xlsxwriter::{Color, Format, FormatAlign, Workbook};

use crate::models::{CompanyType, Posting, RecruitType};

const COLUMNS: &[(&str, f64)] = &[
    ("公司名称", 25.0),
    ("公司类型", 15.0),
    ("工作地点", 15.0),
    ("招聘类型", 12.0),
    ("招聘对象", 12.0),
    ("岗位", 30.0),
    ("薪资", 14.0),
    ("更新时间", 15.0),
    ("发布时间", 15.0),
    ("投递截止", 15.0),
    ("岗位详情链接", 50.0),
    ("投递链接", 50.0),
];

/// 公司名称, 工作地点, 岗位, 投递链接: never dropped even when blank.
const REQUIRED_COLUMNS: &[usize] = &[0, 2, 5, 11];

const HEADER_FILL: u32 = 0x366092;
const HEADER_ROW_HEIGHT: f64 = 25.0;

fn row_values(posting: &Posting) -> [String; 12] {
    [
        posting.company_name.clone(),
        posting.company_type.label().to_string(),
        posting.work_location.clone(),
        posting.recruit_type.label().to_string(),
        posting.recruit_target.clone(),
        posting.job_title.clone(),
        posting.salary.clone(),
        posting.update_time.clone(),
        posting.publish_time.clone().unwrap_or_default(),
        posting.deadline.clone(),
        posting.detail_url.clone(),
        posting.apply_url.clone(),
    ]
}

/// Columns to emit: the required set plus any column with at least one
/// non-blank value this run.
fn kept_columns(rows: &[[String; 12]]) -> Vec<usize> {
    (0..COLUMNS.len())
        .filter(|&col| {
            REQUIRED_COLUMNS.contains(&col) || rows.iter().any(|row| !row[col].is_empty())
        })
        .collect()
}

pub fn write_report(path: &Path, postings: &[Posting]) -> Result<()> {
    let rows: Vec<[String; 12]> = postings.iter().map(row_values).collect();
    let kept = kept_columns(&rows);

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    let header_format = Format::new()
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(HEADER_FILL))
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter);

    worksheet.set_row_height(0, HEADER_ROW_HEIGHT)?;
    for (out_col, &col) in kept.iter().enumerate() {
        let (name, width) = COLUMNS[col];
        let out_col = out_col as u16;
        worksheet.set_column_width(out_col, width)?;
        worksheet.write_string_with_format(0, out_col, name, &header_format)?;
    }

    for (row_idx, row) in rows.iter().enumerate() {
        for (out_col, &col) in kept.iter().enumerate() {
            worksheet.write_string(row_idx as u32 + 1, out_col as u16, &row[col])?;
        }
    }

    workbook
        .save(path)
        .with_context(|| format!("Failed to write spreadsheet: {}", path.display()))?;
    Ok(())
}

fn cell_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        other => other.to_string().trim().to_string(),
    }
}

/// Parses a previously written sheet back into the canonical schema.
/// Columns dropped at write time come back as their defaults.
pub fn read_report(path: &Path) -> Result<Vec<Posting>> {
    let mut workbook: Xlsx<_> = open_workbook(path)
        .with_context(|| format!("Failed to open spreadsheet: {}", path.display()))?;
    let range = workbook
        .worksheet_range_at(0)
        .context("spreadsheet has no sheets")?
        .context("spreadsheet sheet is unreadable")?;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(Vec::new());
    };
    let header: Vec<String> = header.iter().map(cell_string).collect();
    let col_of = |name: &str| header.iter().position(|h| h == name);

    let columns: Vec<Option<usize>> = COLUMNS.iter().map(|(name, _)| col_of(name)).collect();
    let value = |row: &[Data], idx: usize| -> String {
        columns[idx]
            .and_then(|col| row.get(col))
            .map(cell_string)
            .unwrap_or_default()
    };

    let mut postings = Vec::new();
    for row in rows {
        let job_title = value(row, 5);
        let apply_url = value(row, 11);
        if job_title.is_empty() && apply_url.is_empty() {
            continue;
        }

        let publish_time = value(row, 8);
        let detail_url = value(row, 10);
        let deadline = value(row, 9);
        let salary = value(row, 6);
        let update_time = value(row, 7);

        postings.push(Posting {
            company_name: value(row, 0),
            company_type: CompanyType::from_label(&value(row, 1)),
            work_location: value(row, 2),
            recruit_type: RecruitType::from_label(&value(row, 3)),
            recruit_target: value(row, 4),
            job_title,
            salary: if salary.is_empty() { "面议".to_string() } else { salary },
            update_time: if update_time.is_empty() {
                "未知".to_string()
            } else {
                update_time
            },
            publish_time: (!publish_time.is_empty()).then_some(publish_time),
            deadline: if deadline.is_empty() {
                "详见链接".to_string()
            } else {
                deadline
            },
            detail_url: if detail_url.is_empty() {
                apply_url.clone()
            } else {
                detail_url
            },
            apply_url,
            source_site: String::new(),
            source_keyword: String::new(),
            source_city: String::new(),
        });
    }
    Ok(postings)
}

/// Append-mode merge: rows from the current run win over existing rows
/// with the same identity key; surviving old rows keep their order and
/// new rows follow.
pub fn merge_for_append(existing: Vec<Posting>, new: &[Posting]) -> Vec<Posting> {
    let new_keys: HashSet<String> = new.iter().map(Posting::identity_key).collect();
    let mut merged: Vec<Posting> = existing
        .into_iter()
        .filter(|p| !new_keys.contains(&p.identity_key()))
        .collect();
    merged.extend(new.iter().cloned());
    merged
}
