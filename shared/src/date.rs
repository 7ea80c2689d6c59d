//! 时间类型模块
//!
//! 时间线条目的表单日期解析与展示：
//! - `parse_form_date`: 日期输入框的 `YYYY-MM-DD` 文本，空白表示未填写
//! - `Timeline`: Experience / Education 的统一排序视图
//! - `format_month_year` / `format_range`: "Mar 2021 - Present" 风格的标签

use crate::{Education, Experience, Project};
use chrono::NaiveDate;
use std::cmp::Reverse;

pub const FORM_DATE_FORMAT: &str = "%Y-%m-%d";
pub const PRESENT_LABEL: &str = "Present";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DateError {
    #[error("{field} is required")]
    Missing { field: &'static str },
    #[error("{field} must be a YYYY-MM-DD date, got {value:?}")]
    Malformed { field: &'static str, value: String },
}

/// 解析可选的日期输入。空或仅空白的输入为 `None`，绝不是空字符串。
pub fn parse_form_date(field: &'static str, raw: &str) -> Result<Option<NaiveDate>, DateError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(trimmed, FORM_DATE_FORMAT)
        .map(Some)
        .map_err(|_| DateError::Malformed {
            field,
            value: trimmed.to_string(),
        })
}

/// 同 [`parse_form_date`]，但字段必填
pub fn parse_required_date(field: &'static str, raw: &str) -> Result<NaiveDate, DateError> {
    parse_form_date(field, raw)?.ok_or(DateError::Missing { field })
}

/// 按日期输入框期望的格式输出
pub fn to_form_value(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format(FORM_DATE_FORMAT).to_string())
        .unwrap_or_default()
}

/// "Mar 2021"；未结束显示为 "Present"
pub fn format_month_year(date: Option<NaiveDate>) -> String {
    match date {
        Some(d) => d.format("%b %Y").to_string(),
        None => PRESENT_LABEL.to_string(),
    }
}

pub fn format_range(start: NaiveDate, end: Option<NaiveDate>) -> String {
    format!(
        "{} - {}",
        format_month_year(Some(start)),
        format_month_year(end)
    )
}

// =========================================================
// 时间线排序 (Timeline ordering)
// =========================================================

/// 可在时间线上展示的条目
pub trait Timeline {
    fn start_date(&self) -> NaiveDate;
    fn end_date(&self) -> Option<NaiveDate>;

    fn is_current(&self) -> bool {
        self.end_date().is_none()
    }

    fn period_label(&self) -> String {
        format_range(self.start_date(), self.end_date())
    }
}

impl Timeline for Experience {
    fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
    }
}

impl Timeline for Education {
    fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
    }
}

/// 按开始日期倒序。稳定排序，开始日期相同时保持后端顺序。
pub fn sort_newest_first<T: Timeline>(items: &mut [T]) {
    items.sort_by_key(|item| Reverse(item.start_date()));
}

pub fn sort_projects_newest_first(projects: &mut [Project]) {
    projects.sort_by_key(|p| Reverse(p.date));
}
