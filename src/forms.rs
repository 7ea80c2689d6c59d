//! 表单状态管理模块
//!
//! 表单模型保存用户输入的原始文本，负责：
//! - 重置为初始值
//! - 转换为请求载荷
//!
//! 规范化在转换时进行：空白的可选字段变为 `None` (以 `null` 发送)，解析日期，
//! 并在发出请求之前检查必填字段。

use crate::error::{FolioError, FolioResult};
use chrono::{Local, NaiveDate};
use folio_shared::date::{parse_form_date, parse_required_date, to_form_value};
use folio_shared::{
    Education, EducationKind, EducationPayload, EntityId, Experience, ExperiencePayload, Project,
    ProjectPayload, SkillCategory, SkillLevel, SkillPayload, UserProfile, non_blank,
};

fn required(field: &str, value: &str) -> FolioResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FolioError::invalid_input(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

fn optional(value: &str) -> Option<String> {
    non_blank(Some(value))
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

// =========================================================
// 项目 (Project)
// =========================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectForm {
    pub title: String,
    pub description: String,
    pub repo_url: String,
    pub demo_url: String,
    pub image_url: String,
    /// `YYYY-MM-DD`
    pub date: String,
    skill_ids: Vec<EntityId>,
}

impl ProjectForm {
    /// 空表单，日期为今天
    pub fn new() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            repo_url: String::new(),
            demo_url: String::new(),
            image_url: String::new(),
            date: to_form_value(Some(today())),
            skill_ids: Vec::new(),
        }
    }

    /// 编辑模式预填，包括当前关联的技能
    pub fn from_project(project: &Project) -> Self {
        Self {
            title: project.title.clone(),
            description: project.description.clone(),
            repo_url: project.repo_url.clone().unwrap_or_default(),
            demo_url: project.demo_url.clone().unwrap_or_default(),
            image_url: project.image_url.clone().unwrap_or_default(),
            date: to_form_value(Some(project.date)),
            skill_ids: project.skill_ids(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// 已选技能 id，按选择顺序
    pub fn skill_ids(&self) -> &[EntityId] {
        &self.skill_ids
    }

    pub fn is_selected(&self, skill_id: EntityId) -> bool {
        self.skill_ids.contains(&skill_id)
    }

    /// 切换技能选中状态
    pub fn toggle_skill(&mut self, skill_id: EntityId) {
        match self.skill_ids.iter().position(|id| *id == skill_id) {
            Some(index) => {
                self.skill_ids.remove(index);
            }
            None => self.skill_ids.push(skill_id),
        }
    }

    /// 项目写入载荷，以及之后需要关联的技能
    pub fn to_request(&self) -> FolioResult<(ProjectPayload, Vec<EntityId>)> {
        let payload = ProjectPayload {
            title: required("title", &self.title)?,
            description: required("description", &self.description)?,
            demo_url: optional(&self.demo_url),
            repo_url: optional(&self.repo_url),
            image_url: optional(&self.image_url),
            date: parse_required_date("date", &self.date)?,
        };
        Ok((payload, self.skill_ids.clone()))
    }
}

impl Default for ProjectForm {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================
// 时间线 (Experience / Education)
// =========================================================

/// 两个时间线板块共用的表单。`organization` 为公司或学校，`role` 为职位或学位。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimelineForm {
    pub organization: String,
    pub role: String,
    pub description: String,
    pub start_date: String,
    /// 进行中时留空
    pub end_date: String,
    pub logo_url: String,
    /// 仅教育经历使用
    pub kind: EducationKind,
}

impl TimelineForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_experience(exp: &Experience) -> Self {
        Self {
            organization: exp.company.clone(),
            role: exp.position.clone(),
            description: exp.description.clone(),
            start_date: to_form_value(Some(exp.start_date)),
            end_date: to_form_value(exp.end_date),
            logo_url: exp.logo_url.clone().unwrap_or_default(),
            kind: EducationKind::default(),
        }
    }

    pub fn from_education(edu: &Education) -> Self {
        Self {
            organization: edu.institution.clone(),
            role: edu.degree.clone(),
            description: edu.description.clone(),
            start_date: to_form_value(Some(edu.start_date)),
            end_date: to_form_value(edu.end_date),
            logo_url: edu.logo_url.clone().unwrap_or_default(),
            kind: edu.kind,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    fn dates(&self) -> FolioResult<(NaiveDate, Option<NaiveDate>)> {
        let start = parse_required_date("start date", &self.start_date)?;
        let end = parse_form_date("end date", &self.end_date)?;
        if let Some(end) = end {
            if end < start {
                return Err(FolioError::invalid_input("end date is before start date"));
            }
        }
        Ok((start, end))
    }

    pub fn to_experience(&self) -> FolioResult<ExperiencePayload> {
        let (start_date, end_date) = self.dates()?;
        Ok(ExperiencePayload {
            company: required("company", &self.organization)?,
            position: required("position", &self.role)?,
            description: self.description.trim().to_string(),
            start_date,
            end_date,
            logo_url: optional(&self.logo_url),
        })
    }

    pub fn to_education(&self) -> FolioResult<EducationPayload> {
        let (start_date, end_date) = self.dates()?;
        Ok(EducationPayload {
            institution: required("institution", &self.organization)?,
            degree: required("degree", &self.role)?,
            description: self.description.trim().to_string(),
            start_date,
            end_date,
            logo_url: optional(&self.logo_url),
            kind: self.kind,
        })
    }
}

// =========================================================
// 技能 (Skill)
// =========================================================

/// 默认值：Intermediate、Frontend
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SkillForm {
    pub name: String,
    pub level: SkillLevel,
    pub category: SkillCategory,
    pub icon_url: String,
}

impl SkillForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn to_payload(&self) -> FolioResult<SkillPayload> {
        Ok(SkillPayload {
            name: required("name", &self.name)?,
            level: self.level,
            category: self.category.clone(),
            icon_url: optional(&self.icon_url),
        })
    }
}

// =========================================================
// 个人资料 (Profile)
// =========================================================

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProfileForm {
    pub first_name: String,
    pub last_name: String,
    pub title: String,
    pub contact_email: String,
    pub bio: String,
    pub photo_url: String,
    pub location: String,
    pub github_url: String,
    pub linkedin_url: String,
    pub resume_url: String,
}

impl ProfileForm {
    pub fn from_profile(profile: &UserProfile) -> Self {
        Self {
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            title: profile.title.clone(),
            contact_email: profile.contact_email.clone(),
            bio: profile.bio.clone(),
            photo_url: profile.photo_url.clone().unwrap_or_default(),
            location: profile.location.clone().unwrap_or_default(),
            github_url: profile.github_url.clone().unwrap_or_default(),
            linkedin_url: profile.linkedin_url.clone().unwrap_or_default(),
            resume_url: profile.resume_url.clone().unwrap_or_default(),
        }
    }

    /// 保留服务器端 id，仅修改字段
    pub fn to_profile(&self, id: EntityId) -> FolioResult<UserProfile> {
        let contact_email = required("contact email", &self.contact_email)?;
        if !contact_email.contains('@') {
            return Err(FolioError::invalid_input("contact email is not an email address"));
        }
        Ok(UserProfile {
            id,
            first_name: required("first name", &self.first_name)?,
            last_name: self.last_name.trim().to_string(),
            title: required("title", &self.title)?,
            contact_email,
            bio: self.bio.trim().to_string(),
            photo_url: optional(&self.photo_url),
            location: optional(&self.location),
            github_url: optional(&self.github_url),
            linkedin_url: optional(&self.linkedin_url),
            resume_url: optional(&self.resume_url),
        })
    }
}
