//! Public portfolio view model.
//!
//! Every section owns an independent [`ApiHook`]; a failing section does not
//! keep the others from loading.

use crate::api::PortfolioService;
use crate::error::FolioError;
use crate::hook::ApiHook;
use folio_shared::date::{sort_newest_first, sort_projects_newest_first};
use folio_shared::{Education, Experience, Project, Skill, SkillCategory, UserProfile};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomeSection {
    Profile,
    Projects,
    Skills,
    Experience,
    Education,
}

impl HomeSection {
    pub const ALL: [HomeSection; 5] = [
        HomeSection::Profile,
        HomeSection::Projects,
        HomeSection::Skills,
        HomeSection::Experience,
        HomeSection::Education,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HomeSection::Profile => "profile",
            HomeSection::Projects => "projects",
            HomeSection::Skills => "skills",
            HomeSection::Experience => "experience",
            HomeSection::Education => "education",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|section| section.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

pub struct PortfolioHome {
    pub profile: ApiHook<(), UserProfile>,
    pub projects: ApiHook<(), Vec<Project>>,
    pub skills: ApiHook<(), Vec<Skill>>,
    pub experience: ApiHook<(), Vec<Experience>>,
    pub education: ApiHook<(), Vec<Education>>,
}

impl PortfolioHome {
    pub fn new(portfolio: PortfolioService) -> Self {
        let p = portfolio.clone();
        let profile = ApiHook::new(move |()| {
            let p = p.clone();
            async move { p.get_profile().await }
        });

        let p = portfolio.clone();
        let projects = ApiHook::new(move |()| {
            let p = p.clone();
            async move {
                let mut projects = p.get_projects().await?;
                sort_projects_newest_first(&mut projects);
                Ok(projects)
            }
        });

        let p = portfolio.clone();
        let skills = ApiHook::new(move |()| {
            let p = p.clone();
            async move { p.get_skills().await }
        });

        let p = portfolio.clone();
        let experience = ApiHook::new(move |()| {
            let p = p.clone();
            async move {
                let mut entries = p.get_experiences().await?;
                sort_newest_first(&mut entries);
                Ok(entries)
            }
        });

        let p = portfolio;
        let education = ApiHook::new(move |()| {
            let p = p.clone();
            async move {
                let mut entries = p.get_education().await?;
                sort_newest_first(&mut entries);
                Ok(entries)
            }
        });

        Self {
            profile,
            projects,
            skills,
            experience,
            education,
        }
    }

    pub async fn load(&self, section: HomeSection) -> Result<(), FolioError> {
        match section {
            HomeSection::Profile => self.profile.fetch().await.map(drop),
            HomeSection::Projects => self.projects.fetch().await.map(drop),
            HomeSection::Skills => self.skills.fetch().await.map(drop),
            HomeSection::Experience => self.experience.fetch().await.map(drop),
            HomeSection::Education => self.education.fetch().await.map(drop),
        }
    }

    /// Fetches all sections concurrently. Returns the sections that failed.
    pub async fn load_all(&self) -> Vec<(HomeSection, FolioError)> {
        let (profile, projects, skills, experience, education) = futures::join!(
            self.load(HomeSection::Profile),
            self.load(HomeSection::Projects),
            self.load(HomeSection::Skills),
            self.load(HomeSection::Experience),
            self.load(HomeSection::Education),
        );

        HomeSection::ALL
            .into_iter()
            .zip([profile, projects, skills, experience, education])
            .filter_map(|(section, result)| result.err().map(|e| (section, e)))
            .collect()
    }

    pub fn is_loading(&self) -> bool {
        self.profile.loading()
            || self.projects.loading()
            || self.skills.loading()
            || self.experience.loading()
            || self.education.loading()
    }

    /// Skills grouped by category, in the order categories first appear.
    pub fn skills_by_category(&self) -> Vec<(SkillCategory, Vec<Skill>)> {
        let mut groups: Vec<(SkillCategory, Vec<Skill>)> = Vec::new();
        for skill in self.skills.data().unwrap_or_default() {
            match groups.iter_mut().find(|(cat, _)| *cat == skill.category) {
                Some((_, members)) => members.push(skill),
                None => groups.push((skill.category.clone(), vec![skill])),
            }
        }
        groups
    }
}
