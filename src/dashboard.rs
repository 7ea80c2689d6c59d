//! Admin dashboard controllers.
//!
//! One manager per admin section. Each owns an independent copy of its list
//! (an [`ApiHook`]) and reloads it only after its own write has settled.

use crate::api::{AdminService, PortfolioService};
use crate::error::{FolioError, FolioErrorKind, FolioResult};
use crate::forms::{ProfileForm, ProjectForm, SkillForm, TimelineForm};
use crate::hook::ApiHook;
use folio_shared::date::{Timeline, sort_newest_first, sort_projects_newest_first};
use folio_shared::{
    Education, EducationPayload, EntityId, Experience, ExperiencePayload, Project,
    ProjectSkillRequest, Skill, UserProfile,
};
use std::fmt;
use tracing::{info, warn};

// =========================================================
// Error classification
// =========================================================

#[derive(Debug, thiserror::Error)]
pub enum ProjectSaveError {
    /// The project write itself failed (or the form was invalid); nothing
    /// changed on the server.
    #[error("saving the project failed: {0}")]
    Write(#[from] FolioError),
    /// The project was saved but linking its skills failed. The project
    /// exists without the selected skills; retry with
    /// [`ProjectManager::link_skills`].
    #[error("project {} was saved but its skills were not linked: {source}", .project.id)]
    SkillsNotLinked {
        project: Project,
        skill_ids: Vec<EntityId>,
        #[source]
        source: FolioError,
    },
}

/// Why a skill could not be deleted.
#[derive(Debug, thiserror::Error)]
pub enum SkillDeleteError {
    /// The backend refused because a project still uses the skill.
    #[error("the skill is still used by a project")]
    StillReferenced(#[source] FolioError),
    /// No response arrived.
    #[error("could not reach the server")]
    Connectivity(#[source] FolioError),
    #[error("session expired")]
    SessionExpired(#[source] FolioError),
    #[error(transparent)]
    Other(FolioError),
}

impl SkillDeleteError {
    /// 409 and 500 both mean a referential conflict on this endpoint.
    pub fn classify(err: FolioError) -> Self {
        match (err.kind, err.status()) {
            (FolioErrorKind::Network, _) => SkillDeleteError::Connectivity(err),
            (FolioErrorKind::Unauthorized, _) => SkillDeleteError::SessionExpired(err),
            (_, Some(409)) | (_, Some(500)) => SkillDeleteError::StillReferenced(err),
            _ => SkillDeleteError::Other(err),
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            SkillDeleteError::StillReferenced(_) => {
                "This skill is used by at least one project. Remove it from those projects first."
                    .to_string()
            }
            SkillDeleteError::Connectivity(e)
            | SkillDeleteError::SessionExpired(e)
            | SkillDeleteError::Other(e) => e.user_message(),
        }
    }
}

// =========================================================
// Projects
// =========================================================

pub struct ProjectManager {
    admin: AdminService,
    projects: ApiHook<(), Vec<Project>>,
    skills: ApiHook<(), Vec<Skill>>,
}

impl ProjectManager {
    pub fn new(portfolio: PortfolioService, admin: AdminService) -> Self {
        let for_projects = portfolio.clone();
        let projects = ApiHook::new(move |()| {
            let portfolio = for_projects.clone();
            async move {
                let mut projects = portfolio.get_projects().await?;
                sort_projects_newest_first(&mut projects);
                Ok(projects)
            }
        });
        let skills = ApiHook::new(move |()| {
            let portfolio = portfolio.clone();
            async move { portfolio.get_skills().await }
        });
        Self {
            admin,
            projects,
            skills,
        }
    }

    /// Projects and the skills available for selection, fetched together.
    pub async fn load(&self) -> FolioResult<()> {
        let (projects, skills) = futures::join!(self.projects.fetch(), self.skills.fetch());
        projects?;
        skills?;
        Ok(())
    }

    pub fn projects(&self) -> &ApiHook<(), Vec<Project>> {
        &self.projects
    }

    pub fn skills(&self) -> &ApiHook<(), Vec<Skill>> {
        &self.skills
    }

    /// Create (`editing == None`) or update, then link the selected skills
    /// with a single association call, then reload.
    pub async fn save(
        &self,
        form: &ProjectForm,
        editing: Option<EntityId>,
    ) -> Result<Project, ProjectSaveError> {
        let (payload, skill_ids) = form.to_request()?;

        let saved = match editing {
            Some(id) => self.admin.update_project(id, payload).await,
            None => self.admin.create_project(payload).await,
        }
        .map_err(|e| e.in_op("dashboard.projects.save"))?;
        info!(project = saved.id, "project saved");

        let link_error = if skill_ids.is_empty() {
            None
        } else {
            self.link_skills(saved.id, skill_ids.clone()).await.err()
        };

        // Reload whether or not linking succeeded, so the list matches the server.
        self.reload().await;

        if let Some(source) = link_error {
            warn!(project = saved.id, error = %source, "project saved without its skills");
            return Err(ProjectSaveError::SkillsNotLinked {
                project: saved,
                skill_ids,
                source,
            });
        }

        // The association reply carries no project; take it from the reloaded list.
        let refreshed = self
            .projects
            .data()
            .and_then(|projects| projects.into_iter().find(|p| p.id == saved.id));
        Ok(refreshed.unwrap_or(saved))
    }

    /// Links `skill_ids` to an existing project.
    pub async fn link_skills(&self, project_id: EntityId, skill_ids: Vec<EntityId>) -> FolioResult<()> {
        self.admin
            .add_skills_to_project(ProjectSkillRequest {
                project_id,
                skill_ids,
            })
            .await
            .map_err(|e| e.in_op("dashboard.projects.link_skills"))
    }

    pub async fn delete(&self, id: EntityId) -> FolioResult<()> {
        self.admin
            .delete_project(id)
            .await
            .map_err(|e| e.in_op("dashboard.projects.delete"))?;
        self.reload().await;
        Ok(())
    }

    async fn reload(&self) {
        // A failure is recorded in the hook's error.
        let _ = self.projects.fetch().await;
    }
}

// =========================================================
// Skills
// =========================================================

pub struct SkillManager {
    admin: AdminService,
    skills: ApiHook<(), Vec<Skill>>,
}

impl SkillManager {
    pub fn new(portfolio: PortfolioService, admin: AdminService) -> Self {
        let skills = ApiHook::new(move |()| {
            let portfolio = portfolio.clone();
            async move { portfolio.get_skills().await }
        });
        Self { admin, skills }
    }

    pub async fn load(&self) -> FolioResult<Vec<Skill>> {
        self.skills.fetch().await
    }

    pub fn skills(&self) -> &ApiHook<(), Vec<Skill>> {
        &self.skills
    }

    pub async fn create(&self, form: &SkillForm) -> FolioResult<Skill> {
        let payload = form.to_payload()?;
        let skill = self
            .admin
            .create_skill(payload)
            .await
            .map_err(|e| e.in_op("dashboard.skills.create"))?;
        let _ = self.skills.fetch().await;
        Ok(skill)
    }

    /// The list is reloaded only when the delete went through.
    pub async fn delete(&self, id: EntityId) -> Result<(), SkillDeleteError> {
        self.admin
            .delete_skill(id)
            .await
            .map_err(|e| SkillDeleteError::classify(e.in_op("dashboard.skills.delete")))?;
        let _ = self.skills.fetch().await;
        Ok(())
    }
}

// =========================================================
// Timeline sections
// =========================================================

/// A dated section with its own CRUD endpoints.
#[async_trait::async_trait(?Send)]
pub trait TimelineEntry: Timeline + Clone + fmt::Debug + 'static {
    type Payload: 'static;

    const SECTION: &'static str;

    fn id(&self) -> EntityId;
    fn payload_from(form: &TimelineForm) -> FolioResult<Self::Payload>;
    fn to_form(&self) -> TimelineForm;

    async fn list(portfolio: &PortfolioService) -> FolioResult<Vec<Self>>;
    async fn create(admin: &AdminService, payload: Self::Payload) -> FolioResult<Self>;
    async fn update(admin: &AdminService, id: EntityId, payload: Self::Payload) -> FolioResult<Self>;
    async fn delete(admin: &AdminService, id: EntityId) -> FolioResult<()>;
}

#[async_trait::async_trait(?Send)]
impl TimelineEntry for Experience {
    type Payload = ExperiencePayload;
    const SECTION: &'static str = "experience";

    fn id(&self) -> EntityId {
        self.id
    }

    fn payload_from(form: &TimelineForm) -> FolioResult<ExperiencePayload> {
        form.to_experience()
    }

    fn to_form(&self) -> TimelineForm {
        TimelineForm::from_experience(self)
    }

    async fn list(portfolio: &PortfolioService) -> FolioResult<Vec<Self>> {
        portfolio.get_experiences().await
    }

    async fn create(admin: &AdminService, payload: ExperiencePayload) -> FolioResult<Self> {
        admin.create_experience(payload).await
    }

    async fn update(admin: &AdminService, id: EntityId, payload: ExperiencePayload) -> FolioResult<Self> {
        admin.update_experience(id, payload).await
    }

    async fn delete(admin: &AdminService, id: EntityId) -> FolioResult<()> {
        admin.delete_experience(id).await
    }
}

#[async_trait::async_trait(?Send)]
impl TimelineEntry for Education {
    type Payload = EducationPayload;
    const SECTION: &'static str = "education";

    fn id(&self) -> EntityId {
        self.id
    }

    fn payload_from(form: &TimelineForm) -> FolioResult<EducationPayload> {
        form.to_education()
    }

    fn to_form(&self) -> TimelineForm {
        TimelineForm::from_education(self)
    }

    async fn list(portfolio: &PortfolioService) -> FolioResult<Vec<Self>> {
        portfolio.get_education().await
    }

    async fn create(admin: &AdminService, payload: EducationPayload) -> FolioResult<Self> {
        admin.create_education(payload).await
    }

    async fn update(admin: &AdminService, id: EntityId, payload: EducationPayload) -> FolioResult<Self> {
        admin.update_education(id, payload).await
    }

    async fn delete(admin: &AdminService, id: EntityId) -> FolioResult<()> {
        admin.delete_education(id).await
    }
}

/// Entries are kept newest first.
pub struct TimelineManager<T: TimelineEntry> {
    admin: AdminService,
    entries: ApiHook<(), Vec<T>>,
}

impl<T: TimelineEntry> TimelineManager<T> {
    pub fn new(portfolio: PortfolioService, admin: AdminService) -> Self {
        let entries = ApiHook::new(move |()| {
            let portfolio = portfolio.clone();
            async move {
                let mut entries = T::list(&portfolio).await?;
                sort_newest_first(&mut entries);
                Ok(entries)
            }
        });
        Self { admin, entries }
    }

    pub async fn load(&self) -> FolioResult<Vec<T>> {
        self.entries.fetch().await
    }

    pub fn entries(&self) -> &ApiHook<(), Vec<T>> {
        &self.entries
    }

    /// Create (`editing == None`) or update, then reload.
    pub async fn save(&self, form: &TimelineForm, editing: Option<EntityId>) -> FolioResult<T> {
        let payload = T::payload_from(form)?;
        let saved = match editing {
            Some(id) => T::update(&self.admin, id, payload).await,
            None => T::create(&self.admin, payload).await,
        }
        .map_err(|e| e.in_op_with("dashboard.timeline.save", T::SECTION))?;
        let _ = self.entries.fetch().await;
        Ok(saved)
    }

    pub async fn delete(&self, id: EntityId) -> FolioResult<()> {
        T::delete(&self.admin, id)
            .await
            .map_err(|e| e.in_op_with("dashboard.timeline.delete", T::SECTION))?;
        let _ = self.entries.fetch().await;
        Ok(())
    }
}

// =========================================================
// Profile
// =========================================================

pub struct ProfileManager {
    admin: AdminService,
    profile: ApiHook<(), UserProfile>,
}

impl ProfileManager {
    pub fn new(portfolio: PortfolioService, admin: AdminService) -> Self {
        let profile = ApiHook::new(move |()| {
            let portfolio = portfolio.clone();
            async move { portfolio.get_profile().await }
        });
        Self { admin, profile }
    }

    pub async fn load(&self) -> FolioResult<UserProfile> {
        self.profile.fetch().await
    }

    pub fn profile(&self) -> &ApiHook<(), UserProfile> {
        &self.profile
    }

    /// Requires a loaded profile; its id is kept.
    pub async fn save(&self, form: &ProfileForm) -> FolioResult<UserProfile> {
        let current = self
            .profile
            .data()
            .ok_or_else(|| FolioError::invalid_input("load the profile before saving it"))?;
        let profile = form.to_profile(current.id)?;
        let updated = self
            .admin
            .update_profile(profile)
            .await
            .map_err(|e| e.in_op("dashboard.profile.save"))?;
        self.profile.set_data(Some(updated.clone()));
        Ok(updated)
    }
}

// =========================================================
// Dashboard
// =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DashboardTab {
    Profile,
    Skills,
    Experience,
    Education,
    #[default]
    Projects,
}

impl DashboardTab {
    pub const ALL: [DashboardTab; 5] = [
        DashboardTab::Profile,
        DashboardTab::Skills,
        DashboardTab::Experience,
        DashboardTab::Education,
        DashboardTab::Projects,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DashboardTab::Profile => "profile",
            DashboardTab::Skills => "skills",
            DashboardTab::Experience => "experience",
            DashboardTab::Education => "education",
            DashboardTab::Projects => "projects",
        }
    }
}

/// All admin sections, sharing one set of services.
pub struct Dashboard {
    pub profile: ProfileManager,
    pub skills: SkillManager,
    pub experience: TimelineManager<Experience>,
    pub education: TimelineManager<Education>,
    pub projects: ProjectManager,
}

impl Dashboard {
    pub fn new(portfolio: PortfolioService, admin: AdminService) -> Self {
        Self {
            profile: ProfileManager::new(portfolio.clone(), admin.clone()),
            skills: SkillManager::new(portfolio.clone(), admin.clone()),
            experience: TimelineManager::new(portfolio.clone(), admin.clone()),
            education: TimelineManager::new(portfolio.clone(), admin.clone()),
            projects: ProjectManager::new(portfolio, admin),
        }
    }

    /// Loads the data a tab shows when it is opened.
    pub async fn open(&self, tab: DashboardTab) -> FolioResult<()> {
        match tab {
            DashboardTab::Profile => self.profile.load().await.map(drop),
            DashboardTab::Skills => self.skills.load().await.map(drop),
            DashboardTab::Experience => self.experience.load().await.map(drop),
            DashboardTab::Education => self.education.load().await.map(drop),
            DashboardTab::Projects => self.projects.load().await,
        }
    }
}

#[cfg(test)]
mod tests;
