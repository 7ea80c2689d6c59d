use crate::{
    Education, EducationPayload, EntityId, Experience, ExperiencePayload, LoginCredentials,
    LoginResponse, Project, ProjectPayload, ProjectSkillRequest, Skill, SkillPayload, UserProfile,
};
use serde::{Serialize, de::DeserializeOwned};

/// HTTP Methods for API Requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Safe to repeat without side effects on the server.
    pub fn is_idempotent_read(&self) -> bool {
        matches!(self, HttpMethod::Get)
    }
}

/// Relationship between a backend operation, its payload and its response.
///
/// Paths are relative to the API base URL.
pub trait Endpoint {
    type Body: Serialize;
    type Response: DeserializeOwned;

    const METHOD: HttpMethod;

    /// Set on the login call: a 401 there means wrong credentials, not an
    /// expired session.
    const CREDENTIAL_EXCHANGE: bool = false;

    /// Success is decided by the status alone; whatever body comes back
    /// (empty, text, JSON) is dropped. Such endpoints use `Response = ()`.
    const DISCARDS_BODY: bool = false;

    fn path(&self) -> String;

    fn body(&self) -> Option<&Self::Body> {
        None
    }
}

/// Placeholder body type for endpoints that send nothing.
#[derive(Debug, Serialize)]
pub struct NoBody;

pub const PATH_LOGIN: &str = "/auth/login";
pub const PATH_USER: &str = "/user";
pub const PATH_PROJECTS: &str = "/projects";
pub const PATH_PROJECT_SKILLS: &str = "/projects/add-skills";
pub const PATH_SKILLS: &str = "/skills";
pub const PATH_EXPERIENCE: &str = "/experience";
pub const PATH_EDUCATION: &str = "/education";

// Endpoints without a request body (GET / DELETE)
macro_rules! bodiless_endpoint {
    ($name:ident, $method:ident, discard, $base:expr, id) => {
        #[derive(Debug, Clone, Copy)]
        pub struct $name(pub EntityId);

        impl Endpoint for $name {
            type Body = NoBody;
            type Response = ();
            const METHOD: HttpMethod = HttpMethod::$method;
            const DISCARDS_BODY: bool = true;

            fn path(&self) -> String {
                format!("{}/{}", $base, self.0)
            }
        }
    };
    ($name:ident, $method:ident, $response:ty, $path:expr) => {
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl Endpoint for $name {
            type Body = NoBody;
            type Response = $response;
            const METHOD: HttpMethod = HttpMethod::$method;

            fn path(&self) -> String {
                $path.to_string()
            }
        }
    };
    ($name:ident, $method:ident, $response:ty, $base:expr, id) => {
        #[derive(Debug, Clone, Copy)]
        pub struct $name(pub EntityId);

        impl Endpoint for $name {
            type Body = NoBody;
            type Response = $response;
            const METHOD: HttpMethod = HttpMethod::$method;

            fn path(&self) -> String {
                format!("{}/{}", $base, self.0)
            }
        }
    };
}

// Endpoints with a JSON body (POST / PUT)
macro_rules! body_endpoint {
    ($name:ident, $method:ident, $body:ty, discard, $path:expr) => {
        #[derive(Debug, Clone)]
        pub struct $name(pub $body);

        impl Endpoint for $name {
            type Body = $body;
            type Response = ();
            const METHOD: HttpMethod = HttpMethod::$method;
            const DISCARDS_BODY: bool = true;

            fn path(&self) -> String {
                $path.to_string()
            }

            fn body(&self) -> Option<&Self::Body> {
                Some(&self.0)
            }
        }
    };
    ($name:ident, $method:ident, $body:ty, $response:ty, $path:expr) => {
        #[derive(Debug, Clone)]
        pub struct $name(pub $body);

        impl Endpoint for $name {
            type Body = $body;
            type Response = $response;
            const METHOD: HttpMethod = HttpMethod::$method;

            fn path(&self) -> String {
                $path.to_string()
            }

            fn body(&self) -> Option<&Self::Body> {
                Some(&self.0)
            }
        }
    };
    ($name:ident, $method:ident, $body:ty, $response:ty, $base:expr, id) => {
        #[derive(Debug, Clone)]
        pub struct $name(pub EntityId, pub $body);

        impl Endpoint for $name {
            type Body = $body;
            type Response = $response;
            const METHOD: HttpMethod = HttpMethod::$method;

            fn path(&self) -> String {
                format!("{}/{}", $base, self.0)
            }

            fn body(&self) -> Option<&Self::Body> {
                Some(&self.1)
            }
        }
    };
}

// =========================================================
// Auth
// =========================================================

#[derive(Debug, Clone)]
pub struct Login(pub LoginCredentials);

impl Endpoint for Login {
    type Body = LoginCredentials;
    type Response = LoginResponse;
    const METHOD: HttpMethod = HttpMethod::Post;
    const CREDENTIAL_EXCHANGE: bool = true;

    fn path(&self) -> String {
        PATH_LOGIN.to_string()
    }

    fn body(&self) -> Option<&Self::Body> {
        Some(&self.0)
    }
}

// =========================================================
// Public reads
// =========================================================

bodiless_endpoint!(GetProfile, Get, UserProfile, PATH_USER);
bodiless_endpoint!(ListProjects, Get, Vec<Project>, PATH_PROJECTS);
bodiless_endpoint!(ListSkills, Get, Vec<Skill>, PATH_SKILLS);
bodiless_endpoint!(ListExperience, Get, Vec<Experience>, PATH_EXPERIENCE);
bodiless_endpoint!(ListEducation, Get, Vec<Education>, PATH_EDUCATION);

// =========================================================
// Admin writes
// =========================================================

body_endpoint!(UpdateProfile, Put, UserProfile, UserProfile, PATH_USER);

body_endpoint!(CreateProject, Post, ProjectPayload, Project, PATH_PROJECTS);
body_endpoint!(UpdateProject, Put, ProjectPayload, Project, PATH_PROJECTS, id);
bodiless_endpoint!(DeleteProject, Delete, discard, PATH_PROJECTS, id);
body_endpoint!(AddProjectSkills, Post, ProjectSkillRequest, discard, PATH_PROJECT_SKILLS);

body_endpoint!(CreateSkill, Post, SkillPayload, Skill, PATH_SKILLS);
bodiless_endpoint!(DeleteSkill, Delete, discard, PATH_SKILLS, id);

body_endpoint!(CreateExperience, Post, ExperiencePayload, Experience, PATH_EXPERIENCE);
body_endpoint!(UpdateExperience, Put, ExperiencePayload, Experience, PATH_EXPERIENCE, id);
bodiless_endpoint!(DeleteExperience, Delete, discard, PATH_EXPERIENCE, id);

body_endpoint!(CreateEducation, Post, EducationPayload, Education, PATH_EDUCATION);
body_endpoint!(UpdateEducation, Put, EducationPayload, Education, PATH_EDUCATION, id);
bodiless_endpoint!(DeleteEducation, Delete, discard, PATH_EDUCATION, id);
