use clap::{Parser, Subcommand};
use folio::App;
use folio::config::FolioConfig;
use folio::dashboard::{ProjectSaveError, SkillDeleteError};
use folio::error::FolioError;
use folio::forms::{ProjectForm, SkillForm, TimelineForm};
use folio::guard::GuardDecision;
use folio::home::{HomeSection, PortfolioHome};
use folio::shared::date::Timeline;
use folio::shared::{EducationKind, EntityId, LoginCredentials, SkillCategory, SkillLevel};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Portfolio client: browse the public site and manage its content")]
struct Cli {
    /// Overrides FOLIO_API_BASE_URL
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Overrides FOLIO_STORAGE_PATH
    #[arg(long, global = true)]
    storage: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print public sections (all when none is given)
    Show {
        #[arg(value_parser = parse_section)]
        section: Option<HomeSection>,
    },
    Login {
        #[arg(long)]
        username: String,
        #[arg(long, env = "FOLIO_PASSWORD")]
        password: String,
    },
    Logout,
    /// Whether a session is stored
    Status,
    Skill {
        #[command(subcommand)]
        command: SkillCommand,
    },
    Project {
        #[command(subcommand)]
        command: ProjectCommand,
    },
    Experience {
        #[command(subcommand)]
        command: ExperienceCommand,
    },
    Education {
        #[command(subcommand)]
        command: EducationCommand,
    },
}

#[derive(Subcommand)]
enum SkillCommand {
    Add {
        #[arg(long)]
        name: String,
        #[arg(long, value_parser = parse_level, default_value = "Intermedio")]
        level: SkillLevel,
        #[arg(long, default_value = "Frontend")]
        category: String,
        #[arg(long)]
        icon: Option<String>,
    },
    Delete { id: EntityId },
}

#[derive(Subcommand)]
enum ProjectCommand {
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        /// YYYY-MM-DD, defaults to today
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        repo: Option<String>,
        #[arg(long)]
        demo: Option<String>,
        #[arg(long)]
        image: Option<String>,
        /// Skill id to link; repeatable
        #[arg(long = "skill")]
        skills: Vec<EntityId>,
    },
    Delete { id: EntityId },
}

#[derive(Subcommand)]
enum ExperienceCommand {
    Add {
        #[arg(long)]
        company: String,
        #[arg(long)]
        position: String,
        #[arg(long)]
        start: String,
        /// Omit for a current position
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        logo: Option<String>,
    },
    Delete { id: EntityId },
}

#[derive(Subcommand)]
enum EducationCommand {
    Add {
        #[arg(long)]
        institution: String,
        #[arg(long)]
        degree: String,
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: Option<String>,
        #[arg(long, value_parser = parse_kind, default_value = "degree")]
        kind: EducationKind,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        logo: Option<String>,
    },
    Delete { id: EntityId },
}

fn parse_section(s: &str) -> Result<HomeSection, String> {
    HomeSection::parse(s).ok_or_else(|| format!("unknown section {s:?}"))
}

fn parse_level(s: &str) -> Result<SkillLevel, String> {
    SkillLevel::parse(s).ok_or_else(|| format!("unknown level {s:?}"))
}

fn parse_kind(s: &str) -> Result<EducationKind, String> {
    EducationKind::parse(s).ok_or_else(|| format!("unknown education kind {s:?}"))
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("not logged in; run `folio login` first")]
    NotLoggedIn,
    #[error(transparent)]
    Api(#[from] FolioError),
    #[error(transparent)]
    ProjectSave(#[from] ProjectSaveError),
    #[error(transparent)]
    SkillDelete(#[from] SkillDeleteError),
}

impl CliError {
    fn user_message(&self) -> String {
        match self {
            CliError::NotLoggedIn => self.to_string(),
            CliError::Api(e) => e.user_message(),
            CliError::ProjectSave(e @ ProjectSaveError::SkillsNotLinked { .. }) => e.to_string(),
            CliError::ProjectSave(ProjectSaveError::Write(e)) => e.user_message(),
            CliError::SkillDelete(e) => e.user_message(),
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("folio=info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let mut config = FolioConfig::from_env();
    if let Some(url) = cli.base_url {
        config = config.with_base_url(url);
    }
    if let Some(path) = cli.storage {
        config = config.with_storage_path(path);
    }

    let app = match App::from_config(config) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("error: {}", e.user_message());
            return ExitCode::FAILURE;
        }
    };
    app.start();

    match run(&app, cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("error: {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(app: &App, command: Command) -> Result<(), CliError> {
    match command {
        Command::Show { section } => {
            let home = app.home();
            let sections = match section {
                Some(s) => vec![s],
                None => HomeSection::ALL.to_vec(),
            };
            for section in sections {
                match home.load(section).await {
                    Ok(()) => print_section(&home, section),
                    Err(e) => println!("[{}] unavailable: {}", section.as_str(), e.user_message()),
                }
            }
            Ok(())
        }
        Command::Login { username, password } => {
            app.session()
                .login(&LoginCredentials::new(username, password))
                .await
                .map_err(|e| {
                    // one message for rejected credentials
                    if e.is_unauthorized() {
                        FolioError::unauthorized("Invalid credentials. Please try again.")
                    } else {
                        e
                    }
                })?;
            println!("logged in");
            Ok(())
        }
        Command::Logout => {
            app.session().logout();
            println!("logged out");
            Ok(())
        }
        Command::Status => {
            if app.session().is_authenticated() {
                println!("logged in (session stored at {})", app.config().storage_path.display());
            } else {
                println!("not logged in");
            }
            Ok(())
        }
        Command::Skill { command } => {
            let dashboard = enter_admin(app)?;
            match command {
                SkillCommand::Add {
                    name,
                    level,
                    category,
                    icon,
                } => {
                    let form = SkillForm {
                        name,
                        level,
                        category: SkillCategory::from(category),
                        icon_url: icon.unwrap_or_default(),
                    };
                    let skill = dashboard.skills.create(&form).await?;
                    println!("created skill {} ({})", skill.id, skill.name);
                }
                SkillCommand::Delete { id } => {
                    dashboard.skills.delete(id).await?;
                    println!("deleted skill {}", id);
                }
            }
            Ok(())
        }
        Command::Project { command } => {
            let dashboard = enter_admin(app)?;
            match command {
                ProjectCommand::Add {
                    title,
                    description,
                    date,
                    repo,
                    demo,
                    image,
                    skills,
                } => {
                    let mut form = ProjectForm::new();
                    form.title = title;
                    form.description = description;
                    if let Some(date) = date {
                        form.date = date;
                    }
                    form.repo_url = repo.unwrap_or_default();
                    form.demo_url = demo.unwrap_or_default();
                    form.image_url = image.unwrap_or_default();
                    for id in skills {
                        if !form.is_selected(id) {
                            form.toggle_skill(id);
                        }
                    }
                    let project = dashboard.projects.save(&form, None).await?;
                    println!(
                        "created project {} with {} skill(s)",
                        project.id,
                        project.skills.len()
                    );
                }
                ProjectCommand::Delete { id } => {
                    dashboard.projects.delete(id).await?;
                    println!("deleted project {}", id);
                }
            }
            Ok(())
        }
        Command::Experience { command } => {
            let dashboard = enter_admin(app)?;
            match command {
                ExperienceCommand::Add {
                    company,
                    position,
                    start,
                    end,
                    description,
                    logo,
                } => {
                    let form = TimelineForm {
                        organization: company,
                        role: position,
                        description: description.unwrap_or_default(),
                        start_date: start,
                        end_date: end.unwrap_or_default(),
                        logo_url: logo.unwrap_or_default(),
                        ..TimelineForm::new()
                    };
                    let exp = dashboard.experience.save(&form, None).await?;
                    println!("created experience {} ({})", exp.id, exp.period_label());
                }
                ExperienceCommand::Delete { id } => {
                    dashboard.experience.delete(id).await?;
                    println!("deleted experience {}", id);
                }
            }
            Ok(())
        }
        Command::Education { command } => {
            let dashboard = enter_admin(app)?;
            match command {
                EducationCommand::Add {
                    institution,
                    degree,
                    start,
                    end,
                    kind,
                    description,
                    logo,
                } => {
                    let form = TimelineForm {
                        organization: institution,
                        role: degree,
                        description: description.unwrap_or_default(),
                        start_date: start,
                        end_date: end.unwrap_or_default(),
                        logo_url: logo.unwrap_or_default(),
                        kind,
                    };
                    let edu = dashboard.education.save(&form, None).await?;
                    println!("created education {} ({})", edu.id, edu.period_label());
                }
                EducationCommand::Delete { id } => {
                    dashboard.education.delete(id).await?;
                    println!("deleted education {}", id);
                }
            }
            Ok(())
        }
    }
}

/// Admin commands go through the same guard as the admin view.
fn enter_admin(app: &App) -> Result<folio::dashboard::Dashboard, CliError> {
    match app.router().navigate("/admin") {
        GuardDecision::Render(_) => Ok(app.dashboard()),
        GuardDecision::Loading | GuardDecision::Redirect(_) => Err(CliError::NotLoggedIn),
    }
}

fn print_section(home: &PortfolioHome, section: HomeSection) {
    println!("== {} ==", section.as_str());
    match section {
        HomeSection::Profile => {
            if let Some(p) = home.profile.data() {
                println!("{} - {}", p.full_name(), p.title);
                println!("{}", p.contact_email);
                if let Some(location) = &p.location {
                    println!("{}", location);
                }
                if !p.bio.is_empty() {
                    println!("\n{}", p.bio);
                }
            }
        }
        HomeSection::Projects => {
            for p in home.projects.data().unwrap_or_default() {
                let skills: Vec<&str> = p.skills.iter().map(|s| s.name.as_str()).collect();
                println!("#{} {} ({}) [{}]", p.id, p.title, p.date, skills.join(", "));
            }
        }
        HomeSection::Skills => {
            for (category, skills) in home.skills_by_category() {
                let names: Vec<String> = skills
                    .iter()
                    .map(|s| format!("{} #{} ({})", s.name, s.id, s.level.label()))
                    .collect();
                println!("{}: {}", category.as_str(), names.join(", "));
            }
        }
        HomeSection::Experience => {
            for e in home.experience.data().unwrap_or_default() {
                println!("#{} {} @ {} ({})", e.id, e.position, e.company, e.period_label());
            }
        }
        HomeSection::Education => {
            for e in home.education.data().unwrap_or_default() {
                println!(
                    "#{} {} - {} [{}] ({})",
                    e.id,
                    e.degree,
                    e.institution,
                    e.kind.label(),
                    e.period_label()
                );
            }
        }
    }
}
