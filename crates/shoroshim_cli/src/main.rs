//! Command-line front end for the genealogy core.
//!
//! # Responsibility
//! - Open the configured store and expose people, relationships and charts
//!   as plain text.
//! - Act as the terminal `ConfirmationPrompt` and `ChartRenderer`.

use anyhow::{bail, Context};
use async_trait::async_trait;
use clap::{Parser, Subcommand, ValueEnum};
use futures::executor::block_on;
use log::error;
use shoroshim_core::format::relationship_text;
use shoroshim_core::workspace::chart::{ChartRenderer, ChartView};
use shoroshim_core::{
    dates_text, init_logging, ConfirmationPrompt, CoreConfig, GenealogySession, Gender,
    HierarchyNode, Person, PersonFullDetails, PersonStore, PromptChoice, PromptOptions, RelationshipToMe,
    RelationshipType, SaveResponse, SqlitePersonStore, StandardWorkspaceFactory, WorkspaceMode,
};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::rc::Rc;

#[derive(Parser)]
#[command(name = "shoroshim", about = "Family tree store and charts", version)]
struct Cli {
    /// SQLite database file (overrides SHOROSHIM_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Log level (overrides SHOROSHIM_LOG_LEVEL)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Absolute log directory (overrides SHOROSHIM_LOG_DIR)
    #[arg(long, global = true)]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the core version
    Version,
    /// List every person
    People,
    /// Show one person with their relationships
    Show { id: i64 },
    /// Add a person
    Add {
        name: String,
        #[arg(value_enum)]
        gender: GenderArg,
        #[arg(long)]
        born: Option<String>,
        #[arg(long)]
        died: Option<String>,
    },
    /// Record that PARENT is CHILD's <role>
    Link {
        parent: i64,
        child: i64,
        #[arg(value_enum)]
        role: RoleArg,
    },
    /// Render a chart rooted at a person
    Chart {
        person: i64,
        #[arg(value_enum, default_value = "ancestor-tree")]
        mode: ChartArg,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum GenderArg {
    M,
    F,
}

impl From<GenderArg> for Gender {
    fn from(value: GenderArg) -> Self {
        match value {
            GenderArg::M => Gender::Male,
            GenderArg::F => Gender::Female,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum RoleArg {
    Father,
    Mother,
    StepFather,
    StepMother,
    AdoptedFather,
    AdoptedMother,
}

impl From<RoleArg> for RelationshipType {
    fn from(value: RoleArg) -> Self {
        match value {
            RoleArg::Father => RelationshipType::Father,
            RoleArg::Mother => RelationshipType::Mother,
            RoleArg::StepFather => RelationshipType::StepFather,
            RoleArg::StepMother => RelationshipType::StepMother,
            RoleArg::AdoptedFather => RelationshipType::AdoptedFather,
            RoleArg::AdoptedMother => RelationshipType::AdoptedMother,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ChartArg {
    AncestorTree,
    DescendantTree,
    CombinedTree,
    AncestorFan,
    DescendantFan,
}

impl From<ChartArg> for WorkspaceMode {
    fn from(value: ChartArg) -> Self {
        match value {
            ChartArg::AncestorTree => WorkspaceMode::AncestorTree,
            ChartArg::DescendantTree => WorkspaceMode::DescendantTree,
            ChartArg::CombinedTree => WorkspaceMode::CombinedTree,
            ChartArg::AncestorFan => WorkspaceMode::AncestorFan,
            ChartArg::DescendantFan => WorkspaceMode::DescendantFan,
        }
    }
}

/// Stdin/stdout confirmation prompt.
struct TerminalPrompt;

#[async_trait(?Send)]
impl ConfirmationPrompt for TerminalPrompt {
    async fn ask(&self, title: &str, body: &str, options: PromptOptions) -> PromptChoice {
        let hint = match options {
            PromptOptions::YesNoCancel => "[y]es/[n]o/[c]ancel",
            PromptOptions::YesCancel => "[y]es/[c]ancel",
        };
        println!("{title}\n{body} {hint}");
        let _ = std::io::stdout().flush();

        let mut line = String::new();
        if std::io::stdin().lock().read_line(&mut line).is_err() {
            return PromptChoice::Cancel;
        }
        match line.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => PromptChoice::Yes,
            "n" | "no" if options.offers(PromptChoice::No) => PromptChoice::No,
            _ => PromptChoice::Cancel,
        }
    }

    async fn notify(&self, title: &str, message: &str) {
        eprintln!("{title}: {message}");
    }
}

/// Indented text chart printer.
struct TextRenderer;

impl TextRenderer {
    fn print_tree(root: &HierarchyNode) {
        let mut pending = vec![(root, 0usize)];
        while let Some((node, level)) = pending.pop() {
            let name = node.display_name.as_deref().unwrap_or("<unknown>");
            println!("{}{} (#{})", "  ".repeat(level), name, node.person_id);
            pending.extend(node.children.iter().rev().map(|child| (child, level + 1)));
        }
    }
}

impl ChartRenderer for TextRenderer {
    fn render(&self, _mode: WorkspaceMode, heading: &str, view: &ChartView) {
        println!("{heading}");
        match view {
            ChartView::Single(root) => Self::print_tree(root),
            ChartView::Combined {
                ancestors,
                descendants,
            } => {
                println!("-- ancestors");
                Self::print_tree(ancestors);
                println!("-- descendants");
                Self::print_tree(descendants);
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run(cli).inspect_err(|err| error!("event=cli_run module=cli status=error error={err}"))
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = CoreConfig::from_env()?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Some(level) = cli.log_level {
        config.set_log_level(&level)?;
    }
    if cli.log_dir.is_some() {
        config.log_dir = cli.log_dir;
    }
    if let Some(dir) = config.log_dir.as_deref() {
        init_logging(config.log_level, dir).map_err(anyhow::Error::msg)?;
    }

    if let Command::Version = cli.command {
        println!("shoroshim_core version={}", shoroshim_core::core_version());
        return Ok(());
    }

    let store = SqlitePersonStore::open(&config.db_path)
        .with_context(|| format!("opening {}", config.db_path.display()))?;
    block_on(execute(cli.command, Rc::new(store)))
}

async fn execute(command: Command, store: Rc<SqlitePersonStore>) -> anyhow::Result<()> {
    match command {
        Command::Version => Ok(()),
        Command::People => {
            for person in store.load_people().await? {
                println!(
                    "{:>5}  {}  {}  {}",
                    person.id,
                    person.gender.code(),
                    person.display_name,
                    dates_text(person.date_of_birth.as_deref(), person.date_of_death.as_deref())
                );
            }
            Ok(())
        }
        Command::Show { id } => {
            let all = store.load_full_details(id).await?;
            let details = &all.details;
            println!("{} (#{}) {}", details.display_name, details.id, details.gender);
            println!(
                "  {}",
                dates_text(details.date_of_birth.as_deref(), details.date_of_death.as_deref())
            );
            if let Some(veracity) = details.veracity.as_deref() {
                println!("  veracity: {veracity}");
            }
            for rel in &all.relationships {
                println!(
                    "  {:<14} #{}",
                    relationship_text(rel.relationship_type),
                    rel.related_person_id
                );
            }
            Ok(())
        }
        Command::Add {
            name,
            gender,
            born,
            died,
        } => {
            let mut details =
                PersonFullDetails::from_person(&Person::new(0, name, gender.into()));
            details.date_of_birth = born;
            details.date_of_death = died;
            let response = store.save(&details, &[]).await?;
            ensure_saved(&response)?;
            if let Some(id) = response.new_id {
                println!("added #{id}");
            }
            Ok(())
        }
        Command::Link {
            parent,
            child,
            role,
        } => {
            let all = store
                .load_full_details(child)
                .await
                .with_context(|| format!("loading child #{child}"))?;
            let mut relationships = all.relationships;
            relationships.push(RelationshipToMe::new(parent, role.into()));
            let edges = relationships
                .iter()
                .map(|rel| rel.to_edge(child))
                .collect::<Vec<_>>();
            let response = store.save(&all.details, &edges).await?;
            ensure_saved(&response)
        }
        Command::Chart { person, mode } => {
            let session = GenealogySession::new(
                store.clone(),
                Box::new(StandardWorkspaceFactory::new(
                    store,
                    Rc::new(TerminalPrompt),
                    Rc::new(TextRenderer),
                )),
                WorkspaceMode::Editor,
            );
            session.load_people().await?;
            if !session.select_person(person).await? {
                bail!("person selection was blocked");
            }
            session.request_transition(mode.into()).await?;
            Ok(())
        }
    }
}

fn ensure_saved(response: &SaveResponse) -> anyhow::Result<()> {
    if !response.success {
        bail!(
            "could not save person: {}",
            response.error_message.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{ensure_saved, run, Cli};
    use clap::Parser;
    use shoroshim_core::{ConfigError, SaveResponse, StoreError};

    #[test]
    fn unsuccessful_save_reports_store_message() {
        let err = ensure_saved(&SaveResponse::failure("disk full")).expect_err("failed save");
        assert_eq!(err.to_string(), "could not save person: disk full");
        assert!(ensure_saved(&SaveResponse::saved()).is_ok());
    }

    #[test]
    fn bad_log_level_flag_keeps_typed_config_error() {
        let cli = Cli::parse_from(["shoroshim", "--log-level", "loud", "people"]);

        let err = run(cli).expect_err("invalid level");

        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::InvalidLogLevel { value }) if value == "loud"
        ));
    }

    #[test]
    fn missing_person_surfaces_store_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let db = dir.path().join("family.sqlite3");
        let cli = Cli::parse_from([
            "shoroshim",
            "--db",
            db.to_str().expect("utf-8 path"),
            "show",
            "404",
        ]);

        let err = run(cli).expect_err("unknown person");

        let not_found = err.chain().any(|cause| {
            matches!(
                cause.downcast_ref::<StoreError>(),
                Some(StoreError::PersonNotFound(404))
            )
        });
        assert!(not_found, "unexpected error: {err:#}");
    }
}
