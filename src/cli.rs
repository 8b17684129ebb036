use crate::config::Settings;
use crate::fsops;
use crate::launcher::spawn::SystemSpawner;
use crate::launcher::{LaunchResult, Launcher};
use crate::model::{Category, Project};
use crate::registry::{self, MoveOutcome, MoveReport, Overwrite, Registry};
use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use humansize::{BINARY, format_size};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(version, about, long_about = None, disable_version_flag = true)]
pub struct Cli {
    /// Print version information
    #[arg(short = 'v', long = "version", action = clap::ArgAction::Version)]
    version: Option<bool>,

    /// Workspace root (overrides the settings file and DEVSPACE_WORKSPACE)
    #[arg(long, global = true, value_name = "DIR")]
    pub workspace: Option<PathBuf>,

    /// Log at debug level
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// List projects in a category
    List {
        category: Category,
        /// Also list this path as an external entry
        #[arg(long = "external", value_name = "PATH")]
        external: Vec<PathBuf>,
    },
    /// Launch a project
    Run {
        category: Category,
        name: String,
        /// Make this path available as an external entry
        #[arg(long = "external", value_name = "PATH")]
        external: Vec<PathBuf>,
    },
    /// Move external folders or files into the workspace
    Move {
        category: Category,
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Replace existing entries with the same name
        #[arg(long)]
        overwrite: bool,
    },
    /// Move a single path into the workspace
    Import {
        category: Category,
        path: PathBuf,
        #[arg(long)]
        overwrite: bool,
    },
    /// Create a project with a starter entry file
    New { category: Category, name: String },
    /// Print a project's entry file, or one of its files
    Show {
        category: Category,
        name: String,
        /// File inside the project folder
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Overwrite a project's entry file, or one of its files
    Save {
        category: Category,
        name: String,
        #[arg(long)]
        file: Option<PathBuf>,
        /// Read new contents from this file instead of stdin
        #[arg(long, value_name = "SRC")]
        from: Option<PathBuf>,
    },
    /// Move a project to the trash
    Remove { category: Category, name: String },
    /// Print the workspace and category directories
    Paths,
}

pub fn execute(command: Command, mut registry: Registry, settings: Settings) -> Result<()> {
    let launcher = Launcher::new(settings, SystemSpawner { quiet: false });

    match command {
        Command::List { category, external } => {
            add_externals(&mut registry, category, &external)?;
            let projects = registry.list(category)?;
            if projects.is_empty() {
                println!("No projects in {}", registry.workspace().dir(category).display());
                return Ok(());
            }

            let paths: Vec<PathBuf> = projects.iter().map(|p| p.path.clone()).collect();
            let stats = fsops::stats_for(&paths);
            for (project, (_, stats)) in projects.iter().zip(stats) {
                let source = if project.is_external() { "external" } else { "" };
                println!(
                    "{:<32} {:>10} {source}",
                    project.name,
                    format_size(stats.size, BINARY)
                );
            }
        }
        Command::Run {
            category,
            name,
            external,
        } => {
            add_externals(&mut registry, category, &external)?;
            let project = find(&registry, category, &name)?;
            let result = launcher.run(category, &project)?;
            let entry = result.entry().display().to_string();
            match result {
                LaunchResult::Opened(_) => println!("Opened {entry}"),
                LaunchResult::Spawned { pid, cleanup, .. } => {
                    match pid {
                        Some(pid) => println!("Started {entry} (pid {pid})"),
                        None => println!("Started {entry}"),
                    }
                    // Exiting now would kill the cleanup thread and leave the wrapper behind.
                    if let Some(handle) = cleanup
                        && handle.join().is_err()
                    {
                        tracing::warn!("cleanup thread panicked");
                    }
                }
            }
        }
        Command::Move {
            category,
            paths,
            overwrite,
        } => {
            let mut missing = Vec::new();
            for path in paths {
                if let Err(e) = registry.add_external(category, &path) {
                    missing.push((path.display().to_string(), e));
                }
            }
            let mut report = move_with_progress(&mut registry, category, overwrite);
            report.failed.extend(missing);
            println!("{report}");
            if !report.failed.is_empty() {
                bail!("{} item(s) could not be moved", report.failed.len());
            }
        }
        Command::Import {
            category,
            path,
            overwrite,
        } => match registry.import(category, &path, overwrite_mode(overwrite))? {
            MoveOutcome::Moved(to) => println!("Moved to {}", to.display()),
            MoveOutcome::Conflict(to) => {
                bail!("{} already exists; pass --overwrite to replace it", to.display());
            }
            MoveOutcome::AlreadyInWorkspace => {
                println!("{} is already in the workspace", path.display());
            }
        },
        Command::New { category, name } => {
            let project = registry.create_project(category, &name)?;
            println!("Created {}", project.path.display());
        }
        Command::Show {
            category,
            name,
            file,
        } => {
            let project = find(&registry, category, &name)?;
            let path = target_file(&launcher, category, &project, file.as_deref())?;
            print!("{}", registry::read_file(&path)?);
        }
        Command::Save {
            category,
            name,
            file,
            from,
        } => {
            let project = find(&registry, category, &name)?;
            let path = target_file(&launcher, category, &project, file.as_deref())?;
            let contents = match from {
                Some(src) => std::fs::read_to_string(&src)
                    .with_context(|| format!("failed to read {}", src.display()))?,
                None => {
                    let mut buf = String::new();
                    io::stdin()
                        .read_to_string(&mut buf)
                        .context("failed to read stdin")?;
                    buf
                }
            };
            registry::save_file(&path, &contents)?;
            println!("Saved {}", path.display());
        }
        Command::Remove { category, name } => {
            let project = find(&registry, category, &name)?;
            registry.trash_project(category, &project)?;
            println!("Moved {} to trash", project.path.display());
        }
        Command::Paths => {
            println!("workspace: {}", registry.workspace().root().display());
            for category in Category::ALL {
                println!(
                    "{:<10} {}",
                    format!("{category:?}").to_lowercase(),
                    registry.workspace().dir(category).display()
                );
            }
            if let Some(path) = Settings::path() {
                println!("settings:  {}", path.display());
            }
            if let Some(path) = crate::logging::log_path() {
                println!("log:       {}", path.display());
            }
        }
    }

    Ok(())
}

fn add_externals(registry: &mut Registry, category: Category, paths: &[PathBuf]) -> Result<()> {
    for path in paths {
        if !registry.add_external(category, path)? {
            tracing::debug!(path = %path.display(), "already listed, not added");
        }
    }
    Ok(())
}

fn find(registry: &Registry, category: Category, name: &str) -> Result<Project> {
    match registry.find(category, name)? {
        Some(project) => Ok(project),
        None => bail!("no {category} project named {name:?}"),
    }
}

/// `file` relative to the project folder, else the entry file the launcher would use.
fn target_file(
    launcher: &Launcher,
    category: Category,
    project: &Project,
    file: Option<&Path>,
) -> Result<PathBuf> {
    if !project.is_dir {
        return Ok(project.path.clone());
    }
    match file {
        Some(file) => Ok(project.path.join(file)),
        None => Ok(launcher.plan(category, project)?.entry),
    }
}

fn overwrite_mode(overwrite: bool) -> Overwrite {
    if overwrite {
        Overwrite::Replace
    } else {
        Overwrite::Skip
    }
}

fn move_with_progress(registry: &mut Registry, category: Category, overwrite: bool) -> MoveReport {
    let total = registry.pending_moves(category).len() as u64;
    let bar = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::with_template("{bar:30.cyan/blue} {pos}/{len} {msg}") {
        bar.set_style(style);
    }

    let report = registry.move_all(
        category,
        |project| {
            if !overwrite {
                bar.println(format!(
                    "{} already exists in {}, skipped (use --overwrite)",
                    project.name,
                    category.dir_name()
                ));
            }
            overwrite
        },
        |project| {
            bar.set_message(project.name.clone());
            bar.inc(1);
        },
    );
    bar.finish_and_clear();
    report
}
