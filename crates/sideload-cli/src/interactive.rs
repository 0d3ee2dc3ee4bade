//! Interactive queue session.
//!
//! Lets the user build a queue of package files and install it while the
//! connection monitor polls in the background. Uses dialoguer for prompts;
//! every prompt runs on a blocking thread so the poller keeps ticking.

use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, MultiSelect, Select, theme::ColorfulTheme};

use sideload_core::context::AppContext;
use sideload_core::deploy::{LibraryListing, Stage, count_failures};
use sideload_core::package::PackageRef;

use crate::{install_summary, styled_status};

/// Entries offered in the main menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    AddFiles,
    AddFromLibrary,
    Remove,
    InstallAll,
    RemoveAll,
    CheckConnection,
    SetAddress,
    ShowInstalled,
    Quit,
}

impl MenuAction {
    fn label(self) -> &'static str {
        match self {
            Self::AddFiles => "Add package files",
            Self::AddFromLibrary => "Add from default directory",
            Self::Remove => "Remove a package",
            Self::InstallAll => "Install all",
            Self::RemoveAll => "Remove all",
            Self::CheckConnection => "Check connection",
            Self::SetAddress => "Set host address",
            Self::ShowInstalled => "Show installed apps",
            Self::Quit => "Quit",
        }
    }
}

/// Menu for the current queue. Queue actions only appear when there is
/// something queued.
pub fn menu_for(queue_len: usize) -> Vec<MenuAction> {
    let mut actions = vec![MenuAction::AddFiles, MenuAction::AddFromLibrary];
    if queue_len > 0 {
        actions.extend([
            MenuAction::Remove,
            MenuAction::InstallAll,
            MenuAction::RemoveAll,
        ]);
    }
    actions.extend([
        MenuAction::CheckConnection,
        MenuAction::SetAddress,
        MenuAction::ShowInstalled,
        MenuAction::Quit,
    ]);
    actions
}

/// Split a line of input into paths. Paths are separated by `;` so that
/// spaces inside a path survive.
pub fn split_paths(line: &str) -> Vec<String> {
    line.split(';')
        .map(|part| part.trim().trim_matches(|c| c == '"' || c == '\''))
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

pub struct QueueSession<'a> {
    ctx: &'a AppContext,
}

impl<'a> QueueSession<'a> {
    pub fn new(ctx: &'a AppContext) -> Self {
        Self { ctx }
    }

    pub async fn run(&self) -> Result<()> {
        let poller = self.ctx.spawn_polling();
        let result = self.menu_loop().await;
        poller.shutdown().await;
        result
    }

    async fn menu_loop(&self) -> Result<()> {
        println!();
        println!("{}", style("  Sideload Queue").bold().cyan());

        loop {
            self.print_header();
            let actions = menu_for(self.ctx.registry().len());
            let labels: Vec<&'static str> = actions.iter().map(|a| a.label()).collect();

            let choice = prompt(move |theme| {
                Select::with_theme(theme)
                    .with_prompt("What next?")
                    .items(&labels)
                    .default(0)
                    .interact_opt()
            })
            .await?;

            let Some(index) = choice else {
                return Ok(());
            };
            match actions[index] {
                MenuAction::AddFiles => self.add_files().await?,
                MenuAction::AddFromLibrary => self.add_from_library().await?,
                MenuAction::Remove => self.remove_one().await?,
                MenuAction::InstallAll => self.install_all().await?,
                MenuAction::RemoveAll => {
                    self.ctx.registry().clear();
                    println!("  Queue cleared.");
                }
                MenuAction::CheckConnection => {
                    let status = self.ctx.monitor().check_connection().await;
                    println!("  Connection: {}", styled_status(status));
                }
                MenuAction::SetAddress => self.set_address().await?,
                MenuAction::ShowInstalled => self.show_installed().await,
                MenuAction::Quit => return Ok(()),
            }
        }
    }

    fn print_header(&self) {
        let queue = self.ctx.registry().current_selection();
        println!();
        println!(
            "  Connection: {}   Queue: {}",
            styled_status(self.ctx.state().connection_status()),
            style(queue.len()).bold()
        );
        for (i, package) in queue.iter().enumerate() {
            println!("    {}. {}", i + 1, package.display_name);
        }
        println!();
    }

    async fn add_files(&self) -> Result<()> {
        let line = prompt(|theme| {
            Input::<String>::with_theme(theme)
                .with_prompt("Package paths (separate with ';')")
                .allow_empty(true)
                .interact_text()
        })
        .await?;

        let report = self.ctx.registry().add_from_paths(split_paths(&line));
        for rejected in &report.rejected {
            println!("  {} {}", style("⚠").yellow(), rejected);
        }
        if !report.accepted.is_empty() {
            println!("  Added {} package(s).", report.accepted.len());
        }
        Ok(())
    }

    async fn add_from_library(&self) -> Result<()> {
        let listing = match self.ctx.library().list().await {
            Ok(listing) => listing,
            Err(err) => {
                println!("  {}", style(format!("Failed to list package files: {err}")).red());
                return Ok(());
            }
        };
        let packages = match listing {
            LibraryListing::DirectoryNotSet => {
                println!("  No default package directory set. Use `sideload dir <PATH>`.");
                return Ok(());
            }
            LibraryListing::Empty => {
                println!("  No package files found.");
                return Ok(());
            }
            LibraryListing::Packages(packages) => packages,
        };

        let names: Vec<String> = packages.iter().map(|p| p.display_name.clone()).collect();
        let picked = prompt(move |theme| {
            MultiSelect::with_theme(theme)
                .with_prompt("Select packages (space to toggle, enter to confirm)")
                .items(&names)
                .interact()
        })
        .await?;

        let chosen: Vec<PackageRef> = picked.into_iter().map(|i| packages[i].clone()).collect();
        if !chosen.is_empty() {
            let report = self.ctx.registry().add_refs(chosen);
            println!("  Added {} package(s).", report.accepted.len());
        }
        Ok(())
    }

    async fn remove_one(&self) -> Result<()> {
        let queue = self.ctx.registry().current_selection();
        let names: Vec<String> = queue.iter().map(|p| p.display_name.clone()).collect();
        let picked = prompt(move |theme| {
            Select::with_theme(theme)
                .with_prompt("Remove which package?")
                .items(&names)
                .default(0)
                .interact_opt()
        })
        .await?;

        if let Some(index) = picked {
            self.ctx.registry().remove(&queue[index].source_path);
        }
        Ok(())
    }

    async fn install_all(&self) -> Result<()> {
        let attempted = self.ctx.registry().len();
        let outcomes = self.ctx.orchestrator().deploy_selection().await;
        let failed = count_failures(&outcomes, Stage::Install);
        println!();
        if failed == 0 {
            println!("  {}", style(install_summary(attempted, failed)).green());
        } else {
            println!("  {}", style(install_summary(attempted, failed)).red());
        }

        let clear = prompt(move |theme| {
            Confirm::with_theme(theme)
                .with_prompt("Clear the queue?")
                .default(failed == 0)
                .interact()
        })
        .await?;
        if clear {
            self.ctx.registry().clear();
        }
        Ok(())
    }

    async fn set_address(&self) -> Result<()> {
        let current = self.ctx.target().host_address().await.unwrap_or_default();
        let value = prompt(move |theme| {
            Input::<String>::with_theme(theme)
                .with_prompt("Host address (host:port)")
                .with_initial_text(current)
                .interact_text()
        })
        .await?;

        match self.ctx.target().set_host_address(&value).await {
            Ok(address) => {
                println!("  ✓ Host address set to {}", style(address).green());
                let status = self.ctx.monitor().check_connection().await;
                println!("  Connection: {}", styled_status(status));
            }
            Err(err) => println!("  {}", style(err).red()),
        }
        Ok(())
    }

    async fn show_installed(&self) {
        match self.ctx.orchestrator().refresh_installed().await {
            Ok(packages) if packages.is_empty() => println!("  No third-party apps installed."),
            Ok(packages) => {
                for package in packages {
                    println!(
                        "  {} {}",
                        package.display_label,
                        style(format!("({} {})", package.package_name, package.version_name))
                            .dim()
                    );
                }
            }
            Err(err) => println!(
                "  {}",
                style(format!("Failed to list installed packages: {err}")).red()
            ),
        }
    }
}

/// Run a blocking dialoguer prompt off the async runtime.
async fn prompt<T, F>(interact: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&ColorfulTheme) -> dialoguer::Result<T> + Send + 'static,
{
    let result = tokio::task::spawn_blocking(move || interact(&ColorfulTheme::default()))
        .await
        .context("Prompt task failed")?;
    Ok(result?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_queue_hides_queue_actions() {
        let actions = menu_for(0);
        assert!(!actions.contains(&MenuAction::InstallAll));
        assert!(!actions.contains(&MenuAction::RemoveAll));
        assert!(!actions.contains(&MenuAction::Remove));
        assert_eq!(actions.last(), Some(&MenuAction::Quit));
    }

    #[test]
    fn non_empty_queue_offers_install_and_remove_all() {
        let actions = menu_for(2);
        assert!(actions.contains(&MenuAction::InstallAll));
        assert!(actions.contains(&MenuAction::RemoveAll));
    }

    #[test]
    fn split_paths_keeps_spaces_and_strips_quotes() {
        assert_eq!(
            split_paths(r#" "/tmp/My App.apk" ; /tmp/b.apk;; "#),
            ["/tmp/My App.apk", "/tmp/b.apk"]
        );
        assert!(split_paths("   ").is_empty());
    }
}
