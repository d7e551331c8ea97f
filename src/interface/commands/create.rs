//! # Create Command
//!
//! `ade create <folder|file|template|demo>` on top of `FileSystemCreator`.

use anyhow::Result;
use clap::Subcommand;
use std::io::Write;

use crate::application::scaffold::{FileSystemCreator, parse_params, template_names};
use crate::domain::types::ItemKind;
use crate::interface::console::{header, ok_line};

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum CreateCommand {
    /// Create a folder
    Folder {
        path: String,
        /// Fail when the parent folder is missing
        #[arg(long)]
        no_parents: bool,
    },
    /// Create a file, with optional content
    File {
        path: String,
        #[arg(long, default_value = "")]
        content: String,
    },
    /// Expand a built-in template (python_script, readme, config_json, html_page)
    Template {
        name: String,
        /// Template parameters as key=value
        params: Vec<String>,
    },
    /// Create the sample project
    Demo,
}

pub fn handle_create(command: &CreateCommand, creator: &mut FileSystemCreator, out: &mut dyn Write) -> Result<()> {
    match command {
        CreateCommand::Folder { path, no_parents } => {
            let created = creator.create_folder(path, !no_parents)?;
            writeln!(out, "{}", ok_line(&format!("Folder created: {}", created.display())))?;
        }
        CreateCommand::File { path, content } => {
            let created = creator.create_file(path, content)?;
            writeln!(out, "{}", ok_line(&format!("File created: {}", created.display())))?;
        }
        CreateCommand::Template { name, params } => {
            let params = parse_params(params)?;
            let created = creator.create_from_template(name, &params).map_err(|e| {
                anyhow::anyhow!("{:#}. Available templates: {}", e, template_names().join(", "))
            })?;
            writeln!(out, "{}", ok_line(&format!("Template '{}' created: {}", name, created.display())))?;
        }
        CreateCommand::Demo => {
            let created = creator.demo()?;
            writeln!(out, "{}", ok_line(&format!("Demo project created with {} items", created.len())))?;
        }
    }

    writeln!(out, "\n{}", header("📋 Created items"))?;
    for item in creator.list_created_items() {
        let kind = match item.kind {
            ItemKind::Folder => "📁",
            ItemKind::File => "📄",
        };
        writeln!(out, "  {} {} ({} bytes)", kind, item.path, item.size)?;
    }
    Ok(())
}
