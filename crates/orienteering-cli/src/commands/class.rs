use std::path::PathBuf;

use clap::Subcommand;
use orienteering_core::roster;

use super::{finish, open_store, print_json, CliResult};

#[derive(Subcommand)]
pub enum ClassAction {
    /// Save a class roster
    Add {
        name: String,
        /// Student name (repeatable)
        #[arg(long = "student")]
        students: Vec<String>,
    },
    /// Save a class roster from a CSV or tab-separated file
    Import {
        name: String,
        /// File with one student per line (first name, last name)
        file: PathBuf,
    },
    /// List saved classes as JSON
    List,
    /// Remove a saved class
    Remove { id: String },
}

pub fn run(action: ClassAction) -> CliResult {
    let (mut store, config) = open_store()?;

    match action {
        ClassAction::Add { name, students } => {
            let class = store.add_class(&name, students)?;
            finish(&mut store, &config);
            print_json(&class)?;
        }
        ClassAction::Import { name, file } => {
            let text = std::fs::read_to_string(&file)?;
            let students = roster::parse_names(&text);
            if students.is_empty() {
                return Err(format!("no student names found in {}", file.display()).into());
            }
            let class = store.add_class(&name, students)?;
            finish(&mut store, &config);
            print_json(&class)?;
        }
        ClassAction::List => {
            print_json(&store.state().classes)?;
        }
        ClassAction::Remove { id } => {
            store.remove_class(&id)?;
            finish(&mut store, &config);
            println!("class {id} removed");
        }
    }
    Ok(())
}
