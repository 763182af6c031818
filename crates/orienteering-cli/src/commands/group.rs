use clap::Subcommand;
use orienteering_core::GroupSplit;
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::{finish, open_store, print_json, CliResult};

#[derive(Subcommand)]
pub enum GroupAction {
    /// Add a group
    Add {
        name: String,
        /// Member name (repeatable)
        #[arg(long = "member")]
        members: Vec<String>,
    },
    /// List groups as JSON
    List,
    /// Rename a group
    Rename { id: String, name: String },
    /// Remove a group and its unfinished runs
    Remove { id: String },
    /// Shuffle a saved class into new groups
    Generate {
        class_id: String,
        /// Number of groups to create
        #[arg(long, conflicts_with = "size", required_unless_present = "size")]
        count: Option<usize>,
        /// Students per group
        #[arg(long)]
        size: Option<usize>,
        /// Seed for a reproducible draw
        #[arg(long)]
        seed: Option<u64>,
    },
}

pub fn run(action: GroupAction) -> CliResult {
    let (mut store, config) = open_store()?;

    match action {
        GroupAction::Add { name, members } => {
            let group = store.add_group(&name, members)?;
            finish(&mut store, &config);
            print_json(&group)?;
        }
        GroupAction::List => {
            print_json(&store.state().groups)?;
        }
        GroupAction::Rename { id, name } => {
            store.rename_group(&id, &name)?;
            finish(&mut store, &config);
            println!("group {id} renamed");
        }
        GroupAction::Remove { id } => {
            store.remove_group(&id)?;
            finish(&mut store, &config);
            println!("group {id} removed");
        }
        GroupAction::Generate {
            class_id,
            count,
            size,
            seed,
        } => {
            let split = match (count, size) {
                (Some(n), _) => GroupSplit::Count(n),
                (None, Some(n)) => GroupSplit::Size(n),
                (None, None) => return Err("either --count or --size is required".into()),
            };
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let groups = store.create_groups_from_class(&class_id, split, &mut rng)?;
            finish(&mut store, &config);
            print_json(&groups)?;
        }
    }
    Ok(())
}
