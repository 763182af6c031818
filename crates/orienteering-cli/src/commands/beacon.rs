use clap::Subcommand;
use orienteering_core::{BeaconPatch, Level, NewBeacon, PunchCode};

use super::{finish, open_store, print_json, CliResult};

#[derive(Subcommand)]
pub enum BeaconAction {
    /// Add a beacon to the course
    Add {
        /// Number painted on the post
        code: String,
        /// Difficulty level (N1, N2, N3)
        #[arg(long, default_value = "N1")]
        level: Level,
        /// Points awarded; defaults to the level's value
        #[arg(long)]
        points: Option<u32>,
        /// 25-character punch pattern of 0/1
        #[arg(long)]
        punch: Option<String>,
        /// Distance from the start in meters
        #[arg(long, default_value = "0")]
        distance: f64,
    },
    /// List course beacons as JSON
    List,
    /// Edit a beacon
    Update {
        id: String,
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        level: Option<Level>,
        #[arg(long)]
        points: Option<u32>,
        #[arg(long)]
        punch: Option<String>,
        #[arg(long)]
        distance: Option<f64>,
    },
    /// Remove a beacon
    Remove { id: String },
    /// Print a beacon's punch grid
    Punch { id: String },
}

fn parse_punch(raw: Option<String>) -> Result<Option<PunchCode>, Box<dyn std::error::Error>> {
    Ok(raw.map(|p| PunchCode::parse(&p)).transpose()?)
}

pub fn run(action: BeaconAction) -> CliResult {
    let (mut store, config) = open_store()?;

    match action {
        BeaconAction::Add {
            code,
            level,
            points,
            punch,
            distance,
        } => {
            let beacon = store.add_beacon(NewBeacon {
                points,
                punch_code: parse_punch(punch)?.unwrap_or_default(),
                distance,
                ..NewBeacon::new(code, level)
            })?;
            finish(&mut store, &config);
            print_json(&beacon)?;
        }
        BeaconAction::List => {
            print_json(&store.state().beacons)?;
        }
        BeaconAction::Update {
            id,
            code,
            level,
            points,
            punch,
            distance,
        } => {
            let patch = BeaconPatch {
                code,
                level,
                points,
                punch_code: parse_punch(punch)?,
                distance,
            };
            let beacon = store.update_beacon(&id, patch)?;
            finish(&mut store, &config);
            print_json(&beacon)?;
        }
        BeaconAction::Remove { id } => {
            store.remove_beacon(&id)?;
            finish(&mut store, &config);
            println!("beacon {id} removed");
        }
        BeaconAction::Punch { id } => {
            let beacon = store
                .state()
                .beacon(&id)
                .ok_or_else(|| format!("beacon not found: {id}"))?;
            println!("{}", beacon.punch_code.render());
        }
    }
    Ok(())
}
