use orienteering_core::{race_stats, standings as leaderboard};

use super::{finish, open_store, print_json, CliResult};

pub fn standings() -> CliResult {
    let (store, _) = open_store()?;
    print_json(&leaderboard(store.state()))
}

pub fn stats() -> CliResult {
    let (store, _) = open_store()?;
    print_json(&race_stats(store.state()))
}

pub fn reset_scores() -> CliResult {
    let (mut store, config) = open_store()?;
    store.reset_race()?;
    finish(&mut store, &config);
    println!("race reset: all runs cleared, totals set to 0");
    Ok(())
}
