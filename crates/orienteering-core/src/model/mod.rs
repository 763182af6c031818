//! Race data model: beacons, groups, classes, runs and the document holding them.

mod beacon;
mod group;
mod run;
mod state;

pub use beacon::{Beacon, BeaconPatch, Level, PunchCode, PUNCH_CELLS};
pub use group::{ClassRoom, Group};
pub use run::{Run, RunKind, RunMode, RunStatus};
pub use state::GameState;

use serde::{Deserialize, Deserializer};

/// Read an explicit `null` as the type's default. Pair with `#[serde(default)]`
/// so an absent field behaves the same way.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
