//! Splitting one DMI into many RSI bundles
//!
//! States are grouped purely by name. Each [`GroupingMode`] decides how a
//! state name turns into a group key, which states belong to a key, and
//! whether the group is copied as-is or rebuilt from pieces of its states.
//!
//! | Mode | Key | Members | Output |
//! |------|-----|---------|--------|
//! | `auto` | first `-` token, and name without digits | prefix | copy |
//! | `prefix` | first `-` token | prefix | copy |
//! | `state` | full name | exact | copy |
//! | `wall` | name without digits | prefix | smoothing tile set |
//! | `helmet`, `gloves`, `shoes`, `suit` | first `-` token | prefix | worn item |
//! | `magazine`, `ammo-box`, `firearm` | name without trailing index | same key | numbered sequence |

mod equip;
mod sequence;
mod tile;

pub use equip::{EquipKind, EQUIP_STATES};
pub use sequence::{ammo_index, SequenceKind, HAND_ASSETS};
pub use tile::{cornerize, Quadrant};

use std::collections::BTreeSet;

use clap::ValueEnum;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::assets::{AssetProvider, NoAssets};
use crate::dmi::{Dmi, DmiState};
use crate::error::Result;
use crate::output::bundle_name;
use crate::rsi::{Rsi, RsiState, DEFAULT_LICENSE};

/// Strategy used to partition a sheet's states into bundles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum GroupingMode {
    /// Prefix and digit-stripped groups together, copied as-is
    #[default]
    Auto,
    /// Group by the name up to the first `-`
    Prefix,
    /// One bundle per state
    State,
    /// Smoothing wall/window tiles rebuilt from corner pieces
    Wall,
    /// Worn head item
    Helmet,
    /// Worn hand item
    Gloves,
    /// Worn foot item
    Shoes,
    /// Worn outer clothing
    Suit,
    /// Magazine fill levels
    Magazine,
    /// Ammo box fill levels
    AmmoBox,
    /// Firearm fill levels plus held sprites
    Firearm,
}

/// How a mode turns its member states into bundle states.
enum Synthesis {
    Copy,
    Tile,
    Equip(EquipKind),
    Sequence(SequenceKind),
}

impl GroupingMode {
    fn synthesis(self) -> Synthesis {
        match self {
            GroupingMode::Auto | GroupingMode::Prefix | GroupingMode::State => Synthesis::Copy,
            GroupingMode::Wall => Synthesis::Tile,
            GroupingMode::Helmet => Synthesis::Equip(EquipKind::Helmet),
            GroupingMode::Gloves => Synthesis::Equip(EquipKind::Gloves),
            GroupingMode::Shoes => Synthesis::Equip(EquipKind::Shoes),
            GroupingMode::Suit => Synthesis::Equip(EquipKind::Suit),
            GroupingMode::Magazine => Synthesis::Sequence(SequenceKind::Magazine),
            GroupingMode::AmmoBox => Synthesis::Sequence(SequenceKind::AmmoBox),
            GroupingMode::Firearm => Synthesis::Sequence(SequenceKind::Firearm),
        }
    }

    /// Group keys a state name contributes. Empty keys are dropped by the caller.
    pub fn keys(self, name: &str) -> Vec<String> {
        match self {
            GroupingMode::Auto => vec![first_token(name).to_string(), strip_numbers(name)],
            GroupingMode::Prefix
            | GroupingMode::Helmet
            | GroupingMode::Gloves
            | GroupingMode::Shoes
            | GroupingMode::Suit => vec![first_token(name).to_string()],
            GroupingMode::State => vec![name.to_string()],
            GroupingMode::Wall => vec![strip_numbers(name)],
            GroupingMode::Magazine | GroupingMode::AmmoBox | GroupingMode::Firearm => {
                vec![sequence_key(name).to_string()]
            }
        }
    }

    /// Whether the state called `name` belongs to the group `key`.
    pub fn is_member(self, key: &str, name: &str) -> bool {
        match self {
            GroupingMode::State => name == key,
            GroupingMode::Magazine | GroupingMode::AmmoBox | GroupingMode::Firearm => {
                sequence_key(name) == key
            }
            _ => name.starts_with(key),
        }
    }
}

impl std::fmt::Display for GroupingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = self.to_possible_value().map(|v| v.get_name().to_string()).unwrap_or_default();
        write!(f, "{}", name)
    }
}

/// Name up to the first `-`.
pub fn first_token(name: &str) -> &str {
    name.split('-').next().unwrap_or_default()
}

/// Name with every digit and `-` removed.
pub fn strip_numbers(name: &str) -> String {
    name.chars().filter(|c| !c.is_ascii_digit() && *c != '-').collect()
}

/// Name with its trailing index and separators removed (`rifle-10` -> `rifle`).
pub fn sequence_key(name: &str) -> &str {
    name.trim_end_matches(|c: char| c.is_ascii_digit() || c == '-' || c == '_')
}

/// Caller-supplied settings for [`split`].
pub struct SplitOptions<'a> {
    pub copyright: Option<String>,
    pub license: String,
    /// Companion sheet with small inventory icons, matched by state name
    pub icons: Option<&'a Dmi>,
    /// Fixed reference images (held firearm sprites)
    pub assets: &'a dyn AssetProvider,
}

impl Default for SplitOptions<'_> {
    fn default() -> Self {
        Self { copyright: None, license: DEFAULT_LICENSE.to_string(), icons: None, assets: &NoAssets }
    }
}

/// One output bundle of a split.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitBundle {
    /// Normalized group key; the bundle is written as `<name>.rsi`
    pub name: String,
    pub rsi: Rsi,
}

fn copy_states(members: &[&DmiState]) -> Vec<RsiState> {
    members
        .iter()
        .map(|s| {
            RsiState::new(s.name.clone(), s.image.clone())
                .with_directions(s.dirs)
                .with_delays(s.delay.clone())
        })
        .collect()
}

fn build_group(
    dmi: &Dmi,
    mode: GroupingMode,
    key: &str,
    members: &[&DmiState],
    options: &SplitOptions<'_>,
) -> Result<Option<Vec<RsiState>>> {
    let cell = dmi.cell_size();
    match mode.synthesis() {
        Synthesis::Copy => Ok(Some(copy_states(members))),
        Synthesis::Tile => tile::synthesize(key, members, cell),
        Synthesis::Equip(kind) => equip::synthesize(kind, key, members, cell, options.icons),
        Synthesis::Sequence(kind) => sequence::synthesize(kind, key, members, options.assets),
    }
}

/// Split a sheet into bundles, one per surviving group, in key order.
///
/// Groups a mode cannot build (missing source states, too few directions)
/// are left out with a warning; only real failures are errors. Keys that
/// normalize to the same bundle name are merged, first state name wins.
pub fn split(dmi: &Dmi, mode: GroupingMode, options: &SplitOptions<'_>) -> Result<Vec<SplitBundle>> {
    let keys: BTreeSet<String> = dmi
        .states
        .iter()
        .flat_map(|s| mode.keys(&s.name))
        .filter(|k| !k.is_empty())
        .collect();
    debug!("Mode {} found {} groups", mode, keys.len());

    let mut bundles: Vec<SplitBundle> = Vec::new();
    for key in &keys {
        let members: Vec<&DmiState> =
            dmi.states.iter().filter(|s| mode.is_member(key, &s.name)).collect();

        let states = match build_group(dmi, mode, key, &members, options)? {
            Some(states) if !states.is_empty() => states,
            _ => {
                warn!("Skipping group '{}': no states could be built in {} mode", key, mode);
                continue;
            }
        };

        let name = bundle_name(key);
        if let Some(existing) = bundles.iter_mut().find(|b| b.name == name) {
            for state in states {
                let duplicate = state.name.clone().filter(|n| existing.rsi.state(n).is_some());
                match duplicate {
                    Some(duplicate) => warn!(
                        "Dropping state '{}' of group '{}': bundle '{}' already has it",
                        duplicate, key, name
                    ),
                    None => existing.rsi.push_state(state),
                }
            }
            continue;
        }

        let mut rsi = Rsi::new(dmi.cell_size())
            .with_license(options.license.clone())
            .with_copyright(options.copyright.clone());
        for state in states {
            rsi.push_state(state);
        }
        debug!("Group '{}' -> {} ({} states)", key, name, rsi.states.len());
        bundles.push(SplitBundle { name, rsi });
    }

    Ok(bundles)
}
