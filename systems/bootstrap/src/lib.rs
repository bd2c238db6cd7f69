#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure bootstrap system that prepares a fresh Alchemy session.

use alchemy_catalog::Registry;
use alchemy_core::{ring_positions, Command, PlayArea, SpawnOrigin};
use tracing::debug;

/// Produces the command batch that opens a session.
#[derive(Debug, Default)]
pub struct Bootstrap;

impl Bootstrap {
    /// Seeds discovery with every base element and places them on a ring
    /// around the centre of the play area.
    pub fn handle(&self, registry: &Registry, play_area: PlayArea, out: &mut Vec<Command>) {
        let base = registry.base_elements();
        debug!(count = base.len(), "bootstrapping base elements");

        out.push(Command::SeedDiscovery {
            elements: base.iter().map(|element| element.name().clone()).collect(),
        });

        let ring = ring_positions(play_area.center(), base.len());
        for (element, position) in base.into_iter().zip(ring) {
            out.push(Command::SpawnEntity {
                element: element.name().clone(),
                position,
                origin: SpawnOrigin::Base,
            });
        }
    }
}
