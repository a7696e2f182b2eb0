//! Map loading with procgen regions: cached composites are reused until the
//! hosting map's reset status is set, otherwise the region is regenerated.

use tracing::{info, warn};

use crate::map::{Map, ProcgenTrigger};
use crate::map_file::{MapFileError, MapSource};
use crate::rules::RulesConfig;

use super::cache::GenerationCache;
use super::generator::{GeneratedRegion, RegionGenerator};
use super::library::ChunkLibrary;
use super::rng::GenRng;

/// Campaign status store, consulted for the regeneration flag.
pub trait CampaignStatus {
    fn is_set(&self, status: &str) -> bool;

    /// Makes `status` known to the campaign without setting it.
    fn register(&mut self, status: &str);
}

pub struct ProcgenLoader<S> {
    source: S,
    cache: GenerationCache,
}

impl<S: MapSource> ProcgenLoader<S> {
    pub fn new(source: S, cache: GenerationCache) -> Self {
        Self { source, cache }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn cache(&self) -> &GenerationCache {
        &self.cache
    }

    /// Loads map `name`. Maps without a procgen trigger come back as read;
    /// maps with one are replaced by their cached or freshly generated region.
    pub fn load(
        &self,
        name: &str,
        campaign: &mut dyn CampaignStatus,
        rng: &mut GenRng,
    ) -> Result<Map, MapFileError> {
        let host = self.source.load_map(name)?;
        let Some(trigger) = host.procgen_trigger() else {
            return Ok(host);
        };

        if let Some(status) = &host.procgen_reset_status {
            campaign.register(status);
        }
        let reset =
            host.procgen_reset_status.as_deref().is_some_and(|status| campaign.is_set(status));

        if !reset && let Some(cached) = self.cache.load(name) {
            return Ok(cached);
        }

        let mut region = self.generate_for(&host, &trigger, rng);
        region.map.force_spawn_pos = true;
        if let Err(err) = self.cache.store(name, &region.map) {
            warn!(map = %name, error = %err, "could not write procgen cache");
        }
        Ok(region.map)
    }

    /// Runs a generation pass for `trigger`, carrying the host's header over.
    pub fn generate_for(
        &self,
        host: &Map,
        trigger: &ProcgenTrigger,
        rng: &mut GenRng,
    ) -> GeneratedRegion {
        let rules = match self.source.load_rules(&trigger.rules_file) {
            Ok(rules) => rules,
            Err(err) => {
                warn!(
                    rules = %trigger.rules_file,
                    error = %err,
                    "could not load procgen rules; using defaults"
                );
                RulesConfig::default()
            }
        };

        let library = ChunkLibrary::load(&self.source, &rules);
        let mut region = RegionGenerator::new(&library, &rules).generate(trigger.area, rng);

        region.map.title.clone_from(&host.title);
        region.map.tileset.clone_from(&host.tileset);
        region.map.music.clone_from(&host.music);
        region.map.ensure_collision_layer();

        info!(
            rules = %trigger.rules_file,
            width = region.map.width,
            height = region.map.height,
            "regenerated procgen map"
        );
        region
    }
}
