use crate::candidate::{CandidateStore, LinkCandidate, LinkCandidateBuilder, LinkCandidates, PendingStop};
use crate::config::ManualCandidates;
use crate::diagnostics::Counter;
use crate::network::{LinkIx, Network};

use std::sync::Arc;

impl LinkCandidateBuilder {
    /// Resolves the links of a manual candidate set,
    /// skipping those the network does not hold.
    fn resolve(&self, network: &Network, manual: &ManualCandidates) -> Vec<LinkIx> {
        manual
            .link_ids
            .iter()
            .filter_map(|id| {
                let link = network.link_ix(id);
                if link.is_none() {
                    self.diagnostics.increment(Counter::OverridesSkipped);
                    self.diagnostics.warn(format!(
                        "Manual candidate link {id} of stop facility {} does not exist, skipping",
                        manual.facility_id
                    ));
                }
                link
            })
            .collect()
    }

    /// Merges the configured manual candidates into the store.
    ///
    /// Manual candidates score `1`. A manual candidate further from its
    /// stop than the maximum candidate distance is kept regardless.
    pub(crate) fn apply_overrides(
        &self,
        network: &Network,
        pending: &[PendingStop],
        store: &mut CandidateStore,
    ) {
        for manual in &self.config.manual_candidates {
            let links = self.resolve(network, manual);

            let served = pending.iter().filter(|stop| {
                manual.applies_to(&stop.occurrence.facility().id, &stop.schedule_mode)
            });

            for stop in served {
                let candidates = links
                    .iter()
                    .map(|link| {
                        let candidate = LinkCandidate::new(network, *link, &stop.occurrence, stop.position)
                            .with_priority(1.0);

                        if candidate.distance() > stop.params.max_candidate_distance {
                            self.diagnostics.increment(Counter::OverridesOverDistance);
                            self.diagnostics.warn(format!(
                                "Manual candidate link {} is {:.1} away from stop facility {}, \
                                beyond the maximum of {:.1}",
                                network.link(*link).id,
                                candidate.distance(),
                                manual.facility_id,
                                stop.params.max_candidate_distance
                            ));
                        }

                        candidate
                    })
                    .collect::<Vec<_>>();

                if manual.replace && candidates.is_empty() {
                    self.diagnostics.warn(format!(
                        "Manual candidates of stop facility {} resolved to no link, keeping the computed candidates",
                        manual.facility_id
                    ));
                    continue;
                }

                let key = stop.occurrence.key();
                let existing = store.take(key).unwrap_or_default();
                store.insert(Arc::clone(key), existing.merge(candidates, manual.replace));
            }
        }
    }
}
