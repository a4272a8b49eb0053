use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::{
    attestation::AttestationRecord,
    config::SlasherConfig,
    detection::{DetectionKind, DetectionResult, dedup_results},
    errors::{PreconditionViolation, SlasherError, StorageError},
    locks::ValidatorLocks,
    span::Span,
    span_table::{EpochSpanTable, SpanStore},
};

/// Min-max span surround and double vote detector.
///
/// For a validator, `min_span[e]` holds the smallest `t' - e` over recorded attestations
/// `(s', t')` with `s' > e`, and `max_span[e]` the largest `t' - e` over those with
/// `s' < e < t'`. A new attestation `(s, t)` surrounds a recorded one exactly when
/// `min_span[s] < t - s`, and is surrounded by one exactly when `max_span[s] > t - s`.
#[derive(Debug)]
pub struct SpanDetector<S> {
    table: EpochSpanTable<S>,
    config: SlasherConfig,
    locks: ValidatorLocks,
}

impl<S: SpanStore> SpanDetector<S> {
    pub fn new(store: S, config: SlasherConfig) -> Result<Self, SlasherError> {
        config.validate()?;
        Ok(Self {
            table: EpochSpanTable::new(store),
            config,
            locks: ValidatorLocks::default(),
        })
    }

    pub fn config(&self) -> &SlasherConfig {
        &self.config
    }

    pub fn span_table(&self) -> &EpochSpanTable<S> {
        &self.table
    }

    /// Drops the locks of validators with no attestation in flight.
    pub fn prune_idle_locks(&self) {
        self.locks.prune_idle();
    }

    /// Checks `attestation` against the validator's spans, then records it.
    ///
    /// Returns every offense found, deduplicated by key. Spans are updated whether or not an
    /// offense was found, in a single atomic batch. On error nothing has been written.
    pub fn process_attestation(
        &self,
        attestation: &AttestationRecord,
    ) -> Result<Vec<DetectionResult>, SlasherError> {
        self.check_preconditions(attestation)?;

        self.locks.with_lock(attestation.validator_index, || -> Result<_, SlasherError> {
            let results = self.detect(attestation)?;
            let updates = self.stage_updates(attestation)?;
            self.table.put_batch(attestation.validator_index, &updates)?;

            debug!(
                validator_index = attestation.validator_index,
                source_epoch = attestation.source_epoch,
                target_epoch = attestation.target_epoch,
                span_writes = updates.len(),
                offenses = results.len(),
                "Processed attestation"
            );
            Ok(results)
        })
    }

    /// Detection only; the validator's spans are left untouched.
    pub fn detect_slashings(
        &self,
        attestation: &AttestationRecord,
    ) -> Result<Vec<DetectionResult>, SlasherError> {
        self.check_preconditions(attestation)?;

        self.locks
            .with_lock(attestation.validator_index, || self.detect(attestation))
    }

    /// Records `attestation` in the validator's spans without reporting offenses.
    pub fn update_spans(&self, attestation: &AttestationRecord) -> Result<(), SlasherError> {
        self.check_preconditions(attestation)?;

        self.locks.with_lock(attestation.validator_index, || -> Result<_, SlasherError> {
            let updates = self.stage_updates(attestation)?;
            self.table.put_batch(attestation.validator_index, &updates)?;
            Ok(())
        })
    }

    fn check_preconditions(&self, attestation: &AttestationRecord) -> Result<(), SlasherError> {
        if attestation.source_epoch >= attestation.target_epoch {
            return Err(PreconditionViolation::SourceNotBeforeTarget {
                source_epoch: attestation.source_epoch,
                target_epoch: attestation.target_epoch,
            }
            .into());
        }

        let distance = attestation.distance();
        if distance > u64::from(self.config.history_window) {
            return Err(PreconditionViolation::DistanceExceedsWindow {
                distance,
                history_window: self.config.history_window,
            }
            .into());
        }

        Ok(())
    }

    fn detect(
        &self,
        attestation: &AttestationRecord,
    ) -> Result<Vec<DetectionResult>, SlasherError> {
        let AttestationRecord {
            validator_index,
            source_epoch,
            target_epoch,
            sig_fingerprint,
        } = *attestation;
        // Bounded by the history window, which is a u16.
        let distance = attestation.distance() as u16;

        let offense = |kind| DetectionResult {
            validator_index,
            slashable_epoch: target_epoch,
            kind,
            sig_fingerprint,
        };
        let mut results = vec![];

        let target_span = self.table.get(validator_index, target_epoch)?;
        if target_span.has_attested() && target_span.sig_fingerprint != sig_fingerprint {
            warn!(
                validator_index,
                target_epoch,
                recorded = %target_span.sig_fingerprint,
                incoming = %sig_fingerprint,
                "Double vote detected"
            );
            results.push(offense(DetectionKind::DoubleVote));
        }

        let source_span = self.table.get(validator_index, source_epoch)?;
        if source_span.min_span != 0 && source_span.min_span < distance {
            warn!(
                validator_index,
                source_epoch,
                target_epoch,
                surrounded_target = source_epoch + u64::from(source_span.min_span),
                "Surround vote detected, attestation surrounds a recorded one"
            );
            results.push(offense(DetectionKind::SurroundVote));
        }
        if source_span.max_span > distance {
            warn!(
                validator_index,
                source_epoch,
                target_epoch,
                surrounding_target = source_epoch + u64::from(source_span.max_span),
                "Surround vote detected, attestation is surrounded by a recorded one"
            );
            results.push(offense(DetectionKind::SurroundVote));
        }

        Ok(dedup_results(results))
    }

    /// Computes every span that changes once `attestation` is recorded. Spans already at their
    /// settled value are left out.
    fn stage_updates(
        &self,
        attestation: &AttestationRecord,
    ) -> Result<BTreeMap<u64, Span>, StorageError> {
        let AttestationRecord {
            validator_index,
            source_epoch,
            target_epoch,
            sig_fingerprint,
        } = *attestation;
        let mut updates = BTreeMap::new();

        // Stepping back one epoch raises a min span by at most one. Once an epoch already holds
        // a value no larger than ours, every earlier epoch does too.
        let lowest_epoch = target_epoch.saturating_sub(u64::from(self.config.history_window));
        for epoch in (lowest_epoch..source_epoch).rev() {
            let new_min_span = (target_epoch - epoch) as u16;
            let mut span = self.table.get(validator_index, epoch)?;
            if span.min_span != 0 && span.min_span <= new_min_span {
                break;
            }
            span.min_span = new_min_span;
            updates.insert(epoch, span);
        }

        // Likewise for max spans going forward.
        for epoch in source_epoch + 1..target_epoch {
            let new_max_span = (target_epoch - epoch) as u16;
            let mut span = self.table.get(validator_index, epoch)?;
            if span.max_span >= new_max_span {
                break;
            }
            span.max_span = new_max_span;
            updates.insert(epoch, span);
        }

        let mut target_span = self.table.get(validator_index, target_epoch)?;
        let recorded = target_span;
        target_span.mark_attested(sig_fingerprint);
        if target_span != recorded {
            updates.insert(target_epoch, target_span);
        }

        Ok(updates)
    }
}
