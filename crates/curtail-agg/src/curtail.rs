//! Per-interval curtailment energy.
//!
//! Effective capacity depends on the configured [`CurtailVariant`]; whether
//! the interval counts as restricted depends on the configured
//! [`RestrictionPolicy`]. Neither is ever inferred from which optional
//! column happens to be populated.

use curtail_core::{Hours, IntervalRecord, MegawattHours, Megawatts};
use curtail_io::{CurtailVariant, RestrictionPolicy};

/// Curtailed and generated energy for one interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntervalEnergy {
    pub curtailed: MegawattHours,
    pub generated: MegawattHours,
}

/// Compute one interval's energies.
///
/// Curtailed power is `max(0, capacity - generation)`, but curtailed energy
/// is forced to zero unless the record qualifies as restricted under the
/// policy. Generated energy is `max(0, capacity) x duration`. Both results
/// are finite and non-negative.
pub fn interval_energy(
    record: &IntervalRecord,
    variant: CurtailVariant,
    policy: &RestrictionPolicy,
) -> IntervalEnergy {
    let capacity = match variant {
        CurtailVariant::MinAvailabilityReference => record
            .availability
            .map(|availability| availability.min(record.reference))
            .unwrap_or(record.reference),
        CurtailVariant::ReferenceOnly => record.reference,
    };

    let restricted = match policy {
        RestrictionPolicy::Codes(accepted) => record
            .restriction_code
            .as_deref()
            .map(|code| accepted.contains(&code))
            .unwrap_or(false),
        RestrictionPolicy::LimitedMarker => record.limited.is_some(),
    };

    let curtailed_power = (capacity - record.generation).max(Megawatts(0.0));
    let curtailed = if restricted {
        curtailed_power * record.duration
    } else {
        MegawattHours(0.0)
    };
    let generated = capacity.max(Megawatts(0.0)) * record.duration;

    IntervalEnergy {
        curtailed: sanitize(curtailed),
        generated: sanitize(generated),
    }
}

fn sanitize(energy: MegawattHours) -> MegawattHours {
    if energy.is_finite() {
        energy.max(MegawattHours(0.0))
    } else {
        MegawattHours(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(
        generation: f64,
        reference: f64,
        availability: Option<f64>,
        restriction: Option<&str>,
        limited: Option<f64>,
    ) -> IntervalRecord {
        IntervalRecord {
            timestamp: NaiveDate::from_ymd_opt(2025, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            entity: "P".to_string(),
            restriction_code: restriction.map(str::to_string),
            generation: Megawatts(generation),
            reference: Megawatts(reference),
            availability: availability.map(Megawatts),
            limited: limited.map(Megawatts),
            duration: Hours(0.5),
        }
    }

    const CODES: RestrictionPolicy = RestrictionPolicy::Codes(&["CNF", "ENE", "REL"]);

    #[test]
    fn availability_caps_the_reference() {
        let energy = interval_energy(
            &record(4.0, 12.0, Some(10.0), Some("CNF"), None),
            CurtailVariant::MinAvailabilityReference,
            &CODES,
        );
        // capacity = min(10, 12) = 10; curtailed power = 6 MW over 0.5 h.
        assert_eq!(energy.curtailed, MegawattHours(3.0));
        assert_eq!(energy.generated, MegawattHours(5.0));
    }

    #[test]
    fn missing_availability_falls_back_to_reference() {
        let energy = interval_energy(
            &record(4.0, 12.0, None, Some("ENE"), None),
            CurtailVariant::MinAvailabilityReference,
            &CODES,
        );
        assert_eq!(energy.curtailed, MegawattHours(4.0));
        assert_eq!(energy.generated, MegawattHours(6.0));
    }

    #[test]
    fn unaccepted_code_forces_curtailment_to_zero() {
        let energy = interval_energy(
            &record(4.0, 12.0, Some(10.0), Some("OUT"), None),
            CurtailVariant::MinAvailabilityReference,
            &CODES,
        );
        assert_eq!(energy.curtailed, MegawattHours(0.0));
        // Generated energy is unaffected by the restriction gate.
        assert_eq!(energy.generated, MegawattHours(5.0));
    }

    #[test]
    fn missing_code_means_unrestricted() {
        let energy = interval_energy(
            &record(4.0, 12.0, None, None, None),
            CurtailVariant::MinAvailabilityReference,
            &CODES,
        );
        assert_eq!(energy.curtailed, MegawattHours(0.0));
    }

    #[test]
    fn limited_marker_variant_gates_on_presence() {
        let with_marker = interval_energy(
            &record(4.0, 12.0, None, None, Some(5.0)),
            CurtailVariant::ReferenceOnly,
            &RestrictionPolicy::LimitedMarker,
        );
        assert_eq!(with_marker.curtailed, MegawattHours(4.0));

        let without_marker = interval_energy(
            &record(4.0, 12.0, None, None, None),
            CurtailVariant::ReferenceOnly,
            &RestrictionPolicy::LimitedMarker,
        );
        assert_eq!(without_marker.curtailed, MegawattHours(0.0));
    }

    #[test]
    fn generation_above_capacity_clamps_to_zero_curtailment() {
        let energy = interval_energy(
            &record(15.0, 12.0, None, Some("REL"), None),
            CurtailVariant::MinAvailabilityReference,
            &CODES,
        );
        assert_eq!(energy.curtailed, MegawattHours(0.0));
    }

    #[test]
    fn negative_capacity_clamps_generated_energy() {
        let energy = interval_energy(
            &record(0.0, -3.0, None, Some("CNF"), None),
            CurtailVariant::MinAvailabilityReference,
            &CODES,
        );
        assert_eq!(energy.generated, MegawattHours(0.0));
        assert_eq!(energy.curtailed, MegawattHours(0.0));
    }
}
