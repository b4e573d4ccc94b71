//! Monthly aggregation.
//!
//! Interval energies are summed into one row per (period, entity[,
//! restriction code]), keeping the latest timestamp seen in each group. The
//! ratio is division-safe: `None` whenever generated energy is not strictly
//! positive. A company-level view re-aggregates entity rows through an
//! injected lookup.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use curtail_core::{
    safe_ratio, IntervalRecord, MegawattHours, MonthlyAggregate, Period,
};
use curtail_io::{CurtailVariant, RestrictionPolicy};

use crate::curtail::interval_energy;

#[derive(Default)]
struct GroupTotals {
    curtailed: MegawattHours,
    generated: MegawattHours,
    last_timestamp: Option<NaiveDateTime>,
}

/// Aggregate interval records into monthly rows, sorted by (period, entity,
/// restriction code).
pub fn aggregate_monthly(
    records: &[IntervalRecord],
    variant: CurtailVariant,
    policy: &RestrictionPolicy,
) -> Vec<MonthlyAggregate> {
    let mut groups: BTreeMap<(Period, String, Option<String>), GroupTotals> = BTreeMap::new();

    for record in records {
        let energy = interval_energy(record, variant, policy);
        let key = (
            Period::from_timestamp(record.timestamp),
            record.entity.clone(),
            record.restriction_code.clone(),
        );
        let totals = groups.entry(key).or_default();
        totals.curtailed = totals.curtailed + energy.curtailed;
        totals.generated = totals.generated + energy.generated;
        totals.last_timestamp = match totals.last_timestamp {
            Some(seen) => Some(seen.max(record.timestamp)),
            None => Some(record.timestamp),
        };
    }

    groups
        .into_iter()
        .map(|((period, entity, restriction_code), totals)| MonthlyAggregate {
            period,
            entity,
            restriction_code,
            curtailed_mwh: totals.curtailed.value(),
            generated_mwh: totals.generated.value(),
            ratio: safe_ratio(totals.curtailed, totals.generated),
            last_timestamp: totals
                .last_timestamp
                .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string()),
        })
        .collect()
}

/// Re-aggregate entity rows into a company-level view.
///
/// The lookup maps an entity id to its company id (identity for unmapped
/// entities). The restriction dimension is dropped; rows mapping to an empty
/// company id are excluded from the output.
pub fn company_view<F>(rows: &[MonthlyAggregate], lookup: F) -> Vec<MonthlyAggregate>
where
    F: Fn(&str) -> String,
{
    let mut groups: BTreeMap<(Period, String), GroupTotals> = BTreeMap::new();

    for row in rows {
        let company = lookup(&row.entity).trim().to_string();
        if company.is_empty() {
            continue;
        }
        let totals = groups.entry((row.period, company)).or_default();
        totals.curtailed = totals.curtailed + MegawattHours(row.curtailed_mwh);
        totals.generated = totals.generated + MegawattHours(row.generated_mwh);
        if let Some(ts) = row
            .last_timestamp
            .as_deref()
            .and_then(|s| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").ok())
        {
            totals.last_timestamp = Some(match totals.last_timestamp {
                Some(seen) => seen.max(ts),
                None => ts,
            });
        }
    }

    groups
        .into_iter()
        .map(|((period, company), totals)| MonthlyAggregate {
            period,
            entity: company,
            restriction_code: None,
            curtailed_mwh: totals.curtailed.value(),
            generated_mwh: totals.generated.value(),
            ratio: safe_ratio(totals.curtailed, totals.generated),
            last_timestamp: totals
                .last_timestamp
                .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use curtail_core::{Hours, Megawatts};

    const CODES: RestrictionPolicy = RestrictionPolicy::Codes(&["CNF", "ENE", "REL"]);

    fn record(day: u32, minute: u32, entity: &str, generation: f64, reference: f64) -> IntervalRecord {
        IntervalRecord {
            timestamp: NaiveDate::from_ymd_opt(2025, 1, day)
                .unwrap()
                .and_hms_opt(minute / 60, minute % 60, 0)
                .unwrap(),
            entity: entity.to_string(),
            restriction_code: Some("CNF".to_string()),
            generation: Megawatts(generation),
            reference: Megawatts(reference),
            availability: None,
            limited: None,
            duration: Hours(0.5),
        }
    }

    #[test]
    fn sums_energies_and_keeps_latest_timestamp() {
        let records = vec![
            record(1, 0, "P", 4.0, 12.0),
            record(1, 30, "P", 8.0, 12.0),
            record(2, 0, "P", 12.0, 12.0),
        ];
        let rows = aggregate_monthly(&records, CurtailVariant::MinAvailabilityReference, &CODES);
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        // Curtailed: (8 + 4 + 0) MW x 0.5 h; generated: 12 x 0.5 x 3.
        assert!((row.curtailed_mwh - 6.0).abs() < 1e-9);
        assert!((row.generated_mwh - 18.0).abs() < 1e-9);
        assert_eq!(row.last_timestamp.as_deref(), Some("2025-01-02 00:00:00"));
    }

    #[test]
    fn per_row_energies_sum_to_the_group_aggregate() {
        let records: Vec<IntervalRecord> = (0..48)
            .map(|i| record(1, i * 30 % (24 * 60), "P", (i % 7) as f64, 10.0))
            .collect();
        let per_row: f64 = records
            .iter()
            .map(|r| {
                interval_energy(r, CurtailVariant::MinAvailabilityReference, &CODES)
                    .curtailed
                    .value()
            })
            .sum();
        let rows = aggregate_monthly(&records, CurtailVariant::MinAvailabilityReference, &CODES);
        let total: f64 = rows.iter().map(|r| r.curtailed_mwh).sum();
        assert!((per_row - total).abs() < 1e-9);
    }

    #[test]
    fn ratio_is_null_when_nothing_generated() {
        let mut rec = record(1, 0, "P", 0.0, 0.0);
        rec.restriction_code = Some("CNF".to_string());
        let rows = aggregate_monthly(&[rec], CurtailVariant::MinAvailabilityReference, &CODES);
        assert_eq!(rows[0].generated_mwh, 0.0);
        assert_eq!(rows[0].ratio, None);
    }

    #[test]
    fn restriction_code_is_a_separate_dimension() {
        let mut a = record(1, 0, "P", 4.0, 12.0);
        let mut b = record(1, 30, "P", 4.0, 12.0);
        a.restriction_code = Some("CNF".to_string());
        b.restriction_code = Some("ENE".to_string());
        let rows = aggregate_monthly(&[a, b], CurtailVariant::MinAvailabilityReference, &CODES);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn company_view_merges_entities_and_drops_restriction() {
        let records = vec![
            record(1, 0, "PARQUE A", 4.0, 12.0),
            record(1, 0, "PARQUE B", 4.0, 12.0),
        ];
        let rows = aggregate_monthly(&records, CurtailVariant::MinAvailabilityReference, &CODES);
        let companies = company_view(&rows, |entity| {
            if entity.starts_with("PARQUE") {
                "ACME".to_string()
            } else {
                entity.to_string()
            }
        });
        assert_eq!(companies.len(), 1);
        assert_eq!(companies[0].entity, "ACME");
        assert_eq!(companies[0].restriction_code, None);
        assert!((companies[0].curtailed_mwh - 8.0).abs() < 1e-9);
    }

    #[test]
    fn company_view_excludes_empty_identifiers() {
        let rows = aggregate_monthly(
            &[record(1, 0, "DISCARD", 4.0, 12.0)],
            CurtailVariant::MinAvailabilityReference,
            &CODES,
        );
        let companies = company_view(&rows, |_| String::new());
        assert!(companies.is_empty());
    }
}
