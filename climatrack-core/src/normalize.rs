use crate::date::DateStamp;
use crate::model::{DailyRecord, ParameterSeries, RawObservationSet};

/// Flatten the per-parameter series into one record per primary-series date.
///
/// Dates come out in ascending order. Values are passed through untouched,
/// sentinels included; a secondary parameter missing for a date becomes `None`.
pub fn normalize(raw: &RawObservationSet) -> Vec<DailyRecord> {
    raw.temperature
        .iter()
        .map(|(date, temperature)| DailyRecord {
            date: *date,
            temperature: *temperature,
            precipitation: value_at(raw.precipitation.as_ref(), date),
            wind_speed: value_at(raw.wind_speed.as_ref(), date),
        })
        .collect()
}

fn value_at(series: Option<&ParameterSeries>, date: &DateStamp) -> Option<f64> {
    series.and_then(|s| s.get(date).copied().flatten())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> DateStamp {
        DateStamp::from_ymd(2024, 6, d).unwrap()
    }

    #[test]
    fn missing_precipitation_entries_become_none() {
        let temperature: ParameterSeries =
            (10..15).map(|d| (day(d), Some(f64::from(d)))).collect();
        let precipitation: ParameterSeries =
            [10, 12, 14].into_iter().map(|d| (day(d), Some(0.5))).collect();

        let records = normalize(&RawObservationSet {
            temperature,
            precipitation: Some(precipitation),
            wind_speed: None,
        });

        assert_eq!(records.len(), 5);
        let missing: Vec<_> = records
            .iter()
            .filter(|r| r.precipitation.is_none())
            .map(|r| r.date)
            .collect();
        assert_eq!(missing, vec![day(11), day(13)]);
        assert!(records.iter().all(|r| r.wind_speed.is_none()));
    }

    #[test]
    fn records_are_chronological() {
        let temperature: ParameterSeries = [14, 10, 12]
            .into_iter()
            .map(|d| (day(d), Some(1.0)))
            .collect();

        let dates: Vec<_> = normalize(&RawObservationSet {
            temperature,
            ..Default::default()
        })
        .into_iter()
        .map(|r| r.date)
        .collect();

        assert_eq!(dates, vec![day(10), day(12), day(14)]);
    }

    #[test]
    fn sentinels_pass_through_unchanged() {
        let temperature: ParameterSeries = [(day(1), Some(-999.0))].into_iter().collect();
        let wind_speed: ParameterSeries = [(day(1), Some(-999.0))].into_iter().collect();

        let records = normalize(&RawObservationSet {
            temperature,
            precipitation: None,
            wind_speed: Some(wind_speed),
        });

        assert_eq!(
            records,
            vec![DailyRecord {
                date: day(1),
                temperature: Some(-999.0),
                precipitation: None,
                wind_speed: Some(-999.0),
            }]
        );
    }

    #[test]
    fn dates_outside_primary_series_are_ignored() {
        let temperature: ParameterSeries = [(day(1), Some(20.0))].into_iter().collect();
        let precipitation: ParameterSeries =
            [(day(1), Some(0.0)), (day(2), Some(3.0))].into_iter().collect();

        let records = normalize(&RawObservationSet {
            temperature,
            precipitation: Some(precipitation),
            wind_speed: None,
        });

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].precipitation, Some(0.0));
    }
}
