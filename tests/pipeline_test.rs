//! End-to-end properties of the monitoring pipeline

use chrono::{Duration, NaiveDate, NaiveDateTime};
use condensate_monitor::config::PipelineConfig;
use condensate_monitor::core::{
    forecast_all, normalize_records, resample, run_from_source, run_pipeline, scan_breaches,
    Channel, Forecast, IndeterminateReason,
};
use condensate_monitor::source::{FileSource, RawRecord, StaticSource};
use condensate_monitor::PipelineError;
use serde_json::{json, Value};

fn base() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 5)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap()
}

/// Format a timestamp the way the sheet does: day-first.
fn sheet_time(t: NaiveDateTime) -> String {
    t.format("%d/%m/%Y %H:%M:%S").to_string()
}

fn row(time: Value, t1: Value, t2: Value, t3: Value) -> RawRecord {
    match json!({"FechaHora": time, "Temp 1": t1, "Temp 2": t2, "Temp3": t3}) {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}

fn numeric_rows(readings: &[(i64, [f64; 3])]) -> Vec<RawRecord> {
    readings
        .iter()
        .map(|&(minute, [a, b, c])| {
            row(
                json!(sheet_time(base() + Duration::minutes(minute))),
                json!(a),
                json!(b),
                json!(c),
            )
        })
        .collect()
}

#[test]
fn test_cleaning_keeps_exactly_the_valid_rows() {
    let config = PipelineConfig::default();
    let records = vec![
        row(json!("05/03/2024 10:00"), json!(70), json!("71"), json!(72.5)),
        row(json!("05/03/2024 10:05"), json!("n/a"), json!(70), json!(70)),
        row(json!("31/04/2024 10:05"), json!(70), json!(70), json!(70)),
        row(json!(""), json!(70), json!(70), json!(70)),
        row(json!("05/03/2024 10:10"), json!(70), json!(Value::Null), json!(70)),
        row(json!("05/03/2024 10:15"), json!(70), json!(70), json!("Infinity")),
        row(json!("04/03/2024 23:55"), json!("69.5"), json!(70), json!(70)),
    ];

    let (series, stats) = normalize_records(&records, &config);

    assert_eq!(series.len(), 2);
    assert_eq!(stats.rows_received, 7);
    assert_eq!(stats.rows_kept, 2);
    assert_eq!(stats.rows_dropped(), 5);
    // Day-first: 04/03 is March 4th and sorts before March 5th
    assert_eq!(series.as_slice()[0].reading(Channel::One), 69.5);
    assert!(series.iter().all(|o| o.readings.iter().all(|r| r.is_finite())));
}

#[test]
fn test_series_is_time_ordered() {
    let config = PipelineConfig::default();
    let records = numeric_rows(&[
        (30, [1.0, 0.0, 0.0]),
        (0, [2.0, 0.0, 0.0]),
        (15, [3.0, 0.0, 0.0]),
        (15, [4.0, 0.0, 0.0]),
        (5, [5.0, 0.0, 0.0]),
    ]);

    let (series, _) = normalize_records(&records, &config);

    let times: Vec<NaiveDateTime> = series.iter().map(|o| o.timestamp).collect();
    assert!(times.windows(2).all(|w| w[0] <= w[1]));

    // Ties keep source order
    let firsts: Vec<f64> = series.iter().map(|o| o.reading(Channel::One)).collect();
    assert_eq!(firsts, vec![2.0, 5.0, 3.0, 4.0, 1.0]);
}

#[test]
fn test_resample_window_of_oscillating_readings() {
    let config = PipelineConfig::default();
    let readings: Vec<(i64, [f64; 3])> = (0..25)
        .map(|i| {
            let t1 = if i % 2 == 0 { 70.0 } else { 74.0 };
            (5 * i, [t1, 60.0, 60.0])
        })
        .collect();
    let (series, _) = normalize_records(&numeric_rows(&readings), &config);

    let window = resample(&series, config.bucket_span(), config.window_size);

    assert_eq!(window.len(), 10);
    for pair in window.points.windows(2) {
        assert_eq!(pair[1].bucket_start - pair[0].bucket_start, Duration::minutes(10));
    }
    for point in window.iter() {
        assert!(point.observation.timestamp >= point.bucket_start);
        assert!(point.observation.timestamp < point.bucket_start + Duration::minutes(10));
    }
    // 25 samples span 13 buckets; the last bucket holds only minute 120
    let last = window.points.last().unwrap();
    assert_eq!(last.bucket_start, base() + Duration::minutes(120));
    assert_eq!(last.observation.timestamp, base() + Duration::minutes(120));
    // Earlier buckets keep their later sample (the :x5 minute)
    let first = window.points[0];
    assert_eq!(first.bucket_start, base() + Duration::minutes(30));
    assert_eq!(first.observation.timestamp, base() + Duration::minutes(35));
    assert_eq!(first.observation.reading(Channel::One), 74.0);
}

#[test]
fn test_breach_scan_properties() {
    let config = PipelineConfig::default();
    let readings: Vec<(i64, [f64; 3])> = (0..30)
        .map(|i| {
            let r = match i % 3 {
                0 => [80.0, 80.0, 80.0],
                1 => [70.0, 70.0, 80.01],
                _ => [90.0, 60.0, 60.0],
            };
            (i, r)
        })
        .collect();
    let (series, _) = normalize_records(&numeric_rows(&readings), &config);

    let breaches = scan_breaches(&series, config.breach_threshold, config.breach_limit);

    assert_eq!(breaches.len(), 10);
    assert!(breaches.iter().all(|o| o.exceeds(80.0)));
    assert!(breaches.iter().all(|o| o.readings != [80.0, 80.0, 80.0]));
    assert!(breaches.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    assert_eq!(breaches[0].timestamp, base() + Duration::minutes(29));
}

#[test]
fn test_small_example_has_no_breaches_and_flat_channel_is_indeterminate() {
    let config = PipelineConfig::default();
    let records = numeric_rows(&[
        (0, [70.0, 70.0, 70.0]),
        (5, [75.0, 68.0, 70.0]),
        (10, [72.0, 80.0, 70.0]),
    ]);
    let (series, _) = normalize_records(&records, &config);

    assert!(scan_breaches(&series, 80.0, 10).is_empty());

    let forecasts = forecast_all(&series, config.bucket_span());
    assert_eq!(
        forecasts[2].forecast,
        Forecast::Indeterminate {
            reason: IndeterminateReason::SingleClass
        }
    );
}

#[test]
fn test_strictly_increasing_channel_is_indeterminate() {
    let config = PipelineConfig::default();
    let readings: Vec<(i64, [f64; 3])> = (0..20)
        .map(|i| {
            let wobble = if i % 2 == 0 { 65.0 } else { 67.0 };
            (5 * i, [60.0 + i as f64, wobble, 70.0 - wobble / 10.0])
        })
        .collect();

    let report = run_pipeline(&numeric_rows(&readings), &config);

    assert_eq!(report.forecasts[0].forecast_text, "Cannot predict");
    assert_eq!(report.forecasts[0].effective_at_text, "---");
    assert_ne!(report.forecasts[1].forecast_text, "Cannot predict");
    assert_eq!(
        report.forecasts[1].effective_at_text,
        "2024-03-05 11:45:00" // last sample 11:35 plus one bucket
    );
}

#[test]
fn test_alarm_matches_forecasts() {
    let config = PipelineConfig::default();
    let scenarios: Vec<Vec<(i64, [f64; 3])>> = vec![
        // Channel 1 alternates low/high and ends low, so it should rise
        (0..13)
            .map(|i| (5 * i, [if i % 2 == 0 { 60.0 } else { 80.0 }, 50.0, 50.0]))
            .collect(),
        // Nothing ever changes
        (0..13).map(|i| (5 * i, [60.0, 50.0, 50.0])).collect(),
    ];

    for readings in scenarios {
        let report = run_pipeline(&numeric_rows(&readings), &config);
        let any_rise = report.forecasts.iter().any(|f| f.forecast_text == "Rises");
        assert_eq!(report.alarm, any_rise);
    }

    let rising = (0..13)
        .map(|i| (5 * i, [if i % 2 == 0 { 60.0 } else { 80.0 }, 50.0, 50.0]))
        .collect::<Vec<_>>();
    let report = run_pipeline(&numeric_rows(&rising), &config);
    assert!(report.alarm);
    assert_eq!(report.forecasts[0].forecast_text, "Rises");
}

#[test]
fn test_report_serializes_for_presentation() {
    let config = PipelineConfig::default();
    let records = numeric_rows(&[(0, [85.0, 70.0, 70.0]), (10, [70.0, 70.0, 70.0])]);

    let report = run_from_source(&StaticSource::new(records), &config).unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["alarm"], false);
    assert_eq!(json["breaches"][0]["FechaHora"], "2024-03-05 10:00:00");
    assert_eq!(json["breaches"][0]["Temp 1"], 85.0);
    assert_eq!(json["chart"].as_array().unwrap().len(), 3);
    assert_eq!(
        json["chart"][0]["points"][0]["label"],
        "Temp 1: 85.0°C, Date: 2024-03-05 10:00:00"
    );
    assert_eq!(json["forecasts"][0]["forecast_text"], "Cannot predict");
    assert_eq!(json["stats"]["rows_kept"], 2);
}

#[test]
fn test_unavailable_source_fails_the_run() {
    let source = FileSource::new("/nonexistent/condensate/records.json");

    let result = run_from_source(&source, &PipelineConfig::default());

    assert!(matches!(result, Err(PipelineError::Source(_))));
}
