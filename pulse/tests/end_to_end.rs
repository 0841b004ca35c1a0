use casting_pulse::{
    build_pulse_file, BuildOptions, ConfigError, InputError, OutputFormat, PipelineError,
    PulseConfig,
};
use std::fs;
use std::path::Path;

const INPUT: &str = "\
actor_id,posted_date,work_city,project_type,rate_value,role_billing,union_status,role_description
1,2024-05-01,Los Angeles,Feature Film,$100,Lead,SAG-AFTRA,A lonely robot
2,2024-05-01,\"Burbank, CA\",Film,125,Lead,union,Cheerful baker
3,2024-05-01T10:00:00Z,LA,feature,150/day,Principal,yes,Robot repair tech
4,2024-05-01,Hollywood,Film,175,Supporting,SAG,
5,2024-05-01,los angeles,short film,200,Background,Non-Union,
6,2024-05-01,Los Angeles,Film,225,Extra,,
7,2024-05-01,NYC,TV Series,300,Lead,SAG,Grim detective
8,2024-05-01,Brooklyn,Television,300,Lead,SAG,
9,2024-05-01,Atlantis,Film,100,Lead,,
10,yesterday,LA,Film,100,Lead,,
";

fn zero_noise() -> PulseConfig {
    PulseConfig {
        laplace_noise_scale: 0.0,
        ..PulseConfig::default()
    }
}

fn write_input(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("views.csv");
    fs::write(&path, INPUT).unwrap();
    path
}

#[test]
fn test_csv_to_csv() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path());
    let output = dir.path().join("pulse.csv");

    let report = build_pulse_file(
        &input,
        Some(output.as_path()),
        &zero_noise(),
        &BuildOptions::default(),
    )
    .unwrap();

    assert_eq!(report.stats.input_rows, 10);
    assert_eq!(report.stats.drops.invalid_date, 1);
    assert_eq!(report.stats.drops.unmapped_region, 1);
    assert_eq!(report.stats.buckets, 2);
    // NY/T has two rows and is suppressed
    assert_eq!(report.stats.suppressed, 1);

    let content = fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(
        lines[0],
        "date_utc,region_code,proj_type_code,role_count_day,lead_share_pct_day,\
         union_share_pct_day,median_rate_day_usd,sentiment_avg_day,theme_ai_share_pct_day"
    );
    assert_eq!(lines.len(), 2);

    let fields: Vec<&str> = lines[1].split(',').collect();
    assert_eq!(&fields[..7], &["2024-05-01", "LA", "F", "6", "50.0", "66.7", "175"]);
    assert_eq!(fields[8], "33.3");
    assert!(!content.contains("actor_id"));
}

#[test]
fn test_json_output_with_seeded_noise() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path());
    let config = PulseConfig {
        noise_seed: Some(99),
        ..PulseConfig::default()
    };
    let options = BuildOptions {
        format: OutputFormat::Json,
        delimiter: None,
    };

    let first = dir.path().join("a.json");
    let second = dir.path().join("b.json");
    build_pulse_file(&input, Some(first.as_path()), &config, &options).unwrap();
    build_pulse_file(&input, Some(second.as_path()), &config, &options).unwrap();

    let a = fs::read_to_string(&first).unwrap();
    assert_eq!(a, fs::read_to_string(&second).unwrap());

    let value: serde_json::Value = serde_json::from_str(&a).unwrap();
    let records = value.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["region_code"], "LA");
    assert_eq!(records[0]["lead_share_pct_day"], 50.0);
    assert_eq!(records[0]["median_rate_day_usd"].as_i64().unwrap() % 25, 0);
}

#[test]
fn test_missing_column_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("views.csv");
    let output = dir.path().join("pulse.csv");
    fs::write(&input, "posted_date,project_type\n2024-05-01,Film\n").unwrap();

    let err = build_pulse_file(
        &input,
        Some(output.as_path()),
        &zero_noise(),
        &BuildOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, PipelineError::Input(InputError::MissingColumn(_))));
    assert!(!output.exists());
}

#[test]
fn test_config_file_overrides_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path());
    let output = dir.path().join("pulse.csv");
    let config_path = dir.path().join("pulse.json");
    fs::write(
        &config_path,
        r#"{ "minimum_bucket_size": 2, "laplace_noise_scale": 0 }"#,
    )
    .unwrap();

    let config = PulseConfig::from_file(&config_path).unwrap();
    let report =
        build_pulse_file(&input, Some(output.as_path()), &config, &BuildOptions::default())
            .unwrap();

    assert_eq!(report.records.len(), 2);
    assert_eq!(report.records[1].key().to_string(), "2024-05-01/NY/T");
    assert_eq!(report.records[1].role_count_day, 2);
}

#[test]
fn test_config_schema_violation() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("pulse.json");
    fs::write(&config_path, r#"{ "minimum_bucket_sise": 2 }"#).unwrap();

    let err = PulseConfig::from_file(&config_path).unwrap_err();
    assert!(matches!(err, ConfigError::Schema(_)));
}

#[test]
fn test_export_with_alias_and_canonical_columns() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("views.csv");
    let output = dir.path().join("pulse.csv");
    fs::write(
        &input,
        "posted_date,work_city,work_location,project_type,rate,rate_value,union\n\
         2024-05-01,Los Angeles,LA,Film,$100/day,100,SAG\n\
         2024-05-01,Burbank,LA,Film,$200/day,200,SAG\n",
    )
    .unwrap();
    let config = PulseConfig {
        minimum_bucket_size: 1,
        ..zero_noise()
    };

    let report =
        build_pulse_file(&input, Some(output.as_path()), &config, &BuildOptions::default())
            .unwrap();

    assert_eq!(report.stats.drops.malformed, 0);
    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].role_count_day, 2);
    assert_eq!(report.records[0].median_rate_day_usd, Some(150));
    assert_eq!(report.records[0].union_share_pct_day, 100.0);
}
