//! Classification-path routing rules (§4.1 table). Evaluated purely from
//! data type and detected patterns — column names never participate.

use crate::config::PipelineConfig;
use crate::models::{ClassificationPath, DataTypeFamily, DetectedPattern, SchemaColumn};
use crate::patterns;

/// Routes one column to its `ClassificationPath`, evaluating the rules in
/// the order given in §4.1.
pub fn route_classification_path(
    family: DataTypeFamily,
    column: &SchemaColumn,
    detected_patterns: &[DetectedPattern],
    cardinality: Option<f64>,
    config: &PipelineConfig,
) -> ClassificationPath {
    let pattern_rate = |name: &str| -> f64 {
        detected_patterns.iter().find(|p| p.pattern_name == name).map(|p| p.match_rate).unwrap_or(0.0)
    };

    match family {
        DataTypeFamily::Timestamp => ClassificationPath::Timestamp,
        DataTypeFamily::Boolean => ClassificationPath::Boolean,
        DataTypeFamily::Integer => route_integer(column, detected_patterns, cardinality, config, &pattern_rate),
        DataTypeFamily::Uuid => ClassificationPath::Uuid,
        DataTypeFamily::Text => route_text(column, cardinality, config, &pattern_rate),
        DataTypeFamily::Json => ClassificationPath::Json,
        DataTypeFamily::Binary | DataTypeFamily::Geometry | DataTypeFamily::Other => {
            ClassificationPath::Unknown
        }
    }
}

fn route_integer(
    column: &SchemaColumn,
    detected_patterns: &[DetectedPattern],
    cardinality: Option<f64>,
    config: &PipelineConfig,
    pattern_rate: &dyn Fn(&str) -> f64,
) -> ClassificationPath {
    if is_binary_samples(column) {
        return ClassificationPath::Boolean;
    }

    if matches_unix_epoch_with_valid_years(detected_patterns, column, config) {
        return ClassificationPath::Timestamp;
    }

    if is_low_cardinality_enum(cardinality, column.distinct_count, config) {
        return ClassificationPath::Enum;
    }

    let _ = pattern_rate; // reserved: integer path has no other pattern-driven rule today
    ClassificationPath::Numeric
}

fn route_text(
    column: &SchemaColumn,
    cardinality: Option<f64>,
    config: &PipelineConfig,
    pattern_rate: &dyn Fn(&str) -> f64,
) -> ClassificationPath {
    if pattern_rate(patterns::UUID) >= 0.95 {
        return ClassificationPath::Uuid;
    }

    let external_id_rate = pattern_rate(patterns::STRIPE_ID)
        .max(pattern_rate(patterns::TWILIO_SID))
        .max(pattern_rate(patterns::AWS_SES_EMAIL));
    if external_id_rate >= 0.80 {
        return ClassificationPath::ExternalId;
    }

    if is_low_cardinality_enum(cardinality, column.distinct_count, config) {
        return ClassificationPath::Enum;
    }

    ClassificationPath::Text
}

fn is_binary_samples(column: &SchemaColumn) -> bool {
    if column.sample_values.is_empty() {
        return false;
    }
    column.sample_values.iter().all(|v| v == "0" || v == "1")
}

fn is_low_cardinality_enum(
    cardinality: Option<f64>,
    distinct_count: Option<i64>,
    config: &PipelineConfig,
) -> bool {
    match (cardinality, distinct_count) {
        (Some(card), Some(distinct)) => {
            card < config.enum_cardinality_ratio && distinct > 0 && distinct as u32 <= config.enum_max_distinct
        }
        _ => false,
    }
}

fn matches_unix_epoch_with_valid_years(
    detected_patterns: &[DetectedPattern],
    column: &SchemaColumn,
    config: &PipelineConfig,
) -> bool {
    let epoch_pattern = [
        patterns::UNIX_SECONDS,
        patterns::UNIX_MILLIS,
        patterns::UNIX_MICROS,
        patterns::UNIX_NANOS,
    ]
    .iter()
    .find_map(|name| {
        detected_patterns
            .iter()
            .find(|p| p.pattern_name == *name && p.match_rate >= config.unix_timestamp_min_match)
    });

    let Some(pattern) = epoch_pattern else { return false };

    if column.sample_values.is_empty() {
        return false;
    }

    let valid_years = column
        .sample_values
        .iter()
        .filter(|v| {
            patterns::decode_epoch_year(v, pattern.pattern_name)
                .map(|year| year >= config.timestamp_year_low && year <= config.timestamp_year_high)
                .unwrap_or(false)
        })
        .count();

    valid_years as f64 / column.sample_values.len() as f64 >= 0.5
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DetectedPattern;

    fn base_column(samples: Vec<&str>, distinct_count: Option<i64>) -> SchemaColumn {
        SchemaColumn {
            id: 1,
            table_id: 1,
            name: "col".into(),
            data_type: "bigint".into(),
            is_pk: false,
            is_unique: false,
            is_nullable: true,
            sample_values: samples.into_iter().map(String::from).collect(),
            distinct_count,
            null_count: None,
            min_length: None,
            max_length: None,
            is_joinable: None,
            joinability_reason: None,
        }
    }

    #[test]
    fn exactly_50_distinct_low_cardinality_routes_to_enum() {
        let config = PipelineConfig::default();
        let column = base_column(vec!["a", "b"], Some(50));
        let routed = route_classification_path(
            DataTypeFamily::Text,
            &column,
            &[],
            Some(0.0099),
            &config,
        );
        assert_eq!(routed, ClassificationPath::Enum);
    }

    #[test]
    fn fifty_one_distinct_routes_to_text() {
        let config = PipelineConfig::default();
        let column = base_column(vec!["a", "b"], Some(51));
        let routed = route_classification_path(
            DataTypeFamily::Text,
            &column,
            &[],
            Some(0.0099),
            &config,
        );
        assert_eq!(routed, ClassificationPath::Text);
    }

    #[test]
    fn cardinality_at_threshold_routes_to_text() {
        let config = PipelineConfig::default();
        let column = base_column(vec!["a", "b"], Some(50));
        let routed = route_classification_path(
            DataTypeFamily::Text,
            &column,
            &[],
            Some(0.0100),
            &config,
        );
        assert_eq!(routed, ClassificationPath::Text);
    }

    #[test]
    fn unix_nanos_with_low_valid_year_rate_routes_to_numeric() {
        let config = PipelineConfig::default();
        // 80% pattern match but only 40% valid years -> Numeric
        let samples: Vec<String> = vec![
            "1631152000000000000".to_string(), // valid year (2021)
            "9999999999999999999".to_string(), // out of range
            "9999999999999999998".to_string(), // out of range
            "9999999999999999997".to_string(), // out of range
            "9999999999999999996".to_string(), // out of range
        ];
        let column = SchemaColumn { sample_values: samples.clone(), ..base_column(vec![], None) };
        let pattern = DetectedPattern {
            pattern_name: patterns::UNIX_NANOS,
            match_rate: 0.80,
            matched_values: samples.iter().take(5).cloned().collect(),
        };
        let routed =
            route_classification_path(DataTypeFamily::Integer, &column, &[pattern], None, &config);
        assert_eq!(routed, ClassificationPath::Numeric);
    }

    #[test]
    fn binary_integer_samples_route_to_boolean() {
        let config = PipelineConfig::default();
        let column = base_column(vec!["0", "1", "1", "0"], None);
        let routed = route_classification_path(DataTypeFamily::Integer, &column, &[], None, &config);
        assert_eq!(routed, ClassificationPath::Boolean);
    }
}
