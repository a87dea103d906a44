mod common;

use common::strings;
use gridlens::{
    detect::{self, Detector, NumericShape},
    format::{DataKind, ValueFormat},
    infer::{self, InferenceOptions},
};
use proptest::prelude::*;
use rust_decimal::Decimal;

fn options(min_matches: usize) -> InferenceOptions {
    InferenceOptions {
        min_required_matches: min_matches,
        ..InferenceOptions::default()
    }
}

#[test]
fn boolean_literals_match_case_insensitively() {
    let guess = infer::guess_format(&strings(&["true", "FALSE", "True"]), &options(4));
    let format = guess.found_format.expect("boolean format");
    assert_eq!(format.kind, DataKind::Boolean);
    assert_eq!(
        format.parse("FALSE").unwrap(),
        Some(gridlens::value::Value::Boolean(false))
    );
}

#[test]
fn iso_dates_infer_a_single_concrete_pattern() {
    let guess = infer::guess_format(
        &strings(&["2023-01-05", "2023-02-28", "2023-12-31"]),
        &options(3),
    );
    let format = guess.found_format.expect("date format");
    assert_eq!(format.kind, DataKind::DateTime);
    assert_eq!(format.date_format, "yyyy-MM-dd");
}

#[test]
fn leading_zero_digits_fall_through_to_text() {
    let guess = infer::guess_format(&strings(&["0123", "0456"]), &options(2));
    assert!(guess.found_format.is_none());
    assert!(!guess.is_possible_match);
}

#[test]
fn percent_samples_infer_percentage_and_parse_pre_divided() {
    let guess = infer::guess_format(&strings(&["12.5%", "33.0%"]), &options(2));
    let format = guess.found_format.expect("percentage format");
    assert_eq!(format.kind, DataKind::Percentage);
    let parsed = format.parse("12.5%").unwrap().expect("value");
    assert_eq!(
        parsed,
        gridlens::value::Value::Percentage(Decimal::new(125, 3))
    );
}

#[test]
fn one_failing_sample_blocks_an_outright_win() {
    // All-or-nothing: a 9-of-10 integer column is not an Integer column.
    let mut values = strings(&["1", "2", "3", "4", "5", "6", "7", "8", "9"]);
    values.push("ten".to_string());
    let guess = infer::guess_format(&values, &options(4));
    assert!(guess.found_format.is_none());
    assert!(guess.is_possible_match);
    assert_eq!(
        guess.possible_match.map(|f| f.kind),
        Some(DataKind::Integer)
    );
    assert_eq!(guess.non_matching_examples, vec!["ten".to_string()]);
}

#[test]
fn boolean_outranks_integer_for_zero_one_columns() {
    let values = strings(&["0", "1", "1", "0", "1"]);
    let guess = infer::guess_format(&values, &options(4));
    assert_eq!(
        guess.found_format.map(|f| f.kind),
        Some(DataKind::Boolean)
    );

    let mut without_boolean = options(4);
    without_boolean.enabled.retain(|d| *d != Detector::Boolean);
    let fallback = infer::guess_format(&values, &without_boolean);
    assert_eq!(
        fallback.found_format.map(|f| f.kind),
        Some(DataKind::Integer)
    );
}

#[test]
fn guid_column_beats_text() {
    let guess = infer::guess_format(
        &strings(&[
            "6f9619ff-8b86-d011-b42d-00c04fc964ff",
            "{afe4f5b2-6a1d-4c0e-9f3b-2f1d6a0c9b11}",
            "00000000-0000-0000-0000-000000000000",
            "c56a4180-65aa-42ec-a945-5fd21dec0538",
        ]),
        &options(4),
    );
    assert_eq!(guess.found_format.map(|f| f.kind), Some(DataKind::Guid));
}

#[test]
fn committed_formats_survive_re_guessing() {
    // Inference is advisory: accepting a guess into a column never changes
    // the guess itself on a rerun over the same sample.
    let samples = strings(&["2023-01-05", "2023-02-28", "2023-12-31"]);
    let first = infer::guess_format(&samples, &options(3));
    let second = infer::guess_format(&samples, &options(3));
    assert_eq!(
        first.found_format.as_ref().map(|f| &f.date_format),
        second.found_format.as_ref().map(|f| &f.date_format)
    );
}

#[test]
fn known_format_hint_accepts_small_samples() {
    let mut opts = options(4);
    opts.known_date_formats = Some("dd.MM.yyyy".to_string());
    let guess = infer::guess_format(&strings(&["05.01.2023", "28.02.2023"]), &opts);
    let format = guess.found_format.expect("date format");
    assert!(format.date_formats().contains(&"dd.MM.yyyy"));
}

#[test]
fn percentage_format_round_trips_half() {
    let format = ValueFormat::new(DataKind::Percentage);
    let value = gridlens::value::Value::Percentage(Decimal::new(5, 1));
    assert_eq!(format.format_value(&value), "50%");
    assert_eq!(format.parse("50%").unwrap(), Some(value));
}

fn apply_grouping(digits: &str, separator: char) -> String {
    let mut grouped = String::new();
    for (index, ch) in digits.chars().enumerate() {
        let remaining = digits.len() - index;
        if index > 0 && remaining % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(ch);
    }
    grouped
}

fn numeric_token_strategy() -> impl Strategy<Value = (String, u32, bool)> {
    (
        1u64..=999_999_999,
        0u32..=4,
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_flat_map(|(integer, scale, negative, grouped, currency)| {
            let fraction = if scale == 0 {
                Just(String::new()).boxed()
            } else {
                proptest::collection::vec(0u8..=9, scale as usize)
                    .prop_map(|digits| {
                        digits.iter().map(|d| (b'0' + d) as char).collect()
                    })
                    .boxed()
            };
            fraction.prop_map(move |fraction| {
                let mut body = integer.to_string();
                if grouped {
                    body = apply_grouping(&body, ',');
                }
                if scale > 0 {
                    body.push('.');
                    body.push_str(&fraction);
                }
                if currency {
                    body = format!("${body}");
                }
                if negative {
                    body = format!("-{body}");
                }
                (body, scale, currency)
            })
        })
}

proptest! {
    #[test]
    fn generated_numeric_tokens_always_classify(
        (token, scale, currency) in numeric_token_strategy()
    ) {
        let observed = detect::match_number(&token, '.', Some(','), true)
            .expect("generated numeric token should classify");
        if scale > 0 {
            prop_assert_eq!(observed.shape, NumericShape::Numeric);
        } else {
            prop_assert_eq!(observed.shape, NumericShape::Integer);
        }
        prop_assert_eq!(observed.had_currency_symbol, currency);
        prop_assert_eq!(observed.percent_divisor, 1);
    }
}
