//! Format inference: orchestrates the detectors over a sample and resolves
//! the winner.
//!
//! A detector wins only when it matches every non-null sample; a single
//! near-miss detector is surfaced as a *possible match* for the caller to
//! offer rather than apply. Ambiguous date patterns that all parse every
//! sample are retained together in the format list — the engine never
//! guesses day/month intent.

use std::collections::HashSet;

use log::debug;

use crate::{
    detect::{self, Detector, NumericShape},
    format::{DataKind, ValueFormat, join_date_formats},
    locale::{FORMAT_LIST_DELIMITER, LocaleConfig},
};

const NON_MATCHING_EXAMPLE_LIMIT: usize = 4;
const POSSIBLE_MATCH_THRESHOLD_PERCENT: usize = 80;
const SERIAL_PATTERN_TOKEN: &str = "serial";

/// Per-call knobs for [`guess_format`]. Locale state is resolved here once;
/// the algorithm never consults globals.
#[derive(Debug, Clone)]
pub struct InferenceOptions {
    pub locale: LocaleConfig,
    /// Minimum matching samples required before a detector may be accepted.
    pub min_required_matches: usize,
    pub enabled: Vec<Detector>,
    /// Extra boolean literals, `;`-separated, merged with the locale defaults.
    pub extra_true_literals: String,
    pub extra_false_literals: String,
    /// Explicit prior date formats; supplying one short-circuits the
    /// minimum-sample requirement for DateTime.
    pub known_date_formats: Option<String>,
    /// Serial date-times are ambiguous with plain numbers; opt-in only.
    pub allow_serial_dates: bool,
    pub remove_currency_symbols: bool,
}

impl Default for InferenceOptions {
    fn default() -> Self {
        Self {
            locale: LocaleConfig::default(),
            min_required_matches: 4,
            enabled: Detector::PRIORITY.to_vec(),
            extra_true_literals: String::new(),
            extra_false_literals: String::new(),
            known_date_formats: None,
            allow_serial_dates: false,
            remove_currency_symbols: false,
        }
    }
}

impl InferenceOptions {
    fn is_enabled(&self, detector: Detector) -> bool {
        self.enabled.contains(&detector)
    }
}

/// Outcome of one inference call. `found_format` is advisory: the caller
/// decides whether to commit it to the column configuration.
#[derive(Debug, Clone, Default)]
pub struct GuessResult {
    pub found_format: Option<ValueFormat>,
    pub possible_match: Option<ValueFormat>,
    pub is_possible_match: bool,
    pub non_matching_examples: Vec<String>,
}

impl GuessResult {
    pub fn found_kind(&self) -> Option<DataKind> {
        self.found_format.as_ref().map(|f| f.kind)
    }
}

#[derive(Debug, Clone, Default)]
struct Tally {
    matched: usize,
    failures: Vec<String>,
}

impl Tally {
    fn record(&mut self, raw: &str, matched: bool) {
        if matched {
            self.matched += 1;
        } else if self.failures.len() < NON_MATCHING_EXAMPLE_LIMIT {
            self.failures.push(raw.to_string());
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SeparatorPair {
    decimal: char,
    group: Option<char>,
}

#[derive(Debug, Clone)]
struct NumberPairTally {
    pair: SeparatorPair,
    parsed: usize,
    integers: usize,
    numerics: usize,
    doubles: usize,
    percents: usize,
    currency_hits: usize,
    group_hits: usize,
}

impl NumberPairTally {
    fn new(pair: SeparatorPair) -> Self {
        Self {
            pair,
            parsed: 0,
            integers: 0,
            numerics: 0,
            doubles: 0,
            percents: 0,
            currency_hits: 0,
            group_hits: 0,
        }
    }
}

/// Infers the most plausible [`ValueFormat`] for a sample of raw values.
///
/// Never fails on malformed sample text; malformed values only feed the
/// non-matching tallies. Null/empty values must already be excluded by the
/// sample collector.
pub fn guess_format(samples: &[String], options: &InferenceOptions) -> GuessResult {
    let total = samples.len();
    if total == 0 {
        return GuessResult::default();
    }

    let (true_literals, false_literals) = options.locale.boolean_literals(
        &options.extra_true_literals,
        &options.extra_false_literals,
    );

    let known_formats: Vec<String> = options
        .known_date_formats
        .as_deref()
        .unwrap_or_default()
        .split(FORMAT_LIST_DELIMITER)
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();
    let mut date_candidates = known_formats.clone();
    for candidate in options.locale.candidate_date_patterns() {
        if !date_candidates.contains(&candidate) {
            date_candidates.push(candidate);
        }
    }

    let mut boolean = Tally::default();
    let mut guid = Tally::default();
    let mut date = Tally::default();
    let mut pattern_hits: Vec<(String, Vec<usize>)> = Vec::new();
    let mut pair_tallies = candidate_separator_pairs(&options.locale)
        .into_iter()
        .map(NumberPairTally::new)
        .collect::<Vec<_>>();
    let mut percent_tally = Tally::default();
    let mut integer_tally = Tally::default();
    let mut numeric_tally = Tally::default();
    let mut double_tally = Tally::default();

    for (row, raw) in samples.iter().enumerate() {
        if options.is_enabled(Detector::Boolean) {
            let hit = detect::match_boolean(raw, &true_literals, &false_literals).is_some();
            boolean.record(raw, hit);
        }
        if options.is_enabled(Detector::Guid) {
            guid.record(raw, detect::match_guid(raw));
        }
        if options.is_enabled(Detector::DateTime) {
            let matches = detect::match_date_patterns(raw, &date_candidates);
            let mut any = !matches.is_empty();
            for pattern in &matches {
                bump_pattern(&mut pattern_hits, pattern, row);
            }
            if options.allow_serial_dates && detect::match_serial_date(raw).is_some() {
                bump_pattern(&mut pattern_hits, SERIAL_PATTERN_TOKEN, row);
                any = true;
            }
            date.record(raw, any);
        }

        let numbers_enabled = options.is_enabled(Detector::Integer)
            || options.is_enabled(Detector::Numeric)
            || options.is_enabled(Detector::Double)
            || options.is_enabled(Detector::Percentage);
        if numbers_enabled {
            let mut percent_hit = false;
            let mut integer_hit = false;
            let mut numeric_hit = false;
            let mut double_hit = false;
            for tally in &mut pair_tallies {
                let observed = detect::match_number(
                    raw,
                    tally.pair.decimal,
                    tally.pair.group,
                    options.remove_currency_symbols,
                );
                let Some(observed) = observed else { continue };
                tally.parsed += 1;
                if observed.had_currency_symbol {
                    tally.currency_hits += 1;
                }
                if observed.had_group_separator {
                    tally.group_hits += 1;
                }
                if observed.percent_divisor > 1 {
                    tally.percents += 1;
                    percent_hit = true;
                    continue;
                }
                match observed.shape {
                    NumericShape::Integer => {
                        tally.integers += 1;
                        integer_hit = true;
                        numeric_hit = true;
                        double_hit = true;
                    }
                    NumericShape::Numeric => {
                        tally.numerics += 1;
                        numeric_hit = true;
                        double_hit = true;
                    }
                    NumericShape::Double => {
                        tally.doubles += 1;
                        double_hit = true;
                    }
                }
            }
            percent_tally.record(raw, percent_hit);
            integer_tally.record(raw, integer_hit);
            numeric_tally.record(raw, numeric_hit);
            double_tally.record(raw, double_hit);
        }
    }

    // A pair with a mix of percent-suffixed and plain values has no single
    // format that re-parses every row, so it cannot win outright.
    let winning_pair = pair_tallies
        .iter()
        .find(|tally| tally.parsed == total && (tally.percents == 0 || tally.percents == total));
    let number_winner: Option<(Detector, &NumberPairTally)> =
        winning_pair.map(|tally| {
            let detector = if tally.percents == total {
                Detector::Percentage
            } else if tally.doubles > 0 {
                Detector::Double
            } else if tally.numerics > 0 {
                Detector::Numeric
            } else {
                Detector::Integer
            };
            (detector, tally)
        });

    let accepts = |detector: Detector, matched: usize| -> bool {
        if matched != total {
            return false;
        }
        if matched >= options.min_required_matches {
            return true;
        }
        match detector {
            Detector::Boolean => true,
            Detector::DateTime => !known_formats.is_empty(),
            _ => false,
        }
    };

    // Resolution walks the fixed priority order over the closed outcome set.
    let mut found: Option<(Detector, ValueFormat)> = None;
    for detector in Detector::PRIORITY {
        if !options.is_enabled(detector) {
            continue;
        }
        let winner = match detector {
            Detector::Boolean if accepts(Detector::Boolean, boolean.matched) => {
                Some(boolean_format(options, &true_literals, &false_literals))
            }
            Detector::Guid if accepts(Detector::Guid, guid.matched) => {
                Some(ValueFormat::new(DataKind::Guid))
            }
            Detector::DateTime if accepts(Detector::DateTime, date.matched) => {
                Some(date_format(options, &pattern_hits, total))
            }
            Detector::Percentage | Detector::Numeric | Detector::Double | Detector::Integer => {
                match number_winner {
                    Some((winner_detector, tally))
                        if winner_detector == detector
                            && accepts(detector, tally.parsed) =>
                    {
                        Some(number_format(options, detector, tally))
                    }
                    _ => None,
                }
            }
            _ => None,
        };
        if let Some(format) = winner {
            found = Some((detector, format));
            break;
        }
    }

    if let Some((detector, format)) = found {
        debug!("format inference settled on {:?}", detector);
        return GuessResult {
            found_format: Some(format),
            possible_match: None,
            is_possible_match: false,
            non_matching_examples: Vec::new(),
        };
    }

    // No outright winner: surface a single high-proportion detector as a
    // possible match, with its counter-examples.
    let threshold = total * POSSIBLE_MATCH_THRESHOLD_PERCENT / 100;
    let threshold = threshold.max(1);
    let mut near_misses: Vec<(Detector, usize, Vec<String>)> = Vec::new();
    let mut push_near = |detector: Detector, tally: &Tally| {
        if options.is_enabled(detector) && tally.matched < total && tally.matched >= threshold {
            near_misses.push((detector, tally.matched, tally.failures.clone()));
        }
    };
    push_near(Detector::Boolean, &boolean);
    push_near(Detector::Guid, &guid);
    push_near(Detector::DateTime, &date);
    push_near(Detector::Percentage, &percent_tally);
    if percent_tally.matched < threshold {
        // Only one numeric family candidate: the narrowest that clears the bar.
        if integer_tally.matched >= threshold && integer_tally.matched < total {
            push_near(Detector::Integer, &integer_tally);
        } else if numeric_tally.matched >= threshold && numeric_tally.matched < total {
            push_near(Detector::Numeric, &numeric_tally);
        } else {
            push_near(Detector::Double, &double_tally);
        }
    }

    if near_misses.len() == 1 {
        let (detector, matched, failures) = near_misses.into_iter().next().unwrap();
        debug!(
            "format inference found possible match {:?} ({matched}/{total})",
            detector
        );
        let format = match detector {
            Detector::Boolean => boolean_format(options, &true_literals, &false_literals),
            Detector::Guid => ValueFormat::new(DataKind::Guid),
            Detector::DateTime => date_format(options, &pattern_hits, matched),
            Detector::Percentage | Detector::Numeric | Detector::Double | Detector::Integer => {
                match pair_tallies.iter().max_by_key(|t| t.parsed) {
                    Some(tally) => number_format(options, detector, tally),
                    None => ValueFormat::with_locale(detector.kind(), &options.locale),
                }
            }
        };
        return GuessResult {
            found_format: None,
            possible_match: Some(format),
            is_possible_match: true,
            non_matching_examples: failures,
        };
    }

    GuessResult::default()
}

fn bump_pattern(hits: &mut Vec<(String, Vec<usize>)>, pattern: &str, row: usize) {
    if let Some((_, rows)) = hits.iter_mut().find(|(p, _)| p == pattern) {
        rows.push(row);
    } else {
        hits.push((pattern.to_string(), vec![row]));
    }
}

fn candidate_separator_pairs(locale: &LocaleConfig) -> Vec<SeparatorPair> {
    let mut pairs = vec![SeparatorPair {
        decimal: locale.decimal_separator,
        group: locale.group_separator,
    }];
    for fallback in [
        SeparatorPair { decimal: '.', group: Some(',') },
        SeparatorPair { decimal: ',', group: Some('.') },
    ] {
        if !pairs.contains(&fallback) {
            pairs.push(fallback);
        }
    }
    pairs
}

fn boolean_format(
    options: &InferenceOptions,
    true_literals: &[String],
    false_literals: &[String],
) -> ValueFormat {
    let mut format = ValueFormat::with_locale(DataKind::Boolean, &options.locale);
    format.true_literals = true_literals.to_vec();
    format.false_literals = false_literals.to_vec();
    format
}

/// Builds the DateTime format from the observed pattern tallies.
///
/// Patterns that parse *every* sample are all retained (the deliberate
/// no-guess policy for day/month ambiguity). When no single pattern covers
/// the whole sample, a greedy cover merges overlapping patterns — rows with
/// and without a time component, for example.
fn date_format(
    options: &InferenceOptions,
    pattern_hits: &[(String, Vec<usize>)],
    total: usize,
) -> ValueFormat {
    let mut format = ValueFormat::with_locale(DataKind::DateTime, &options.locale);
    let mut serial = false;
    let full: Vec<&str> = pattern_hits
        .iter()
        .filter(|(pattern, rows)| {
            if pattern == SERIAL_PATTERN_TOKEN {
                serial = rows.len() == total;
                false
            } else {
                rows.len() == total
            }
        })
        .map(|(pattern, _)| pattern.as_str())
        .collect();

    let merged: Vec<&str> = if !full.is_empty() {
        full
    } else {
        greedy_pattern_cover(pattern_hits)
    };

    format.date_format = join_date_formats(merged);
    format.serial_date_time = serial && options.allow_serial_dates;
    format
}

/// Greedy set cover over the sample rows each pattern parsed. Coverage is
/// recomputed per step so a row matched by several patterns counts once;
/// the loop stops only when no remaining pattern parses an uncovered row.
fn greedy_pattern_cover(pattern_hits: &[(String, Vec<usize>)]) -> Vec<&str> {
    let candidates: Vec<(&str, &[usize])> = pattern_hits
        .iter()
        .filter(|(pattern, _)| pattern != SERIAL_PATTERN_TOKEN)
        .map(|(pattern, rows)| (pattern.as_str(), rows.as_slice()))
        .collect();

    let mut covered: HashSet<usize> = HashSet::new();
    let mut cover: Vec<&str> = Vec::new();
    loop {
        let best = candidates
            .iter()
            .filter(|(pattern, _)| !cover.contains(pattern))
            .map(|(pattern, rows)| {
                let gain = rows.iter().filter(|row| !covered.contains(row)).count();
                (gain, *pattern, *rows)
            })
            .filter(|(gain, _, _)| *gain > 0)
            // Highest gain wins; ties resolve to the lexically smaller name.
            .max_by(|a, b| a.0.cmp(&b.0).then_with(|| b.1.cmp(a.1)));
        let Some((_, pattern, rows)) = best else { break };
        cover.push(pattern);
        covered.extend(rows.iter().copied());
    }
    cover
}

fn number_format(
    options: &InferenceOptions,
    detector: Detector,
    tally: &NumberPairTally,
) -> ValueFormat {
    let mut format = ValueFormat::with_locale(detector.kind(), &options.locale);
    format.decimal_separator = tally.pair.decimal;
    format.group_separator = if tally.group_hits > 0 {
        tally.pair.group
    } else {
        None
    };
    format.remove_currency_symbols =
        options.remove_currency_symbols && tally.currency_hits > 0;
    format
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn options() -> InferenceOptions {
        InferenceOptions {
            min_required_matches: 2,
            ..InferenceOptions::default()
        }
    }

    #[test]
    fn boolean_wins_over_integer_for_bit_columns() {
        let result = guess_format(&samples(&["0", "1", "1", "0"]), &options());
        assert_eq!(result.found_kind(), Some(DataKind::Boolean));
    }

    #[test]
    fn integer_wins_when_boolean_disabled() {
        let mut opts = options();
        opts.enabled.retain(|d| *d != Detector::Boolean);
        let result = guess_format(&samples(&["0", "1", "1", "0"]), &opts);
        assert_eq!(result.found_kind(), Some(DataKind::Integer));
    }

    #[test]
    fn ambiguous_dates_retain_both_patterns() {
        let result = guess_format(&samples(&["10/05/2022", "01/02/2022", "03/04/2022"]), &options());
        let format = result.found_format.expect("date format");
        assert_eq!(format.kind, DataKind::DateTime);
        let formats = format.date_formats();
        assert!(formats.contains(&"MM/dd/yyyy"));
        assert!(formats.contains(&"dd/MM/yyyy"));
    }

    #[test]
    fn mixed_date_and_datetime_rows_merge_into_cover() {
        let result = guess_format(
            &samples(&["2023-01-05", "2023-02-28 10:30:00", "2023-12-31"]),
            &options(),
        );
        let format = result.found_format.expect("date format");
        let formats = format.date_formats();
        assert!(formats.contains(&"yyyy-MM-dd"));
        assert!(formats.contains(&"yyyy-MM-dd HH:mm:ss"));
    }

    #[test]
    fn merged_cover_parses_every_sample() {
        // Rows 1-2 match both slash patterns; row 3 only matches the
        // day-first pattern with a time component. A count-based merge
        // would stop before covering row 3.
        let rows = samples(&["01/02/2022", "03/04/2022", "25/12/2022 10:30"]);
        let result = guess_format(&rows, &options());
        let format = result.found_format.expect("date format");
        assert_eq!(format.kind, DataKind::DateTime);
        for raw in &rows {
            assert!(
                format.parse(raw).unwrap().is_some(),
                "winning format {} cannot parse {raw}",
                format.date_format
            );
        }
    }

    #[test]
    fn near_miss_becomes_possible_match_with_examples() {
        let values = samples(&[
            "2023-01-05",
            "2023-02-28",
            "2023-03-14",
            "2023-04-01",
            "not a date",
        ]);
        let result = guess_format(&values, &options());
        assert!(result.found_format.is_none());
        assert!(result.is_possible_match);
        assert_eq!(
            result.possible_match.map(|f| f.kind),
            Some(DataKind::DateTime)
        );
        assert_eq!(result.non_matching_examples, vec!["not a date".to_string()]);
    }

    #[test]
    fn small_sample_rejected_without_known_format() {
        let mut opts = options();
        opts.min_required_matches = 4;
        let result = guess_format(&samples(&["2023-01-05", "2023-02-06"]), &opts);
        assert!(result.found_format.is_none());

        opts.known_date_formats = Some("yyyy-MM-dd".to_string());
        let with_known = guess_format(&samples(&["2023-01-05", "2023-02-06"]), &opts);
        assert_eq!(with_known.found_kind(), Some(DataKind::DateTime));
    }

    #[test]
    fn serial_dates_only_match_when_enabled() {
        let values = samples(&["44927", "44928", "44929", "44930"]);
        let plain = guess_format(&values, &options());
        assert_eq!(plain.found_kind(), Some(DataKind::Integer));

        let mut opts = options();
        opts.allow_serial_dates = true;
        opts.enabled.retain(|d| {
            !matches!(d, Detector::Integer | Detector::Numeric | Detector::Double)
        });
        let serial = guess_format(&values, &opts);
        let format = serial.found_format.expect("serial format");
        assert_eq!(format.kind, DataKind::DateTime);
        assert!(format.serial_date_time);
    }

    #[test]
    fn percent_suffixed_values_infer_percentage() {
        let result = guess_format(&samples(&["12.5%", "33.0%", "7%"]), &options());
        assert_eq!(result.found_kind(), Some(DataKind::Percentage));
    }

    #[test]
    fn mixed_percent_and_plain_numbers_do_not_win() {
        let result = guess_format(&samples(&["12.5%", "3.4", "7%", "9.0"]), &options());
        assert!(result.found_format.is_none());
    }

    #[test]
    fn empty_sample_yields_no_format() {
        let result = guess_format(&[], &options());
        assert!(result.found_format.is_none());
        assert!(!result.is_possible_match);
    }
}
