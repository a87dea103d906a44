pub mod cli;
pub mod cluster;
pub mod column;
pub mod compose;
pub mod detect;
pub mod format;
pub mod infer;
pub mod io_utils;
pub mod locale;
pub mod sample;
pub mod settings;
pub mod source;
pub mod table;
pub mod value;
pub mod view;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, info, warn};

use crate::{
    cli::{Cli, ClustersArgs, Commands, FilterArgs, ProbeArgs, RankOrder},
    cluster::{ClusterCatalogue, ClusterOutcome, ClusterRank, ValueCluster},
    column::ColumnSet,
    compose::{ColumnFilterLogic, EngineError, FilterTarget, any_of_expression},
    infer::InferenceOptions,
    locale::LocaleConfig,
    sample::SampleOptions,
    source::{CancellationToken, CsvRowSource, RowSource},
    table::{Alignment, print_table},
    view::DataView,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("gridlens", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Probe(args) => handle_probe(&args),
        Commands::Clusters(args) => handle_clusters(&args),
        Commands::Filter(args) => handle_filter(&args),
    }
}

fn open_source(
    input: &std::path::Path,
    delimiter: Option<u8>,
    encoding: Option<&str>,
) -> Result<CsvRowSource> {
    let delimiter = io_utils::resolve_input_delimiter(input, delimiter);
    let encoding = io_utils::resolve_encoding(encoding)?;
    debug!(
        "Reading {input:?} with delimiter '{}' and encoding {}",
        io_utils::printable_delimiter(delimiter),
        encoding.name()
    );
    CsvRowSource::open(input, delimiter, encoding)
        .with_context(|| format!("Opening {input:?}"))
}

fn handle_probe(args: &ProbeArgs) -> Result<()> {
    info!("Probing '{}'", args.input.display());
    let mut source = open_source(
        &args.input,
        args.delimiter,
        args.input_encoding.as_deref(),
    )?;
    let headers = source.column_names().to_vec();

    let sample_options = SampleOptions {
        max_distinct_values: args.max_distinct,
        max_records: (args.sample_rows > 0).then_some(args.sample_rows),
        treat_as_null: args.null_literals.clone(),
    };
    let cancel = CancellationToken::new();
    let samples = sample::collect_all(&mut source, &sample_options, &cancel)
        .with_context(|| format!("Sampling {:?}", args.input))?;

    let locale = LocaleConfig {
        decimal_separator: args.decimal_separator,
        group_separator: args.group_separator,
        ..locale::process_locale()
    };
    let inference = InferenceOptions {
        locale,
        min_required_matches: args.min_matches,
        extra_true_literals: args.true_literals.clone(),
        extra_false_literals: args.false_literals.clone(),
        known_date_formats: args.known_date_formats.clone(),
        allow_serial_dates: args.serial_dates,
        remove_currency_symbols: args.currency,
        ..InferenceOptions::default()
    };

    let mut set = ColumnSet::from_names(&headers);
    let mut summary: Vec<Vec<String>> = Vec::new();
    for (index, header) in headers.iter().enumerate() {
        let sample = &samples[index];
        let guess = infer::guess_format(&sample.values, &inference);
        let (status, described) = match (&guess.found_format, &guess.possible_match) {
            (Some(format), _) => ("found".to_string(), format.describe()),
            (None, Some(format)) => {
                let examples = guess.non_matching_examples.join(", ");
                (format!("possible (not matching: {examples})"), format.describe())
            }
            (None, None) => ("none".to_string(), "string".to_string()),
        };
        summary.push(vec![
            header.clone(),
            described,
            sample.values.len().to_string(),
            status,
        ]);
        if let Some(column) = set.column_mut(header) {
            column.accept_guess(&guess);
        }
    }

    print_table(
        &[
            "column".to_string(),
            "format".to_string(),
            "samples".to_string(),
            "status".to_string(),
        ],
        &summary,
        &[Alignment::Left, Alignment::Left, Alignment::Right, Alignment::Left],
    );

    if let Some(path) = &args.columns {
        set.save(path)
            .with_context(|| format!("Writing column file {path:?}"))?;
        info!(
            "Formats for {} column(s) written to {:?}",
            set.columns.len(),
            path
        );
    }
    Ok(())
}

fn load_view(
    input: &std::path::Path,
    columns: Option<&std::path::Path>,
    delimiter: Option<u8>,
    encoding: Option<&str>,
) -> Result<(DataView, Option<ColumnSet>)> {
    let mut source = open_source(input, delimiter, encoding)?;
    let headers = source.column_names().to_vec();
    let set = match columns {
        Some(path) => Some(
            ColumnSet::load(path).with_context(|| format!("Loading column file {path:?}"))?,
        ),
        None => None,
    };
    let formats = match &set {
        Some(set) => set.formats_for(&headers),
        None => vec![None; headers.len()],
    };
    let view = DataView::load(&mut source, formats)
        .with_context(|| format!("Reading rows from {input:?}"))?;
    Ok((view, set))
}

fn handle_clusters(args: &ClustersArgs) -> Result<()> {
    info!(
        "Clustering column '{}' of '{}'",
        args.column,
        args.input.display()
    );
    let (mut view, set) = load_view(
        &args.input,
        args.columns.as_deref(),
        args.delimiter,
        args.input_encoding.as_deref(),
    )?;
    if let Some(expression) = &args.filter {
        view.apply_filter(expression)?;
        info!(
            "Filter keeps {} of {} row(s)",
            view.visible_count(),
            view.row_count()
        );
    }

    let ordinal = view
        .column_names()
        .iter()
        .position(|name| name.eq_ignore_ascii_case(&args.column))
        .ok_or_else(|| EngineError::ColumnNotFound(args.column.clone()))?;
    let format = set
        .as_ref()
        .and_then(|set| set.column(&args.column))
        .and_then(|column| column.value_format.clone());

    let rank = match args.rank {
        RankOrder::Frequency => ClusterRank::FrequencyDescending,
        RankOrder::Value => ClusterRank::ValueAscending,
    };
    let mut visible = view.visible_source();
    let catalogue = cluster::build(
        &mut visible,
        ordinal,
        format.as_ref(),
        args.max_values,
        rank,
    )?;

    match catalogue.outcome {
        ClusterOutcome::ListFilled => {
            let rows: Vec<Vec<String>> = catalogue
                .clusters
                .iter()
                .map(|c| vec![c.display_text.clone(), c.count.to_string()])
                .collect();
            print_table(
                &["value".to_string(), "count".to_string()],
                &rows,
                &[Alignment::Left, Alignment::Right],
            );
        }
        ClusterOutcome::TooManyValues => {
            warn!(
                "Column '{}' has more than {} distinct value(s); no pick list built",
                args.column, args.max_values
            );
        }
        ClusterOutcome::NoValues => {
            warn!("Column '{}' has no non-null values", args.column);
        }
        ClusterOutcome::WrongType => {
            warn!("Column '{}' is not an enumerable type", args.column);
        }
        ClusterOutcome::Error => {
            warn!(
                "Column '{}' could not be formatted under its configured format",
                args.column
            );
        }
    }
    Ok(())
}

fn handle_filter(args: &FilterArgs) -> Result<()> {
    let (mut view, _) = load_view(
        &args.input,
        args.columns.as_deref(),
        args.delimiter,
        args.input_encoding.as_deref(),
    )?;
    let headers = view.column_names().to_vec();

    let mut view_settings = match &args.settings {
        Some(path) if path.exists() => settings::ViewSettings::load(path)
            .with_context(|| format!("Loading view settings {path:?}"))?,
        _ => settings::ViewSettings::default(),
    };
    let mut composer = view_settings.composer(headers.clone());

    for term in &args.terms {
        let (column, expression) = split_term(term)?;
        require_column(&headers, column)?;
        composer.set_logic(column, ColumnFilterLogic::new(expression));
    }
    for spec in &args.any_of {
        let (column, values) = split_term(spec)?;
        require_column(&headers, column)?;
        let catalogue = pick_list_from_values(values);
        if let Some(expression) = any_of_expression(column, &catalogue) {
            let mut logic = ColumnFilterLogic::new(expression);
            logic.catalogue = Some(catalogue);
            composer.set_logic(column, logic);
        }
    }

    let changed = composer.apply_filters(&mut view)?;
    info!(
        "Filter {}; {} of {} row(s) visible",
        if changed { "applied" } else { "unchanged" },
        view.visible_count(),
        view.row_count()
    );

    if args.table {
        let alignments: Vec<Alignment> = view
            .formats()
            .iter()
            .map(|f| Alignment::for_format(f.as_ref()))
            .collect();
        let rows: Vec<Vec<String>> = (0..view.visible_count().min(args.limit))
            .filter_map(|index| view.display_row(index))
            .collect();
        print_table(&headers, &rows, &alignments);
        if view.visible_count() > args.limit {
            info!("Showing {} of {} row(s)", args.limit, view.visible_count());
        }
    } else {
        println!("{}", view.visible_count());
    }

    if let Some(path) = &args.settings {
        view_settings.capture_filters(&composer);
        view_settings
            .save(path)
            .with_context(|| format!("Writing view settings {path:?}"))?;
        info!("View settings written to {path:?}");
    }
    Ok(())
}

fn split_term(term: &str) -> Result<(&str, &str)> {
    let (column, rest) = term
        .split_once(':')
        .with_context(|| format!("Term '{term}' must look like 'column: expression'"))?;
    let column = column.trim();
    let rest = rest.trim();
    anyhow::ensure!(
        !column.is_empty() && !rest.is_empty(),
        "Term '{term}' must look like 'column: expression'"
    );
    Ok((column, rest))
}

fn require_column(headers: &[String], column: &str) -> Result<()> {
    if headers.iter().any(|h| h.eq_ignore_ascii_case(column)) {
        Ok(())
    } else {
        Err(EngineError::ColumnNotFound(column.to_string()).into())
    }
}

/// Turns a `v1; v2` list into an all-active pick list so the "any of"
/// expression builder can be reused from the command line.
fn pick_list_from_values(values: &str) -> ClusterCatalogue {
    let clusters = values
        .split(';')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|value| ValueCluster {
            display_text: value.to_string(),
            source_value: None,
            count: 0,
            active: true,
        })
        .collect();
    ClusterCatalogue {
        outcome: ClusterOutcome::ListFilled,
        clusters,
    }
}
