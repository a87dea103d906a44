//! Value clustering: enumerates the distinct formatted values of one column
//! so a filter UI can offer an "any of" pick list.

use anyhow::Result;
use itertools::Itertools;
use log::{debug, warn};

use crate::{
    format::{DataKind, ValueFormat},
    source::RowSource,
    value::{ComparableValue, Value},
};

pub const DEFAULT_MAX_DISTINCT_VALUES: usize = 40;

/// One distinct formatted value with its occurrence count. `active` is the
/// only field mutated after construction (pick-list checkboxes).
#[derive(Debug, Clone, PartialEq)]
pub struct ValueCluster {
    pub display_text: String,
    /// Typed value when the column format parses it, raw-text `None` for
    /// plain string columns.
    pub source_value: Option<Value>,
    pub count: usize,
    pub active: bool,
}

/// Classification of a clustering pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterOutcome {
    /// A value failed to format/parse under the column format. Advisory
    /// data, so this is an outcome rather than a propagated error.
    Error,
    /// The column type is not enumerable (binary payloads, rewrite-only
    /// text formats).
    WrongType,
    /// Distinct count exceeded the cap; the catalogue is deliberately left
    /// empty rather than truncated.
    TooManyValues,
    NoValues,
    ListFilled,
}

/// Ranking applied to a filled catalogue. Value ordering compares typed
/// values where available, so `2` sorts before `10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClusterRank {
    #[default]
    FrequencyDescending,
    ValueAscending,
}

#[derive(Debug, Clone)]
pub struct ClusterCatalogue {
    pub outcome: ClusterOutcome,
    pub clusters: Vec<ValueCluster>,
}

impl ClusterCatalogue {
    fn bare(outcome: ClusterOutcome) -> Self {
        Self {
            outcome,
            clusters: Vec::new(),
        }
    }

    /// Display texts of the currently checked entries.
    pub fn active_texts(&self) -> Vec<&str> {
        self.clusters
            .iter()
            .filter(|c| c.active)
            .map(|c| c.display_text.as_str())
            .collect()
    }
}

fn is_clusterable(kind: DataKind) -> bool {
    !matches!(kind, DataKind::Binary | DataKind::TextReplace)
}

/// Scans the source and builds the distinct-value catalogue for `column`.
///
/// The source is expected to already reflect any applied filter; clustering
/// sees exactly the rows the grid shows. Only a source read failure
/// propagates as `Err` — everything else is encoded in the outcome.
pub fn build(
    source: &mut dyn RowSource,
    column: usize,
    format: Option<&ValueFormat>,
    max_distinct_values: usize,
    rank: ClusterRank,
) -> Result<ClusterCatalogue> {
    if let Some(format) = format
        && !is_clusterable(format.kind)
    {
        return Ok(ClusterCatalogue::bare(ClusterOutcome::WrongType));
    }

    let mut clusters: Vec<ValueCluster> = Vec::new();
    while source.read()? {
        let Some(raw) = source.value(column) else { continue };
        if raw.trim().is_empty() {
            continue;
        }

        let (display_text, source_value) = match format {
            Some(format) => match format.parse(raw) {
                Ok(Some(value)) => (format.format_value(&value), Some(value)),
                Ok(None) => continue,
                Err(error) => {
                    warn!("cluster scan failed to format {raw:?}: {error:#}");
                    return Ok(ClusterCatalogue::bare(ClusterOutcome::Error));
                }
            },
            None => (raw.to_string(), None),
        };

        if let Some(cluster) = clusters.iter_mut().find(|c| c.display_text == display_text) {
            cluster.count += 1;
        } else {
            if clusters.len() >= max_distinct_values {
                return Ok(ClusterCatalogue::bare(ClusterOutcome::TooManyValues));
            }
            clusters.push(ValueCluster {
                display_text,
                source_value,
                count: 1,
                active: false,
            });
        }
    }

    if clusters.is_empty() {
        return Ok(ClusterCatalogue::bare(ClusterOutcome::NoValues));
    }

    clusters = match rank {
        ClusterRank::FrequencyDescending => clusters
            .into_iter()
            .sorted_by(|a, b| {
                b.count
                    .cmp(&a.count)
                    .then_with(|| a.display_text.cmp(&b.display_text))
            })
            .collect(),
        ClusterRank::ValueAscending => clusters
            .into_iter()
            .sorted_by(|a, b| {
                ComparableValue(a.source_value.clone())
                    .cmp(&ComparableValue(b.source_value.clone()))
                    .then_with(|| a.display_text.cmp(&b.display_text))
            })
            .collect(),
    };

    debug!("clustered column {column} into {} value(s)", clusters.len());
    Ok(ClusterCatalogue {
        outcome: ClusterOutcome::ListFilled,
        clusters,
    })
}
