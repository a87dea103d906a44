//! View settings persistence: column visibility, widths, sort order, and
//! the active filters, stored as YAML.

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::compose::{ColumnFilterLogic, FilterComposer};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnViewSettings {
    pub name: String,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<usize>,
}

fn default_visible() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SortSettings {
    pub column: String,
    #[serde(default)]
    pub direction: SortDirection,
}

/// One persisted filter entry; expressions are stored verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveFilter {
    pub column: String,
    pub expression: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewSettings {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<ColumnViewSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortSettings>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<ActiveFilter>,
}

impl ViewSettings {
    pub fn load(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("Opening view settings {path:?}"))?;
        let reader = BufReader::new(file);
        serde_yaml::from_reader(reader).context("Parsing view settings YAML")
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file =
            File::create(path).with_context(|| format!("Creating view settings {path:?}"))?;
        serde_yaml::to_writer(file, self).context("Writing view settings YAML")
    }

    /// Seeds a composer with the persisted filters, all active.
    pub fn composer(&self, display_order: Vec<String>) -> FilterComposer {
        let mut composer = FilterComposer::new(display_order);
        for filter in &self.filters {
            composer.set_logic(&filter.column, ColumnFilterLogic::new(&*filter.expression));
        }
        composer
    }

    /// Captures the composer's active filters back for persistence.
    pub fn capture_filters(&mut self, composer: &FilterComposer) {
        self.filters = composer
            .active_logic()
            .into_iter()
            .map(|(column, logic)| ActiveFilter {
                column: column.to_string(),
                expression: logic.expression.clone(),
            })
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_round_trip_through_yaml() {
        let settings = ViewSettings {
            columns: vec![ColumnViewSettings {
                name: "city".to_string(),
                visible: false,
                width: Some(12),
            }],
            sort: Some(SortSettings {
                column: "city".to_string(),
                direction: SortDirection::Descending,
            }),
            filters: vec![ActiveFilter {
                column: "city".to_string(),
                expression: "city = 'Oslo'".to_string(),
            }],
        };
        let yaml = serde_yaml::to_string(&settings).unwrap();
        let loaded: ViewSettings = serde_yaml::from_str(&yaml).unwrap();
        assert!(!loaded.columns[0].visible);
        assert_eq!(loaded.filters[0].expression, "city = 'Oslo'");
    }

    #[test]
    fn composer_round_trip_preserves_filters() {
        let settings = ViewSettings {
            filters: vec![ActiveFilter {
                column: "amount".to_string(),
                expression: "amount > 5".to_string(),
            }],
            ..ViewSettings::default()
        };
        let composer = settings.composer(vec!["amount".to_string()]);
        assert_eq!(composer.combined_expression(), "(amount > 5)");

        let mut captured = ViewSettings::default();
        captured.capture_filters(&composer);
        assert_eq!(captured.filters.len(), 1);
        assert_eq!(captured.filters[0].column, "amount");
    }
}
