//! Persisted column configuration: per-column value formats and ignore
//! flags, stored as YAML next to the data file.

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::{format::ValueFormat, infer::GuessResult};

const CURRENT_CONFIG_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_format: Option<ValueFormat>,
    /// Ignored columns are skipped by inference and clustering.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub ignore: bool,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value_format: None,
            ignore: false,
        }
    }

    /// Commits an accepted inference result. The possible match is taken
    /// only when there was no outright winner.
    pub fn accept_guess(&mut self, guess: &GuessResult) {
        if let Some(format) = &guess.found_format {
            self.value_format = Some(format.clone());
        } else if let Some(format) = &guess.possible_match {
            self.value_format = Some(format.clone());
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_version: Option<String>,
    pub columns: Vec<Column>,
}

impl ColumnSet {
    pub fn from_names(names: &[String]) -> Self {
        Self {
            config_version: Some(CURRENT_CONFIG_VERSION.to_string()),
            columns: names.iter().map(Column::new).collect(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening column file {path:?}"))?;
        let reader = BufReader::new(file);
        let set: ColumnSet =
            serde_yaml::from_reader(reader).context("Parsing column YAML")?;
        set.validate()?;
        Ok(set)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let mut set = self.clone();
        if set.config_version.is_none() {
            set.config_version = Some(CURRENT_CONFIG_VERSION.to_string());
        }
        set.validate()?;
        let file =
            File::create(path).with_context(|| format!("Creating column file {path:?}"))?;
        serde_yaml::to_writer(file, &set).context("Writing column YAML")
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Serializing columns to YAML string")
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns
            .iter_mut()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Positional formats for binding a [`crate::view::DataView`].
    pub fn formats_for(&self, headers: &[String]) -> Vec<Option<ValueFormat>> {
        headers
            .iter()
            .map(|header| {
                self.column(header)
                    .filter(|c| !c.ignore)
                    .and_then(|c| c.value_format.clone())
            })
            .collect()
    }

    fn validate(&self) -> Result<()> {
        for (index, column) in self.columns.iter().enumerate() {
            if column.name.trim().is_empty() {
                bail!("Column {index} has an empty name");
            }
            let duplicate = self.columns[..index]
                .iter()
                .any(|earlier| earlier.name.eq_ignore_ascii_case(&column.name));
            if duplicate {
                bail!("Duplicate column name '{}'", column.name);
            }
        }
        Ok(())
    }
}
