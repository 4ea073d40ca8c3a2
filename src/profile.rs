//! Import profiles: parse settings plus column interpretations, saved as
//! YAML so a corrected batch setup can be replayed on the next export drop.

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{columns::ColumnInterpretation, parse::ParseSettings, sniff::Separator};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportProfile {
    pub separator: Separator,
    pub header_row: usize,
    pub columns: Vec<ColumnInterpretation>,
}

impl ImportProfile {
    pub fn from_parts(settings: ParseSettings, columns: &[ColumnInterpretation]) -> Self {
        Self {
            separator: settings.separator,
            header_row: settings.header_row,
            columns: columns.to_vec(),
        }
    }

    pub fn settings(&self) -> ParseSettings {
        ParseSettings {
            separator: self.separator,
            header_row: self.header_row,
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file =
            File::create(path).with_context(|| format!("Creating profile file {path:?}"))?;
        serde_yaml::to_writer(file, self).context("Writing profile YAML")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening profile file {path:?}"))?;
        let reader = BufReader::new(file);
        let profile = serde_yaml::from_reader(reader).context("Parsing profile YAML")?;
        Ok(profile)
    }
}
