//! Case study catalog, loaded once at start-up from a JSON file.
//!
//! File shape: `{ "<key>": { "name", "objective", "process_answer": [..],
//! "key_considerations_answer": [..] } }`.

pub mod handlers;

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseStudy {
    #[serde(skip_deserializing)]
    pub key: String,
    pub name: String,
    pub objective: String,
    #[serde(default)]
    pub process_answer: Vec<String>,
    #[serde(default)]
    pub key_considerations_answer: Vec<String>,
}

/// Read-only mapping of case key → case study, ordered by key.
#[derive(Debug, Clone, Default)]
pub struct CaseCatalog {
    cases: BTreeMap<String, CaseStudy>,
}

impl CaseCatalog {
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: BTreeMap<String, CaseStudy> =
            serde_json::from_str(json).context("case studies must be a JSON object keyed by case")?;

        let cases = raw
            .into_iter()
            .map(|(key, mut case)| {
                case.key = key.clone();
                (key, case)
            })
            .collect();

        Ok(Self { cases })
    }

    /// Loads the catalog from `path`. A missing or invalid file yields an empty
    /// catalog and an error log; the service still starts.
    pub fn load(path: &Path) -> Self {
        let loaded = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))
            .and_then(|json| Self::from_json(&json));

        match loaded {
            Ok(catalog) => {
                info!(
                    "Loaded {} case studies from {}",
                    catalog.len(),
                    path.display()
                );
                catalog
            }
            Err(e) => {
                error!("No case studies found: {e:#}");
                Self::default()
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&CaseStudy> {
        self.cases.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CaseStudy> {
        self.cases.values()
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

#[cfg(test)]
pub(crate) const SAMPLE_CATALOG: &str = r#"{
    "cloud_migration": {
        "name": "Cloud Migration",
        "objective": "Define a framework to migrate 200 on-premise applications to the cloud.",
        "process_answer": ["Assess the application portfolio", "Plan migration waves", "Execute and validate"],
        "key_considerations_answer": ["Legacy dependencies", "Downtime windows", "Cost control"]
    },
    "disaster_recovery": {
        "name": "Disaster Recovery",
        "objective": "Design a DR strategy for a payments platform.",
        "process_answer": ["Define RTO and RPO", "Choose replication topology"],
        "key_considerations_answer": ["Regulatory constraints"]
    }
}"#;
