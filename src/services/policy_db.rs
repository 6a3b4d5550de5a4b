use anyhow::Result;
use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::{bson::doc, Collection, Database};
use serde::{Deserialize, Serialize};

/// The two rule-database reads the session controller needs.
#[async_trait]
pub trait PolicyDb: Send + Sync {
    /// Rule ids and base names that every session gets.
    async fn get_omnipresent_rules(&self) -> Result<(Vec<String>, Vec<String>)>;

    async fn get_rule_ids_for_base_names(&self, base_names: &[String]) -> Result<Vec<String>>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OmnipresentRulesDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub rule_ids: Vec<String>,
    #[serde(default)]
    pub base_names: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BaseNameDocument {
    #[serde(rename = "_id")]
    pub name: String,
    #[serde(default)]
    pub rule_names: Vec<String>,
}

const OMNIPRESENT_RULES_COLLECTION: &str = "omnipresent_rules";
const BASE_NAMES_COLLECTION: &str = "base_names";
const NETWORK_WIDE_ID: &str = "network_wide";

pub struct MongoPolicyDb {
    db: Database,
}

impl MongoPolicyDb {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PolicyDb for MongoPolicyDb {
    async fn get_omnipresent_rules(&self) -> Result<(Vec<String>, Vec<String>)> {
        let collection: Collection<OmnipresentRulesDocument> =
            self.db.collection(OMNIPRESENT_RULES_COLLECTION);

        let document = collection
            .find_one(doc! { "_id": NETWORK_WIDE_ID })
            .await?
            .unwrap_or_default();

        Ok((document.rule_ids, document.base_names))
    }

    async fn get_rule_ids_for_base_names(&self, base_names: &[String]) -> Result<Vec<String>> {
        if base_names.is_empty() {
            return Ok(Vec::new());
        }

        let collection: Collection<BaseNameDocument> = self.db.collection(BASE_NAMES_COLLECTION);
        let documents: Vec<BaseNameDocument> = collection
            .find(doc! { "_id": { "$in": base_names.to_vec() } })
            .await?
            .try_collect()
            .await?;

        let mut rule_ids = Vec::new();
        for name in base_names {
            if let Some(document) = documents.iter().find(|d| &d.name == name) {
                for rule in &document.rule_names {
                    if !rule_ids.contains(rule) {
                        rule_ids.push(rule.clone());
                    }
                }
            }
        }
        Ok(rule_ids)
    }
}

/// Omnipresent rule ids plus the rules behind the omnipresent base names.
/// A failing read only loses its own part.
pub async fn omnipresent_rule_ids(policy_db: &dyn PolicyDb) -> Vec<String> {
    let (mut rule_ids, base_names) = match policy_db.get_omnipresent_rules().await {
        Ok(rules) => rules,
        Err(e) => {
            tracing::error!("Failed to read omnipresent rules: {}", e);
            return Vec::new();
        }
    };

    match policy_db.get_rule_ids_for_base_names(&base_names).await {
        Ok(resolved) => {
            for rule_id in resolved {
                if !rule_ids.contains(&rule_id) {
                    rule_ids.push(rule_id);
                }
            }
        }
        Err(e) => {
            tracing::error!(
                "Failed to resolve omnipresent base names {:?}: {}",
                base_names,
                e
            );
        }
    }

    rule_ids
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;

    /// In-memory rule database used by the controller tests.
    #[derive(Default)]
    pub struct FakePolicyDb {
        pub rule_ids: Vec<String>,
        pub base_names: Vec<String>,
        pub base_name_rules: HashMap<String, Vec<String>>,
        pub fail_base_names: bool,
    }

    #[async_trait]
    impl PolicyDb for FakePolicyDb {
        async fn get_omnipresent_rules(&self) -> Result<(Vec<String>, Vec<String>)> {
            Ok((self.rule_ids.clone(), self.base_names.clone()))
        }

        async fn get_rule_ids_for_base_names(&self, base_names: &[String]) -> Result<Vec<String>> {
            if self.fail_base_names {
                return Err(anyhow::anyhow!("base name lookup failed"));
            }
            Ok(base_names
                .iter()
                .filter_map(|name| self.base_name_rules.get(name))
                .flatten()
                .cloned()
                .collect())
        }
    }

    #[tokio::test]
    async fn test_omnipresent_rules_include_base_names() {
        let db = FakePolicyDb {
            rule_ids: vec!["omni1".to_string()],
            base_names: vec!["bn1".to_string()],
            base_name_rules: HashMap::from([(
                "bn1".to_string(),
                vec!["omni1".to_string(), "bn_rule1".to_string()],
            )]),
            ..Default::default()
        };
        assert_eq!(omnipresent_rule_ids(&db).await, vec!["omni1", "bn_rule1"]);
    }

    #[tokio::test]
    async fn test_base_name_failure_keeps_rule_ids() {
        let db = FakePolicyDb {
            rule_ids: vec!["omni1".to_string()],
            base_names: vec!["bn1".to_string()],
            fail_base_names: true,
            ..Default::default()
        };
        assert_eq!(omnipresent_rule_ids(&db).await, vec!["omni1"]);
    }
}
