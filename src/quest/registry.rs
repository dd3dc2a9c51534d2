//! Quest Registry
//!
//! Loads and caches quest definitions from TOML files, and builds live
//! helpers from them.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::definition::{QuestDefinition, RawQuestFile};
use super::helper::QuestHelper;
use crate::session::StepContext;

/// Registry for all quest definitions
pub struct QuestRegistry {
    /// Loaded quest definitions
    quests: RwLock<HashMap<String, Arc<QuestDefinition>>>,
    /// Base directory for quest data
    data_dir: PathBuf,
}

impl QuestRegistry {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            quests: RwLock::new(HashMap::new()),
            data_dir: data_dir.join("quests"),
        }
    }

    /// Load all quest definitions from the data directory.
    ///
    /// Files that fail to parse are skipped with a warning.
    pub async fn load_all(&self) -> Result<usize, String> {
        info!("Loading quests from {:?}", self.data_dir);

        if !self.data_dir.exists() {
            warn!("Quest directory does not exist: {:?}", self.data_dir);
            return Ok(0);
        }

        // Collect all TOML files first (sync), then load them (async)
        let mut paths = Vec::new();
        collect_toml_files(&self.data_dir, &mut paths)?;
        paths.sort();

        let mut count = 0;
        for path in paths {
            match self.load_quest_file(&path).await {
                Ok(()) => count += 1,
                Err(e) => warn!("Failed to load quest {:?}: {}", path, e),
            }
        }

        info!("Loaded {} quest definitions", count);
        Ok(count)
    }

    async fn load_quest_file(&self, path: &Path) -> Result<(), String> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read {:?}: {}", path, e))?;

        let raw: RawQuestFile = toml::from_str(&content)
            .map_err(|e| format!("Failed to parse {:?}: {}", path, e))?;

        let quest = QuestDefinition::from_raw(&raw.quest)?;
        let quest_id = quest.id.clone();

        let mut quests = self.quests.write().await;
        if quests.contains_key(&quest_id) {
            warn!("Quest '{}' defined again in {:?}, replacing", quest_id, path);
        }

        info!(
            "Loaded quest: {} ({}, {} steps)",
            quest.name,
            quest_id,
            quest.step_count()
        );
        quests.insert(quest_id, Arc::new(quest));

        Ok(())
    }

    /// Get a quest by ID
    pub async fn get(&self, quest_id: &str) -> Option<Arc<QuestDefinition>> {
        let quests = self.quests.read().await;
        quests.get(quest_id).cloned()
    }

    /// Get all quest IDs, sorted
    pub async fn all_ids(&self) -> Vec<String> {
        let quests = self.quests.read().await;
        let mut ids: Vec<String> = quests.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Get count of loaded quests
    pub async fn count(&self) -> usize {
        self.quests.read().await.len()
    }

    /// Build a live helper for a loaded quest. The helper is not started.
    pub async fn build(&self, quest_id: &str, ctx: &StepContext) -> Result<QuestHelper, String> {
        let quest = self
            .get(quest_id)
            .await
            .ok_or_else(|| format!("Quest '{}' not found", quest_id))?;

        Ok(QuestHelper::from_definition(&quest, ctx))
    }
}

/// Recursively collect TOML files under a directory
fn collect_toml_files(dir: &Path, paths: &mut Vec<PathBuf>) -> Result<(), String> {
    let entries =
        std::fs::read_dir(dir).map_err(|e| format!("Failed to read directory {:?}: {}", dir, e))?;

    for entry in entries {
        let entry = entry.map_err(|e| format!("Failed to read entry: {}", e))?;
        let path = entry.path();

        if path.is_dir() {
            collect_toml_files(&path, paths)?;
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            paths.push(path);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestHost;
    use tempfile::TempDir;

    fn create_test_quest_toml() -> &'static str {
        r#"
[quest]
id = "rune_mysteries"
name = "Rune Mysteries"
description = "Deliver the talisman."

[[quest.steps]]
id = "duke"
text = "Talk to Duke Horacio."
dialog = ["Have you any quests for me?", "Sure, no problem."]
done_when = { type = "variable", id = 63, op = "ge", value = 1 }

[[quest.steps]]
id = "sedridor"
text = "Bring the talisman to Sedridor."
"#
    }

    fn quest_dir() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let quest_dir = temp_dir.path().join("quests").join("free");
        std::fs::create_dir_all(&quest_dir).unwrap();
        std::fs::write(quest_dir.join("rune_mysteries.toml"), create_test_quest_toml()).unwrap();
        temp_dir
    }

    #[tokio::test]
    async fn test_load_quest() {
        let temp_dir = quest_dir();

        let registry = QuestRegistry::new(temp_dir.path());
        assert_eq!(registry.load_all().await.unwrap(), 1);

        let quest = registry.get("rune_mysteries").await.unwrap();
        assert_eq!(quest.name, "Rune Mysteries");
        assert_eq!(quest.steps.len(), 2);
        assert_eq!(registry.all_ids().await, vec!["rune_mysteries".to_string()]);
    }

    #[tokio::test]
    async fn test_broken_files_skipped() {
        let temp_dir = quest_dir();
        std::fs::write(temp_dir.path().join("quests").join("broken.toml"), "[quest\nid =").unwrap();
        std::fs::write(temp_dir.path().join("quests").join("notes.txt"), "ignored").unwrap();

        let registry = QuestRegistry::new(temp_dir.path());
        assert_eq!(registry.load_all().await.unwrap(), 1);
        assert_eq!(registry.count().await, 1);
    }

    #[tokio::test]
    async fn test_missing_directory_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let registry = QuestRegistry::new(temp_dir.path());

        assert_eq!(registry.load_all().await.unwrap(), 0);
        assert!(registry.get("rune_mysteries").await.is_none());
    }

    #[tokio::test]
    async fn test_build_helper() {
        let temp_dir = quest_dir();
        let registry = QuestRegistry::new(temp_dir.path());
        registry.load_all().await.unwrap();

        let host = TestHost::new();
        host.session.set_variable(63, 0);
        let helper = registry.build("rune_mysteries", &host.ctx).await.unwrap();
        assert_eq!(helper.name(), "Rune Mysteries");
        assert_eq!(helper.root().text(), "Deliver the talisman.");
        assert_eq!(helper.active_step().text(), "Talk to Duke Horacio.");

        let err = registry.build("dragon_slayer", &host.ctx).await.unwrap_err();
        assert!(err.contains("not found"));
    }
}
