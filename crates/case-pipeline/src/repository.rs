//! In-memory case storage

use std::collections::HashMap;

use async_trait::async_trait;
use shared_types::CaseSummary;
use tokio::sync::RwLock;

use crate::error::{PipelineError, Result};
use crate::traits::CaseRepository;

#[derive(Debug, Default)]
pub struct InMemoryCaseRepository {
    cases: RwLock<HashMap<String, CaseSummary>>,
}

impl InMemoryCaseRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.cases.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.cases.read().await.is_empty()
    }
}

#[async_trait]
impl CaseRepository for InMemoryCaseRepository {
    async fn create(&self, case_id: &str, summary: CaseSummary) -> Result<()> {
        let mut cases = self.cases.write().await;
        if cases.contains_key(case_id) {
            return Err(PipelineError::CaseExists(case_id.to_string()));
        }
        cases.insert(case_id.to_string(), summary);
        Ok(())
    }

    async fn get(&self, case_id: &str) -> Result<Option<CaseSummary>> {
        Ok(self.cases.read().await.get(case_id).cloned())
    }

    async fn update(&self, case_id: &str, summary: CaseSummary) -> Result<()> {
        self.cases.write().await.insert(case_id.to_string(), summary);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::Owner;

    fn summary(name: &str) -> CaseSummary {
        CaseSummary {
            owner: Owner {
                name: name.to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = InMemoryCaseRepository::new();
        assert!(repo.is_empty().await);

        repo.create("case-1", summary("홍길동")).await.unwrap();

        let stored = repo.get("case-1").await.unwrap().unwrap();
        assert_eq!(stored.owner.name, "홍길동");
        assert!(repo.get("case-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_create_is_rejected() {
        let repo = InMemoryCaseRepository::new();
        repo.create("case-1", summary("홍길동")).await.unwrap();

        let result = repo.create("case-1", summary("김철수")).await;
        assert!(matches!(result, Err(PipelineError::CaseExists(_))));
        assert_eq!(repo.get("case-1").await.unwrap().unwrap().owner.name, "홍길동");
    }

    #[tokio::test]
    async fn test_update_replaces() {
        let repo = InMemoryCaseRepository::new();
        repo.update("case-1", summary("홍길동")).await.unwrap();
        repo.update("case-1", summary("김철수")).await.unwrap();

        assert_eq!(repo.len().await, 1);
        assert_eq!(repo.get("case-1").await.unwrap().unwrap().owner.name, "김철수");
    }
}
