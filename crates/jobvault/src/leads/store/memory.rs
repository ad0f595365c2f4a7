use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::leads::domain::{LeadId, LeadRecord, LeadStatus, NewLead};
use crate::leads::repository::{LeadRepository, RepositoryError};

/// Process-local lead table. Backs the demo, the tests, and deployments that
/// run without a hosted table.
#[derive(Debug, Default, Clone)]
pub struct InMemoryLeadRepository {
    state: Arc<RwLock<MemoryTable>>,
}

#[derive(Debug, Default)]
struct MemoryTable {
    next_id: u64,
    rows: Vec<LeadRecord>,
}

impl MemoryTable {
    fn allocate_id(&mut self) -> LeadId {
        self.next_id += 1;
        LeadId(self.next_id.to_string())
    }

    fn row_mut(&mut self, id: &LeadId) -> Result<&mut LeadRecord, RepositoryError> {
        self.rows
            .iter_mut()
            .find(|record| &record.id == id)
            .ok_or(RepositoryError::NotFound)
    }
}

impl InMemoryLeadRepository {
    /// Seed the table with existing rows. Later inserts continue numbering
    /// after the highest numeric identifier present.
    pub fn with_records(records: Vec<LeadRecord>) -> Self {
        let next_id = records
            .iter()
            .filter_map(|record| record.id.0.parse::<u64>().ok())
            .max()
            .unwrap_or(0);

        Self {
            state: Arc::new(RwLock::new(MemoryTable {
                next_id,
                rows: records,
            })),
        }
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl LeadRepository for InMemoryLeadRepository {
    async fn insert(&self, lead: NewLead) -> Result<LeadRecord, RepositoryError> {
        let mut table = self.state.write().await;
        let id = table.allocate_id();
        let record = LeadRecord::new(id, lead);
        table.rows.push(record.clone());
        Ok(record)
    }

    async fn list(&self) -> Result<Vec<LeadRecord>, RepositoryError> {
        let table = self.state.read().await;
        let mut rows = table.rows.clone();
        rows.sort_by(|a, b| b.submitted_at().cmp(&a.submitted_at()));
        Ok(rows)
    }

    async fn fetch(&self, id: &LeadId) -> Result<Option<LeadRecord>, RepositoryError> {
        let table = self.state.read().await;
        Ok(table.rows.iter().find(|record| &record.id == id).cloned())
    }

    async fn update_status(
        &self,
        id: &LeadId,
        status: LeadStatus,
    ) -> Result<LeadRecord, RepositoryError> {
        let mut table = self.state.write().await;
        let row = table.row_mut(id)?;
        row.lead.status = status;
        Ok(row.clone())
    }

    async fn update_notes(&self, id: &LeadId, notes: &str) -> Result<LeadRecord, RepositoryError> {
        let mut table = self.state.write().await;
        let row = table.row_mut(id)?;
        row.lead.notes = notes.to_string();
        Ok(row.clone())
    }

    async fn delete(&self, id: &LeadId) -> Result<(), RepositoryError> {
        let mut table = self.state.write().await;
        let before = table.rows.len();
        table.rows.retain(|record| &record.id != id);
        if table.rows.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn check_connection(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leads::store::fixtures::mock_leads;

    #[tokio::test]
    async fn seeded_tables_continue_numbering() {
        let seeded = mock_leads();
        let highest = seeded.len();
        let repository = InMemoryLeadRepository::with_records(seeded);

        let template = mock_leads().remove(0).lead;
        let inserted = repository.insert(template).await.expect("insert succeeds");
        assert_eq!(inserted.id, LeadId((highest + 1).to_string()));
        assert_eq!(repository.len().await, highest + 1);
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let repository = InMemoryLeadRepository::with_records(mock_leads());
        let rows = repository.list().await.expect("list succeeds");
        assert!(rows
            .windows(2)
            .all(|pair| pair[0].submitted_at() >= pair[1].submitted_at()));
    }

    #[tokio::test]
    async fn mutations_on_missing_rows_report_not_found() {
        let repository = InMemoryLeadRepository::default();
        let missing = LeadId::from("404");

        assert!(matches!(
            repository
                .update_status(&missing, LeadStatus::Processed)
                .await,
            Err(RepositoryError::NotFound)
        ));
        assert!(matches!(
            repository.update_notes(&missing, "call back").await,
            Err(RepositoryError::NotFound)
        ));
        assert!(matches!(
            repository.delete(&missing).await,
            Err(RepositoryError::NotFound)
        ));
    }
}
