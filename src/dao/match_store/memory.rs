//! In-memory [`MatchStore`] used by the engine tests. Mirrors the backing
//! database semantics the services rely on: positional uniqueness on insert
//! and compare-and-swap on matchup updates.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::{
    match_store::MatchStore,
    models::{MatchupEntity, ScoreReportEntity, TournamentEntity, TournamentListItemEntity},
    storage::{StorageError, StorageResult},
};

#[derive(Default)]
struct MemoryInner {
    tournaments: HashMap<Uuid, TournamentEntity>,
    matches: HashMap<Uuid, MatchupEntity>,
    reports: HashMap<Uuid, ScoreReportEntity>,
}

/// Shared in-memory store handle.
#[derive(Clone, Default)]
pub struct MemoryMatchStore {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryMatchStore {
    /// Fresh empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryInner> {
        self.inner.lock().expect("memory store poisoned")
    }
}

impl MatchStore for MemoryMatchStore {
    fn insert_tournament(
        &self,
        tournament: TournamentEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.lock().tournaments.insert(tournament.id, tournament);
            Ok(())
        })
    }

    fn update_tournament(
        &self,
        tournament: TournamentEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        self.insert_tournament(tournament)
    }

    fn find_tournament(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<TournamentEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.lock().tournaments.get(&id).cloned()) })
    }

    fn list_tournaments(
        &self,
    ) -> BoxFuture<'static, StorageResult<Vec<TournamentListItemEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .lock()
                .tournaments
                .values()
                .cloned()
                .map(Into::into)
                .collect())
        })
    }

    fn delete_tournament(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let mut guard = store.lock();
            let removed = guard.tournaments.remove(&id).is_some();
            guard.matches.retain(|_, matchup| matchup.tournament_id != id);
            guard.reports.retain(|_, report| report.tournament_id != id);
            Ok(removed)
        })
    }

    fn insert_matches(
        &self,
        matches: Vec<MatchupEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let mut guard = store.lock();
            for matchup in matches {
                let duplicate = guard.matches.values().any(|existing| {
                    existing.tournament_id == matchup.tournament_id
                        && existing.round == matchup.round
                        && existing.match_number == matchup.match_number
                });
                if duplicate {
                    return Err(StorageError::conflict(format!(
                        "matchup position (tournament `{}`, round {}, match {}) already exists",
                        matchup.tournament_id, matchup.round, matchup.match_number
                    )));
                }
                guard.matches.insert(matchup.id, matchup);
            }
            Ok(())
        })
    }

    fn find_match(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<MatchupEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.lock().matches.get(&id).cloned()) })
    }

    fn find_match_at(
        &self,
        tournament_id: Uuid,
        round: u32,
        match_number: u32,
    ) -> BoxFuture<'static, StorageResult<Option<MatchupEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .lock()
                .matches
                .values()
                .find(|matchup| {
                    matchup.tournament_id == tournament_id
                        && matchup.round == round
                        && matchup.match_number == match_number
                })
                .cloned())
        })
    }

    fn list_matches(
        &self,
        tournament_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<MatchupEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let mut matches: Vec<MatchupEntity> = store
                .lock()
                .matches
                .values()
                .filter(|matchup| matchup.tournament_id == tournament_id)
                .cloned()
                .collect();
            matches.sort_by_key(|matchup| (matchup.round, matchup.match_number));
            Ok(matches)
        })
    }

    fn update_match(
        &self,
        matchup: MatchupEntity,
    ) -> BoxFuture<'static, StorageResult<MatchupEntity>> {
        let store = self.clone();
        Box::pin(async move {
            let mut guard = store.lock();
            let Some(existing) = guard.matches.get_mut(&matchup.id) else {
                return Err(StorageError::conflict(format!(
                    "matchup `{}` no longer exists",
                    matchup.id
                )));
            };
            if existing.version != matchup.version {
                return Err(StorageError::conflict(format!(
                    "matchup `{}` was modified concurrently (expected version {})",
                    matchup.id, matchup.version
                )));
            }
            let mut next = matchup;
            next.version += 1;
            *existing = next.clone();
            Ok(next)
        })
    }

    fn insert_report(&self, report: ScoreReportEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.lock().reports.insert(report.id, report);
            Ok(())
        })
    }

    fn find_report(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<ScoreReportEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.lock().reports.get(&id).cloned()) })
    }

    fn update_report(&self, report: ScoreReportEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.insert_report(report)
    }

    fn delete_report(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.lock().reports.remove(&id).is_some()) })
    }

    fn list_reports_for_match(
        &self,
        match_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<ScoreReportEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let mut reports: Vec<ScoreReportEntity> = store
                .lock()
                .reports
                .values()
                .filter(|report| report.match_id == match_id)
                .cloned()
                .collect();
            reports.sort_by_key(|report| report.created_at);
            Ok(reports)
        })
    }

    fn list_reports_for_tournament(
        &self,
        tournament_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<ScoreReportEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let mut reports: Vec<ScoreReportEntity> = store
                .lock()
                .reports
                .values()
                .filter(|report| report.tournament_id == tournament_id)
                .cloned()
                .collect();
            reports.sort_by_key(|report| report.created_at);
            Ok(reports)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
