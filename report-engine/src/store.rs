//! FILENAME: report-engine/src/store.rs
//! PURPOSE: Persistence seam for report definitions, plus access checks.
//! CONTEXT: The executor only needs get/insert/update/remove/all, so a
//! document-store backed implementation can replace `MemoryReportStore`
//! without touching execution code.

use crate::definition::{PermissionLevel, Report, ReportId, ReportPatch};
use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;

pub trait ReportStore {
    fn get(&self, id: &str) -> Option<Report>;

    /// Inserts a report, replacing any report with the same id.
    fn insert(&mut self, report: Report);

    /// Applies a patch and returns the updated report.
    fn update(&mut self, id: &str, patch: &ReportPatch, at: DateTime<Utc>) -> Option<Report>;

    fn remove(&mut self, id: &str) -> Option<Report>;

    /// Every stored report, oldest first.
    fn all(&self) -> Vec<Report>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryReportStore {
    reports: FxHashMap<ReportId, Report>,
}

impl MemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reports(reports: impl IntoIterator<Item = Report>) -> Self {
        let mut store = Self::new();
        for report in reports {
            store.insert(report);
        }
        store
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}

impl ReportStore for MemoryReportStore {
    fn get(&self, id: &str) -> Option<Report> {
        self.reports.get(id).cloned()
    }

    fn insert(&mut self, report: Report) {
        self.reports.insert(report.id.clone(), report);
    }

    fn update(&mut self, id: &str, patch: &ReportPatch, at: DateTime<Utc>) -> Option<Report> {
        let report = self.reports.get_mut(id)?;
        patch.apply(report, at);
        Some(report.clone())
    }

    fn remove(&mut self, id: &str) -> Option<Report> {
        self.reports.remove(id)
    }

    fn all(&self) -> Vec<Report> {
        let mut reports: Vec<Report> = self.reports.values().cloned().collect();
        reports.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        reports
    }
}

// ============================================================================
// ACCESS CHECKS
// ============================================================================

pub fn can_view(report: &Report, user: &str) -> bool {
    report.permission_for(user).is_some()
}

pub fn can_edit(report: &Report, user: &str) -> bool {
    report
        .permission_for(user)
        .is_some_and(|level| level >= PermissionLevel::Edit)
}

pub fn can_admin(report: &Report, user: &str) -> bool {
    report.permission_for(user) == Some(PermissionLevel::Admin)
}
