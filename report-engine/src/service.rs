//! FILENAME: report-engine/src/service.rs
//! PURPOSE: Report management around the executor.
//! CONTEXT: Create/update/delete, listing and search, sharing, templates and
//! cache maintenance. Every operation that touches an existing report checks
//! the caller's access level first:
//!   view  - duplicate
//!   edit  - update
//!   admin - delete, share, unshare

use crate::cache::ResultCache;
use crate::definition::{
    NewReport, Report, ReportId, ReportPatch, ReportShare, ReportType,
};
use crate::executor::ReportExecutor;
use crate::error::ReportError;
use crate::sources::RowSourceProvider;
use crate::store::{can_admin, can_edit, can_view, ReportStore};
use engine::{log_info, Clock};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Listing options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportQuery {
    pub report_type: Option<ReportType>,
    pub include_templates: bool,
}

impl<S, C, P, K> ReportExecutor<S, C, P, K>
where
    S: ReportStore,
    C: ResultCache,
    P: RowSourceProvider,
    K: Clock,
{
    pub fn create_report(&mut self, new: NewReport, user: &str) -> Result<Report, ReportError> {
        new.config.validate()?;
        if new.name.trim().is_empty() {
            return Err(ReportError::Validation("report name is empty".to_string()));
        }

        let now = self.clock.now();
        let report = Report {
            id: Uuid::new_v4().to_string(),
            name: new.name,
            description: new.description,
            report_type: new.report_type,
            config: new.config,
            created_by: user.to_string(),
            is_public: new.is_public,
            shared_with: Vec::new(),
            cache_enabled: new.cache_enabled,
            cache_ttl: new.cache_ttl,
            is_template: new.is_template,
            created_at: now,
            updated_at: now,
            last_executed: None,
            execution_time: None,
        };
        self.store.insert(report.clone());

        log_info!("REPORT", "created report={} user={}", report.id, user);
        Ok(report)
    }

    pub fn get_report(&self, id: &str, user: &str) -> Result<Report, ReportError> {
        let report = self.load(id)?;
        if !can_view(&report, user) {
            return Err(ReportError::denied(user, "view", id));
        }
        Ok(report)
    }

    pub fn update_report(&mut self, id: &str, patch: &ReportPatch, user: &str) -> Result<Report, ReportError> {
        let report = self.load(id)?;
        if !can_edit(&report, user) {
            return Err(ReportError::denied(user, "edit", id));
        }
        if let Some(config) = &patch.config {
            config.validate()?;
        }

        let now = self.clock.now();
        let updated = self
            .store
            .update(id, patch, now)
            .ok_or_else(|| ReportError::NotFound(id.to_string()))?;

        // cached rows were produced by the old config
        if patch.config.is_some() {
            let purged = self.cache.remove_for_report(id);
            log_info!("CACHE", "config changed report={} purged={}", id, purged);
        }
        Ok(updated)
    }

    /// Deletes a report together with its cached results.
    pub fn delete_report(&mut self, id: &str, user: &str) -> Result<(), ReportError> {
        let report = self.load(id)?;
        if !can_admin(&report, user) {
            return Err(ReportError::denied(user, "delete", id));
        }

        self.store.remove(id);
        let purged = self.cache.remove_for_report(id);
        log_info!("REPORT", "deleted report={} cached_entries={} user={}", id, purged, user);
        Ok(())
    }

    /// Reports the user can see, newest first.
    pub fn list_reports(&self, user: &str, query: &ReportQuery) -> Vec<Report> {
        let mut reports: Vec<Report> = self
            .store
            .all()
            .into_iter()
            .filter(|r| can_view(r, user))
            .filter(|r| query.include_templates || !r.is_template)
            .filter(|r| query.report_type.map_or(true, |t| r.report_type == t))
            .collect();
        newest_first(&mut reports);
        reports
    }

    /// Case-insensitive match on name or description, newest first.
    pub fn search_reports(&self, user: &str, term: &str) -> Vec<Report> {
        let needle = term.trim().to_lowercase();
        let mut reports: Vec<Report> = self
            .store
            .all()
            .into_iter()
            .filter(|r| can_view(r, user))
            .filter(|r| {
                r.name.to_lowercase().contains(&needle)
                    || r
                        .description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(&needle))
            })
            .collect();
        newest_first(&mut reports);
        reports
    }

    /// Grants (or changes) a user's access level.
    pub fn share_report(&mut self, id: &str, user: &str, share: ReportShare) -> Result<Report, ReportError> {
        let mut report = self.load(id)?;
        if !can_admin(&report, user) {
            return Err(ReportError::denied(user, "share", id));
        }
        if share.user_id == report.created_by {
            return Err(ReportError::Validation("the owner already has full access".to_string()));
        }

        match report.shared_with.iter_mut().find(|s| s.user_id == share.user_id) {
            Some(existing) => existing.permission = share.permission,
            None => report.shared_with.push(share),
        }
        report.updated_at = self.clock.now();
        self.store.insert(report.clone());
        Ok(report)
    }

    pub fn unshare_report(&mut self, id: &str, user: &str, target: &str) -> Result<Report, ReportError> {
        let mut report = self.load(id)?;
        if !can_admin(&report, user) {
            return Err(ReportError::denied(user, "unshare", id));
        }

        let before = report.shared_with.len();
        report.shared_with.retain(|s| s.user_id != target);
        if report.shared_with.len() != before {
            report.updated_at = self.clock.now();
            self.store.insert(report.clone());
        }
        Ok(report)
    }

    /// All templates, oldest first.
    pub fn list_templates(&self) -> Vec<Report> {
        self.store.all().into_iter().filter(|r| r.is_template).collect()
    }

    /// Instantiates a template as a new private report owned by `user`.
    pub fn create_from_template(&mut self, template_id: &str, name: &str, user: &str) -> Result<Report, ReportError> {
        let template = self
            .store
            .get(template_id)
            .filter(|r| r.is_template)
            .ok_or_else(|| ReportError::TemplateNotFound(template_id.to_string()))?;

        let new = NewReport {
            name: name.to_string(),
            description: template.description,
            report_type: template.report_type,
            config: template.config,
            is_public: false,
            cache_enabled: template.cache_enabled,
            cache_ttl: template.cache_ttl,
            is_template: false,
        };
        self.create_report(new, user)
    }

    /// Copies a report the user can see. The copy is private and owned by `user`.
    pub fn duplicate_report(&mut self, id: &str, user: &str) -> Result<Report, ReportError> {
        let source = self.load(id)?;
        if !can_view(&source, user) {
            return Err(ReportError::denied(user, "duplicate", id));
        }

        let new = NewReport {
            name: format!("{} (Copy)", source.name),
            description: source.description,
            report_type: source.report_type,
            config: source.config,
            is_public: false,
            cache_enabled: source.cache_enabled,
            cache_ttl: source.cache_ttl,
            is_template: false,
        };
        self.create_report(new, user)
    }

    /// Drops expired cache entries. Returns how many were removed.
    pub fn cleanup_expired_cache(&mut self) -> usize {
        let removed = self.cache.sweep_expired(self.clock.now());
        if removed > 0 {
            log_info!("CACHE", "swept {} expired entries", removed);
        }
        removed
    }

    fn load(&self, id: &str) -> Result<Report, ReportError> {
        self.store.get(id).ok_or_else(|| ReportError::NotFound(ReportId::from(id)))
    }
}

fn newest_first(reports: &mut [Report]) {
    reports.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
}
