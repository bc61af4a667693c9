//! Daily conversion counter persisted to a small JSON file.
//!
//! The stored record rolls over to zero whenever its date differs from the
//! current UTC day. All operations go through one async mutex, so concurrent
//! requests see a consistent count.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;

pub const DEFAULT_DAILY_LIMIT: u32 = 100;

#[derive(Debug, Error)]
pub enum QuotaError {
    #[error("failed to persist usage data: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode usage data: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct UsageRecord {
    date: NaiveDate,
    count: u32,
    #[serde(default)]
    limit: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuotaCheck {
    pub allowed: bool,
    pub remaining: u32,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UsageUpdate {
    pub used: u32,
    pub limit: u32,
    pub remaining: u32,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageInfo {
    pub date: NaiveDate,
    pub used: u32,
    pub limit: u32,
    pub remaining: u32,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuotaReset {
    pub success: bool,
    pub message: String,
    pub previous_count: u32,
    pub new_count: u32,
}

pub struct DailyQuota {
    path: PathBuf,
    limit: u32,
    record: Mutex<UsageRecord>,
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

impl DailyQuota {
    pub async fn load(path: impl Into<PathBuf>, limit: u32) -> Result<Self, QuotaError> {
        Self::load_on(path.into(), limit, today()).await
    }

    async fn load_on(path: PathBuf, limit: u32, today: NaiveDate) -> Result<Self, QuotaError> {
        let record = read_record(&path, limit, today).await;
        let quota = Self {
            path,
            limit,
            record: Mutex::new(record),
        };

        let used = {
            let mut record = quota.record.lock().await;
            quota.roll_over(&mut record, today).await?;
            quota.save(&record).await?;
            record.count
        };
        tracing::info!("Usage tracker initialized: {}/{} used today", used, limit);
        Ok(quota)
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub async fn check(&self) -> Result<QuotaCheck, QuotaError> {
        self.check_on(today()).await
    }

    async fn check_on(&self, today: NaiveDate) -> Result<QuotaCheck, QuotaError> {
        let mut record = self.record.lock().await;
        self.roll_over(&mut record, today).await?;

        let remaining = self.limit.saturating_sub(record.count);
        if remaining == 0 {
            return Ok(QuotaCheck {
                allowed: false,
                remaining: 0,
                message: format!(
                    "Daily quota exceeded ({} conversions per day). Resets at midnight UTC.",
                    self.limit
                ),
            });
        }
        Ok(QuotaCheck {
            allowed: true,
            remaining,
            message: format!("{remaining} conversions remaining today"),
        })
    }

    pub async fn increment(&self) -> Result<UsageUpdate, QuotaError> {
        self.increment_on(today()).await
    }

    async fn increment_on(&self, today: NaiveDate) -> Result<UsageUpdate, QuotaError> {
        let mut record = self.record.lock().await;
        self.roll_over(&mut record, today).await?;

        record.count += 1;
        self.save(&record).await?;

        let remaining = self.limit.saturating_sub(record.count);
        tracing::info!(
            "PDF conversion recorded: {}/{} ({} remaining)",
            record.count,
            self.limit,
            remaining
        );
        Ok(UsageUpdate {
            used: record.count,
            limit: self.limit,
            remaining,
            date: record.date,
        })
    }

    pub async fn usage(&self) -> Result<UsageInfo, QuotaError> {
        self.usage_on(today()).await
    }

    async fn usage_on(&self, today: NaiveDate) -> Result<UsageInfo, QuotaError> {
        let mut record = self.record.lock().await;
        self.roll_over(&mut record, today).await?;

        let percentage = if self.limit == 0 {
            100.0
        } else {
            (record.count as f64 / self.limit as f64 * 1000.0).round() / 10.0
        };
        Ok(UsageInfo {
            date: record.date,
            used: record.count,
            limit: self.limit,
            remaining: self.limit.saturating_sub(record.count),
            percentage,
        })
    }

    pub async fn reset(&self) -> Result<QuotaReset, QuotaError> {
        self.reset_on(today()).await
    }

    async fn reset_on(&self, today: NaiveDate) -> Result<QuotaReset, QuotaError> {
        let mut record = self.record.lock().await;
        let previous_count = record.count;
        *record = UsageRecord {
            date: today,
            count: 0,
            limit: self.limit,
        };
        self.save(&record).await?;

        tracing::warn!("Usage manually reset (previous count: {})", previous_count);
        Ok(QuotaReset {
            success: true,
            message: "Usage counter reset successfully".to_string(),
            previous_count,
            new_count: 0,
        })
    }

    async fn roll_over(&self, record: &mut UsageRecord, today: NaiveDate) -> Result<(), QuotaError> {
        if record.date != today {
            tracing::info!(
                "New day detected ({} -> {}), resetting count from {}",
                record.date,
                today,
                record.count
            );
            *record = UsageRecord {
                date: today,
                count: 0,
                limit: self.limit,
            };
            self.save(record).await?;
        }
        Ok(())
    }

    async fn save(&self, record: &UsageRecord) -> Result<(), QuotaError> {
        let record = UsageRecord {
            limit: self.limit,
            ..record.clone()
        };
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, serde_json::to_vec_pretty(&record)?).await?;
        Ok(())
    }
}

async fn read_record(path: &Path, limit: u32, today: NaiveDate) -> UsageRecord {
    let fresh = UsageRecord {
        date: today,
        count: 0,
        limit,
    };

    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return fresh,
        Err(e) => {
            tracing::warn!("Error loading usage data: {}", e);
            return fresh;
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(record) => record,
        Err(e) => {
            tracing::warn!("Error loading usage data: {}", e);
            fresh
        }
    }
}
