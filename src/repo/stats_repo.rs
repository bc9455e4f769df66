use crate::db::DbPool;
use crate::dto::{DailyCount, ListingStats};
use crate::models::ListingStatus;
use crate::schema::listings;
use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use diesel::prelude::*;
use tracing::instrument;

/// Number of calendar days covered by the creation trend
pub const TREND_DAYS: i64 = 7;

/// Computes moderation counters and the daily creation trend
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `today` - The last day of the trend (UTC calendar date)
///
/// ### Returns
///
/// Totals per status plus one entry per day for the `TREND_DAYS` days ending
/// on `today`, oldest first. Days without listings are reported as zero.
#[instrument(skip(pool))]
pub fn listing_stats(pool: &DbPool, today: NaiveDate) -> Result<ListingStats> {
    let conn = &mut pool.get()?;

    let total: i64 = listings::table.count().get_result(conn)?;

    let mut count_status = |status: ListingStatus| -> Result<i64> {
        Ok(listings::table
            .filter(listings::status.eq(status))
            .count()
            .get_result(conn)?)
    };
    let pending = count_status(ListingStatus::Pending)?;
    let approved = count_status(ListingStatus::Approved)?;
    let rejected = count_status(ListingStatus::Rejected)?;

    let mut trend = Vec::with_capacity(TREND_DAYS as usize);
    for days_back in (0..TREND_DAYS).rev() {
        let date = today - Duration::days(days_back);
        let start = date
            .and_hms_opt(0, 0, 0)
            .context("midnight is always a valid time")?;
        let end = start + Duration::days(1);

        let count: i64 = listings::table
            .filter(listings::created_at.ge(start))
            .filter(listings::created_at.lt(end))
            .count()
            .get_result(conn)?;

        trend.push(DailyCount { date, count });
    }

    Ok(ListingStats {
        total,
        pending,
        approved,
        rejected,
        trend,
    })
}
