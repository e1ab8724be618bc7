//! Analytics aggregation
//!
//! Everything here is recomputed on demand from snapshots of the event and
//! registration collections. The pure functions take `now` in the timezone
//! used for calendar buckets; the service passes the server's local time.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Datelike, Local, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::config::settings::Settings;
use crate::database::store::CampusStore;
use crate::models::event::{effective_status, Event, EventStatus};
use crate::models::registration::Registration;
use crate::services::events::EventView;
use crate::services::identity::Actor;
use crate::utils::errors::{CampusHubError, Result};
use crate::utils::helpers::{round_half_up, round_one_decimal};

const TREND_MONTHS: i32 = 6;

/// Rounded percentage of `part` in `whole`; 0 for an empty denominator
pub fn percent(part: usize, whole: usize) -> i64 {
    if whole == 0 {
        return 0;
    }
    round_half_up(part as f64 / whole as f64 * 100.0)
}

/// Month-over-month growth in percent
pub fn growth(this_month: usize, last_month: usize) -> i64 {
    if last_month > 0 {
        round_half_up((this_month as f64 - last_month as f64) / last_month as f64 * 100.0)
    } else if this_month > 0 {
        100
    } else {
        0
    }
}

/// Revenue earned by checked-in confirmed attendees of a paid event
pub fn revenue<'a>(event: &Event, registrations: impl IntoIterator<Item = &'a Registration>) -> f64 {
    match event.paid_price() {
        Some(price) => registrations.into_iter().filter(|r| r.attended()).count() as f64 * price,
        None => 0.0,
    }
}

/// Per-event counters shared by listings, detail pages and reports
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventStats {
    pub total_registrations: usize,
    pub total_checked_in: usize,
    pub total_cancelled: usize,
    pub attendance_rate: i64,
    pub revenue: f64,
    pub capacity: i32,
    pub capacity_utilization: i64,
}

impl EventStats {
    /// `registrations` may include other events' records; they are ignored
    pub fn compute(event: &Event, registrations: &[Registration]) -> Self {
        let own: Vec<&Registration> = registrations.iter().filter(|r| r.event_id == event.id).collect();
        let confirmed = own.iter().filter(|r| r.is_confirmed()).count();
        let checked_in = own.iter().filter(|r| r.attended()).count();
        let cancelled = own.len() - confirmed;

        Self {
            total_registrations: confirmed,
            total_checked_in: checked_in,
            total_cancelled: cancelled,
            attendance_rate: percent(checked_in, confirmed),
            revenue: revenue(event, own.iter().copied()),
            capacity: event.capacity,
            capacity_utilization: percent(confirmed, event.capacity.max(0) as usize),
        }
    }
}

/// Calendar month window, `[start, end)` in UTC
#[derive(Debug, Clone, PartialEq)]
pub struct MonthBucket {
    pub label: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl MonthBucket {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }
}

fn shift_month(year: i32, month: u32, delta: i32) -> (i32, u32) {
    let index = year * 12 + month as i32 - 1 + delta;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

fn local_month_start<Tz: TimeZone>(tz: &Tz, year: i32, month: u32) -> Option<(NaiveDate, DateTime<Utc>)> {
    let date = NaiveDate::from_ymd_opt(year, month, 1)?;
    let midnight = date.and_hms_opt(0, 0, 0)?;
    let start = tz.from_local_datetime(&midnight).earliest()?;
    Some((date, start.with_timezone(&Utc)))
}

/// The calendar month `months_back` months before the one containing `now`
pub fn month_bucket<Tz: TimeZone>(now: &DateTime<Tz>, months_back: i32) -> Option<MonthBucket> {
    let tz = now.timezone();
    let (year, month) = shift_month(now.year(), now.month(), -months_back);
    let (next_year, next_month) = shift_month(year, month, 1);
    let (date, start) = local_month_start(&tz, year, month)?;
    let (_, end) = local_month_start(&tz, next_year, next_month)?;

    Some(MonthBucket {
        label: date.format("%b").to_string(),
        start,
        end,
    })
}

/// Trailing buckets, oldest first, ending with the current month
pub fn trailing_months<Tz: TimeZone>(now: &DateTime<Tz>, count: i32) -> Vec<MonthBucket> {
    (0..count).rev().filter_map(|back| month_bucket(now, back)).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyCount {
    pub month: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryValue {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub name: String,
    pub value: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedAnalytics {
    pub total_events: usize,
    pub active_events: usize,
    pub upcoming_events: usize,
    pub completed_events: usize,
    pub total_registrations: usize,
    pub total_attended: usize,
    pub attendance_rate: i64,
    pub total_revenue: f64,
    pub this_month_registrations: usize,
    pub last_month_registrations: usize,
    pub registration_growth: i64,
    pub registrations_trend: Vec<MonthlyCount>,
    pub events_trend: Vec<MonthlyCount>,
    pub revenue_by_category: Vec<CategoryValue>,
    pub events_by_category: Vec<CategoryCount>,
}

fn category_of(event: &Event) -> String {
    if event.category.trim().is_empty() {
        "other".to_string()
    } else {
        event.category.clone()
    }
}

/// Platform-wide figures over every event and registration
pub fn aggregate<Tz: TimeZone>(events: &[Event], registrations: &[Registration], now: &DateTime<Tz>) -> AggregatedAnalytics {
    let now_utc = now.with_timezone(&Utc);
    let mut active_events = 0;
    let mut upcoming_events = 0;
    let mut completed_events = 0;
    for event in events {
        match effective_status(event, now_utc) {
            EventStatus::Live => active_events += 1,
            EventStatus::Approved if event.start_date > now_utc => upcoming_events += 1,
            EventStatus::Completed => completed_events += 1,
            _ => {}
        }
    }

    let confirmed: Vec<&Registration> = registrations.iter().filter(|r| r.is_confirmed()).collect();
    let total_attended = confirmed.iter().filter(|r| r.checked_in).count();

    let events_by_id: HashMap<Uuid, &Event> = events.iter().map(|e| (e.id, e)).collect();
    let mut total_revenue = 0.0;
    let mut revenue_by_category: BTreeMap<String, f64> = BTreeMap::new();
    for registration in confirmed.iter().filter(|r| r.checked_in) {
        if let Some(event) = events_by_id.get(&registration.event_id) {
            if let Some(price) = event.paid_price() {
                total_revenue += price;
                *revenue_by_category.entry(category_of(event)).or_default() += price;
            }
        }
    }

    let months = trailing_months(now, TREND_MONTHS);
    let registrations_trend: Vec<MonthlyCount> = months
        .iter()
        .map(|m| MonthlyCount {
            month: m.label.clone(),
            count: confirmed.iter().filter(|r| m.contains(r.registered_at)).count(),
        })
        .collect();
    let events_trend = months
        .iter()
        .map(|m| MonthlyCount {
            month: m.label.clone(),
            count: events.iter().filter(|e| m.contains(e.created_at)).count(),
        })
        .collect();

    let this_month_registrations = registrations_trend.last().map_or(0, |m| m.count);
    let last_month_registrations = month_bucket(now, 1)
        .map_or(0, |m| confirmed.iter().filter(|r| m.contains(r.registered_at)).count());

    let mut events_by_category: BTreeMap<String, usize> = BTreeMap::new();
    for event in events {
        *events_by_category.entry(category_of(event)).or_default() += 1;
    }

    AggregatedAnalytics {
        total_events: events.len(),
        active_events,
        upcoming_events,
        completed_events,
        total_registrations: confirmed.len(),
        total_attended,
        attendance_rate: percent(total_attended, confirmed.len()),
        total_revenue,
        this_month_registrations,
        last_month_registrations,
        registration_growth: growth(this_month_registrations, last_month_registrations),
        registrations_trend,
        events_trend,
        revenue_by_category: revenue_by_category
            .into_iter()
            .filter(|(_, value)| *value > 0.0)
            .map(|(name, value)| CategoryValue { name, value })
            .collect(),
        events_by_category: events_by_category
            .into_iter()
            .map(|(name, value)| CategoryCount { name, value })
            .collect(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyCount {
    pub date: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventAnalytics {
    pub event: EventView,
    pub total_registered: usize,
    pub total_attended: usize,
    pub total_cancelled: usize,
    pub attendance_rate: i64,
    pub total_revenue: f64,
    pub capacity_utilization: i64,
    /// Cumulative confirmed registrations at the end of each day
    pub registration_timeline: Vec<DailyCount>,
    pub daily_registrations: Vec<DailyCount>,
    pub peak_day: Option<String>,
    pub peak_count: usize,
    pub avg_daily_rate: f64,
}

/// Drill-down for one event; `registrations` are that event's records
pub fn event_analytics<Tz: TimeZone>(event: &Event, registrations: &[Registration], now: &DateTime<Tz>) -> EventAnalytics {
    let tz = now.timezone();
    let stats = EventStats::compute(event, registrations);

    let mut confirmed: Vec<&Registration> = registrations
        .iter()
        .filter(|r| r.event_id == event.id && r.is_confirmed())
        .collect();
    confirmed.sort_by_key(|r| r.registered_at);

    // chronological, one entry per local day
    let mut daily: Vec<(NaiveDate, usize)> = Vec::new();
    for registration in &confirmed {
        let day = registration.registered_at.with_timezone(&tz).date_naive();
        match daily.last_mut() {
            Some((last, count)) if *last == day => *count += 1,
            _ => daily.push((day, 1)),
        }
    }

    let label = |day: &NaiveDate| day.format("%b %-d").to_string();
    let mut cumulative = 0;
    let registration_timeline = daily
        .iter()
        .map(|(day, count)| {
            cumulative += count;
            DailyCount { date: label(day), count: cumulative }
        })
        .collect();
    let daily_registrations: Vec<DailyCount> = daily
        .iter()
        .map(|(day, count)| DailyCount { date: label(day), count: *count })
        .collect();

    let mut peak_day = None;
    let mut peak_count = 0;
    for day in &daily_registrations {
        if day.count > peak_count {
            peak_day = Some(day.date.clone());
            peak_count = day.count;
        }
    }

    let span = daily.len().max(1);
    EventAnalytics {
        event: EventView::at(event.clone(), now.with_timezone(&Utc)),
        total_registered: stats.total_registrations,
        total_attended: stats.total_checked_in,
        total_cancelled: stats.total_cancelled,
        attendance_rate: stats.attendance_rate,
        total_revenue: stats.revenue,
        capacity_utilization: stats.capacity_utilization,
        registration_timeline,
        daily_registrations,
        peak_day,
        peak_count,
        avg_daily_rate: round_one_decimal(stats.total_registrations as f64 / span as f64),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub live_events: Vec<EventView>,
    pub upcoming_events: Vec<EventView>,
    pub total_events: usize,
    pub total_revenue: f64,
    pub monthly_revenue: f64,
    pub total_registrations: usize,
    pub total_checked_in: usize,
    pub attendance_rate: i64,
}

/// Admin landing page figures
pub fn dashboard<Tz: TimeZone>(
    events: &[Event],
    registrations: &[Registration],
    now: &DateTime<Tz>,
    upcoming_window_days: i64,
) -> DashboardStats {
    let now_utc = now.with_timezone(&Utc);
    let horizon = now_utc + chrono::Duration::days(upcoming_window_days);

    let mut live_events = Vec::new();
    let mut upcoming_events = Vec::new();
    for event in events {
        let view = EventView::at(event.clone(), now_utc);
        match view.effective_status {
            EventStatus::Live => live_events.push(view),
            EventStatus::Approved if event.start_date <= horizon => upcoming_events.push(view),
            _ => {}
        }
    }
    upcoming_events.sort_by_key(|v| v.event.start_date);

    let events_by_id: HashMap<Uuid, &Event> = events.iter().map(|e| (e.id, e)).collect();
    let this_month = month_bucket(now, 0);
    let mut total_revenue = 0.0;
    let mut monthly_revenue = 0.0;
    for registration in registrations.iter().filter(|r| r.attended()) {
        let Some(price) = events_by_id.get(&registration.event_id).and_then(|e| e.paid_price()) else {
            continue;
        };
        total_revenue += price;
        if this_month.as_ref().map_or(false, |m| m.contains(registration.registered_at)) {
            monthly_revenue += price;
        }
    }

    let total_registrations = registrations.iter().filter(|r| r.is_confirmed()).count();
    let total_checked_in = registrations.iter().filter(|r| r.attended()).count();

    DashboardStats {
        live_events,
        upcoming_events,
        total_events: events.len(),
        total_revenue,
        monthly_revenue,
        total_registrations,
        total_checked_in,
        attendance_rate: percent(total_checked_in, total_registrations),
    }
}

/// Analytics service backed by live collections
#[derive(Clone)]
pub struct AnalyticsService {
    store: Arc<dyn CampusStore>,
    settings: Settings,
}

impl AnalyticsService {
    pub fn new(store: Arc<dyn CampusStore>, settings: Settings) -> Self {
        Self { store, settings }
    }

    pub async fn get_aggregated_analytics(&self, actor: &Actor) -> Result<AggregatedAnalytics> {
        actor.require_admin()?;
        let events = self.store.list_events().await?;
        let registrations = self.store.list_registrations().await?;
        Ok(aggregate(&events, &registrations, &Local::now()))
    }

    pub async fn get_event_analytics(&self, actor: &Actor, event_id: Uuid) -> Result<EventAnalytics> {
        actor.require_admin()?;
        let event = self
            .store
            .find_event(event_id)
            .await?
            .ok_or(CampusHubError::EventNotFound { event_id })?;
        let registrations = self.store.list_event_registrations(event_id).await?;
        Ok(event_analytics(&event, &registrations, &Local::now()))
    }

    pub async fn get_dashboard_stats(&self, actor: &Actor) -> Result<DashboardStats> {
        actor.require_admin()?;
        let events = self.store.list_events().await?;
        let registrations = self.store.list_registrations().await?;
        Ok(dashboard(
            &events,
            &registrations,
            &Local::now(),
            self.settings.events.upcoming_window_days,
        ))
    }
}
