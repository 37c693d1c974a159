use crate::core::ApiClient;
use crate::domain::model::{
    Booking, BookingStatus, BookingStatusUpdate, Id, NewBooking, Page, PageRequest, TimeSlot,
};
use crate::utils::error::Result;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use super::{item_path, no_query};

const BOOKINGS_PATH: &str = "/bookings";

type SlotKey = (Id, NaiveDate);

struct CachedSlots {
    fetched_at: Instant,
    slots: Vec<TimeSlot>,
}

/// 時段快取；`generation` 在每次失效時遞增，
/// 查詢期間若有失效就不寫入舊結果
#[derive(Default)]
struct SlotCache {
    entries: HashMap<SlotKey, CachedSlots>,
    generation: u64,
}

impl SlotCache {
    fn fresh(&mut self, key: &SlotKey, ttl: Duration) -> Option<Vec<TimeSlot>> {
        let fresh = self
            .entries
            .get(key)
            .filter(|entry| entry.fetched_at.elapsed() < ttl)
            .map(|entry| entry.slots.clone());
        if fresh.is_none() {
            self.entries.remove(key);
        }
        fresh
    }

    /// 寫入時順便清掉所有過期項目
    fn store(&mut self, key: SlotKey, slots: Vec<TimeSlot>, ttl: Duration, fetched_at: Instant) {
        self.entries.retain(|_, entry| entry.fetched_at.elapsed() < ttl);
        self.entries.insert(key, CachedSlots { fetched_at, slots });
    }

    fn invalidate(&mut self, key: &SlotKey) {
        self.entries.remove(key);
        self.generation = self.generation.wrapping_add(1);
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.generation = self.generation.wrapping_add(1);
    }
}

/// 預約 API；可用時段依 (中心, 日期) 快取在實例上
#[derive(Clone)]
pub struct BookingService {
    client: ApiClient,
    ttl: Duration,
    slot_cache: Arc<Mutex<SlotCache>>,
}

impl BookingService {
    pub fn new(client: ApiClient) -> Self {
        let ttl = client.config().time_slot_ttl();
        Self {
            client,
            ttl,
            slot_cache: Arc::new(Mutex::new(SlotCache::default())),
        }
    }

    pub async fn list(&self, page: &PageRequest) -> Result<Page<Booking>> {
        self.client.get(BOOKINGS_PATH, page.to_query()).await
    }

    pub async fn list_by_status(
        &self,
        status: BookingStatus,
        page: &PageRequest,
    ) -> Result<Page<Booking>> {
        let status = serde_json::to_value(status)?
            .as_str()
            .unwrap_or_default()
            .to_string();
        let page = page.clone().filter("status", status);
        self.client.get(BOOKINGS_PATH, page.to_query()).await
    }

    pub async fn get(&self, id: Id) -> Result<Booking> {
        self.client.get(&item_path(BOOKINGS_PATH, id), no_query()).await
    }

    pub async fn create(&self, booking: &NewBooking) -> Result<Booking> {
        let created: Booking = self.client.post(BOOKINGS_PATH, booking).await?;
        self.invalidate(booking.center_id, booking.booking_date);
        tracing::info!(
            "📅 Booking {} created for center {} on {}",
            created.id,
            created.center_id,
            created.booking_date
        );
        Ok(created)
    }

    pub async fn update_status(&self, id: Id, update: &BookingStatusUpdate) -> Result<Booking> {
        let path = format!("{}/status", item_path(BOOKINGS_PATH, id));
        let booking: Booking = self.client.patch(&path, update).await?;
        self.invalidate(booking.center_id, booking.booking_date);
        Ok(booking)
    }

    pub async fn cancel(&self, id: Id, reason: Option<&str>) -> Result<Booking> {
        let path = format!("{}/cancel", item_path(BOOKINGS_PATH, id));
        let body = serde_json::json!({ "reason": reason });
        let booking: Booking = self.client.patch(&path, &body).await?;
        self.invalidate(booking.center_id, booking.booking_date);
        Ok(booking)
    }

    /// 查詢可用時段，TTL 內直接回傳快取
    pub async fn available_time_slots(&self, center_id: Id, date: NaiveDate) -> Result<Vec<TimeSlot>> {
        let key = (center_id, date);
        let generation = {
            let mut cache = self.cache();
            if let Some(slots) = cache.fresh(&key, self.ttl) {
                tracing::debug!("Time slots for center {} on {} served from cache", center_id, date);
                return Ok(slots);
            }
            cache.generation
        };
        let query = vec![
            ("centerId".to_string(), center_id.to_string()),
            ("date".to_string(), date.format("%Y-%m-%d").to_string()),
        ];
        let slots: Vec<TimeSlot> = self
            .client
            .get(&format!("{}/available-slots", BOOKINGS_PATH), query)
            .await?;

        if !self.ttl.is_zero() {
            let mut cache = self.cache();
            if cache.generation == generation {
                cache.store(key, slots.clone(), self.ttl, Instant::now());
            } else {
                tracing::debug!(
                    "Time slots for center {} on {} changed during fetch, not caching",
                    center_id,
                    date
                );
            }
        }
        Ok(slots)
    }

    pub fn invalidate(&self, center_id: Id, date: NaiveDate) {
        self.cache().invalidate(&(center_id, date));
    }

    pub fn clear_cache(&self) {
        self.cache().clear();
    }

    pub fn cached_slot_entries(&self) -> usize {
        self.cache().entries.len()
    }

    fn cache(&self) -> MutexGuard<'_, SlotCache> {
        self.slot_cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(hour: u32) -> TimeSlot {
        serde_json::from_value(serde_json::json!({
            "startTime": format!("{:02}:00:00", hour),
            "endTime": format!("{:02}:00:00", hour + 1),
            "available": true,
            "remainingCapacity": 1
        }))
        .unwrap()
    }

    #[test]
    fn test_store_prunes_expired_entries() {
        let ttl = Duration::from_secs(60);
        let day = NaiveDate::from_ymd_opt(2026, 10, 20).unwrap();
        let stale_at = Instant::now()
            .checked_sub(Duration::from_secs(120))
            .expect("monotonic clock started too recently");

        let mut cache = SlotCache::default();
        cache.store((1, day), vec![slot(8)], ttl, stale_at);
        cache.store((2, day), vec![slot(9)], ttl, Instant::now());

        assert_eq!(cache.entries.len(), 1);
        assert!(cache.entries.contains_key(&(2, day)));
        assert_eq!(cache.fresh(&(2, day), ttl), Some(vec![slot(9)]));
    }

    #[test]
    fn test_invalidate_bumps_generation() {
        let ttl = Duration::from_secs(60);
        let day = NaiveDate::from_ymd_opt(2026, 10, 20).unwrap();
        let mut cache = SlotCache::default();
        cache.store((3, day), vec![slot(8)], ttl, Instant::now());

        let before = cache.generation;
        cache.invalidate(&(3, day));
        assert_ne!(cache.generation, before);
        assert!(cache.fresh(&(3, day), ttl).is_none());

        let before = cache.generation;
        cache.clear();
        assert_ne!(cache.generation, before);
    }
}
