use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

pub type Id = i64;

// ---------------------------------------------------------------------------
// 分頁

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// 列表查詢參數，page 從 0 開始
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
    pub sort: Option<String>,
    pub direction: SortDirection,
    pub search: Option<String>,
    pub filters: Vec<(String, String)>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: 10,
            sort: None,
            direction: SortDirection::Asc,
            search: None,
            filters: Vec::new(),
        }
    }
}

impl PageRequest {
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page,
            size,
            ..Self::default()
        }
    }

    pub fn sorted_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort = Some(field.into());
        self.direction = direction;
        self
    }

    pub fn search(mut self, keyword: impl Into<String>) -> Self {
        let keyword = keyword.into();
        self.search = (!keyword.trim().is_empty()).then_some(keyword);
        self
    }

    pub fn filter(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.filters.push((key.into(), value.to_string()));
        self
    }

    /// 轉為 query string，sort 採用 `field,direction` 格式
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = vec![
            ("page".to_string(), self.page.to_string()),
            ("size".to_string(), self.size.to_string()),
        ];
        if let Some(sort) = &self.sort {
            query.push((
                "sort".to_string(),
                format!("{},{}", sort, self.direction.as_str()),
            ));
        }
        if let Some(search) = &self.search {
            query.push(("search".to_string(), search.clone()));
        }
        query.extend(self.filters.iter().cloned());
        query
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default, alias = "number")]
    pub page: u32,
    #[serde(default)]
    pub size: u32,
}

impl<T> Page<T> {
    pub fn is_last(&self) -> bool {
        self.total_pages == 0 || self.page.saturating_add(1) >= self.total_pages
    }
}

// ---------------------------------------------------------------------------
// 認證

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(alias = "accessToken")]
    pub token: String,
    #[serde(default)]
    pub user: Option<User>,
}

// ---------------------------------------------------------------------------
// 服務中心

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Center {
    pub id: Id,
    pub name: String,
    pub address: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub opening_time: Option<NaiveTime>,
    pub closing_time: Option<NaiveTime>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCenter {
    pub name: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opening_time: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closing_time: Option<NaiveTime>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CenterUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opening_time: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closing_time: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

// ---------------------------------------------------------------------------
// 零件庫存

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    pub id: Id,
    pub name: String,
    pub code: String,
    pub category: Option<String>,
    pub price: f64,
    pub quantity: i32,
    pub min_stock: Option<i32>,
    pub center_id: Option<Id>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Part {
    pub fn is_low_stock(&self) -> bool {
        self.min_stock.is_some_and(|min| self.quantity <= min)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPart {
    pub name: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub price: f64,
    pub quantity: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_stock: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center_id: Option<Id>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_stock: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// 庫存增減，`delta` 可為負數
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAdjustment {
    pub delta: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

// ---------------------------------------------------------------------------
// 促銷

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountType {
    Percentage,
    FixedAmount,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Promotion {
    pub id: Id,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub usage_limit: Option<u32>,
    #[serde(default)]
    pub used_count: u32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Promotion {
    pub fn is_running_on(&self, date: NaiveDate) -> bool {
        self.is_active
            && self.start_date <= date
            && date <= self.end_date
            && self.usage_limit.map_or(true, |limit| self.used_count < limit)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPromotion {
    pub code: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_limit: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionValidation {
    pub valid: bool,
    pub discount_amount: Option<f64>,
    pub message: Option<String>,
}

// ---------------------------------------------------------------------------
// 使用者

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Admin,
    Manager,
    Staff,
    Technician,
    Customer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Id,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub role: UserRole,
    pub center_id: Option<Id>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub role: UserRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center_id: Option<Id>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

// ---------------------------------------------------------------------------
// 客戶與車輛

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Id,
    pub full_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCustomer {
    pub full_name: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: Id,
    pub license_plate: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub color: Option<String>,
    pub vin: Option<String>,
    pub mileage: Option<u32>,
    pub customer_id: Id,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVehicle {
    pub license_plate: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mileage: Option<u32>,
    pub customer_id: Id,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_plate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mileage: Option<u32>,
}

// ---------------------------------------------------------------------------
// 員工 / 技師

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StaffRole {
    Manager,
    Receptionist,
    Technician,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Staff {
    pub id: Id,
    pub full_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub role: StaffRole,
    pub center_id: Id,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStaff {
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub role: StaffRole,
    pub center_id: Id,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<StaffRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

// ---------------------------------------------------------------------------
// 預約

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Id,
    pub customer_id: Id,
    pub vehicle_id: Id,
    pub center_id: Id,
    pub technician_id: Option<Id>,
    pub booking_date: NaiveDate,
    pub start_time: NaiveTime,
    pub status: BookingStatus,
    pub notes: Option<String>,
    pub promotion_code: Option<String>,
    pub total_price: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBooking {
    pub customer_id: Id,
    pub vehicle_id: Id,
    pub center_id: Id,
    pub booking_date: NaiveDate,
    pub start_time: NaiveTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promotion_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingStatusUpdate {
    pub status: BookingStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technician_id: Option<Id>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub available: bool,
    pub remaining_capacity: Option<u32>,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_request_query() {
        let query = PageRequest::new(2, 20)
            .sorted_by("name", SortDirection::Desc)
            .search("Hà Nội")
            .filter("centerId", 7)
            .to_query();

        assert_eq!(
            query,
            vec![
                ("page".to_string(), "2".to_string()),
                ("size".to_string(), "20".to_string()),
                ("sort".to_string(), "name,desc".to_string()),
                ("search".to_string(), "Hà Nội".to_string()),
                ("centerId".to_string(), "7".to_string()),
            ]
        );
    }

    #[test]
    fn test_blank_search_is_dropped() {
        let request = PageRequest::default().search("   ");
        assert!(request.search.is_none());
    }

    #[test]
    fn test_page_accepts_spring_number_field() {
        let page: Page<Customer> = serde_json::from_value(json!({
            "content": [{"id": 1, "fullName": "Nguyễn Văn A", "phone": "0901234567"}],
            "totalElements": 11,
            "totalPages": 2,
            "number": 1,
            "size": 10
        }))
        .unwrap();

        assert_eq!(page.page, 1);
        assert_eq!(page.content[0].full_name, "Nguyễn Văn A");
        assert!(page.is_last());
    }

    #[test]
    fn test_is_last_with_out_of_range_page() {
        let page: Page<Customer> = serde_json::from_value(json!({
            "content": [],
            "totalPages": 3,
            "number": u32::MAX
        }))
        .unwrap();

        assert!(page.is_last());
    }

    #[test]
    fn test_booking_wire_format() {
        let booking: Booking = serde_json::from_value(json!({
            "id": 5,
            "customerId": 1,
            "vehicleId": 2,
            "centerId": 3,
            "technicianId": null,
            "bookingDate": "2026-10-20",
            "startTime": "08:30:00",
            "status": "IN_PROGRESS",
            "notes": null,
            "promotionCode": "GIAM10",
            "totalPrice": 450000.0
        }))
        .unwrap();

        assert_eq!(booking.status, BookingStatus::InProgress);
        assert_eq!(booking.start_time, NaiveTime::from_hms_opt(8, 30, 0).unwrap());
    }

    #[test]
    fn test_update_skips_unset_fields() {
        let update = CenterUpdate {
            phone: Some("0281234567".to_string()),
            ..CenterUpdate::default()
        };
        assert_eq!(
            serde_json::to_value(update).unwrap(),
            json!({"phone": "0281234567"})
        );
    }

    #[test]
    fn test_promotion_running_window() {
        let promotion = Promotion {
            id: 1,
            code: "TET2027".to_string(),
            name: "Khuyến mãi Tết".to_string(),
            description: None,
            discount_type: DiscountType::Percentage,
            discount_value: 10.0,
            start_date: NaiveDate::from_ymd_opt(2027, 1, 20).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2027, 2, 10).unwrap(),
            usage_limit: Some(100),
            used_count: 100,
            is_active: true,
        };

        let inside = NaiveDate::from_ymd_opt(2027, 2, 1).unwrap();
        assert!(!promotion.is_running_on(inside));

        let promotion = Promotion {
            used_count: 3,
            ..promotion
        };
        assert!(promotion.is_running_on(inside));
        assert!(!promotion.is_running_on(NaiveDate::from_ymd_opt(2027, 3, 1).unwrap()));
    }

    #[test]
    fn test_part_low_stock() {
        let part = Part {
            id: 1,
            name: "Lọc dầu".to_string(),
            code: "OF-01".to_string(),
            category: None,
            price: 120000.0,
            quantity: 3,
            min_stock: Some(5),
            center_id: None,
            is_active: true,
        };
        assert!(part.is_low_stock());
    }
}
