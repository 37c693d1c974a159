//! 每個後端資源一個 service，皆為 [`ApiClient`] 之上的薄封裝。

pub mod auth;
pub mod bookings;
pub mod centers;
pub mod customers;
pub mod parts;
pub mod promotions;
pub mod staff;
pub mod users;
pub mod vehicles;

use crate::core::ApiClient;
use crate::domain::model::Id;

pub use auth::AuthService;
pub use bookings::BookingService;
pub use centers::CenterService;
pub use customers::CustomerService;
pub use parts::PartService;
pub use promotions::PromotionService;
pub use staff::StaffService;
pub use users::UserService;
pub use vehicles::VehicleService;

/// 所有 service 共用同一個 client
#[derive(Clone)]
pub struct AdminApi {
    pub auth: AuthService,
    pub bookings: BookingService,
    pub centers: CenterService,
    pub customers: CustomerService,
    pub parts: PartService,
    pub promotions: PromotionService,
    pub staff: StaffService,
    pub users: UserService,
    pub vehicles: VehicleService,
}

impl AdminApi {
    pub fn new(client: ApiClient) -> Self {
        Self {
            auth: AuthService::new(client.clone()),
            bookings: BookingService::new(client.clone()),
            centers: CenterService::new(client.clone()),
            customers: CustomerService::new(client.clone()),
            parts: PartService::new(client.clone()),
            promotions: PromotionService::new(client.clone()),
            staff: StaffService::new(client.clone()),
            users: UserService::new(client.clone()),
            vehicles: VehicleService::new(client),
        }
    }
}

pub(crate) fn item_path(collection: &str, id: Id) -> String {
    format!("{}/{}", collection, id)
}

pub(crate) fn no_query() -> Vec<(String, String)> {
    Vec::new()
}
