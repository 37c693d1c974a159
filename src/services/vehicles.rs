use crate::core::ApiClient;
use crate::domain::model::{Id, NewVehicle, Page, PageRequest, Vehicle, VehicleUpdate};
use crate::utils::error::Result;

use super::{item_path, no_query};

const VEHICLES_PATH: &str = "/vehicles";

#[derive(Clone)]
pub struct VehicleService {
    client: ApiClient,
}

impl VehicleService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, page: &PageRequest) -> Result<Page<Vehicle>> {
        self.client.get(VEHICLES_PATH, page.to_query()).await
    }

    /// 某位客戶名下的所有車輛 (不分頁)
    pub async fn list_by_customer(&self, customer_id: Id) -> Result<Vec<Vehicle>> {
        let path = format!("{}/vehicles", item_path("/customers", customer_id));
        self.client.get(&path, no_query()).await
    }

    pub async fn get(&self, id: Id) -> Result<Vehicle> {
        self.client.get(&item_path(VEHICLES_PATH, id), no_query()).await
    }

    pub async fn create(&self, vehicle: &NewVehicle) -> Result<Vehicle> {
        self.client.post(VEHICLES_PATH, vehicle).await
    }

    pub async fn update(&self, id: Id, update: &VehicleUpdate) -> Result<Vehicle> {
        self.client.put(&item_path(VEHICLES_PATH, id), update).await
    }

    pub async fn delete(&self, id: Id) -> Result<()> {
        self.client.delete(&item_path(VEHICLES_PATH, id)).await
    }
}
