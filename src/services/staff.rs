use crate::core::ApiClient;
use crate::domain::model::{Id, NewStaff, Page, PageRequest, Staff, StaffUpdate};
use crate::utils::error::Result;

use super::{item_path, no_query};

const STAFF_PATH: &str = "/staff";

#[derive(Clone)]
pub struct StaffService {
    client: ApiClient,
}

impl StaffService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, page: &PageRequest) -> Result<Page<Staff>> {
        self.client.get(STAFF_PATH, page.to_query()).await
    }

    pub async fn get(&self, id: Id) -> Result<Staff> {
        self.client.get(&item_path(STAFF_PATH, id), no_query()).await
    }

    pub async fn create(&self, staff: &NewStaff) -> Result<Staff> {
        self.client.post(STAFF_PATH, staff).await
    }

    pub async fn update(&self, id: Id, update: &StaffUpdate) -> Result<Staff> {
        self.client.put(&item_path(STAFF_PATH, id), update).await
    }

    pub async fn delete(&self, id: Id) -> Result<()> {
        self.client.delete(&item_path(STAFF_PATH, id)).await
    }

    /// 中心內可指派的技師
    pub async fn technicians(&self, center_id: Id) -> Result<Vec<Staff>> {
        let path = format!("{}/technicians", item_path("/centers", center_id));
        self.client.get(&path, no_query()).await
    }
}
