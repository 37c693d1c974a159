use crate::core::ApiClient;
use crate::domain::model::{Center, CenterUpdate, Id, NewCenter, Page, PageRequest};
use crate::utils::error::Result;
use serde_json::json;

use super::{item_path, no_query};

const CENTERS_PATH: &str = "/centers";

#[derive(Clone)]
pub struct CenterService {
    client: ApiClient,
}

impl CenterService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, page: &PageRequest) -> Result<Page<Center>> {
        self.client.get(CENTERS_PATH, page.to_query()).await
    }

    pub async fn get(&self, id: Id) -> Result<Center> {
        self.client.get(&item_path(CENTERS_PATH, id), no_query()).await
    }

    pub async fn create(&self, center: &NewCenter) -> Result<Center> {
        self.client.post(CENTERS_PATH, center).await
    }

    pub async fn update(&self, id: Id, update: &CenterUpdate) -> Result<Center> {
        self.client.put(&item_path(CENTERS_PATH, id), update).await
    }

    pub async fn delete(&self, id: Id) -> Result<()> {
        self.client.delete(&item_path(CENTERS_PATH, id)).await
    }

    /// 啟用 / 停用中心
    pub async fn set_active(&self, id: Id, active: bool) -> Result<Center> {
        let path = format!("{}/status", item_path(CENTERS_PATH, id));
        self.client.patch(&path, &json!({ "isActive": active })).await
    }
}
