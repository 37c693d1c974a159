use crate::core::ApiClient;
use crate::domain::model::{Id, NewPart, Page, PageRequest, Part, PartUpdate, StockAdjustment};
use crate::utils::error::Result;

use super::{item_path, no_query};

const PARTS_PATH: &str = "/parts";

#[derive(Clone)]
pub struct PartService {
    client: ApiClient,
}

impl PartService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, page: &PageRequest) -> Result<Page<Part>> {
        self.client.get(PARTS_PATH, page.to_query()).await
    }

    pub async fn list_by_center(&self, center_id: Id, page: &PageRequest) -> Result<Page<Part>> {
        let page = page.clone().filter("centerId", center_id);
        self.client.get(PARTS_PATH, page.to_query()).await
    }

    /// 庫存低於下限的零件
    pub async fn low_stock(&self, center_id: Option<Id>) -> Result<Vec<Part>> {
        let query = center_id
            .map(|id| vec![("centerId".to_string(), id.to_string())])
            .unwrap_or_default();
        self.client
            .get(&format!("{}/low-stock", PARTS_PATH), query)
            .await
    }

    pub async fn get(&self, id: Id) -> Result<Part> {
        self.client.get(&item_path(PARTS_PATH, id), no_query()).await
    }

    pub async fn create(&self, part: &NewPart) -> Result<Part> {
        self.client.post(PARTS_PATH, part).await
    }

    pub async fn update(&self, id: Id, update: &PartUpdate) -> Result<Part> {
        self.client.put(&item_path(PARTS_PATH, id), update).await
    }

    pub async fn delete(&self, id: Id) -> Result<()> {
        self.client.delete(&item_path(PARTS_PATH, id)).await
    }

    pub async fn adjust_stock(&self, id: Id, adjustment: &StockAdjustment) -> Result<Part> {
        let path = format!("{}/stock", item_path(PARTS_PATH, id));
        self.client.patch(&path, adjustment).await
    }
}
