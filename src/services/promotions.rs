use crate::core::ApiClient;
use crate::domain::model::{
    Id, NewPromotion, Page, PageRequest, Promotion, PromotionUpdate, PromotionValidation,
};
use crate::utils::error::Result;

use super::{item_path, no_query};

const PROMOTIONS_PATH: &str = "/promotions";

#[derive(Clone)]
pub struct PromotionService {
    client: ApiClient,
}

impl PromotionService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, page: &PageRequest) -> Result<Page<Promotion>> {
        self.client.get(PROMOTIONS_PATH, page.to_query()).await
    }

    pub async fn get(&self, id: Id) -> Result<Promotion> {
        self.client
            .get(&item_path(PROMOTIONS_PATH, id), no_query())
            .await
    }

    pub async fn create(&self, promotion: &NewPromotion) -> Result<Promotion> {
        self.client.post(PROMOTIONS_PATH, promotion).await
    }

    pub async fn update(&self, id: Id, update: &PromotionUpdate) -> Result<Promotion> {
        self.client.put(&item_path(PROMOTIONS_PATH, id), update).await
    }

    pub async fn delete(&self, id: Id) -> Result<()> {
        self.client.delete(&item_path(PROMOTIONS_PATH, id)).await
    }

    /// 檢查促銷碼；`order_total` 有值時後端會算出折扣金額
    pub async fn validate_code(
        &self,
        code: &str,
        order_total: Option<f64>,
    ) -> Result<PromotionValidation> {
        let mut query = vec![("code".to_string(), code.trim().to_uppercase())];
        if let Some(total) = order_total {
            query.push(("amount".to_string(), total.to_string()));
        }
        self.client
            .get(&format!("{}/validate", PROMOTIONS_PATH), query)
            .await
    }
}
