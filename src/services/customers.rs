use crate::core::ApiClient;
use crate::domain::model::{Customer, CustomerUpdate, Id, NewCustomer, Page, PageRequest};
use crate::utils::error::Result;

use super::{item_path, no_query};

const CUSTOMERS_PATH: &str = "/customers";

#[derive(Clone)]
pub struct CustomerService {
    client: ApiClient,
}

impl CustomerService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, page: &PageRequest) -> Result<Page<Customer>> {
        self.client.get(CUSTOMERS_PATH, page.to_query()).await
    }

    pub async fn get(&self, id: Id) -> Result<Customer> {
        self.client
            .get(&item_path(CUSTOMERS_PATH, id), no_query())
            .await
    }

    pub async fn create(&self, customer: &NewCustomer) -> Result<Customer> {
        self.client.post(CUSTOMERS_PATH, customer).await
    }

    pub async fn update(&self, id: Id, update: &CustomerUpdate) -> Result<Customer> {
        self.client.put(&item_path(CUSTOMERS_PATH, id), update).await
    }

    pub async fn delete(&self, id: Id) -> Result<()> {
        self.client.delete(&item_path(CUSTOMERS_PATH, id)).await
    }
}
