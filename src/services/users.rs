use crate::core::ApiClient;
use crate::domain::model::{Id, NewUser, Page, PageRequest, User, UserRole, UserUpdate};
use crate::utils::error::Result;
use serde_json::json;

use super::{item_path, no_query};

const USERS_PATH: &str = "/users";

#[derive(Clone)]
pub struct UserService {
    client: ApiClient,
}

impl UserService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, page: &PageRequest) -> Result<Page<User>> {
        self.client.get(USERS_PATH, page.to_query()).await
    }

    pub async fn get(&self, id: Id) -> Result<User> {
        self.client.get(&item_path(USERS_PATH, id), no_query()).await
    }

    pub async fn create(&self, user: &NewUser) -> Result<User> {
        self.client.post(USERS_PATH, user).await
    }

    pub async fn update(&self, id: Id, update: &UserUpdate) -> Result<User> {
        self.client.put(&item_path(USERS_PATH, id), update).await
    }

    pub async fn delete(&self, id: Id) -> Result<()> {
        self.client.delete(&item_path(USERS_PATH, id)).await
    }

    pub async fn change_role(&self, id: Id, role: UserRole) -> Result<User> {
        let path = format!("{}/role", item_path(USERS_PATH, id));
        self.client.patch(&path, &json!({ "role": role })).await
    }
}
