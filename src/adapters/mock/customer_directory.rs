use crate::domain::{Customer, CustomerId};
use crate::ports::customer_directory::{CustomerDirectory as CustomerDirectoryTrait, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// CustomerDirectoryのモック実装
pub struct CustomerDirectory {
    customers: Mutex<HashMap<CustomerId, Customer>>,
}

impl CustomerDirectory {
    pub fn new() -> Self {
        Self {
            customers: Mutex::new(HashMap::new()),
        }
    }

    /// テスト用に利用者を登録
    pub fn add_customer(&self, customer: Customer) {
        self.customers
            .lock()
            .unwrap()
            .insert(customer.customer_id, customer);
    }
}

impl Default for CustomerDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CustomerDirectoryTrait for CustomerDirectory {
    async fn get_customer(&self, customer_id: CustomerId) -> Result<Option<Customer>> {
        Ok(self.customers.lock().unwrap().get(&customer_id).cloned())
    }
}
