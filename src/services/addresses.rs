use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::database::models::{Address, AddressType};
use crate::database::{DatabaseError, DocumentStore, Repository, WriteBatch};
use crate::filter::FilterData;

#[derive(Debug, thiserror::Error)]
pub enum AddressError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Address not found")]
    NotFound,
    #[error("Invalid address")]
    Validation(HashMap<String, String>),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressInput {
    #[serde(default, rename = "type")]
    pub address_type: AddressType,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub line1: Option<String>,
    pub line2: Option<String>,
    pub landmark: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

/// Validated address fields.
struct AddressFields {
    address_type: AddressType,
    name: String,
    phone: String,
    line1: String,
    line2: Option<String>,
    landmark: Option<String>,
    city: String,
    state: String,
    pincode: String,
}

impl AddressInput {
    fn validate(self) -> Result<AddressFields, AddressError> {
        let mut errors = HashMap::new();
        let mut required = |value: Option<String>, field: &str| -> String {
            let value = value.map(|v| v.trim().to_string()).unwrap_or_default();
            if value.is_empty() {
                errors.insert(field.to_string(), "This field is required".to_string());
            }
            value
        };

        let name = required(self.name, "name");
        let phone = required(self.phone, "phone");
        let line1 = required(self.line1, "line1");
        let city = required(self.city, "city");
        let state = required(self.state, "state");
        let pincode = self.pincode.map(|p| p.trim().to_string()).unwrap_or_default();

        if pincode.len() != 6 || !pincode.chars().all(|c| c.is_ascii_digit()) {
            errors.insert("pincode".to_string(), "Pincode must be 6 digits".to_string());
        }
        if !errors.is_empty() {
            return Err(AddressError::Validation(errors));
        }

        Ok(AddressFields {
            address_type: self.address_type,
            name,
            phone,
            line1,
            line2: optional(self.line2),
            landmark: optional(self.landmark),
            city,
            state,
            pincode,
        })
    }
}

fn optional(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Per-user address book. Once a user has any address, exactly one is default;
/// every change that moves the flag is a single batch.
#[derive(Clone)]
pub struct AddressService {
    addresses: Repository<Address>,
    store: Arc<dyn DocumentStore>,
}

impl AddressService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { addresses: Repository::new(store.clone()), store }
    }

    /// Creation order.
    pub async fn list(&self, user_id: Uuid) -> Result<Vec<Address>, AddressError> {
        let mut addresses = self
            .addresses
            .select_any(FilterData::new().with_where(json!({ "user_id": user_id })))
            .await?;
        addresses.sort_by_key(|a| (a.created_at, a.id));
        Ok(addresses)
    }

    pub async fn get(&self, user_id: Uuid, address_id: Uuid) -> Result<Address, AddressError> {
        self.addresses
            .get(address_id)
            .await?
            .filter(|a| a.user_id == user_id)
            .ok_or(AddressError::NotFound)
    }

    /// The first address is always the default.
    pub async fn add(&self, user_id: Uuid, input: AddressInput) -> Result<Address, AddressError> {
        let wants_default = input.is_default;
        let fields = input.validate()?;
        let existing = self.list(user_id).await?;

        let now = Utc::now();
        let address = Address {
            id: Uuid::now_v7(),
            user_id,
            address_type: fields.address_type,
            name: fields.name,
            phone: fields.phone,
            line1: fields.line1,
            line2: fields.line2,
            landmark: fields.landmark,
            city: fields.city,
            state: fields.state,
            pincode: fields.pincode,
            is_default: existing.is_empty() || wants_default,
            created_at: now,
            updated_at: now,
        };

        let mut batch = WriteBatch::new();
        if address.is_default {
            clear_defaults(&mut batch, existing, address.id)?;
        }
        batch.put(&address)?;
        self.store.commit(batch).await?;
        Ok(address)
    }

    /// Full replacement of the fields. Clearing the flag on the current
    /// default is ignored.
    pub async fn update(&self, user_id: Uuid, address_id: Uuid, input: AddressInput) -> Result<Address, AddressError> {
        let mut address = self.get(user_id, address_id).await?;
        let wants_default = input.is_default;
        let fields = input.validate()?;

        address.address_type = fields.address_type;
        address.name = fields.name;
        address.phone = fields.phone;
        address.line1 = fields.line1;
        address.line2 = fields.line2;
        address.landmark = fields.landmark;
        address.city = fields.city;
        address.state = fields.state;
        address.pincode = fields.pincode;
        address.updated_at = Utc::now();

        let mut batch = WriteBatch::new();
        if wants_default && !address.is_default {
            address.is_default = true;
            clear_defaults(&mut batch, self.list(user_id).await?, address.id)?;
        }
        batch.put(&address)?;
        self.store.commit(batch).await?;
        Ok(address)
    }

    pub async fn set_default(&self, user_id: Uuid, address_id: Uuid) -> Result<Address, AddressError> {
        let mut address = self.get(user_id, address_id).await?;
        let mut batch = WriteBatch::new();
        clear_defaults(&mut batch, self.list(user_id).await?, address.id)?;
        address.is_default = true;
        address.updated_at = Utc::now();
        batch.put(&address)?;
        self.store.commit(batch).await?;
        Ok(address)
    }

    /// Deleting the default hands the flag to the earliest-created remaining address.
    pub async fn delete(&self, user_id: Uuid, address_id: Uuid) -> Result<(), AddressError> {
        let address = self.get(user_id, address_id).await?;
        let mut batch = WriteBatch::new();
        batch.delete::<Address>(address.id);

        if address.is_default {
            let successor = self.list(user_id).await?.into_iter().find(|a| a.id != address.id);
            if let Some(mut successor) = successor {
                successor.is_default = true;
                successor.updated_at = Utc::now();
                batch.put(&successor)?;
            }
        }

        self.store.commit(batch).await?;
        Ok(())
    }

    pub async fn default_for(&self, user_id: Uuid) -> Result<Option<Address>, AddressError> {
        Ok(self
            .addresses
            .select_one(FilterData::new().with_where(json!({ "user_id": user_id, "is_default": true })))
            .await?)
    }
}

fn clear_defaults(batch: &mut WriteBatch, addresses: Vec<Address>, keep: Uuid) -> Result<(), AddressError> {
    let now = Utc::now();
    for mut other in addresses.into_iter().filter(|a| a.is_default && a.id != keep) {
        other.is_default = false;
        other.updated_at = now;
        batch.put(&other)?;
    }
    Ok(())
}
