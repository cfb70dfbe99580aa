use std::sync::Arc;

use models::contact;
use models::document::{self, text_field};
use mongodb::bson::oid::ObjectId;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument};

use crate::errors::ServiceError;
use crate::storage::{DocumentCollection, Filter};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ContactSummary {
    pub id: String,
    pub list_id: String,
    pub alias: String,
}

/// CRUD over a user's contact list.
///
/// Every lookup, update and delete is keyed by the pair (owner id, contact id), so a
/// contact is only reachable through the list it was created in. No check is made
/// that the owner exists.
pub struct ContactService {
    contacts: Arc<dyn DocumentCollection>,
}

fn owned_by(owner: &ObjectId) -> Filter {
    Filter::all().eq(contact::LIST_ID, owner.to_hex())
}

fn scoped(owner: &ObjectId, contact_id: ObjectId) -> Filter {
    owned_by(owner).eq(document::ID, contact_id)
}

impl ContactService {
    pub fn new(contacts: Arc<dyn DocumentCollection>) -> Self {
        Self { contacts }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, user_id: &str) -> Result<Vec<Value>, ServiceError> {
        let owner = document::parse_id(user_id)?;
        let docs = self.contacts.find(&owned_by(&owner)).await?;
        info!(collection = self.contacts.name(), count = docs.len(), "list contacts");
        Ok(document::to_portable_list(docs)?)
    }

    pub async fn get(&self, user_id: &str, contact_id: &str) -> Result<Value, ServiceError> {
        let owner = document::parse_id(user_id)?;
        let cid = document::parse_id(contact_id)?;
        let found = self
            .contacts
            .find_one(&scoped(&owner, cid))
            .await?
            .ok_or_else(|| ServiceError::not_found("contact", contact_id))?;
        Ok(document::to_portable_json(found)?)
    }

    /// Insert a contact into `user_id`'s list. Duplicate phones are allowed.
    #[instrument(skip(self, body))]
    pub async fn create(&self, user_id: &str, body: Value) -> Result<ContactSummary, ServiceError> {
        let owner = document::parse_id(user_id)?;
        let new = contact::new_contact(&owner, body)?;
        let id = self.contacts.insert_one(new.document).await?;
        info!(contact_id = %id, list_id = %new.list_id, "contact_created");
        Ok(ContactSummary { id: id.to_hex(), list_id: new.list_id, alias: new.alias })
    }

    #[instrument(skip(self, body))]
    pub async fn update(&self, user_id: &str, contact_id: &str, body: Value) -> Result<ContactSummary, ServiceError> {
        let owner = document::parse_id(user_id)?;
        let cid = document::parse_id(contact_id)?;
        let patch = contact::patch(body)?;
        let updated = self
            .contacts
            .update_one(&scoped(&owner, cid), patch)
            .await?
            .ok_or_else(|| ServiceError::not_found("contact", contact_id))?;
        info!(contact_id = %cid, list_id = %owner, "contact_updated");
        Ok(ContactSummary {
            id: cid.to_hex(),
            list_id: owner.to_hex(),
            alias: text_field(&updated, contact::ALIAS).unwrap_or_default(),
        })
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, user_id: &str, contact_id: &str) -> Result<(), ServiceError> {
        let owner = document::parse_id(user_id)?;
        let cid = document::parse_id(contact_id)?;
        if self.contacts.delete_one(&scoped(&owner, cid)).await? == 0 {
            return Err(ServiceError::not_found("contact", contact_id));
        }
        info!(contact_id = %cid, list_id = %owner, "contact_deleted");
        Ok(())
    }

    /// Contacts whose `listAlias` equals `alias` exactly, across all lists.
    #[instrument(skip(self))]
    pub async fn find_by_list_alias(&self, alias: &str) -> Result<Vec<Value>, ServiceError> {
        let docs = self
            .contacts
            .find(&Filter::all().eq(contact::LIST_ALIAS, alias))
            .await?;
        Ok(document::to_portable_list(docs)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Collections;
    use serde_json::json;

    const USER_A: &str = "64b7f0c2a1b2c3d4e5f60718";
    const USER_B: &str = "64b7f0c2a1b2c3d4e5f60719";

    fn service() -> ContactService {
        ContactService::new(Collections::in_memory().contacts)
    }

    #[tokio::test]
    async fn contacts_are_listed_per_owner() -> Result<(), anyhow::Error> {
        let svc = service();
        svc.create(USER_A, json!({"phone": "1", "alias": "Ann"})).await?;
        svc.create(USER_A, json!({"phone": "1", "alias": "Ann again"})).await?;
        svc.create(USER_B, json!({"phone": "2", "alias": "Bob"})).await?;

        let a = svc.list(USER_A).await?;
        assert_eq!(a.len(), 2);
        assert!(a.iter().all(|c| c["listId"] == USER_A));
        assert_eq!(svc.list(USER_B).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn contact_is_invisible_from_another_list() -> Result<(), anyhow::Error> {
        let svc = service();
        let c = svc.create(USER_A, json!({"phone": "1", "alias": "Ann"})).await?;

        assert_eq!(svc.get(USER_A, &c.id).await?["alias"], "Ann");
        assert!(matches!(svc.get(USER_B, &c.id).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(
            svc.update(USER_B, &c.id, json!({"alias": "hijack"})).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(svc.delete(USER_B, &c.id).await, Err(ServiceError::NotFound(_))));
        assert_eq!(svc.get(USER_A, &c.id).await?["alias"], "Ann");
        Ok(())
    }

    #[tokio::test]
    async fn update_and_delete_within_the_owning_list() -> Result<(), anyhow::Error> {
        let svc = service();
        let c = svc.create(USER_A, json!({"phone": "1", "alias": "Ann"})).await?;
        let updated = svc.update(USER_A, &c.id, json!({"alias": "Annie"})).await?;
        assert_eq!(updated.alias, "Annie");

        svc.delete(USER_A, &c.id).await?;
        assert!(matches!(svc.get(USER_A, &c.id).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(svc.delete(USER_A, &c.id).await, Err(ServiceError::NotFound(_))));
        Ok(())
    }

    #[tokio::test]
    async fn list_alias_lookup_is_exact() -> Result<(), anyhow::Error> {
        let svc = service();
        svc.create(USER_A, json!({"phone": "1", "alias": "Ann", "listAlias": "family"})).await?;
        svc.create(USER_B, json!({"phone": "2", "alias": "Bob", "listAlias": "family"})).await?;
        svc.create(USER_B, json!({"phone": "3", "alias": "Cy", "listAlias": "Family friends"})).await?;

        assert_eq!(svc.find_by_list_alias("family").await?.len(), 2);
        assert_eq!(svc.find_by_list_alias("fam").await?.len(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn malformed_ids_are_rejected() {
        let svc = service();
        assert!(matches!(svc.list("nope").await, Err(ServiceError::InvalidId(_))));
        assert!(matches!(svc.get(USER_A, "nope").await, Err(ServiceError::InvalidId(_))));
        assert!(matches!(
            svc.create("nope", json!({"phone": "1", "alias": "x"})).await,
            Err(ServiceError::InvalidId(_))
        ));
    }
}
