//! Service layer providing the directory's CRUD operations on top of models.
//! - Separates business rules from the document store backend.
//! - Reuses validation and field definitions in `models` crate.
//! - Provides clear error types and documented interfaces.

pub mod errors;
pub mod storage;
pub mod users;
pub mod contacts;
pub mod messages;

use std::sync::Arc;

use contacts::ContactService;
use messages::MessageService;
use storage::Collections;
use users::UserService;

/// The three resource services, sharing one set of collections.
#[derive(Clone)]
pub struct Services {
    pub users: Arc<UserService>,
    pub contacts: Arc<ContactService>,
    pub messages: Arc<MessageService>,
}

impl Services {
    pub fn new(collections: &Collections) -> Self {
        Self {
            users: Arc::new(UserService::new(Arc::clone(&collections.users))),
            contacts: Arc::new(ContactService::new(Arc::clone(&collections.contacts))),
            messages: Arc::new(MessageService::new(Arc::clone(&collections.messages))),
        }
    }
}
