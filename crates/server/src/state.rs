use std::sync::Arc;

use service::{contacts::ContactService, messages::MessageService, users::UserService, Services};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UserService>,
    pub contacts: Arc<ContactService>,
    pub messages: Arc<MessageService>,
}

impl From<Services> for AppState {
    fn from(s: Services) -> Self {
        Self { users: s.users, contacts: s.contacts, messages: s.messages }
    }
}
