//! MongoDB-backed implementation of the user repository port.
//!
//! The adapter owns the transport details: collection access, the unique
//! index on `providerId`, and mapping driver errors into the
//! discriminated port error.

use std::sync::Arc;

use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::IndexOptions;
use mongodb::{Collection, IndexModel};
use tokio::sync::OnceCell;

use super::models::UserDocument;
use super::store::DocumentStore;
use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::{NewUser, User};

const USERS_COLLECTION: &str = "users";

/// Mongo server error code for a unique key violation.
const DUPLICATE_KEY_CODE: i32 = 11000;

/// User repository persisting documents to the shared [`DocumentStore`].
pub struct MongoUserRepository {
    store: Arc<DocumentStore>,
    index_guard: OnceCell<()>,
}

impl MongoUserRepository {
    /// Create a repository over the shared store handle.
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self {
            store,
            index_guard: OnceCell::new(),
        }
    }

    /// Resolve the user collection, ensuring the unique `providerId`
    /// index exactly once per process.
    async fn users(&self) -> Result<Collection<UserDocument>, UserPersistenceError> {
        let database = self
            .store
            .database()
            .await
            .map_err(|err| UserPersistenceError::connection(err.to_string()))?;
        let collection = database.collection::<UserDocument>(USERS_COLLECTION);

        self.index_guard
            .get_or_try_init(|| async {
                let index = IndexModel::builder()
                    .keys(doc! { "providerId": 1 })
                    .options(IndexOptions::builder().unique(true).build())
                    .build();
                collection
                    .create_index(index)
                    .await
                    .map(|_| ())
                    .map_err(|err| UserPersistenceError::query(err.to_string()))
            })
            .await?;

        Ok(collection)
    }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    async fn create(&self, user: &NewUser) -> Result<User, UserPersistenceError> {
        let collection = self.users().await?;
        let document = UserDocument::from_new(user);

        let inserted = collection
            .insert_one(&document)
            .await
            .map_err(|err| map_mongo_error(&user.provider_id, &err))?;

        let id = inserted.inserted_id.as_object_id().ok_or_else(|| {
            UserPersistenceError::query("store returned a non-ObjectId inserted id")
        })?;
        Ok(document.into_user(id))
    }

    async fn find_by_provider_id(
        &self,
        provider_id: &str,
    ) -> Result<Option<User>, UserPersistenceError> {
        let collection = self.users().await?;
        let found = collection
            .find_one(doc! { "providerId": provider_id })
            .await
            .map_err(|err| map_mongo_error(provider_id, &err))?;

        match found {
            None => Ok(None),
            Some(document) => {
                let id = document.id.ok_or_else(|| {
                    UserPersistenceError::query("stored user document is missing its _id")
                })?;
                Ok(Some(document.into_user(id)))
            }
        }
    }
}

fn map_mongo_error(provider_id: &str, err: &mongodb::error::Error) -> UserPersistenceError {
    if is_duplicate_key(err) {
        return UserPersistenceError::Duplicate {
            provider_id: provider_id.to_owned(),
        };
    }
    match &*err.kind {
        ErrorKind::ServerSelection { .. } | ErrorKind::Io(_) => {
            UserPersistenceError::connection(err.to_string())
        }
        ErrorKind::InvalidArgument { .. } | ErrorKind::BsonSerialization(_) => {
            UserPersistenceError::validation(err.to_string())
        }
        _ => UserPersistenceError::query(err.to_string()),
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match &*err.kind {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => {
            is_duplicate_code(write_error.code)
        }
        ErrorKind::Command(command_error) => is_duplicate_code(command_error.code),
        _ => false,
    }
}

const fn is_duplicate_code(code: i32) -> bool {
    code == DUPLICATE_KEY_CODE
}
