//! The domain façade: typed operations against the school backend.
//!
//! Each fetch caches its decoded payload under a well-known key, so the
//! matching `cached_*` accessor (and any later offline retry of the same
//! fetch) can serve the last successful snapshot. Per-record image fetches
//! are deliberately sequential: one step settles before the next starts,
//! which keeps cache-write order deterministic and bounds load on the
//! transport.

use std::path::PathBuf;

use anyhow::Result;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::cache::{keys, CacheStore};
use crate::config::Config;
use crate::models::{Connection, FilePointer, LoggedInUser, Pointer, School, Section, Student};
use crate::net::{NetClient, RequestOptions, RequestParams, ResponseKind};

use super::hydrate;

/// Backend class names addressed through `/classes/{name}`
mod classes {
    pub const USER: &str = "_User";
    pub const SCHOOL: &str = "School";
    pub const SECTION: &str = "Section";
    pub const STUDENT: &str = "Student";
    pub const CONNECTION: &str = "Connection";
}

/// Relations inlined when querying connections
const CONNECTION_INCLUDE: &str = "school,school.user";

/// Typed façade over the transport layer.
pub struct Api {
    net: NetClient,
}

impl Api {
    pub fn new(config: Config, cache_dir: PathBuf) -> Result<Self> {
        let cache = CacheStore::open(cache_dir)?;
        let net = NetClient::new(config, cache)?;
        Ok(Self { net })
    }

    fn config(&self) -> &Config {
        self.net.config()
    }

    // ===== Login =====

    /// Authenticate and cache the resulting user under the current-user
    /// key. The session-token header is omitted here since no session
    /// exists yet. When the backend is unreachable, a previously cached
    /// user is returned instead.
    pub async fn login(&self, username: &str, password: &str) -> Option<LoggedInUser> {
        let mut credentials = Map::new();
        credentials.insert("username".to_string(), Value::String(username.to_string()));
        credentials.insert("password".to_string(), Value::String(password.to_string()));

        let params = RequestParams {
            url: self.config().login_url(),
            query_params: Some(credentials),
            ..RequestParams::default()
        };
        let options = RequestOptions {
            attach_session: false,
            ..RequestOptions::default()
        };

        let payload = self
            .net
            .get(&params, Some(keys::LOGGED_IN_USER), &options)
            .await?;
        hydrate::hydrate_one(&payload)
    }

    /// Synchronous read of the cached current user. Never touches the
    /// network; `None` until a login has populated the cache.
    pub fn logged_in_user(&self) -> Option<LoggedInUser> {
        let payload = self.net.cache().get(keys::LOGGED_IN_USER)?;
        hydrate::hydrate_one(&payload)
    }

    // ===== Connections =====

    /// Fetch the logged-in user's connections with their schools inlined,
    /// then sequentially cache each connection's school image.
    pub async fn fetch_connections(&self) -> Vec<Connection> {
        let Some(user) = self.logged_in_user() else {
            warn!("no logged-in user cached; cannot query connections");
            return Vec::new();
        };

        let mut condition = Map::new();
        condition.insert(
            "user".to_string(),
            Pointer::new(classes::USER, &user.object_id).to_value(),
        );

        let params = RequestParams {
            url: self.config().class_url(classes::CONNECTION),
            query_params: Some(condition),
            where_query: true,
            include: Some(CONNECTION_INCLUDE.to_string()),
            ..RequestParams::default()
        };

        let payload = self
            .net
            .get(&params, Some(keys::CONNECTIONS), &RequestOptions::default())
            .await;
        let connections: Vec<Connection> =
            payload.as_ref().map(hydrate::hydrate_many).unwrap_or_default();

        sequential_for_each(&connections, |connection| {
            async move {
                if let Some(school) = &connection.school {
                    self.cache_image_of(school.name.as_deref(), school.image.as_ref())
                        .await;
                }
            }
            .boxed()
        })
        .await;

        connections
    }

    /// Last cached connections list; empty if never fetched.
    pub fn selected_connections(&self) -> Vec<Connection> {
        self.cached_list(keys::CONNECTIONS)
    }

    // ===== Schools =====

    /// Look up a school by its join code and cache it as the current
    /// selection.
    pub async fn fetch_school_by_code(&self, code: &str) -> Vec<School> {
        let mut condition = Map::new();
        condition.insert("code".to_string(), Value::String(code.to_string()));

        let params = RequestParams {
            url: self.config().class_url(classes::SCHOOL),
            query_params: Some(condition),
            where_query: true,
            ..RequestParams::default()
        };

        let payload = self
            .net
            .get(&params, Some(keys::SELECTED_SCHOOL), &RequestOptions::default())
            .await;
        payload.as_ref().map(hydrate::hydrate_many).unwrap_or_default()
    }

    /// Last cached school selection; empty if never fetched.
    pub fn selected_school(&self) -> Vec<School> {
        self.cached_list(keys::SELECTED_SCHOOL)
    }

    // ===== Sections =====

    /// Fetch the sections of a school, then sequentially cache each
    /// section's image under the section name.
    pub async fn fetch_sections_for_school(&self, school: &School) -> Vec<Section> {
        let mut condition = Map::new();
        condition.insert(
            "school".to_string(),
            Pointer::new(classes::SCHOOL, &school.object_id).to_value(),
        );

        let params = RequestParams {
            url: self.config().class_url(classes::SECTION),
            query_params: Some(condition),
            where_query: true,
            ..RequestParams::default()
        };

        let payload = self
            .net
            .get(&params, Some(keys::SECTIONS), &RequestOptions::default())
            .await;
        let sections: Vec<Section> =
            payload.as_ref().map(hydrate::hydrate_many).unwrap_or_default();

        sequential_for_each(&sections, |section| {
            async move {
                self.cache_image_of(section.name.as_deref(), section.image.as_ref())
                    .await;
            }
            .boxed()
        })
        .await;

        sections
    }

    /// Last cached section list; empty if never fetched.
    pub fn cached_sections(&self) -> Vec<Section> {
        self.cached_list(keys::SECTIONS)
    }

    // ===== Students =====

    /// Fetch the students of a section within a school (compound filter on
    /// both pointers), then sequentially cache each student's image.
    pub async fn fetch_students_for_section(
        &self,
        school_id: &str,
        section_id: &str,
    ) -> Vec<Student> {
        let mut condition = Map::new();
        condition.insert(
            "school".to_string(),
            Pointer::new(classes::SCHOOL, school_id).to_value(),
        );
        condition.insert(
            "section".to_string(),
            Pointer::new(classes::SECTION, section_id).to_value(),
        );

        let params = RequestParams {
            url: self.config().class_url(classes::STUDENT),
            query_params: Some(condition),
            where_query: true,
            ..RequestParams::default()
        };

        let payload = self
            .net
            .get(&params, Some(keys::STUDENTS), &RequestOptions::default())
            .await;
        let students: Vec<Student> =
            payload.as_ref().map(hydrate::hydrate_many).unwrap_or_default();

        sequential_for_each(&students, |student| {
            async move {
                self.cache_image_of(student.name.as_deref(), student.image.as_ref())
                    .await;
            }
            .boxed()
        })
        .await;

        students
    }

    /// Last cached student list; empty if never fetched.
    pub fn cached_students(&self) -> Vec<Student> {
        self.cached_list(keys::STUDENTS)
    }

    // ===== Images =====

    /// Fetch a binary asset and cache it as base64 text under `cache_key`.
    /// Falls back to the cached copy when the fetch fails.
    pub async fn load_image(&self, url: &str, cache_key: &str) -> Option<String> {
        let params = RequestParams::new(url);
        let options = RequestOptions {
            kind: ResponseKind::Binary,
            ..RequestOptions::default()
        };
        let payload = self.net.get(&params, Some(cache_key), &options).await?;
        payload.as_str().map(str::to_string)
    }

    /// Synchronous read of a previously cached image.
    pub fn cached_image(&self, cache_key: &str) -> Option<String> {
        self.net.cache().get(cache_key)?.as_str().map(str::to_string)
    }

    // ===== Internals =====

    async fn cache_image_of(&self, name: Option<&str>, image: Option<&FilePointer>) {
        let (Some(name), Some(image)) = (name, image) else {
            debug!("record has no image to cache");
            return;
        };
        match self.load_image(&image.url, name).await {
            Some(encoded) => debug!(key = name, length = encoded.len(), "cached image"),
            None => debug!(key = name, "image unavailable and not cached"),
        }
    }

    fn cached_list<T: serde::de::DeserializeOwned>(&self, key: &str) -> Vec<T> {
        self.net
            .cache()
            .get(key)
            .as_ref()
            .map(hydrate::hydrate_many)
            .unwrap_or_default()
    }
}

/// Apply an asynchronous step to each item in order, awaiting each before
/// starting the next. Used wherever per-item cache writes must not race.
pub async fn sequential_for_each<'a, T, F>(items: &'a [T], mut step: F)
where
    F: FnMut(&'a T) -> BoxFuture<'a, ()>,
{
    for item in items {
        step(item).await;
    }
}

// ============================================================================
// Tests
// ============================================================================
