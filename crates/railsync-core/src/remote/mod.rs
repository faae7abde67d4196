//! Request dispatch
//!
//! A `Context` owns the type registry, the default remote config, the
//! pluralizer, and the transport collaborator. It builds REST paths by
//! convention, wraps write bodies under the model-name key, executes the
//! exchange through the transport, and routes every response through the
//! single classification pipeline before applying it to the subject object.
//!
//! Every operation exists in two modes: the async form is the operation
//! itself, and (with the `blocking` feature) a `*_blocking` adapter awaits
//! it on an internally created runtime. Within one request/response cycle
//! the full deserialization completes before the operation resolves, so a
//! caller inspecting the subject afterwards always observes the fully
//! applied result.
//!
//! Two concurrent operations targeting the same object interleave with no
//! ordering guarantee between them; Rust's `&mut` discipline rules this out
//! for the async API on a single instance, and callers of the blocking
//! adapters carry the same responsibility themselves.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::config::RemoteConfig;
use crate::error::{Error, Result};
use crate::http::{classify_response, HttpTransport, Method, ReqwestTransport, RestRequest};
use crate::inflect::{resource_name, Pluralizer};
use crate::model::{ModelType, RemoteObject, TypeRegistry};

/// Extension appended to every request path.
const PATH_EXTENSION: &str = ".json";

/// The engine's entry point: registry + config + transport.
pub struct Context {
    registry: TypeRegistry,
    config: RemoteConfig,
    pluralizer: Pluralizer,
    transport: Arc<dyn HttpTransport>,
}

impl Context {
    /// Create a context with the default `reqwest`-backed transport.
    pub fn new(config: RemoteConfig) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::new(config.timeout_secs)?);
        Ok(Self::with_transport(config, transport))
    }

    /// Create a context with an explicit transport collaborator.
    pub fn with_transport(config: RemoteConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            registry: TypeRegistry::new(),
            config,
            pluralizer: Pluralizer::new(),
            transport,
        }
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Register a model type with this context.
    pub fn register(&self, model: ModelType) -> Arc<ModelType> {
        self.registry.register(Arc::new(model))
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    /// Pluralizer used for resource names; mutable so irregular forms can
    /// be registered before any collection is dispatched.
    pub fn pluralizer_mut(&mut self) -> &mut Pluralizer {
        &mut self.pluralizer
    }

    /// The config governing operations on a type: the type-level override
    /// when one is set (a full replacement), else the context default.
    pub fn effective_config<'a>(&'a self, model: Option<&'a ModelType>) -> &'a RemoteConfig {
        model
            .and_then(|m| m.config())
            .unwrap_or(&self.config)
    }

    /// Assemble the request path by convention:
    /// `plural[.json]`, `plural/id.json`, `plural/method.json`,
    /// `plural/id/method.json`, or `method.json` when no type is given.
    /// Lower-casing (when configured) runs on the fully assembled path,
    /// after pluralization and name resolution.
    pub fn resource_path(
        &self,
        model: Option<&ModelType>,
        id: Option<i64>,
        method: Option<&str>,
    ) -> String {
        let config = self.effective_config(model);
        let mut segments = Vec::new();
        if let Some(model) = model {
            segments.push(resource_name(
                model.name(),
                model.model_name(),
                model.plural_name(),
                config.auto_inflect,
                &self.pluralizer,
            ));
            if let Some(id) = id {
                segments.push(id.to_string());
            }
        }
        if let Some(method) = method {
            segments.push(method.to_string());
        }

        let path = format!("{}{}", segments.join("/"), PATH_EXTENSION);
        if config.lowercase_urls {
            path.to_lowercase()
        } else {
            path
        }
    }

    /// Build, execute, and classify one request. The returned value is the
    /// parsed 2xx body (`null` for empty bodies).
    pub async fn request(
        &self,
        method: Method,
        model: Option<&ModelType>,
        id: Option<i64>,
        custom_method: Option<&str>,
        body: Option<Value>,
    ) -> Result<Value> {
        if model.is_none() && custom_method.is_none() {
            return Err(Error::Configuration {
                message: "a request needs a model type or a custom method to route to".to_string(),
                source: None,
            });
        }

        let config = self.effective_config(model);
        let path = self.resource_path(model, id, custom_method);
        let url = format!("{}/{}", config.base_url.trim_end_matches('/'), path);
        log::debug!("{} {}", method, url);
        if let Some(body) = &body {
            log::trace!("request body: {}", body);
        }

        let basic_auth = config
            .username
            .as_ref()
            .map(|user| (user.clone(), config.password.clone().unwrap_or_default()));
        let response = self
            .transport
            .execute(RestRequest {
                method,
                url,
                basic_auth,
                body,
            })
            .await
            .map_err(Error::from)?;

        log::debug!("response status {}", response.status);
        log::trace!("response body: {}", response.body);
        classify_response(&response)
    }

    /// Fetch every remote object of a type: `GET /plural.json`.
    pub async fn fetch_all(&self, model: &Arc<ModelType>) -> Result<Vec<RemoteObject>> {
        let value = self
            .request(Method::GET, Some(model), None, None, None)
            .await?;
        let elements = value.as_array().ok_or_else(|| Error::LocalMapping {
            message: "expected array response for index operation".to_string(),
        })?;

        let config = self.effective_config(Some(model));
        elements
            .iter()
            .map(|element| {
                let map = expect_object(element)?;
                RemoteObject::from_remote_map(model.clone(), map, &self.registry, config)
            })
            .collect()
    }

    /// Fetch one remote object by ID: `GET /plural/id.json`.
    pub async fn fetch_one(&self, model: &Arc<ModelType>, id: i64) -> Result<RemoteObject> {
        let value = self
            .request(Method::GET, Some(model), Some(id), None, None)
            .await?;
        let map = expect_object(&value)?;
        RemoteObject::from_remote_map(
            model.clone(),
            map,
            &self.registry,
            self.effective_config(Some(model)),
        )
    }

    /// Blocking adapter for [`Context::request`].
    #[cfg(feature = "blocking")]
    pub fn request_blocking(
        &self,
        method: Method,
        model: Option<&ModelType>,
        id: Option<i64>,
        custom_method: Option<&str>,
        body: Option<Value>,
    ) -> Result<Value> {
        block_on(self.request(method, model, id, custom_method, body))
    }

    /// Blocking adapter for [`Context::fetch_all`].
    #[cfg(feature = "blocking")]
    pub fn fetch_all_blocking(&self, model: &Arc<ModelType>) -> Result<Vec<RemoteObject>> {
        block_on(self.fetch_all(model))
    }

    /// Blocking adapter for [`Context::fetch_one`].
    #[cfg(feature = "blocking")]
    pub fn fetch_one_blocking(&self, model: &Arc<ModelType>, id: i64) -> Result<RemoteObject> {
        block_on(self.fetch_one(model, id))
    }
}

impl RemoteObject {
    /// Refresh this object from the server: `GET /plural/id.json`.
    ///
    /// Returns whether any declared field actually changed. Requires a
    /// remote ID; fails with [`Error::NullRemoteId`] before any network
    /// activity otherwise.
    pub async fn remote_fetch(&mut self, context: &Context) -> Result<bool> {
        let id = self.remote_id.ok_or(Error::NullRemoteId)?;
        let model = self.model().clone();
        let value = context
            .request(Method::GET, Some(&model), Some(id), None, None)
            .await?;
        let map = expect_object(&value)?;
        self.set_properties_from_remote(
            map,
            context.registry(),
            context.effective_config(Some(&model)),
        )
    }

    /// Create this object remotely: `POST /plural.json` with the object's
    /// representation as the body. The response, including the assigned
    /// remote ID, is applied back onto this object.
    pub async fn remote_create(&mut self, context: &Context) -> Result<()> {
        let model = self.model().clone();
        let body =
            self.remote_json_representation(context.registry(), context.effective_config(Some(&model)));
        let value = context
            .request(Method::POST, Some(&model), None, None, Some(body))
            .await?;
        if let Some(map) = value.as_object() {
            self.set_properties_from_remote(
                map,
                context.registry(),
                context.effective_config(Some(&model)),
            )?;
        }
        Ok(())
    }

    /// Update the corresponding remote object: `PUT /plural/id.json`.
    ///
    /// No local fields are set from the response; the server returns
    /// nothing useful for updates. Nested objects created as part of the
    /// update therefore do not learn their remote IDs.
    pub async fn remote_update(&self, context: &Context) -> Result<()> {
        let id = self.remote_id.ok_or(Error::NullRemoteId)?;
        let model = self.model().clone();
        let body =
            self.remote_json_representation(context.registry(), context.effective_config(Some(&model)));
        context
            .request(Method::PUT, Some(&model), Some(id), None, Some(body))
            .await?;
        Ok(())
    }

    /// Destroy the corresponding remote object: `DELETE /plural/id.json`.
    /// The local object is unaffected.
    pub async fn remote_destroy(&self, context: &Context) -> Result<()> {
        let id = self.remote_id.ok_or(Error::NullRemoteId)?;
        context
            .request(Method::DELETE, Some(self.model()), Some(id), None, None)
            .await?;
        Ok(())
    }

    /// GET a custom method scoped to this instance:
    /// `GET /plural/id/method.json`.
    pub async fn remote_get(&self, context: &Context, custom_method: &str) -> Result<Value> {
        let id = self.remote_id.ok_or(Error::NullRemoteId)?;
        context
            .request(
                Method::GET,
                Some(self.model()),
                Some(id),
                Some(custom_method),
                None,
            )
            .await
    }

    /// Issue a custom-method request scoped to this instance, sending the
    /// object's representation as the body:
    /// `VERB /plural/id/method.json` (`/plural/id.json` without a method).
    pub async fn remote_request(
        &self,
        context: &Context,
        method: Method,
        custom_method: Option<&str>,
    ) -> Result<Value> {
        let id = self.remote_id.ok_or(Error::NullRemoteId)?;
        let model = self.model().clone();
        let body =
            self.remote_json_representation(context.registry(), context.effective_config(Some(&model)));
        context
            .request(method, Some(&model), Some(id), custom_method, Some(body))
            .await
    }

    /// Blocking adapter for [`RemoteObject::remote_fetch`].
    #[cfg(feature = "blocking")]
    pub fn remote_fetch_blocking(&mut self, context: &Context) -> Result<bool> {
        block_on(self.remote_fetch(context))
    }

    /// Blocking adapter for [`RemoteObject::remote_create`].
    #[cfg(feature = "blocking")]
    pub fn remote_create_blocking(&mut self, context: &Context) -> Result<()> {
        block_on(self.remote_create(context))
    }

    /// Blocking adapter for [`RemoteObject::remote_update`].
    #[cfg(feature = "blocking")]
    pub fn remote_update_blocking(&self, context: &Context) -> Result<()> {
        block_on(self.remote_update(context))
    }

    /// Blocking adapter for [`RemoteObject::remote_destroy`].
    #[cfg(feature = "blocking")]
    pub fn remote_destroy_blocking(&self, context: &Context) -> Result<()> {
        block_on(self.remote_destroy(context))
    }
}

fn expect_object(value: &Value) -> Result<&Map<String, Value>> {
    value.as_object().ok_or_else(|| Error::LocalMapping {
        message: "expected a JSON object in response".to_string(),
    })
}

/// Run one operation to completion on an internally created runtime.
#[cfg(feature = "blocking")]
fn block_on<T>(future: impl std::future::Future<Output = Result<T>>) -> Result<T> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::Configuration {
            message: format!("failed to create blocking runtime: {e}"),
            source: Some(anyhow::Error::new(e)),
        })?;
    runtime.block_on(future)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::MockTransport;
    use serde_json::json;

    fn test_context() -> (Arc<MockTransport>, Context, Arc<ModelType>) {
        let mock = Arc::new(MockTransport::new());
        let context = Context::with_transport(
            RemoteConfig::new("http://localhost:3000"),
            mock.clone(),
        );
        let article = context.register(ModelType::new("Article").with_sync("title, content"));
        (mock, context, article)
    }

    #[test]
    fn test_path_construction_table() {
        let (_, context, article) = test_context();
        assert_eq!(context.resource_path(Some(&article), None, None), "articles.json");
        assert_eq!(
            context.resource_path(Some(&article), Some(1), None),
            "articles/1.json"
        );
        assert_eq!(
            context.resource_path(Some(&article), None, Some("register")),
            "articles/register.json"
        );
        assert_eq!(
            context.resource_path(Some(&article), Some(1), Some("register")),
            "articles/1/register.json"
        );
        assert_eq!(context.resource_path(None, None, Some("root")), "root.json");
    }

    #[test]
    fn test_path_lowercasing_runs_after_name_resolution() {
        let mock = Arc::new(MockTransport::new());
        let context =
            Context::with_transport(RemoteConfig::new("http://localhost:3000"), mock);
        let shouting = context.register(
            ModelType::new("Article")
                .with_plural_name("Articles")
                .with_config(RemoteConfig {
                    lowercase_urls: false,
                    ..RemoteConfig::new("http://localhost:3000")
                }),
        );
        // With the toggle off the explicit mixed-case override survives.
        assert_eq!(
            context.resource_path(Some(&shouting), None, None),
            "Articles.json"
        );
    }

    #[tokio::test]
    async fn test_fetch_without_remote_id_hits_no_network() {
        let (mock, context, article) = test_context();
        let mut object = RemoteObject::new(article);

        let err = object.remote_fetch(&context).await.unwrap_err();
        assert!(matches!(err, Error::NullRemoteId));
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn test_create_posts_envelope_and_applies_response() {
        let (mock, context, article) = test_context();
        mock.push_response(201, r#"{"id": 7, "title": "Hello", "content": "body"}"#);

        let mut object = RemoteObject::new(article);
        object.set_scalar("title", "Hello");
        object.remote_create(&context).await.unwrap();

        assert_eq!(object.remote_id, Some(7));
        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::POST);
        assert_eq!(requests[0].url, "http://localhost:3000/articles.json");
        assert_eq!(
            requests[0].body.as_ref().unwrap()["article"]["title"],
            json!("Hello")
        );
    }

    #[tokio::test]
    async fn test_fetch_reports_changes() {
        let (mock, context, article) = test_context();
        mock.push_response(200, r#"{"id": 1, "title": "Hello"}"#);
        mock.push_response(200, r#"{"id": 1, "title": "Hello"}"#);

        let mut object = RemoteObject::new(article);
        object.remote_id = Some(1);
        assert!(object.remote_fetch(&context).await.unwrap());
        assert!(!object.remote_fetch(&context).await.unwrap());
        assert_eq!(mock.requests()[0].url, "http://localhost:3000/articles/1.json");
    }

    #[tokio::test]
    async fn test_update_puts_and_ignores_response_body() {
        let (mock, context, article) = test_context();
        mock.push_response(200, "");

        let mut object = RemoteObject::new(article);
        object.remote_id = Some(4);
        object.set_scalar("title", "Edited");
        object.remote_update(&context).await.unwrap();

        let requests = mock.requests();
        assert_eq!(requests[0].method, Method::PUT);
        assert_eq!(requests[0].url, "http://localhost:3000/articles/4.json");
        assert_eq!(
            requests[0].body.as_ref().unwrap()["article"]["title"],
            json!("Edited")
        );
    }

    #[tokio::test]
    async fn test_destroy_deletes_and_leaves_local_state() {
        let (mock, context, article) = test_context();
        mock.push_response(200, "");

        let mut object = RemoteObject::new(article);
        object.remote_id = Some(4);
        object.set_scalar("title", "Kept");
        object.remote_destroy(&context).await.unwrap();

        let requests = mock.requests();
        assert_eq!(requests[0].method, Method::DELETE);
        assert_eq!(requests[0].url, "http://localhost:3000/articles/4.json");
        assert_eq!(object.remote_id, Some(4));
        assert!(object.get("title").is_some());
    }

    #[tokio::test]
    async fn test_fetch_all_materializes_instances() {
        let (mock, context, article) = test_context();
        mock.push_response(200, r#"[{"id": 1, "title": "a"}, {"id": 2, "title": "b"}]"#);

        let objects = context.fetch_all(&article).await.unwrap();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].remote_id, Some(1));
        assert_eq!(objects[1].remote_id, Some(2));
    }

    #[tokio::test]
    async fn test_fetch_all_rejects_non_array() {
        let (mock, context, article) = test_context();
        mock.push_response(200, r#"{"id": 1}"#);

        let err = context.fetch_all(&article).await.unwrap_err();
        assert!(matches!(err, Error::LocalMapping { .. }));
    }

    #[tokio::test]
    async fn test_custom_methods_route_by_scope() {
        let (mock, context, article) = test_context();
        mock.push_response(200, "{}");
        mock.push_response(200, "{}");
        mock.push_response(200, "{}");

        // Class-scoped custom method.
        context
            .request(Method::POST, Some(&article), None, Some("register"), None)
            .await
            .unwrap();
        // Instance-scoped custom method.
        let mut object = RemoteObject::new(article);
        object.remote_id = Some(1);
        object.remote_get(&context, "register").await.unwrap();
        // Root-level custom method with no type.
        context
            .request(Method::GET, None, None, Some("root"), None)
            .await
            .unwrap();

        let urls: Vec<String> = mock.requests().into_iter().map(|r| r.url).collect();
        assert_eq!(urls[0], "http://localhost:3000/articles/register.json");
        assert_eq!(urls[1], "http://localhost:3000/articles/1/register.json");
        assert_eq!(urls[2], "http://localhost:3000/root.json");
    }

    #[tokio::test]
    async fn test_request_with_no_route_is_rejected() {
        let (mock, context, _) = test_context();
        let err = context
            .request(Method::GET, None, None, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn test_validation_failure_surfaces_per_field_reasons() {
        let (mock, context, article) = test_context();
        mock.push_response(422, r#"{"title": ["can't be blank"]}"#);

        let mut object = RemoteObject::new(article);
        let err = object.remote_create(&context).await.unwrap_err();
        match err {
            Error::RemoteValidation { errors } => {
                assert_eq!(errors["title"], vec!["can't be blank"]);
            }
            other => panic!("expected RemoteValidation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_transport_failure_surfaces_as_is() {
        let (mock, context, article) = test_context();
        mock.push_error("connection refused");

        let err = context.fetch_all(&article).await.unwrap_err();
        match err {
            Error::Transport { message, .. } => assert_eq!(message, "connection refused"),
            other => panic!("expected Transport, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_basic_auth_attached_from_effective_config() {
        let mock = Arc::new(MockTransport::new());
        let context = Context::with_transport(
            RemoteConfig::new("http://localhost:3000").with_credentials("app", "secret"),
            mock.clone(),
        );
        let article = context.register(ModelType::new("Article").with_sync("title"));
        mock.push_response(200, "[]");

        context.fetch_all(&article).await.unwrap();
        assert_eq!(
            mock.requests()[0].basic_auth,
            Some(("app".to_string(), "secret".to_string()))
        );
    }

    #[tokio::test]
    async fn test_per_type_config_fully_replaces_default() {
        let mock = Arc::new(MockTransport::new());
        let context = Context::with_transport(
            RemoteConfig::new("http://localhost:3000").with_credentials("app", "secret"),
            mock.clone(),
        );
        let hosted = context.register(
            ModelType::new("Article")
                .with_sync("title")
                .with_config(RemoteConfig::new("http://other:4000")),
        );
        mock.push_response(200, "[]");

        context.fetch_all(&hosted).await.unwrap();
        let request = &mock.requests()[0];
        assert_eq!(request.url, "http://other:4000/articles.json");
        // The override replaces the default wholesale: no credential merge.
        assert_eq!(request.basic_auth, None);
    }

    #[cfg(feature = "blocking")]
    #[test]
    fn test_blocking_adapter_completes_once() {
        let (mock, context, article) = test_context();
        mock.push_response(200, r#"[{"id": 1, "title": "a"}]"#);

        let objects = context.fetch_all_blocking(&article).unwrap();
        assert_eq!(objects.len(), 1);
        assert_eq!(mock.request_count(), 1);
    }
}
