//! REST handlers: token endpoints, the profile and every site-scoped catalog
//! collection behind one dispatcher.

use crate::catalog::service_categories::{sort_by_hierarchy, HierarchyItem, HierarchyMeta, ServiceCategory};
use crate::mock::error::{ApiError, FieldErrors};
use crate::mock::model::{CollectionSpec, FieldKind};
use crate::mock::query::{page_url, run, ListQuery};
use crate::mock::render::{Renderer, View};
use crate::mock::state::{record_id, MockState, MockUser, Record, Tables};
use crate::mock::validation::{coerce_form_value, extract_fields, RequestValidator, WriteTarget};
use crate::response::PaginatedResponse;
use axum::body::to_bytes;
use axum::extract::{FromRequest, Multipart, OriginalUri, Path, Query, Request, State};
use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{json, Value};

#[derive(Serialize)]
pub struct HealthBody {
    status: &'static str,
}

pub async fn health() -> Json<HealthBody> {
    Json(HealthBody { status: "ok" })
}

pub async fn version() -> Json<Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// POST /auth-tokens: `{email, password}` → `{access, refresh}`.
pub async fn login(State(state): State<MockState>, Json(body): Json<Value>) -> Result<Json<Value>, ApiError> {
    let email = body.get("email").and_then(Value::as_str);
    let password = body.get("password").and_then(Value::as_str);
    let (Some(email), Some(password)) = (email, password) else {
        let mut errors = FieldErrors::new();
        for (field, value) in [("email", email), ("password", password)] {
            if value.is_none() {
                errors.insert(field.to_string(), vec!["This field is required.".to_string()]);
            }
        }
        return Err(ApiError::Validation(errors));
    };
    let user = state
        .user_by_credentials(email, password)
        .cloned()
        .ok_or_else(|| ApiError::Unauthorized("No active account found with the given credentials".into()))?;
    let (access, refresh) = state.issue_tokens(&user);
    tracing::info!(email = %user.email, "signed in");
    Ok(Json(json!({ "access": access, "refresh": refresh })))
}

/// POST /auth-tokens/refresh/: `{refresh}` → `{access}`.
pub async fn refresh(State(state): State<MockState>, Json(body): Json<Value>) -> Result<Json<Value>, ApiError> {
    let token = body
        .get("refresh")
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::field("refresh", "This field is required."))?;
    let access = state.refresh(token)?;
    tracing::debug!(calls = state.refresh_calls(), "access token refreshed");
    Ok(Json(json!({ "access": access })))
}

/// GET /users/me/
pub async fn me(State(state): State<MockState>, headers: HeaderMap) -> Result<Json<MockUser>, ApiError> {
    let user = state.authenticate(bearer(&headers))?;
    Ok(Json(user.clone()))
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
}

fn origin(headers: &HeaderMap) -> String {
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    format!("http://{}", host)
}

fn timestamp() -> Value {
    Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true))
}

/// A collection as addressed by one request, optionally under a parent record.
struct Scope<'a> {
    spec: &'a CollectionSpec,
    parent_id: Option<String>,
}

impl Scope<'_> {
    fn contains(&self, record: &Record) -> bool {
        match (&self.spec.parent, &self.parent_id) {
            (Some(parent), Some(id)) => record.get(parent.key).and_then(Value::as_str) == Some(id.as_str()),
            _ => true,
        }
    }

    fn position(&self, tables: &Tables, site: &str, id: &str) -> Option<usize> {
        tables
            .rows(site, self.spec.segment)
            .iter()
            .position(|r| record_id(r) == Some(id) && self.contains(r))
    }
}

/// Who is writing where.
struct WriteContext<'a> {
    state: &'a MockState,
    site: &'a str,
    user: &'a MockUser,
}

/// Uploaded file as stored on a record.
struct StoredFile {
    url: String,
    file_name: String,
    file_type: String,
}

struct Incoming {
    fields: Record,
    file: Option<StoredFile>,
}

/// Any method on `/sites/{site}/...`.
pub async fn site_resource(
    State(state): State<MockState>,
    method: Method,
    Path((site, rest)): Path<(String, String)>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<Vec<(String, String)>>,
    headers: HeaderMap,
    request: Request,
) -> Result<Response, ApiError> {
    let user = state.authenticate(bearer(&headers))?.clone();
    let origin = origin(&headers);
    let segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();

    let (scope, id) = match segments.as_slice() {
        ["service-categories", "hierarchy"] => {
            return match method {
                Method::GET => hierarchy(&state, &site),
                other => Err(ApiError::MethodNotAllowed(other.to_string())),
            };
        }
        [segment] => (top_level(&state, segment)?, None),
        [segment, id] => (top_level(&state, segment)?, Some(*id)),
        [parent, parent_id, segment] => (nested(&state, &site, parent, parent_id, segment)?, None),
        [parent, parent_id, segment, id] => (nested(&state, &site, parent, parent_id, segment)?, Some(*id)),
        _ => return Err(ApiError::NotFound),
    };
    let ctx = WriteContext {
        state: &state,
        site: &site,
        user: &user,
    };

    match (method, id) {
        (Method::GET, None) => {
            let base = format!("{}{}", origin, uri.path());
            list(&state, &site, &scope, &params, &base)
        }
        (Method::POST, None) => {
            let incoming = read_body(scope.spec, request, &origin).await?;
            create(&ctx, &scope, incoming)
        }
        (Method::GET, Some(id)) => retrieve(&state, &site, &scope, id),
        (Method::PUT, Some(id)) => {
            let incoming = read_body(scope.spec, request, &origin).await?;
            update(&ctx, &scope, id, incoming, false)
        }
        (Method::PATCH, Some(id)) => {
            let incoming = read_body(scope.spec, request, &origin).await?;
            update(&ctx, &scope, id, incoming, true)
        }
        (Method::DELETE, Some(id)) => destroy(&ctx, &scope, id),
        (other, _) => Err(ApiError::MethodNotAllowed(other.to_string())),
    }
}

fn top_level<'a>(state: &'a MockState, segment: &str) -> Result<Scope<'a>, ApiError> {
    let spec = state.model().top_level(segment).ok_or(ApiError::NotFound)?;
    Ok(Scope { spec, parent_id: None })
}

fn nested<'a>(
    state: &'a MockState,
    site: &str,
    parent: &str,
    parent_id: &str,
    segment: &str,
) -> Result<Scope<'a>, ApiError> {
    let spec = state.model().nested(parent, segment).ok_or(ApiError::NotFound)?;
    if state.tables()?.find(site, parent, parent_id).is_none() {
        return Err(ApiError::NotFound);
    }
    Ok(Scope {
        spec,
        parent_id: Some(parent_id.to_string()),
    })
}

async fn read_body(spec: &CollectionSpec, request: Request, origin: &str) -> Result<Incoming, ApiError> {
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));
    if is_multipart {
        return read_multipart(spec, request, origin).await;
    }
    let bytes = to_bytes(request.into_body(), usize::MAX)
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Incoming {
            fields: Record::new(),
            file: None,
        });
    }
    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(fields)) => Ok(Incoming { fields, file: None }),
        Ok(_) => Err(ApiError::BadRequest("Expected a JSON object.".into())),
        Err(e) => Err(ApiError::BadRequest(format!("JSON parse error - {}", e))),
    }
}

async fn read_multipart(spec: &CollectionSpec, request: Request, origin: &str) -> Result<Incoming, ApiError> {
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let mut fields = Record::new();
    let mut file = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if let Some(file_name) = field.file_name().map(str::to_string) {
            let file_type = field.content_type().unwrap_or("application/octet-stream").to_string();
            let bytes = field.bytes().await.map_err(|e| ApiError::BadRequest(e.body_text()))?;
            if name != "file" || !spec.has_file() {
                continue;
            }
            tracing::debug!(collection = spec.segment, %file_name, size = bytes.len(), "file received");
            file = Some(StoredFile {
                url: format!("{}/media/{}/{}/{}", origin, spec.segment, uuid::Uuid::new_v4().simple(), file_name),
                file_name,
                file_type,
            });
            continue;
        }
        let text = field.text().await.map_err(|e| ApiError::BadRequest(e.body_text()))?;
        let field_spec = spec.fields.iter().find(|f| f.request_keys().any(|k| k == name));
        let value = coerce_form_value(field_spec, text);
        if matches!(field_spec.map(|f| &f.kind), Some(FieldKind::RefList { .. })) {
            if let Value::Array(items) = fields.entry(name).or_insert_with(|| Value::Array(Vec::new())) {
                items.push(value);
            }
        } else {
            fields.insert(name, value);
        }
    }
    Ok(Incoming { fields, file })
}

fn list(
    state: &MockState,
    site: &str,
    scope: &Scope<'_>,
    params: &[(String, String)],
    base: &str,
) -> Result<Response, ApiError> {
    let spec = scope.spec;
    let mut query = ListQuery::parse(params, spec, state.config())?;
    if let (Some(parent), Some(parent_id)) = (&spec.parent, &scope.parent_id) {
        query.filters.push((parent.key.to_string(), parent_id.clone()));
    }
    let tables = state.tables()?;
    let page = run(spec, tables.rows(site, spec.segment), &query)?;
    let renderer = Renderer::new(state.model(), &tables, site);
    let body = PaginatedResponse {
        count: page.count as u64,
        next: page.next_page.map(|p| page_url(base, params, p)).transpose()?,
        previous: page.previous_page.map(|p| page_url(base, params, p)).transpose()?,
        results: page
            .rows
            .iter()
            .map(|r| renderer.render(spec, r, View::List))
            .collect::<Vec<_>>(),
    };
    Ok(Json(body).into_response())
}

fn retrieve(state: &MockState, site: &str, scope: &Scope<'_>, id: &str) -> Result<Response, ApiError> {
    let tables = state.tables()?;
    let index = scope.position(&tables, site, id).ok_or(ApiError::NotFound)?;
    let record = &tables.rows(site, scope.spec.segment)[index];
    let body = Renderer::new(state.model(), &tables, site).render(scope.spec, record, View::Detail);
    Ok(Json(body).into_response())
}

fn create(ctx: &WriteContext<'_>, scope: &Scope<'_>, incoming: Incoming) -> Result<Response, ApiError> {
    let spec = scope.spec;
    let site = ctx.site;
    let mut tables = ctx.state.tables_mut()?;

    let mut body = extract_fields(spec, incoming.fields);
    if let Some(file) = &incoming.file {
        body.insert("file".into(), Value::String(file.url.clone()));
    }
    fill_slug(spec, &mut body, &tables, site, None);
    let target = WriteTarget {
        site,
        tables: &tables,
        id: None,
    };
    RequestValidator::validate(spec, &body, &target)?;

    let id = uuid::Uuid::new_v4().to_string();
    let now = timestamp();
    let mut record = Record::new();
    record.insert("id".into(), Value::String(id.clone()));
    for field in &spec.fields {
        let value = body.remove(field.name).unwrap_or_else(|| field.default.clone());
        record.insert(field.name.to_string(), value);
    }
    if let Some(file) = incoming.file {
        record.insert("file_name".into(), Value::String(file.file_name));
        record.insert("file_type".into(), Value::String(file.file_type));
    }
    if let (Some(parent), Some(parent_id)) = (&spec.parent, &scope.parent_id) {
        record.insert(parent.key.to_string(), Value::String(parent_id.clone()));
    }
    record.insert("site".into(), Value::String(site.to_string()));
    record.insert("creator".into(), json!(ctx.user));
    record.insert("created".into(), now.clone());
    record.insert("updated".into(), now);

    clear_exclusive_flags(scope, &mut tables, site, &record);
    tables.rows_mut(site, spec.segment).push(record);
    tracing::info!(collection = spec.segment, %site, %id, "created");

    let record = tables.find(site, spec.segment, &id).ok_or(ApiError::NotFound)?;
    let body = Renderer::new(ctx.state.model(), &tables, site).render(spec, record, View::Detail);
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

fn update(
    ctx: &WriteContext<'_>,
    scope: &Scope<'_>,
    id: &str,
    incoming: Incoming,
    partial: bool,
) -> Result<Response, ApiError> {
    let spec = scope.spec;
    let site = ctx.site;
    let mut tables = ctx.state.tables_mut()?;
    let index = scope.position(&tables, site, id).ok_or(ApiError::NotFound)?;
    let mut record = tables.rows(site, spec.segment)[index].clone();

    let mut body = extract_fields(spec, incoming.fields);
    if let Some(file) = &incoming.file {
        body.insert("file".into(), Value::String(file.url.clone()));
    }
    fill_slug(spec, &mut body, &tables, site, Some(&record));
    let target = WriteTarget {
        site,
        tables: &tables,
        id: Some(id),
    };
    if partial {
        RequestValidator::validate_partial(spec, &body, &target)?;
    } else {
        RequestValidator::validate(spec, &body, &target)?;
    }

    for (key, value) in body {
        record.insert(key, value);
    }
    if let Some(file) = incoming.file {
        record.insert("file_name".into(), Value::String(file.file_name));
        record.insert("file_type".into(), Value::String(file.file_type));
    }
    record.insert("updated".into(), timestamp());

    clear_exclusive_flags(scope, &mut tables, site, &record);
    tables.rows_mut(site, spec.segment)[index] = record;
    tracing::info!(collection = spec.segment, %site, %id, partial, "updated");

    let record = &tables.rows(site, spec.segment)[index];
    let body = Renderer::new(ctx.state.model(), &tables, site).render(spec, record, View::Detail);
    Ok(Json(body).into_response())
}

fn destroy(ctx: &WriteContext<'_>, scope: &Scope<'_>, id: &str) -> Result<Response, ApiError> {
    let spec = scope.spec;
    let site = ctx.site;
    let mut tables = ctx.state.tables_mut()?;
    let index = scope.position(&tables, site, id).ok_or(ApiError::NotFound)?;
    tables.rows_mut(site, spec.segment).remove(index);
    for child in ctx.state.model().children_of(spec.segment) {
        if let Some(parent) = &child.parent {
            tables
                .rows_mut(site, child.segment)
                .retain(|r| r.get(parent.key).and_then(Value::as_str) != Some(id));
        }
    }
    tracing::info!(collection = spec.segment, %site, %id, "deleted");
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// GET service-categories/hierarchy/: every category in tree order plus meta.
fn hierarchy(state: &MockState, site: &str) -> Result<Response, ApiError> {
    let spec = state.model().get("service-categories").ok_or(ApiError::NotFound)?;
    let tables = state.tables()?;
    let renderer = Renderer::new(state.model(), &tables, site);
    let categories = tables
        .rows(site, spec.segment)
        .iter()
        .map(|r| serde_json::from_value::<ServiceCategory>(renderer.render(spec, r, View::List)))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ApiError::Internal(format!("category does not render: {}", e)))?;
    let meta = HierarchyMeta::from_categories(&categories);
    let items: Vec<HierarchyItem> = sort_by_hierarchy(&categories)
        .into_iter()
        .map(|c| HierarchyItem {
            parent_id: c.parent_id().map(str::to_string),
            id: c.id,
            name: c.name,
            slug: c.slug,
            brief: c.brief,
            is_published: c.is_published,
            order: c.order,
            level: c.level,
            has_children: c.has_children,
        })
        .collect();
    Ok(Json(json!({ "categories": items, "meta": meta })).into_response())
}

/// Generate `slug` from the collection's source field when the request has none.
/// An existing record keeps its slug unless a new one is sent.
fn fill_slug(spec: &CollectionSpec, body: &mut Record, tables: &Tables, site: &str, existing: Option<&Record>) {
    let Some(source) = spec.slug_from else {
        return;
    };
    if body.get("slug").and_then(Value::as_str).is_some_and(|s| !s.is_empty()) {
        return;
    }
    if existing.is_some() && !body.contains_key("slug") {
        return;
    }
    let Some(text) = body
        .get(source)
        .or_else(|| existing.and_then(|r| r.get(source)))
        .and_then(Value::as_str)
    else {
        return;
    };
    let own_id = existing.and_then(record_id);
    let taken = |candidate: &str| {
        tables
            .rows(site, spec.segment)
            .iter()
            .any(|r| r.get("slug").and_then(Value::as_str) == Some(candidate) && record_id(r) != own_id)
    };
    let base = slugify(text);
    let mut candidate = base.clone();
    let mut n = 2;
    while taken(&candidate) {
        candidate = format!("{}-{}", base, n);
        n += 1;
    }
    body.insert("slug".into(), Value::String(candidate));
}

/// Lowercase ASCII letters and digits joined by single hyphens.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-').to_string();
    if slug.is_empty() {
        uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
    } else {
        slug
    }
}

/// A flag such as `is_primary` set on `record` is cleared on its siblings.
fn clear_exclusive_flags(scope: &Scope<'_>, tables: &mut Tables, site: &str, record: &Record) {
    let spec = scope.spec;
    let own_id = record_id(record).map(str::to_string);
    for flag in spec.exclusive_flags {
        if record.get(*flag) != Some(&Value::Bool(true)) {
            continue;
        }
        for sibling in tables.rows_mut(site, spec.segment).iter_mut() {
            if scope.contains(sibling) && record_id(sibling).map(str::to_string) != own_id {
                sibling.insert(flag.to_string(), Value::Bool(false));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Acme Corp."), "acme-corp");
        assert_eq!(slugify("  Hair -- Cut  2 "), "hair-cut-2");
        assert_eq!(slugify("snake_case"), "snake_case");
        assert_eq!(slugify("Привет").len(), 8);
    }

    #[test]
    fn slug_is_generated_unique_within_site() {
        let model = crate::mock::model::CatalogModel::catalog();
        let spec = model.get("brands").unwrap();
        let mut tables = Tables::default();
        tables
            .rows_mut("s1", "brands")
            .push(json!({"id": "b1", "slug": "acme"}).as_object().cloned().unwrap());

        let mut body = json!({"name": "Acme"}).as_object().cloned().unwrap();
        fill_slug(spec, &mut body, &tables, "s1", None);
        assert_eq!(body["slug"], json!("acme-2"));

        let mut body = json!({"name": "Acme"}).as_object().cloned().unwrap();
        fill_slug(spec, &mut body, &tables, "s2", None);
        assert_eq!(body["slug"], json!("acme"));
    }

    #[test]
    fn patch_without_slug_keeps_the_existing_one() {
        let model = crate::mock::model::CatalogModel::catalog();
        let spec = model.get("brands").unwrap();
        let tables = Tables::default();
        let existing = json!({"id": "b1", "name": "Acme", "slug": "custom"}).as_object().cloned().unwrap();
        let mut body = json!({"name": "Renamed"}).as_object().cloned().unwrap();
        fill_slug(spec, &mut body, &tables, "s1", Some(&existing));
        assert!(body.get("slug").is_none());
    }
}
