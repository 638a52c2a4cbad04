use std::collections::HashMap;

use axum::async_trait;
use axum::extract::{FromRequest, Multipart, Query, Request};
use axum::http::header::CONTENT_TYPE;
use axum::Form;

use crate::app::AppState;
use crate::errors::AppError;

/// Everything the authorization layer needs from one inbound request,
/// captured eagerly so rules and resolvers never reach into ambient
/// request state. Built per invocation, never persisted.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Principal uid from the bearer token, if one was presented and
    /// verified. Absence makes every dynamic check fail closed.
    pub session_uid: Option<String>,
    pub query: HashMap<String, String>,
    pub headers: HashMap<String, String>,
    /// Form fields from an urlencoded or multipart body. A request
    /// carries at most one body kind, so one map serves both.
    pub form: HashMap<String, String>,
    pub path: String,
}

impl RequestContext {
    /// Resolve the target object id. Search order, first source that
    /// carries an `id` wins: query string, header, form body, then the
    /// trailing path segment (`.../view/10` -> `10`). Malformed values
    /// resolve to `None` rather than erroring; callers treat `None` as
    /// "check is not object-scoped".
    pub fn object_id(&self) -> Option<i64> {
        for source in [
            self.query.get("id"),
            self.headers.get("id"),
            self.form.get("id"),
        ]
        .into_iter()
        .flatten()
        {
            return parse_id(source);
        }

        self.path.rsplit('/').next().and_then(parse_id)
    }
}

fn parse_id(raw: impl AsRef<str>) -> Option<i64> {
    raw.as_ref().trim().parse::<i64>().ok()
}

#[async_trait]
impl FromRequest<AppState> for RequestContext {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let (parts, body) = req.into_parts();

        let path = parts.uri.path().to_string();

        let query = Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
            .map(|q| q.0)
            .unwrap_or_default();

        let headers: HashMap<String, String> = parts
            .headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        let session_uid = headers
            .get("authorization")
            .and_then(|v| v.strip_prefix("Bearer "))
            .and_then(|token| state.jwt.decode(token).ok())
            .map(|claims| claims.sub);

        let content_type = parts
            .headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let req = Request::from_parts(parts, body);

        let form = if content_type.starts_with("application/x-www-form-urlencoded") {
            Form::<HashMap<String, String>>::from_request(req, state)
                .await
                .map(|f| f.0)
                .unwrap_or_default()
        } else if content_type.starts_with("multipart/form-data") {
            multipart_fields(req, state).await
        } else {
            HashMap::new()
        };

        Ok(RequestContext {
            session_uid,
            query,
            headers,
            form,
            path,
        })
    }
}

/// Collect the text fields of a multipart body. Malformed bodies and
/// file fields are skipped; resolution fails soft to an empty map.
async fn multipart_fields(req: Request, state: &AppState) -> HashMap<String, String> {
    let mut fields = HashMap::new();

    let Ok(mut multipart) = Multipart::from_request(req, state).await else {
        return fields;
    };

    while let Ok(Some(field)) = multipart.next_field().await {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        if let Ok(value) = field.text().await {
            fields.insert(name, value);
        }
    }

    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> RequestContext {
        RequestContext {
            path: "/portfolio-entries/view/7".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn query_wins_over_path() {
        let mut ctx = ctx();
        ctx.query.insert("id".to_string(), "5".to_string());
        assert_eq!(ctx.object_id(), Some(5));
    }

    #[test]
    fn header_wins_over_form() {
        let mut ctx = ctx();
        ctx.headers.insert("id".to_string(), "3".to_string());
        ctx.form.insert("id".to_string(), "4".to_string());
        assert_eq!(ctx.object_id(), Some(3));
    }

    #[test]
    fn form_wins_over_path() {
        let mut ctx = ctx();
        ctx.form.insert("id".to_string(), "4".to_string());
        assert_eq!(ctx.object_id(), Some(4));
    }

    #[test]
    fn falls_back_to_trailing_path_segment() {
        assert_eq!(ctx().object_id(), Some(7));
    }

    #[test]
    fn non_numeric_path_segment_is_absent() {
        let ctx = RequestContext {
            path: "/portfolio-entries/list".to_string(),
            ..Default::default()
        };
        assert_eq!(ctx.object_id(), None);
    }

    #[test]
    fn malformed_explicit_id_is_absent_without_fallthrough() {
        let mut ctx = ctx();
        ctx.query.insert("id".to_string(), "not-a-number".to_string());
        assert_eq!(ctx.object_id(), None);
    }
}
