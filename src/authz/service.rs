use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::authz::cache::{decision_key, DecisionCache, Lookup};
use crate::authz::context::RequestContext;
use crate::authz::rules::{self, DynamicRule, EvalCtx};
use crate::errors::AppResult;
use crate::store::{AccountStore, DirectoryStore};

/// Central authorization gateway. Every dynamic check funnels through
/// here: resolve the object id, consult the cache, run the registered
/// rule on a miss. Failures deny: an unknown permission name, a
/// session uid with no principal, or a store error all come back
/// `false` rather than an error the caller could mishandle.
pub struct SecurityService {
    rules: HashMap<&'static str, Box<dyn DynamicRule>>,
    cache: DecisionCache,
    directory: Arc<dyn DirectoryStore>,
    accounts: Arc<dyn AccountStore>,
}

impl SecurityService {
    pub fn new(directory: Arc<dyn DirectoryStore>, accounts: Arc<dyn AccountStore>) -> Self {
        Self::with_cache(directory, accounts, DecisionCache::default())
    }

    pub fn with_cache(
        directory: Arc<dyn DirectoryStore>,
        accounts: Arc<dyn AccountStore>,
        cache: DecisionCache,
    ) -> Self {
        Self {
            rules: rules::registry(),
            cache,
            directory,
            accounts,
        }
    }

    /// Dynamic check against the object identified by the request.
    pub async fn is_allowed(&self, permission: &str, ctx: &RequestContext) -> bool {
        let Some(session_uid) = ctx.session_uid.as_deref() else {
            warn!(permission, "dynamic check without a session, denying");
            return false;
        };
        self.is_allowed_with_id(permission, session_uid, ctx.object_id())
            .await
    }

    /// Dynamic check against an explicit object id.
    pub async fn is_allowed_with_id(
        &self,
        permission: &str,
        session_uid: &str,
        object_id: Option<i64>,
    ) -> bool {
        let key = decision_key(session_uid, permission, object_id);
        let flight = match self.cache.lookup(&key).await {
            Lookup::Hit(value) => {
                debug!(permission, session_uid, ?object_id, value, "cached decision");
                return value;
            }
            Lookup::Miss(flight) => flight,
        };

        match self.evaluate(permission, session_uid, object_id).await {
            Ok(value) => {
                debug!(permission, session_uid, ?object_id, value, "computed decision");
                self.cache.complete(flight, value);
                value
            }
            // Denied but not cached; the next check retries.
            Err(err) => {
                warn!(permission, session_uid, ?object_id, %err, "authorization check failed, denying");
                false
            }
        }
    }

    /// Static check: does the principal hold the named grant. No
    /// object, no cache.
    pub async fn check_permission(&self, permission: &str, session_uid: &str) -> bool {
        match self.accounts.principal_by_uid(session_uid).await {
            Ok(Some(principal)) => principal.has_permission(permission),
            Ok(None) => false,
            Err(err) => {
                warn!(permission, session_uid, %err, "principal lookup failed, denying");
                false
            }
        }
    }

    async fn evaluate(
        &self,
        permission: &str,
        session_uid: &str,
        object_id: Option<i64>,
    ) -> AppResult<bool> {
        let Some(rule) = self.rules.get(permission) else {
            error!(permission, "no rule registered for dynamic permission");
            return Ok(false);
        };
        let ctx = EvalCtx {
            directory: self.directory.as_ref(),
            accounts: self.accounts.as_ref(),
            session_uid,
        };
        rule.evaluate(&ctx, object_id).await
    }
}
