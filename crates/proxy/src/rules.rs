//! Forwarding table keyed by path prefix.
//!
//! Each [`ForwardRule`] whitelists a public path prefix, names the upstream
//! prefix it maps to, lists the methods it accepts, and carries the
//! [`FailurePolicy`] applied when the upstream call fails. Anything that does
//! not match a rule is never forwarded.
//!
//! A prefix segment written as `{name}` matches any single non-empty segment
//! and may be reused in the upstream prefix.
//!
//! The built-in table can be replaced with a YAML file:
//!
//! ```yaml
//! routes:
//!   - prefix: /api/cart/{id}/decrement
//!     methods: [PATCH]
//!     failure:
//!       status: 500
//!       message: Failed to decrement cart item
//!       relay_upstream_status: true
//!   - prefix: /api/auth/login
//!     upstream_prefix: /auth/login
//!     methods: [POST]
//!     failure: { status: 401, message: Login failed }
//! ```

use std::path::Path;

use axum::http::{Method, StatusCode};
use serde::Deserialize;
use thiserror::Error;

/// Errors building a [`RouteTable`].
#[derive(Debug, Error)]
pub enum RouteTableError {
    #[error("failed to read routes file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse routes file: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid prefix '{0}': must start with '/' and name at least one segment")]
    InvalidPrefix(String),
    #[error("upstream prefix for {prefix} uses unknown parameter '{name}'")]
    UnknownParam { prefix: String, name: String },
    #[error("invalid method '{method}' for prefix {prefix}")]
    InvalidMethod { prefix: String, method: String },
    #[error("no methods listed for prefix {0}")]
    NoMethods(String),
    #[error("invalid failure status {status} for prefix {prefix}")]
    InvalidStatus { prefix: String, status: u16 },
    #[error("routes file contains no routes")]
    Empty,
}

/// What the client sees when forwarding fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailurePolicy {
    /// Status returned on network errors and non-success upstream responses.
    pub status: StatusCode,
    /// Static message placed in the JSON error body.
    pub message: String,
    /// Use the upstream's own status when it answered with an error.
    pub relay_upstream_status: bool,
}

impl FailurePolicy {
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            relay_upstream_status: false,
        }
    }

    #[must_use]
    pub const fn relaying_upstream_status(mut self) -> Self {
        self.relay_upstream_status = true;
        self
    }
}

impl Default for FailurePolicy {
    fn default() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to fetch from backend",
        )
    }
}

/// One segment of a rule prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

impl Segment {
    fn parse_all(prefix: &str) -> Result<Vec<Self>, RouteTableError> {
        prefix
            .split('/')
            .skip(1)
            .map(|raw| {
                let param = raw
                    .strip_prefix('{')
                    .and_then(|rest| rest.strip_suffix('}'));
                match param {
                    Some(name) if !name.is_empty() && !name.contains(['{', '}']) => {
                        Ok(Self::Param(name.to_string()))
                    }
                    None if !raw.is_empty() && !raw.contains(['{', '}']) => {
                        Ok(Self::Literal(raw.to_string()))
                    }
                    _ => Err(RouteTableError::InvalidPrefix(prefix.to_string())),
                }
            })
            .collect()
    }
}

/// One whitelisted path prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardRule {
    prefix: String,
    segments: Vec<Segment>,
    upstream_prefix: String,
    upstream_segments: Vec<Segment>,
    methods: Vec<Method>,
    failure: FailurePolicy,
}

impl ForwardRule {
    /// Create a rule forwarding `prefix` to the same path upstream.
    ///
    /// # Errors
    ///
    /// Returns an error if the prefix is not an absolute, non-root path.
    pub fn new(
        prefix: &str,
        methods: &[Method],
        failure: FailurePolicy,
    ) -> Result<Self, RouteTableError> {
        Self::mapped(prefix, prefix, methods, failure)
    }

    /// Create a rule forwarding `prefix` to a different upstream prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if either prefix is invalid or `methods` is empty.
    pub fn mapped(
        prefix: &str,
        upstream_prefix: &str,
        methods: &[Method],
        failure: FailurePolicy,
    ) -> Result<Self, RouteTableError> {
        let prefix = normalize_prefix(prefix)?;
        let upstream_prefix = normalize_prefix(upstream_prefix)?;
        let segments = Segment::parse_all(&prefix)?;
        let upstream_segments = Segment::parse_all(&upstream_prefix)?;
        let unknown = upstream_segments.iter().find_map(|segment| match segment {
            Segment::Param(name) if !segments.contains(segment) => Some(name.clone()),
            _ => None,
        });
        if let Some(name) = unknown {
            return Err(RouteTableError::UnknownParam { prefix, name });
        }
        if methods.is_empty() {
            return Err(RouteTableError::NoMethods(prefix));
        }
        Ok(Self {
            prefix,
            segments,
            upstream_prefix,
            upstream_segments,
            methods: methods.to_vec(),
            failure,
        })
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    #[must_use]
    pub fn upstream_prefix(&self) -> &str {
        &self.upstream_prefix
    }

    #[must_use]
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    #[must_use]
    pub const fn failure(&self) -> &FailurePolicy {
        &self.failure
    }

    #[must_use]
    pub fn allows(&self, method: &Method) -> bool {
        self.methods.contains(method)
    }

    /// Whether `path` is the prefix itself or lies beneath it.
    #[must_use]
    pub fn covers(&self, path: &str) -> bool {
        self.matched(path).is_some()
    }

    /// Match the prefix segment by segment, returning the captured
    /// parameters and the unmatched remainder of `path`.
    fn matched<'p>(&self, path: &'p str) -> Option<(Vec<(&str, &'p str)>, &'p str)> {
        let mut rest = path;
        let mut params = Vec::new();
        for segment in &self.segments {
            let tail = rest.strip_prefix('/')?;
            let (value, remainder) = tail.find('/').map_or((tail, ""), |i| tail.split_at(i));
            match segment {
                Segment::Literal(literal) if literal == value => {}
                Segment::Param(name) if !value.is_empty() => params.push((name.as_str(), value)),
                _ => return None,
            }
            rest = remainder;
        }
        Some((params, rest))
    }

    /// Upstream path for a covered public path.
    fn upstream_path(&self, path: &str) -> Option<String> {
        let (params, rest) = self.matched(path)?;
        let mut upstream = String::new();
        for segment in &self.upstream_segments {
            upstream.push('/');
            match segment {
                Segment::Literal(literal) => upstream.push_str(literal),
                Segment::Param(name) => {
                    let (_, value) = params.iter().find(|(n, _)| *n == name.as_str())?;
                    upstream.push_str(value);
                }
            }
        }
        upstream.push_str(rest);
        Some(upstream)
    }

    /// Longer prefixes first, then the one with more literal segments.
    fn specificity(&self) -> (usize, usize) {
        let literals = self
            .segments
            .iter()
            .filter(|s| matches!(s, Segment::Literal(_)))
            .count();
        (self.segments.len(), literals)
    }
}

/// Outcome of looking up a request in the table.
#[derive(Debug, PartialEq, Eq)]
pub enum RouteMatch<'a> {
    Forward {
        rule: &'a ForwardRule,
        upstream_path: String,
    },
    MethodNotAllowed,
    NotFound,
    /// The path contains `.` or `..` segments.
    InvalidPath,
}

/// Ordered set of forwarding rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    rules: Vec<ForwardRule>,
}

impl RouteTable {
    #[must_use]
    pub const fn new(rules: Vec<ForwardRule>) -> Self {
        Self { rules }
    }

    #[must_use]
    pub fn rules(&self) -> &[ForwardRule] {
        &self.rules
    }

    /// Find the rule for a request.
    ///
    /// Among rules covering the path and allowing the method, the longest
    /// prefix wins. Paths with dot segments are never forwarded.
    #[must_use]
    pub fn resolve(&self, method: &Method, path: &str) -> RouteMatch<'_> {
        if has_dot_segment(path) {
            return RouteMatch::InvalidPath;
        }

        let mut covered = false;
        let best = self
            .rules
            .iter()
            .filter(|rule| rule.covers(path))
            .inspect(|_| covered = true)
            .filter(|rule| rule.allows(method))
            .max_by_key(|rule| rule.specificity());

        match best.and_then(|rule| Some((rule, rule.upstream_path(path)?))) {
            Some((rule, upstream_path)) => RouteMatch::Forward {
                rule,
                upstream_path,
            },
            None if covered => RouteMatch::MethodNotAllowed,
            None => RouteMatch::NotFound,
        }
    }

    /// Load a table from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or describes invalid rules.
    pub fn load(path: &Path) -> Result<Self, RouteTableError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    /// Parse a table from YAML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed or describes invalid rules.
    pub fn from_yaml(text: &str) -> Result<Self, RouteTableError> {
        let file: RoutesFile = serde_yaml::from_str(text)?;
        if file.routes.is_empty() {
            return Err(RouteTableError::Empty);
        }
        let rules = file
            .routes
            .into_iter()
            .map(RawRule::into_rule)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(rules))
    }

    /// The built-in table covering every route the storefront client uses.
    ///
    /// Login and profile failures answer 401 and registration failures 400.
    /// Only the cart decrement route relays the backend's status, so a
    /// missing line surfaces as 404; every other failure is a fixed 500.
    ///
    /// # Panics
    ///
    /// Never panics: every prefix below is a valid absolute path.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn default_table() -> Self {
        use Method as M;

        let backend = FailurePolicy::default;
        let specs: Vec<(&str, &str, Vec<Method>, FailurePolicy)> = vec![
            ("/api/products", "/api/products", vec![M::GET], backend()),
            ("/api/categories", "/api/categories", vec![M::GET], backend()),
            ("/api/users", "/api/users", vec![M::GET], backend()),
            (
                "/api/cart",
                "/api/cart",
                vec![M::POST],
                FailurePolicy::new(StatusCode::INTERNAL_SERVER_ERROR, "Failed to add to cart"),
            ),
            (
                "/api/cart",
                "/api/cart",
                vec![M::GET],
                FailurePolicy::new(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load cart"),
            ),
            (
                "/api/cart",
                "/api/cart",
                vec![M::DELETE],
                FailurePolicy::new(StatusCode::INTERNAL_SERVER_ERROR, "Failed to delete cart item"),
            ),
            (
                "/api/cart/{id}/decrement",
                "/api/cart/{id}/decrement",
                vec![M::PATCH],
                FailurePolicy::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to decrement cart item",
                )
                .relaying_upstream_status(),
            ),
            (
                "/api/orders",
                "/api/orders",
                vec![M::GET, M::POST, M::PATCH],
                FailurePolicy::new(StatusCode::INTERNAL_SERVER_ERROR, "Order request failed"),
            ),
            (
                "/api/addresses",
                "/api/addresses",
                vec![M::GET, M::POST, M::PUT, M::DELETE],
                FailurePolicy::new(StatusCode::INTERNAL_SERVER_ERROR, "Address request failed"),
            ),
            (
                "/api/wishlist",
                "/api/wishlist",
                vec![M::GET, M::POST, M::DELETE],
                FailurePolicy::new(StatusCode::INTERNAL_SERVER_ERROR, "Wishlist request failed"),
            ),
            (
                "/api/contact",
                "/api/contact",
                vec![M::POST],
                FailurePolicy::new(StatusCode::INTERNAL_SERVER_ERROR, "Failed to send message"),
            ),
        ];

        let auth = [
            ("/login", M::POST, StatusCode::UNAUTHORIZED, "Login failed"),
            ("/register", M::POST, StatusCode::BAD_REQUEST, "Register failed"),
            ("/me", M::GET, StatusCode::UNAUTHORIZED, "Unauthorized"),
        ];
        let auth_specs = auth.into_iter().flat_map(|(suffix, method, status, message)| {
            ["/auth", "/api/auth"].into_iter().map(move |public| {
                (
                    format!("{public}{suffix}"),
                    format!("/auth{suffix}"),
                    method.clone(),
                    FailurePolicy::new(status, message),
                )
            })
        });

        let mut rules: Vec<ForwardRule> = specs
            .into_iter()
            .map(|(prefix, upstream, methods, failure)| {
                ForwardRule::mapped(prefix, upstream, &methods, failure)
                    .expect("built-in prefixes are valid")
            })
            .collect();
        rules.extend(auth_specs.map(|(prefix, upstream, method, failure)| {
            ForwardRule::mapped(&prefix, &upstream, &[method], failure)
                .expect("built-in prefixes are valid")
        }));

        Self::new(rules)
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::default_table()
    }
}

// =============================================================================
// YAML file format
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RoutesFile {
    #[serde(default)]
    routes: Vec<RawRule>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRule {
    prefix: String,
    #[serde(default)]
    upstream_prefix: Option<String>,
    methods: Vec<String>,
    #[serde(default)]
    failure: Option<RawFailure>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFailure {
    status: u16,
    message: String,
    #[serde(default)]
    relay_upstream_status: bool,
}

impl RawRule {
    fn into_rule(self) -> Result<ForwardRule, RouteTableError> {
        let methods = self
            .methods
            .iter()
            .map(|m| {
                m.trim()
                    .to_ascii_uppercase()
                    .parse::<Method>()
                    .map_err(|_| RouteTableError::InvalidMethod {
                        prefix: self.prefix.clone(),
                        method: m.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let failure = match self.failure {
            None => FailurePolicy::default(),
            Some(raw) => {
                let status = StatusCode::from_u16(raw.status)
                    .ok()
                    .filter(|s| s.is_client_error() || s.is_server_error())
                    .ok_or_else(|| RouteTableError::InvalidStatus {
                        prefix: self.prefix.clone(),
                        status: raw.status,
                    })?;
                FailurePolicy {
                    status,
                    message: raw.message,
                    relay_upstream_status: raw.relay_upstream_status,
                }
            }
        };

        let upstream = self.upstream_prefix.as_deref().unwrap_or(&self.prefix);
        ForwardRule::mapped(&self.prefix, upstream, &methods, failure)
    }
}

fn normalize_prefix(raw: &str) -> Result<String, RouteTableError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !trimmed.starts_with('/') || trimmed.len() < 2 || has_dot_segment(trimmed) {
        return Err(RouteTableError::InvalidPrefix(raw.to_string()));
    }
    Ok(trimmed.to_string())
}

/// Whether any segment is `.` or `..`, including percent-encoded dots.
fn has_dot_segment(path: &str) -> bool {
    path.split('/').any(|segment| {
        let decoded = segment.to_ascii_lowercase().replace("%2e", ".");
        decoded == "." || decoded == ".."
    })
}
