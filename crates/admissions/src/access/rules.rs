use axum::http::Method;

use crate::identity::Role;

/// Minimal role a route declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleRequirement {
    /// Open to unauthenticated callers; no token is inspected.
    Public,
    /// Any valid token.
    Authenticated,
    Applicant,
    Staff,
}

impl RoleRequirement {
    pub fn admits(self, role: Role) -> bool {
        match self {
            RoleRequirement::Public | RoleRequirement::Authenticated => true,
            RoleRequirement::Applicant => role >= Role::Applicant,
            RoleRequirement::Staff => role >= Role::Staff,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            RoleRequirement::Public => "public",
            RoleRequirement::Authenticated => "authenticated",
            RoleRequirement::Applicant => "applicant",
            RoleRequirement::Staff => "staff",
        }
    }
}

/// Identity-scoped check layered on top of the role check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    None,
    /// The named path parameter must equal the caller's own application id.
    Application { param: &'static str },
}

#[derive(Debug, Clone)]
pub struct AccessRule {
    pub method: Method,
    /// Path pattern with `{name}` placeholders, e.g. `/applications/{id}`.
    pub pattern: &'static str,
    pub requirement: RoleRequirement,
    pub ownership: Ownership,
}

impl AccessRule {
    pub fn new(method: Method, pattern: &'static str, requirement: RoleRequirement) -> Self {
        Self {
            method,
            pattern,
            requirement,
            ownership: Ownership::None,
        }
    }

    pub fn owned_by_caller(mut self, param: &'static str) -> Self {
        self.ownership = Ownership::Application { param };
        self
    }
}

#[derive(Debug)]
pub struct RouteMatch<'a> {
    pub rule: &'a AccessRule,
    params: Vec<(&'static str, String)>,
}

impl RouteMatch<'_> {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Ordered rule list; the first matching rule wins.
#[derive(Debug, Clone)]
pub struct RouteTable {
    rules: Vec<AccessRule>,
    fallback: RoleRequirement,
}

impl RouteTable {
    pub fn new(rules: Vec<AccessRule>) -> Self {
        Self {
            rules,
            fallback: RoleRequirement::Authenticated,
        }
    }

    /// Routes served by the admissions API.
    pub fn admissions() -> Self {
        use RoleRequirement::{Applicant, Authenticated, Public, Staff};

        Self::new(vec![
            AccessRule::new(Method::GET, "/health", Public),
            AccessRule::new(Method::GET, "/ready", Public),
            AccessRule::new(Method::GET, "/metrics", Public),
            AccessRule::new(Method::POST, "/auth/signup", Public),
            AccessRule::new(Method::POST, "/auth/login", Public),
            AccessRule::new(Method::GET, "/auth/me", Authenticated),
            AccessRule::new(Method::DELETE, "/auth/me", Authenticated),
            AccessRule::new(Method::POST, "/applications", Applicant),
            AccessRule::new(Method::GET, "/applications", Staff),
            AccessRule::new(Method::GET, "/applications/me", Applicant),
            AccessRule::new(Method::GET, "/applications/user/{userId}", Staff),
            AccessRule::new(Method::PUT, "/applications/status/{applicationId}", Staff),
            AccessRule::new(Method::PUT, "/applications/{id}/report", Staff),
            AccessRule::new(Method::GET, "/applications/{id}", Staff),
            AccessRule::new(Method::PUT, "/applications/{id}", Applicant).owned_by_caller("id"),
            AccessRule::new(Method::DELETE, "/applications/{id}", Staff),
            AccessRule::new(Method::POST, "/media/signed-url", Applicant),
        ])
    }

    pub fn fallback(&self) -> RoleRequirement {
        self.fallback
    }

    pub fn rules(&self) -> &[AccessRule] {
        &self.rules
    }

    pub fn resolve(&self, method: &Method, path: &str) -> Option<RouteMatch<'_>> {
        self.rules
            .iter()
            .filter(|rule| rule.method == *method)
            .find_map(|rule| {
                match_pattern(rule.pattern, path).map(|params| RouteMatch { rule, params })
            })
    }
}

fn match_pattern(pattern: &'static str, path: &str) -> Option<Vec<(&'static str, String)>> {
    let mut expected = pattern.trim_end_matches('/').split('/');
    let mut actual = path.trim_end_matches('/').split('/');
    let mut params = Vec::new();

    loop {
        match (expected.next(), actual.next()) {
            (None, None) => return Some(params),
            (Some(segment), Some(value)) => {
                if let Some(name) = segment
                    .strip_prefix('{')
                    .and_then(|rest| rest.strip_suffix('}'))
                {
                    if value.is_empty() {
                        return None;
                    }
                    params.push((name, value.to_string()));
                } else if segment != value {
                    return None;
                }
            }
            _ => return None,
        }
    }
}
