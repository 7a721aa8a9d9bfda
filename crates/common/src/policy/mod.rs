//! Access policy evaluation and role routing
//!
//! Pure functions: given a request path and the session's role (if any),
//! decide whether the request may proceed or where it must be redirected.
//! The same evaluation runs twice per request by design: once at the edge
//! middleware and once inside every page handler. The edge check fails
//! open when session infrastructure is broken; the page-level check fails
//! closed.

use crate::db::models::Role;
use serde::Serialize;

/// Login route; redirect target for unauthenticated access
pub const LOGIN_ROUTE: &str = "/auth/login";

/// Generic dashboard route; resolves to the role home
pub const DASHBOARD_ROUTE: &str = "/dashboard";

/// Route classification. Every path belongs to exactly one class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Browsable without a session
    Public,
    /// Sign-in/sign-up surface; bounced when already authenticated
    AuthPages,
    /// Requires any authenticated profile
    Protected,
    /// Requires the admin role
    AdminOnly,
    /// Requires lembaga or admin
    OrganizationOnly,
}

impl RouteClass {
    /// Classify a request path
    pub fn classify(path: &str) -> RouteClass {
        if path == "/auth" || path.starts_with("/auth/") {
            return RouteClass::AuthPages;
        }

        if path == "/dashboard/admin" || path.starts_with("/dashboard/admin/") {
            return RouteClass::AdminOnly;
        }

        let organization_only = path == "/dashboard/org"
            || path.starts_with("/dashboard/org/")
            || path == "/dashboard/legal"
            || path.starts_with("/dashboard/legal/")
            || path.starts_with("/dashboard/jobs")
            || path == "/dashboard/applicants"
            || path.starts_with("/dashboard/applicants/");
        if organization_only {
            return RouteClass::OrganizationOnly;
        }

        if path == "/dashboard"
            || path.starts_with("/dashboard/")
            || path == "/apply"
            || path.starts_with("/apply/")
        {
            return RouteClass::Protected;
        }

        RouteClass::Public
    }

    /// Whether this class requires a session at all
    pub fn requires_session(&self) -> bool {
        matches!(
            self,
            RouteClass::Protected | RouteClass::AdminOnly | RouteClass::OrganizationOnly
        )
    }
}

/// Outcome of evaluating the access policy for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyDecision {
    Allow,
    /// Send to login, preserving the originally requested path
    RedirectToLogin { redirect_to: String },
    /// Send elsewhere (role home or dashboard)
    Redirect { location: String },
}

impl PolicyDecision {
    /// The Location header value for redirect outcomes
    pub fn location(&self) -> Option<String> {
        match self {
            PolicyDecision::Allow => None,
            PolicyDecision::RedirectToLogin { redirect_to } => {
                Some(format!("{LOGIN_ROUTE}?redirectTo={redirect_to}"))
            }
            PolicyDecision::Redirect { location } => Some(location.clone()),
        }
    }
}

/// Login redirect preserving the requested path
pub fn login_redirect(path: &str) -> String {
    format!("{LOGIN_ROUTE}?redirectTo={path}")
}

/// Evaluate the access policy for a path and session role.
/// `None` means unauthenticated.
pub fn evaluate(path: &str, role: Option<Role>) -> PolicyDecision {
    let class = RouteClass::classify(path);

    match role {
        None => {
            if class.requires_session() {
                PolicyDecision::RedirectToLogin {
                    redirect_to: path.to_string(),
                }
            } else {
                PolicyDecision::Allow
            }
        }
        Some(role) => match class {
            // No re-login loops: authenticated users never see auth pages
            RouteClass::AuthPages => PolicyDecision::Redirect {
                location: DASHBOARD_ROUTE.to_string(),
            },
            RouteClass::AdminOnly if !role.is_admin() => PolicyDecision::Redirect {
                location: DASHBOARD_ROUTE.to_string(),
            },
            RouteClass::OrganizationOnly if !role.is_organization() => PolicyDecision::Redirect {
                location: DASHBOARD_ROUTE.to_string(),
            },
            _ => PolicyDecision::Allow,
        },
    }
}

/// Canonical landing route for a role
pub fn home_route(role: Role) -> &'static str {
    match role {
        Role::Admin => "/dashboard/admin/overview",
        Role::Lembaga => "/dashboard/org",
        Role::User => "/dashboard/profile",
    }
}

/// Capabilities a role may exercise; drives both menu rendering and
/// handler guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ManageOwnProfile,
    ManageResumes,
    SubmitApplications,
    EnrollInClasses,
    ManageOrganizationProfile,
    ManageLegalDocuments,
    ManageOwnJobs,
    ReviewApplicants,
    VerifyOrganizations,
    ManageAllJobs,
    ManageClasses,
    ManageUsers,
    ManageSettings,
}

/// The closed capability set for a role
pub fn capabilities(role: Role) -> &'static [Capability] {
    use Capability::*;
    match role {
        Role::User => &[
            ManageOwnProfile,
            ManageResumes,
            SubmitApplications,
            EnrollInClasses,
        ],
        Role::Lembaga => &[
            ManageOrganizationProfile,
            ManageLegalDocuments,
            ManageOwnJobs,
            ReviewApplicants,
        ],
        Role::Admin => &[
            VerifyOrganizations,
            ManageAllJobs,
            ManageClasses,
            ManageUsers,
            ManageSettings,
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_is_total_and_exclusive() {
        let cases = [
            ("/", RouteClass::Public),
            ("/jobs", RouteClass::Public),
            ("/jobs/tokyo-waiter", RouteClass::Public),
            ("/companies", RouteClass::Public),
            ("/classes/kaiwa-basic", RouteClass::Public),
            ("/auth/login", RouteClass::AuthPages),
            ("/auth/register", RouteClass::AuthPages),
            ("/apply/tokyo-waiter", RouteClass::Protected),
            ("/dashboard", RouteClass::Protected),
            ("/dashboard/profile", RouteClass::Protected),
            ("/dashboard/applications", RouteClass::Protected),
            ("/dashboard/resumes", RouteClass::Protected),
            ("/dashboard/org", RouteClass::OrganizationOnly),
            ("/dashboard/legal", RouteClass::OrganizationOnly),
            ("/dashboard/jobs", RouteClass::OrganizationOnly),
            ("/dashboard/jobs/new", RouteClass::OrganizationOnly),
            ("/dashboard/applicants", RouteClass::OrganizationOnly),
            ("/dashboard/admin/overview", RouteClass::AdminOnly),
            ("/dashboard/admin/organizations", RouteClass::AdminOnly),
        ];

        for (path, expected) in cases {
            assert_eq!(RouteClass::classify(path), expected, "path: {path}");
        }
    }

    #[test]
    fn test_unauthenticated_protected_redirects_to_login_with_path() {
        for path in ["/dashboard/profile", "/apply/tokyo-waiter", "/dashboard/admin/overview"] {
            let decision = evaluate(path, None);
            assert_eq!(
                decision,
                PolicyDecision::RedirectToLogin {
                    redirect_to: path.to_string()
                }
            );
            assert_eq!(
                decision.location().unwrap(),
                format!("/auth/login?redirectTo={path}")
            );
        }
    }

    #[test]
    fn test_unauthenticated_public_allowed() {
        assert_eq!(evaluate("/jobs", None), PolicyDecision::Allow);
        assert_eq!(evaluate("/auth/login", None), PolicyDecision::Allow);
    }

    #[test]
    fn test_authenticated_bounced_off_auth_pages() {
        for role in [Role::User, Role::Lembaga, Role::Admin] {
            assert_eq!(
                evaluate("/auth/login", Some(role)),
                PolicyDecision::Redirect {
                    location: "/dashboard".to_string()
                }
            );
        }
    }

    #[test]
    fn test_admin_only_requires_admin() {
        for role in [Role::User, Role::Lembaga] {
            assert_eq!(
                evaluate("/dashboard/admin/overview", Some(role)),
                PolicyDecision::Redirect {
                    location: "/dashboard".to_string()
                },
                "role: {role}"
            );
        }
        assert_eq!(
            evaluate("/dashboard/admin/overview", Some(Role::Admin)),
            PolicyDecision::Allow
        );
    }

    #[test]
    fn test_organization_only_allows_lembaga_and_admin() {
        assert_eq!(
            evaluate("/dashboard/jobs", Some(Role::User)),
            PolicyDecision::Redirect {
                location: "/dashboard".to_string()
            }
        );
        assert_eq!(evaluate("/dashboard/jobs", Some(Role::Lembaga)), PolicyDecision::Allow);
        assert_eq!(evaluate("/dashboard/jobs", Some(Role::Admin)), PolicyDecision::Allow);
    }

    #[test]
    fn test_protected_allows_any_role() {
        for role in [Role::User, Role::Lembaga, Role::Admin] {
            assert_eq!(evaluate("/dashboard/profile", Some(role)), PolicyDecision::Allow);
        }
    }

    #[test]
    fn test_home_routes() {
        assert_eq!(home_route(Role::Admin), "/dashboard/admin/overview");
        assert_eq!(home_route(Role::Lembaga), "/dashboard/org");
        assert_eq!(home_route(Role::User), "/dashboard/profile");
    }

    #[test]
    fn test_capability_sets_are_disjoint_enough() {
        assert!(capabilities(Role::Admin).contains(&Capability::VerifyOrganizations));
        assert!(!capabilities(Role::Lembaga).contains(&Capability::VerifyOrganizations));
        assert!(capabilities(Role::Lembaga).contains(&Capability::ManageOwnJobs));
        assert!(!capabilities(Role::User).contains(&Capability::ManageOwnJobs));
        assert!(capabilities(Role::User).contains(&Capability::SubmitApplications));
    }
}
