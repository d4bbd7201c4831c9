//! Page-level gate: decides whether a page request is served or redirected.

use super::{table::AREAS, Decision, Principal};

pub const SIGN_IN_PATH: &str = "/auth/signin";
pub const DASHBOARD_PATH: &str = "/dashboard";

const PUBLIC_PATHS: &[&str] = &["/", "/auth/signin", "/auth/signup"];

/// Split a request path into segments, dropping empty and `.` segments and
/// resolving `..` against what came before.
pub fn normalize(path: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments
}

fn matches_prefix(segments: &[&str], prefix: &str) -> bool {
    let prefix = normalize(prefix);
    segments.len() >= prefix.len() && segments[..prefix.len()] == prefix[..]
}

pub fn is_public(path: &str) -> bool {
    let segments = normalize(path);
    PUBLIC_PATHS
        .iter()
        .any(|public| normalize(public) == segments)
}

/// Decide a page request for `path` given the caller's session, if any.
pub fn decide(path: &str, principal: Option<&Principal>) -> Decision {
    if is_public(path) {
        return Decision::Allow;
    }

    let principal = match principal {
        Some(p) if p.is_active => p,
        _ => return Decision::Redirect(SIGN_IN_PATH),
    };

    let segments = normalize(path);
    let area = AREAS.iter().find(|area| {
        area.prefixes
            .iter()
            .any(|prefix| matches_prefix(&segments, prefix))
    });

    match area {
        Some(area) if !area.roles.contains(&principal.role) => Decision::Redirect(DASHBOARD_PATH),
        _ => Decision::Allow,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Role;
    use uuid::Uuid;

    fn principal(role: Role) -> Principal {
        Principal {
            id: Uuid::new_v4(),
            role,
            company_id: None,
            is_active: true,
        }
    }

    #[test]
    fn normalize_resolves_dot_segments() {
        assert_eq!(normalize("/dashboard/../admin"), vec!["admin"]);
        assert_eq!(normalize("//dashboard/./intern/"), vec!["dashboard", "intern"]);
        assert_eq!(normalize("/../.."), Vec::<&str>::new());
    }

    #[test]
    fn public_paths_need_no_session() {
        assert_eq!(decide("/", None), Decision::Allow);
        assert_eq!(decide("/auth/signin", None), Decision::Allow);
        assert_eq!(decide("/auth/signup/", None), Decision::Allow);
    }

    #[test]
    fn anonymous_dashboard_goes_to_sign_in() {
        assert_eq!(decide("/dashboard", None), Decision::Redirect(SIGN_IN_PATH));
    }

    #[test]
    fn inactive_admin_goes_to_sign_in() {
        let mut admin = principal(Role::Admin);
        admin.is_active = false;
        assert_eq!(
            decide("/dashboard/admin", Some(&admin)),
            Decision::Redirect(SIGN_IN_PATH)
        );
    }

    #[test]
    fn intern_is_kept_out_of_admin_area() {
        let intern = principal(Role::Intern);
        for path in ["/admin", "/admin/users", "/dashboard/admin", "/dashboard/../admin"] {
            assert_eq!(
                decide(path, Some(&intern)),
                Decision::Redirect(DASHBOARD_PATH),
                "{path}"
            );
        }
    }

    #[test]
    fn prefixes_match_whole_segments() {
        let intern = principal(Role::Intern);
        assert_eq!(decide("/dashboard/administrator", Some(&intern)), Decision::Allow);
        assert_eq!(decide("/mentors", Some(&intern)), Decision::Allow);
    }

    #[test]
    fn mentor_and_intern_areas() {
        let mentor = principal(Role::Mentor);
        let intern = principal(Role::Intern);
        let admin = principal(Role::Admin);
        let hr = principal(Role::HrManager);

        assert_eq!(decide("/dashboard/mentor", Some(&mentor)), Decision::Allow);
        assert_eq!(
            decide("/dashboard/mentor", Some(&intern)),
            Decision::Redirect(DASHBOARD_PATH)
        );
        assert_eq!(decide("/dashboard/intern", Some(&intern)), Decision::Allow);
        assert_eq!(
            decide("/intern/tasks", Some(&mentor)),
            Decision::Redirect(DASHBOARD_PATH)
        );
        assert_eq!(decide("/dashboard/mentor", Some(&admin)), Decision::Allow);
        assert_eq!(decide("/dashboard/intern", Some(&admin)), Decision::Allow);
        assert_eq!(decide("/dashboard", Some(&hr)), Decision::Allow);
    }

    #[test]
    fn same_inputs_same_decision() {
        let mentor = principal(Role::Mentor);
        let first = decide("/dashboard/admin", Some(&mentor));
        let second = decide("/dashboard/admin", Some(&mentor));
        assert_eq!(first, second);
    }
}
