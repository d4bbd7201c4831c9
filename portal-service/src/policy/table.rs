//! The rule tables. Every access decision in the service reads from here.

use super::{Action, ResourceKind, Role, Scope};

/// One row of the permission table: the listed roles may perform the listed
/// actions on `kind`, limited to `scope`.
#[derive(Debug)]
pub struct Rule {
    pub roles: &'static [Role],
    pub kind: ResourceKind,
    pub actions: &'static [Action],
    pub scope: Scope,
}

const EVERY_ACTION: &[Action] = &[
    Action::View,
    Action::Create,
    Action::Update,
    Action::Delete,
    Action::Review,
];

const NON_ADMIN: &[Role] = &[
    Role::Intern,
    Role::Mentor,
    Role::CompanyAdmin,
    Role::CompanyManager,
    Role::HrManager,
    Role::CompanyCoordinator,
];

const COMPANY_STAFF: &[Role] = &[
    Role::CompanyAdmin,
    Role::CompanyManager,
    Role::HrManager,
    Role::CompanyCoordinator,
];

const HIRING: &[Role] = &[Role::CompanyAdmin, Role::CompanyManager, Role::HrManager];

/// First matching row wins, so a role appears at most once per
/// `(kind, action)` pair.
#[rustfmt::skip]
pub static PERMISSIONS: &[Rule] = &[
    // Global administrators reach everything.
    Rule { roles: &[Role::Admin], kind: ResourceKind::User, actions: EVERY_ACTION, scope: Scope::Any },
    Rule { roles: &[Role::Admin], kind: ResourceKind::Company, actions: EVERY_ACTION, scope: Scope::Any },
    Rule { roles: &[Role::Admin], kind: ResourceKind::Internship, actions: EVERY_ACTION, scope: Scope::Any },
    Rule { roles: &[Role::Admin], kind: ResourceKind::Application, actions: EVERY_ACTION, scope: Scope::Any },
    Rule { roles: &[Role::Admin], kind: ResourceKind::Task, actions: EVERY_ACTION, scope: Scope::Any },
    Rule { roles: &[Role::Admin], kind: ResourceKind::Submission, actions: EVERY_ACTION, scope: Scope::Any },
    Rule { roles: &[Role::Admin], kind: ResourceKind::Message, actions: &[Action::View, Action::Create], scope: Scope::Participant },
    // Users
    Rule { roles: NON_ADMIN, kind: ResourceKind::User, actions: &[Action::View], scope: Scope::Owner },
    // Companies
    Rule { roles: COMPANY_STAFF, kind: ResourceKind::Company, actions: &[Action::View], scope: Scope::Tenant },
    Rule { roles: &[Role::Mentor], kind: ResourceKind::Company, actions: &[Action::View], scope: Scope::Tenant },
    Rule { roles: &[Role::CompanyAdmin], kind: ResourceKind::Company, actions: &[Action::Update], scope: Scope::Tenant },
    // Internships
    Rule { roles: &[Role::Intern], kind: ResourceKind::Internship, actions: &[Action::View], scope: Scope::Any },
    Rule { roles: COMPANY_STAFF, kind: ResourceKind::Internship, actions: &[Action::View], scope: Scope::Tenant },
    Rule { roles: HIRING, kind: ResourceKind::Internship, actions: &[Action::Create, Action::Update, Action::Delete], scope: Scope::Tenant },
    Rule { roles: &[Role::Mentor], kind: ResourceKind::Internship, actions: &[Action::View, Action::Create], scope: Scope::Tenant },
    Rule { roles: &[Role::Mentor], kind: ResourceKind::Internship, actions: &[Action::Update], scope: Scope::TenantOwner },
    // Applications: owner is the internship's mentor, assignee the applicant.
    Rule { roles: &[Role::Intern], kind: ResourceKind::Application, actions: &[Action::Create], scope: Scope::Any },
    Rule { roles: &[Role::Intern], kind: ResourceKind::Application, actions: &[Action::View], scope: Scope::Assignee },
    Rule { roles: HIRING, kind: ResourceKind::Application, actions: &[Action::View, Action::Review], scope: Scope::Tenant },
    Rule { roles: &[Role::CompanyCoordinator], kind: ResourceKind::Application, actions: &[Action::View], scope: Scope::Tenant },
    Rule { roles: &[Role::Mentor], kind: ResourceKind::Application, actions: &[Action::View, Action::Review], scope: Scope::TenantOwner },
    // Tasks: owner is the creating mentor, assignee the intern.
    Rule { roles: &[Role::Intern], kind: ResourceKind::Task, actions: &[Action::View], scope: Scope::Assignee },
    Rule { roles: &[Role::Mentor], kind: ResourceKind::Task, actions: &[Action::View, Action::Create, Action::Update, Action::Delete], scope: Scope::TenantOwner },
    Rule { roles: &[Role::CompanyCoordinator], kind: ResourceKind::Task, actions: &[Action::View, Action::Update], scope: Scope::Tenant },
    Rule { roles: HIRING, kind: ResourceKind::Task, actions: &[Action::View], scope: Scope::Tenant },
    Rule { roles: &[Role::CompanyAdmin], kind: ResourceKind::Task, actions: &[Action::Delete], scope: Scope::Tenant },
    // Submissions: owner is the task's mentor, assignee the submitting intern.
    Rule { roles: &[Role::Intern], kind: ResourceKind::Submission, actions: &[Action::View, Action::Create], scope: Scope::Assignee },
    Rule { roles: &[Role::Mentor], kind: ResourceKind::Submission, actions: &[Action::View, Action::Review], scope: Scope::TenantOwner },
    Rule { roles: COMPANY_STAFF, kind: ResourceKind::Submission, actions: &[Action::View], scope: Scope::Tenant },
    // Messages: owner is the sender, assignee the recipient.
    Rule { roles: NON_ADMIN, kind: ResourceKind::Message, actions: &[Action::View, Action::Create], scope: Scope::Participant },
];

/// Scope granted to `role` for `action` on `kind`, if any rule covers it.
pub fn scope_for(role: Role, kind: ResourceKind, action: Action) -> Option<Scope> {
    PERMISSIONS
        .iter()
        .find(|rule| {
            rule.kind == kind && rule.roles.contains(&role) && rule.actions.contains(&action)
        })
        .map(|rule| rule.scope)
}

/// Page areas in precedence order: the first area whose prefix matches
/// decides, and a role outside `roles` is sent back to the dashboard.
#[derive(Debug)]
pub struct Area {
    pub name: &'static str,
    pub prefixes: &'static [&'static str],
    pub roles: &'static [Role],
}

pub static AREAS: &[Area] = &[
    Area {
        name: "admin",
        prefixes: &["/admin", "/dashboard/admin"],
        roles: &[Role::Admin],
    },
    Area {
        name: "mentor",
        prefixes: &["/mentor", "/dashboard/mentor"],
        roles: &[Role::Mentor, Role::Admin],
    },
    Area {
        name: "intern",
        prefixes: &["/intern", "/dashboard/intern"],
        roles: &[Role::Intern, Role::Admin],
    },
];

/// Who may write to whom. Rows are directional.
#[derive(Debug)]
pub struct MessagingRule {
    pub from: &'static [Role],
    pub to: &'static [Role],
}

pub static MESSAGING: &[MessagingRule] = &[
    MessagingRule {
        from: &[Role::Admin],
        to: &Role::ALL,
    },
    MessagingRule {
        from: COMPANY_STAFF,
        to: &Role::ALL,
    },
    MessagingRule {
        from: &[Role::Mentor],
        to: &Role::ALL,
    },
    MessagingRule {
        from: &[Role::Intern],
        to: &[
            Role::Mentor,
            Role::Admin,
            Role::HrManager,
            Role::CompanyCoordinator,
        ],
    },
];

/// Whether the messaging table lets `from` write to `to`.
pub fn may_message(from: Role, to: Role) -> bool {
    MESSAGING
        .iter()
        .any(|rule| rule.from.contains(&from) && rule.to.contains(&to))
}
