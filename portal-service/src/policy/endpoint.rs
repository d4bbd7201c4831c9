//! API-level guard: runs before a handler touches the store.

use super::{
    table, AccessError, Action, Decision, DenyReason, Principal, ResourceDescriptor, ResourceKind,
    Scope,
};

fn same_tenant(principal: &Principal, resource: &ResourceDescriptor) -> bool {
    principal.is_admin()
        || matches!(
            (principal.company_id, resource.company_id),
            (Some(mine), Some(theirs)) if mine == theirs
        )
}

fn tenant_denial(action: Action) -> DenyReason {
    if action == Action::View {
        DenyReason::Concealed
    } else {
        DenyReason::TenantMismatch
    }
}

/// Owner and assignee denials on a read of another company's record are
/// concealed the same way as a tenant mismatch.
fn scope_denial(
    principal: &Principal,
    action: Action,
    resource: &ResourceDescriptor,
    reason: DenyReason,
) -> DenyReason {
    let foreign = resource.company_id.is_some() && !same_tenant(principal, resource);
    if action == Action::View && foreign {
        DenyReason::Concealed
    } else {
        reason
    }
}

fn active(principal: Option<&Principal>) -> Result<&Principal, DenyReason> {
    match principal {
        None => Err(DenyReason::NoSession),
        Some(p) if !p.is_active => Err(DenyReason::Inactive),
        Some(p) => Ok(p),
    }
}

fn evaluate(
    principal: Option<&Principal>,
    action: Action,
    resource: &ResourceDescriptor,
) -> Result<(), DenyReason> {
    let principal = active(principal)?;

    let scope = rule_scope(principal, resource.kind, action)?;

    let is_owner = resource.owner_id == Some(principal.id);
    let is_assignee = resource.assignee_id == Some(principal.id);
    let denied = |reason: DenyReason| -> Result<(), DenyReason> {
        Err(scope_denial(principal, action, resource, reason))
    };

    match scope {
        Scope::Any => Ok(()),
        Scope::Tenant if same_tenant(principal, resource) => Ok(()),
        Scope::Tenant => Err(tenant_denial(action)),
        Scope::Owner if is_owner => Ok(()),
        Scope::Owner => denied(DenyReason::NotOwner),
        Scope::Assignee if is_assignee => Ok(()),
        Scope::Assignee => denied(DenyReason::NotAssignee),
        Scope::TenantOwner if !same_tenant(principal, resource) => Err(tenant_denial(action)),
        Scope::TenantOwner if is_owner => Ok(()),
        Scope::TenantOwner => Err(DenyReason::NotOwner),
        Scope::Participant if is_owner || is_assignee => Ok(()),
        Scope::Participant => denied(DenyReason::NotParticipant),
    }
}

fn rule_scope(
    principal: &Principal,
    kind: ResourceKind,
    action: Action,
) -> Result<Scope, DenyReason> {
    table::scope_for(principal.role, kind, action).ok_or(DenyReason::NoRule)
}

fn log_denial(
    principal: Option<&Principal>,
    kind: ResourceKind,
    action: Action,
    reason: DenyReason,
) {
    tracing::warn!(
        user_id = ?principal.map(|p| p.id),
        role = ?principal.map(|p| p.role),
        kind = ?kind,
        action = ?action,
        reason = %reason,
        "Access denied"
    );
    metrics::counter!("access_denied_total", "reason" => reason.to_string()).increment(1);
}

/// Pure decision for `action` on `resource`. Never redirects.
pub fn decide(
    principal: Option<&Principal>,
    action: Action,
    resource: &ResourceDescriptor,
) -> Decision {
    match evaluate(principal, action, resource) {
        Ok(()) => Decision::Allow,
        Err(reason) => Decision::Deny(reason),
    }
}

/// First step of the guard on its own, for handlers that must know the
/// caller is signed in before they look up the target record.
pub fn authenticate(principal: Option<&Principal>) -> Result<&Principal, AccessError> {
    active(principal).map_err(|reason| {
        tracing::warn!(reason = %reason, "Access denied");
        AccessError::from(reason)
    })
}

/// Guard entry point for handlers. Denials are logged with the caller and
/// target, then mapped onto the wire error.
pub fn authorize(
    principal: Option<&Principal>,
    action: Action,
    resource: &ResourceDescriptor,
) -> Result<(), AccessError> {
    evaluate(principal, action, resource).map_err(|reason| {
        log_denial(principal, resource.kind, action, reason);
        AccessError::from(reason)
    })
}

/// Role-only step of the guard. Handlers call it before fetching the target
/// record, so a role without a rule gets `Forbidden` whether or not the id
/// exists.
pub fn require_rule(
    principal: &Principal,
    kind: ResourceKind,
    action: Action,
) -> Result<(), AccessError> {
    rule_scope(principal, kind, action).map(|_| ()).map_err(|reason| {
        log_denial(Some(principal), kind, action, reason);
        AccessError::from(reason)
    })
}

/// Silent form of [`authorize`] for filtering list results.
pub fn permits(principal: &Principal, action: Action, resource: &ResourceDescriptor) -> bool {
    evaluate(Some(principal), action, resource).is_ok()
}

/// Messaging check layered on top of the `(Message, Create)` rule: the pair
/// of roles must appear in the messaging table and the two parties must
/// share a company unless one of them is a global admin.
pub fn authorize_message(
    sender: Option<&Principal>,
    recipient: &Principal,
) -> Result<(), AccessError> {
    let sender_id = sender.map(|p| p.id);
    let resource = ResourceDescriptor::new(ResourceKind::Message).assigned_to(recipient.id);
    let resource = match sender_id {
        Some(id) => resource.owned_by(id),
        None => resource,
    };
    authorize(sender, Action::Create, &resource)?;

    let Some(sender) = sender else {
        return Err(AccessError::Unauthenticated);
    };

    let shared_tenant = sender.is_admin()
        || recipient.is_admin()
        || matches!(
            (sender.company_id, recipient.company_id),
            (Some(a), Some(b)) if a == b
        );

    if table::may_message(sender.role, recipient.role) && shared_tenant {
        return Ok(());
    }

    tracing::warn!(
        user_id = %sender.id,
        recipient_id = %recipient.id,
        reason = %DenyReason::MessagingNotAllowed,
        "Access denied"
    );
    let reason = DenyReason::MessagingNotAllowed.to_string();
    metrics::counter!("access_denied_total", "reason" => reason).increment(1);
    Err(AccessError::Forbidden)
}
