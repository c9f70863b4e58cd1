//! Courier on-duty and approval statuses with their transition tables.

use serde::{Deserialize, Serialize};

/// Whether a courier is taking work right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CourierStatus {
    Available,
    Busy,
    OnBreak,
    OffDuty,
    #[default]
    Inactive,
}

pub const COURIER_STATUS_TRANSITIONS: [(CourierStatus, &[CourierStatus]); 5] = {
    use CourierStatus::*;
    [
        (Available, &[Busy, OnBreak, OffDuty, Inactive]),
        (Busy, &[Available, OnBreak, OffDuty, Inactive]),
        (OnBreak, &[Available, OffDuty, Inactive]),
        (OffDuty, &[Available, Inactive]),
        (Inactive, &[Available]),
    ]
};

pub fn courier_status_transition_allowed(from: CourierStatus, to: CourierStatus) -> bool {
    COURIER_STATUS_TRANSITIONS
        .iter()
        .find(|(status, _)| *status == from)
        .is_some_and(|(_, next)| next.contains(&to))
}

/// Only an available courier can be offered new work.
pub fn is_available(status: CourierStatus) -> bool {
    status == CourierStatus::Available
}

/// On shift, whether or not currently carrying orders.
pub fn is_on_shift(status: CourierStatus) -> bool {
    matches!(
        status,
        CourierStatus::Available | CourierStatus::Busy | CourierStatus::OnBreak
    )
}

impl CourierStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CourierStatus::Available => "AVAILABLE",
            CourierStatus::Busy => "BUSY",
            CourierStatus::OnBreak => "ON_BREAK",
            CourierStatus::OffDuty => "OFF_DUTY",
            CourierStatus::Inactive => "INACTIVE",
        }
    }
}

impl std::fmt::Display for CourierStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a courier stands in onboarding review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Suspended,
    Terminated,
}

pub const APPROVAL_TRANSITIONS: [(ApprovalStatus, &[ApprovalStatus]); 5] = {
    use ApprovalStatus::*;
    [
        (Pending, &[Approved, Rejected]),
        (Approved, &[Suspended, Terminated]),
        // A rejected applicant may re-apply.
        (Rejected, &[Pending]),
        (Suspended, &[Approved, Terminated]),
        (Terminated, &[]),
    ]
};

pub fn approval_transition_allowed(from: ApprovalStatus, to: ApprovalStatus) -> bool {
    APPROVAL_TRANSITIONS
        .iter()
        .find(|(status, _)| *status == from)
        .is_some_and(|(_, next)| next.contains(&to))
}

pub fn can_work(approval: ApprovalStatus) -> bool {
    approval == ApprovalStatus::Approved
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "PENDING",
            ApprovalStatus::Approved => "APPROVED",
            ApprovalStatus::Rejected => "REJECTED",
            ApprovalStatus::Suspended => "SUSPENDED",
            ApprovalStatus::Terminated => "TERMINATED",
        }
    }
}

impl std::fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
