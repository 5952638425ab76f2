use tracing::{info, warn};

use crate::error::ScorecardError;
use crate::models::StaffMember;

pub const DEFAULT_MANAGER_PASSCODE: &str = "1234";
pub const PASSCODE_LEN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessState {
    Locked,
    Unlocked,
}

/// Text entered at the passcode prompt, kept exactly as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasscodeField {
    value: String,
}

impl PasscodeField {
    pub fn new(input: &str) -> Self {
        Self {
            value: input.to_string(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn clear(&mut self) {
        self.value.clear();
    }
}

pub fn is_valid_passcode(passcode: &str) -> bool {
    passcode.len() == PASSCODE_LEN && passcode.chars().all(|ch| ch.is_ascii_digit())
}

#[derive(Debug)]
pub struct AccessGate {
    passcode: String,
    state: AccessState,
}

impl AccessGate {
    pub fn new(passcode: impl Into<String>) -> Self {
        Self {
            passcode: passcode.into(),
            state: AccessState::Locked,
        }
    }

    pub fn is_unlocked(&self) -> bool {
        self.state == AccessState::Unlocked
    }

    /// Unlocks on an exact match. A rejected entry clears the field.
    pub fn submit(&mut self, field: &mut PasscodeField) -> Result<(), ScorecardError> {
        if field.value() == self.passcode {
            self.state = AccessState::Unlocked;
            info!("manager mode unlocked");
            Ok(())
        } else {
            field.clear();
            warn!("manager passcode rejected");
            Err(ScorecardError::Unauthorized)
        }
    }

    pub fn logout(&mut self) {
        if self.state == AccessState::Unlocked {
            info!("manager mode locked");
        }
        self.state = AccessState::Locked;
    }

    pub fn require_manager(&self) -> Result<(), ScorecardError> {
        if self.is_unlocked() {
            Ok(())
        } else {
            Err(ScorecardError::Unauthorized)
        }
    }
}

/// Gates a staff member's private exam history behind their own passcode.
pub fn verify_staff_passcode(staff: &StaffMember, input: &str) -> Result<(), ScorecardError> {
    if input == staff.passcode {
        Ok(())
    } else {
        warn!(staff = %staff.id, "staff passcode rejected");
        Err(ScorecardError::StaffPasscodeMismatch(staff.id.clone()))
    }
}
