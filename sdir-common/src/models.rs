//! Directory data model
//!
//! Three shapes travel through the system:
//! - [`MemberRecord`]: one display/search row built from the spreadsheet
//! - [`MemberForm`]: the nested entry form a user fills in
//! - [`NewMemberData`]: the flat, fixed-shape payload appended to the spreadsheet

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Slot numbers of the optional family members on the entry form.
///
/// The primary member is implicitly "member 1", so the family slots are 2 through 6.
pub const FAMILY_SLOTS: [u8; 5] = [2, 3, 4, 5, 6];

/// A member as displayed and searched
///
/// Identity is the position within the fetched set; records carry no stable ID.
/// Built once per fetch and replaced wholesale on every reload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRecord {
    pub name: String,
    pub village: String,
    pub current_address: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile_number: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Columns not recognized by name, keyed by normalized header
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl MemberRecord {
    /// Create a record with the three searchable fields set
    pub fn new(
        name: impl Into<String>,
        village: impl Into<String>,
        current_address: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            village: village.into(),
            current_address: current_address.into(),
            mobile_number: None,
            email: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_mobile(mut self, mobile: impl Into<String>) -> Self {
        self.mobile_number = Some(mobile.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// One optional family member on the entry form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FamilyMember {
    pub name: String,
    pub age: String,
    pub business_job: String,
}

impl FamilyMember {
    /// True when none of the three sub-fields holds anything but whitespace.
    ///
    /// Blank slots are skipped entirely during submission validation.
    pub fn is_blank(&self) -> bool {
        self.name.trim().is_empty()
            && self.age.trim().is_empty()
            && self.business_job.trim().is_empty()
    }
}

/// Nested entry form for a new member
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MemberForm {
    pub name: String,
    pub mobile: String,
    pub village: String,
    pub current_address: String,
    pub member2: FamilyMember,
    pub member3: FamilyMember,
    pub member4: FamilyMember,
    pub member5: FamilyMember,
    pub member6: FamilyMember,
    pub remark: String,
}

impl MemberForm {
    /// Family member in the given slot (2..=6)
    pub fn slot(&self, slot: u8) -> Option<&FamilyMember> {
        match slot {
            2 => Some(&self.member2),
            3 => Some(&self.member3),
            4 => Some(&self.member4),
            5 => Some(&self.member5),
            6 => Some(&self.member6),
            _ => None,
        }
    }

    pub fn slot_mut(&mut self, slot: u8) -> Option<&mut FamilyMember> {
        match slot {
            2 => Some(&mut self.member2),
            3 => Some(&mut self.member3),
            4 => Some(&mut self.member4),
            5 => Some(&mut self.member5),
            6 => Some(&mut self.member6),
            _ => None,
        }
    }

    /// Iterate over `(slot, member)` pairs in slot order
    pub fn family_members(&self) -> impl Iterator<Item = (u8, &FamilyMember)> {
        [
            (2, &self.member2),
            (3, &self.member3),
            (4, &self.member4),
            (5, &self.member5),
            (6, &self.member6),
        ]
        .into_iter()
    }
}

/// Flat append payload sent to the directory store
///
/// Every key is always present; fields the user left out are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewMemberData {
    pub name: String,
    pub mobile: String,
    pub village: String,
    pub current_address: String,
    pub member2_name: String,
    pub member2_age: String,
    pub member2_business: String,
    pub member3_name: String,
    pub member3_age: String,
    pub member3_business: String,
    pub member4_name: String,
    pub member4_age: String,
    pub member4_business: String,
    pub member5_name: String,
    pub member5_age: String,
    pub member5_business: String,
    pub member6_name: String,
    pub member6_age: String,
    pub member6_business: String,
    pub remark: String,
}
