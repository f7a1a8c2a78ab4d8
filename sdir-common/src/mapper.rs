//! Spreadsheet row and submission shape mapping
//!
//! Spreadsheet headers vary from sheet to sheet, so columns are recognized by
//! keyword: the first header containing a keyword claims the field. Columns no
//! field claims are kept on the record under a normalized key.

use crate::models::{MemberForm, MemberRecord, NewMemberData};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use tracing::debug;

const NAME_KEYWORDS: &[&str] = &["name"];
const VILLAGE_KEYWORDS: &[&str] = &["village", "native"];
const ADDRESS_KEYWORDS: &[&str] = &["address", "current", "location"];
const MOBILE_KEYWORDS: &[&str] = &["mobile", "phone", "contact"];
const EMAIL_KEYWORDS: &[&str] = &["email", "mail"];

/// Column indices resolved from a header row
///
/// Each field is resolved independently, so one column may claim more than one
/// field (e.g. `contact_address` matches both address and mobile).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    headers: Vec<String>,
    pub name: Option<usize>,
    pub village: Option<usize>,
    pub address: Option<usize>,
    pub mobile: Option<usize>,
    pub email: Option<usize>,
}

impl ColumnMap {
    /// Resolve column indices from raw header cells
    pub fn from_headers<S: AsRef<str>>(raw_headers: &[S]) -> Self {
        let headers: Vec<String> = raw_headers
            .iter()
            .map(|h| h.as_ref().trim().to_lowercase())
            .collect();

        let find = |keywords: &[&str]| {
            headers
                .iter()
                .position(|h| keywords.iter().any(|k| h.contains(k)))
        };

        let map = Self {
            name: find(NAME_KEYWORDS),
            village: find(VILLAGE_KEYWORDS),
            address: find(ADDRESS_KEYWORDS),
            mobile: find(MOBILE_KEYWORDS),
            email: find(EMAIL_KEYWORDS),
            headers,
        };

        debug!(
            name = ?map.name,
            village = ?map.village,
            address = ?map.address,
            mobile = ?map.mobile,
            email = ?map.email,
            "Resolved spreadsheet columns"
        );

        map
    }

    /// Normalized (trimmed, lower-cased) headers
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    fn is_known(&self, index: usize) -> bool {
        [self.name, self.village, self.address, self.mobile, self.email].contains(&Some(index))
    }

    /// Build one record from a data row; missing cells read as empty
    pub fn record_from_row<S: AsRef<str>>(&self, row: &[S]) -> MemberRecord {
        let cell = |index: usize| -> String {
            row.get(index)
                .map(|c| c.as_ref().trim().to_string())
                .unwrap_or_default()
        };
        let field = |index: Option<usize>| index.map(cell).unwrap_or_default();

        let mut extra = BTreeMap::new();
        for (index, header) in self.headers.iter().enumerate() {
            if !self.is_known(index) {
                extra.insert(normalize_key(header), cell(index));
            }
        }

        MemberRecord {
            name: field(self.name),
            village: field(self.village),
            current_address: field(self.address),
            mobile_number: self.mobile.map(cell),
            email: self.email.map(cell),
            extra,
        }
    }
}

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Replace each whitespace run in a header with a single underscore
pub fn normalize_key(header: &str) -> String {
    WHITESPACE_RUN.replace_all(header, "_").into_owned()
}

/// Convert raw spreadsheet rows (header row first) into member records
///
/// Rows whose name is empty after trimming are dropped.
pub fn rows_to_records<S: AsRef<str>>(rows: &[Vec<S>]) -> Vec<MemberRecord> {
    let Some((header, data)) = rows.split_first() else {
        return Vec::new();
    };

    let columns = ColumnMap::from_headers(header);
    let records: Vec<MemberRecord> = data
        .iter()
        .map(|row| columns.record_from_row(row))
        .filter(|record| !record.name.is_empty())
        .collect();

    debug!(
        data_rows = data.len(),
        records = records.len(),
        "Mapped spreadsheet rows to member records"
    );

    records
}

impl From<&MemberForm> for NewMemberData {
    fn from(form: &MemberForm) -> Self {
        Self {
            name: form.name.clone(),
            mobile: form.mobile.clone(),
            village: form.village.clone(),
            current_address: form.current_address.clone(),
            member2_name: form.member2.name.clone(),
            member2_age: form.member2.age.clone(),
            member2_business: form.member2.business_job.clone(),
            member3_name: form.member3.name.clone(),
            member3_age: form.member3.age.clone(),
            member3_business: form.member3.business_job.clone(),
            member4_name: form.member4.name.clone(),
            member4_age: form.member4.age.clone(),
            member4_business: form.member4.business_job.clone(),
            member5_name: form.member5.name.clone(),
            member5_age: form.member5.age.clone(),
            member5_business: form.member5.business_job.clone(),
            member6_name: form.member6.name.clone(),
            member6_age: form.member6.age.clone(),
            member6_business: form.member6.business_job.clone(),
            remark: form.remark.clone(),
        }
    }
}

impl From<&NewMemberData> for MemberForm {
    fn from(data: &NewMemberData) -> Self {
        use crate::models::FamilyMember;

        let member = |name: &str, age: &str, business: &str| FamilyMember {
            name: name.to_string(),
            age: age.to_string(),
            business_job: business.to_string(),
        };

        Self {
            name: data.name.clone(),
            mobile: data.mobile.clone(),
            village: data.village.clone(),
            current_address: data.current_address.clone(),
            member2: member(&data.member2_name, &data.member2_age, &data.member2_business),
            member3: member(&data.member3_name, &data.member3_age, &data.member3_business),
            member4: member(&data.member4_name, &data.member4_age, &data.member4_business),
            member5: member(&data.member5_name, &data.member5_age, &data.member5_business),
            member6: member(&data.member6_name, &data.member6_age, &data.member6_business),
            remark: data.remark.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FamilyMember;

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|row| row.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_headers_matched_by_keyword() {
        let columns = ColumnMap::from_headers(&[
            " Full Name ",
            "Native Place",
            "Current City",
            "Phone No",
            "E-Mail",
        ]);
        assert_eq!(columns.name, Some(0));
        assert_eq!(columns.village, Some(1));
        assert_eq!(columns.address, Some(2));
        assert_eq!(columns.mobile, Some(3));
        assert_eq!(columns.email, Some(4));
        assert_eq!(columns.headers()[0], "full name");
    }

    #[test]
    fn test_first_match_wins() {
        // "village name" contains "name", so it claims the name field first
        let columns = ColumnMap::from_headers(&["Village Name", "Name", "Village"]);
        assert_eq!(columns.name, Some(0));
        assert_eq!(columns.village, Some(0));
    }

    #[test]
    fn test_one_column_can_claim_two_fields() {
        let columns = ColumnMap::from_headers(&["name", "contact_address"]);
        assert_eq!(columns.address, Some(1));
        assert_eq!(columns.mobile, Some(1));
    }

    #[test]
    fn test_rows_to_records_maps_and_trims() {
        let records = rows_to_records(&rows(&[
            &["Name", "Village", "Current Address", "Mobile", "Blood  Group"],
            &[" Rajesh Patel ", "Gandhinagar", " Ahmedabad ", "9876543210", "O+"],
        ]));

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.name, "Rajesh Patel");
        assert_eq!(record.current_address, "Ahmedabad");
        assert_eq!(record.mobile_number.as_deref(), Some("9876543210"));
        assert_eq!(record.email, None);
        assert_eq!(record.extra.get("blood_group").map(String::as_str), Some("O+"));
        assert_eq!(record.extra.len(), 1);
    }

    #[test]
    fn test_short_rows_read_missing_cells_as_empty() {
        let records = rows_to_records(&rows(&[
            &["Name", "Village", "Address", "Email", "Notes"],
            &["Priya Shah"],
        ]));

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].village, "");
        assert_eq!(records[0].email.as_deref(), Some(""));
        assert_eq!(records[0].extra.get("notes").map(String::as_str), Some(""));
    }

    #[test]
    fn test_rows_without_name_are_dropped() {
        let records = rows_to_records(&rows(&[
            &["Name", "Village"],
            &["   ", "Kalol"],
            &[],
            &["Amit Desai", "Mansa"],
        ]));

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Amit Desai");
    }

    #[test]
    fn test_missing_name_column_drops_everything() {
        let records = rows_to_records(&rows(&[&["Village", "Address"], &["Kalol", "Surat"]]));
        assert!(records.is_empty());
    }

    #[test]
    fn test_empty_sheet() {
        let empty: Vec<Vec<String>> = Vec::new();
        assert!(rows_to_records(&empty).is_empty());
        assert!(rows_to_records(&rows(&[&["Name"]])).is_empty());
    }

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("blood group"), "blood_group");
        assert_eq!(normalize_key("date \t of  birth"), "date_of_birth");
        assert_eq!(normalize_key("gotra"), "gotra");
        assert_eq!(normalize_key("native\n\nplace"), "native_place");
    }

    #[test]
    fn test_form_to_payload_flattens_family_members() {
        let form = MemberForm {
            name: "Kiran Mehta".to_string(),
            mobile: "9876543214".to_string(),
            village: "Dehgam".to_string(),
            current_address: "Pune, Maharashtra".to_string(),
            member5: FamilyMember {
                name: "Asha Mehta".to_string(),
                age: "34".to_string(),
                business_job: "Teacher".to_string(),
            },
            ..Default::default()
        };

        let payload = NewMemberData::from(&form);
        assert_eq!(payload.member5_name, "Asha Mehta");
        assert_eq!(payload.member5_age, "34");
        assert_eq!(payload.member5_business, "Teacher");
        assert_eq!(payload.member2_name, "");
        assert_eq!(payload.remark, "");

        assert_eq!(MemberForm::from(&payload), form);
    }
}
