use std::fmt;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Institute,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Institute => "institute",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "student" => Some(Role::Student),
            "institute" => Some(Role::Institute),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An account. The password hash is never part of this type; the
/// repository hands it out separately for login.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub phone: String,
    pub terms_accepted: bool,
    #[serde(flatten)]
    pub profile: UserProfile,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn role(&self) -> Role {
        self.profile.role()
    }

    pub fn student_summary(&self) -> Option<StudentSummary> {
        match &self.profile {
            UserProfile::Student(student) => Some(StudentSummary {
                id: self.id,
                fullname: student.fullname.clone(),
                email: self.email.clone(),
                student_id: student.student_id.clone(),
                major: student.major.clone(),
                university: student.university.clone(),
            }),
            _ => None,
        }
    }

    pub fn institute_summary(&self) -> Option<InstituteSummary> {
        match &self.profile {
            UserProfile::Institute(institute) => Some(InstituteSummary {
                id: self.id,
                institute_name: institute.institute_name.clone(),
                email: self.email.clone(),
                phone: self.phone.clone(),
                city: institute.city.clone(),
                contact_person_name: institute.contact_person_name.clone(),
            }),
            _ => None,
        }
    }
}

/// Role-specific payload. Each role carries exactly the fields it requires.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum UserProfile {
    Student(StudentProfile),
    Institute(InstituteProfile),
    Admin(AdminProfile),
}

impl UserProfile {
    pub fn role(&self) -> Role {
        match self {
            UserProfile::Student(_) => Role::Student,
            UserProfile::Institute(_) => Role::Institute,
            UserProfile::Admin(_) => Role::Admin,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StudentProfile {
    pub fullname: String,
    pub student_id: String,
    pub major: String,
    pub university: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InstituteProfile {
    pub institute_name: String,
    pub institute_type: InstituteType,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub country: String,
    pub established_year: i32,
    pub affiliated_to: Option<String>,
    pub website: Option<String>,
    pub contact_person_name: String,
    pub designation: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdminProfile {
    pub fullname: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InstituteType {
    University,
    College,
    Technical,
    Management,
    Engineering,
    Medical,
    Other,
}

impl InstituteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstituteType::University => "university",
            InstituteType::College => "college",
            InstituteType::Technical => "technical",
            InstituteType::Management => "management",
            InstituteType::Engineering => "engineering",
            InstituteType::Medical => "medical",
            InstituteType::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "university" => Some(InstituteType::University),
            "college" => Some(InstituteType::College),
            "technical" => Some(InstituteType::Technical),
            "management" => Some(InstituteType::Management),
            "engineering" => Some(InstituteType::Engineering),
            "medical" => Some(InstituteType::Medical),
            "other" => Some(InstituteType::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StudentSummary {
    pub id: Uuid,
    pub fullname: String,
    pub email: String,
    pub student_id: String,
    pub major: String,
    pub university: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InstituteSummary {
    pub id: Uuid,
    pub institute_name: String,
    pub email: String,
    pub phone: String,
    pub city: String,
    pub contact_person_name: String,
}

/// Everything the repository needs to insert an account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub phone: String,
    pub terms_accepted: bool,
    pub profile: UserProfile,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StudentSignupRequest {
    #[validate(length(min = 2, message = "Full name must be at least 2 characters"))]
    pub fullname: String,
    #[validate(custom(function = "validate_username"))]
    pub username: String,
    #[validate(email(message = "Valid email is required"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(length(min = 1, message = "Student ID is required"))]
    pub student_id: String,
    #[validate(length(min = 1, message = "Major is required"))]
    pub major: String,
    #[validate(custom(function = "validate_phone"))]
    pub phone: String,
    #[validate(length(min = 1, message = "University is required"))]
    pub university: String,
}

impl StudentSignupRequest {
    pub fn normalized(mut self) -> Self {
        self.fullname = self.fullname.trim().to_string();
        self.username = self.username.trim().to_lowercase();
        self.email = self.email.trim().to_lowercase();
        self.student_id = self.student_id.trim().to_string();
        self.major = self.major.trim().to_string();
        self.phone = self.phone.trim().to_string();
        self.university = self.university.trim().to_string();
        self
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InstituteSignupRequest {
    #[validate(length(min = 2, message = "Institute name must be at least 2 characters"))]
    pub institute_name: String,
    pub institute_type: InstituteType,
    #[validate(email(message = "Valid email is required"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(custom(function = "validate_phone"))]
    pub phone: String,
    #[validate(length(min = 1, message = "Address is required"))]
    pub address: String,
    #[validate(length(min = 1, message = "City is required"))]
    pub city: String,
    #[validate(length(min = 1, message = "State is required"))]
    pub state: String,
    #[validate(length(min = 1, message = "PIN code is required"))]
    pub pincode: String,
    #[serde(default = "default_country")]
    pub country: String,
    #[validate(custom(function = "validate_established_year"))]
    pub established_year: i32,
    #[serde(default)]
    pub affiliated_to: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[validate(length(min = 1, message = "Contact person name is required"))]
    pub contact_person_name: String,
    #[validate(length(min = 1, message = "Designation is required"))]
    pub designation: String,
    #[validate(custom(function = "validate_terms"))]
    pub terms: bool,
}

fn default_country() -> String {
    "India".to_string()
}

impl InstituteSignupRequest {
    pub fn normalized(mut self) -> Self {
        fn trim_opt(value: Option<String>) -> Option<String> {
            value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
        }

        self.institute_name = self.institute_name.trim().to_string();
        self.email = self.email.trim().to_lowercase();
        self.phone = self.phone.trim().to_string();
        self.address = self.address.trim().to_string();
        self.city = self.city.trim().to_string();
        self.state = self.state.trim().to_string();
        self.pincode = self.pincode.trim().to_string();
        self.country = self.country.trim().to_string();
        if self.country.is_empty() {
            self.country = default_country();
        }
        self.affiliated_to = trim_opt(self.affiliated_to);
        self.website = trim_opt(self.website);
        self.contact_person_name = self.contact_person_name.trim().to_string();
        self.designation = self.designation.trim().to_string();
        self
    }

    pub fn profile(&self) -> InstituteProfile {
        InstituteProfile {
            institute_name: self.institute_name.clone(),
            institute_type: self.institute_type,
            address: self.address.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            pincode: self.pincode.clone(),
            country: self.country.clone(),
            established_year: self.established_year,
            affiliated_to: self.affiliated_to.clone(),
            website: self.website.clone(),
            contact_person_name: self.contact_person_name.clone(),
            designation: self.designation.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email or username
    #[validate(length(min = 1, message = "Username or email is required"))]
    pub identifier: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

fn validate_username(username: &str) -> Result<(), ValidationError> {
    let username = username.trim();
    if username.len() < 3 {
        let mut err = ValidationError::new("username_length");
        err.message = Some("Username must be at least 3 characters".into());
        return Err(err);
    }
    if !username.chars().all(|c| c.is_ascii_alphanumeric()) {
        let mut err = ValidationError::new("username_charset");
        err.message = Some("Username can only contain letters and numbers".into());
        return Err(err);
    }
    Ok(())
}

fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let phone = phone.trim();
    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    let allowed = phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'));
    if digits < 7 || !allowed {
        let mut err = ValidationError::new("phone");
        err.message = Some("Valid phone number is required".into());
        return Err(err);
    }
    Ok(())
}

fn validate_established_year(year: i32) -> Result<(), ValidationError> {
    let current_year = Utc::now().year();
    if year < 1800 || year > current_year {
        let mut err = ValidationError::new("established_year");
        err.message = Some("Valid established year is required".into());
        return Err(err);
    }
    Ok(())
}

fn validate_terms(accepted: &bool) -> Result<(), ValidationError> {
    if !*accepted {
        let mut err = ValidationError::new("terms");
        err.message = Some("You must accept the terms and conditions".into());
        return Err(err);
    }
    Ok(())
}

/// Institutes don't pick a username; it is the lowercased alphanumeric part
/// of their name followed by a 4-digit suffix.
pub fn institute_username(institute_name: &str, suffix: u16) -> String {
    let base: String = institute_name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    let base = if base.is_empty() { "institute".to_string() } else { base };
    format!("{}{}", base, suffix)
}
