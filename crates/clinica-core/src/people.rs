use crate::error::Result;
use crate::id::{DepartmentId, DoctorId, PatientId, StaffId};
use crate::interval::now_utc;
use crate::validation::{validate_email, validate_non_empty};
use serde::{Deserialize, Serialize};
use std::fmt;
use time::{Date, OffsetDateTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Male => write!(f, "male"),
            Self::Female => write!(f, "female"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// A registered patient.
///
/// Identity fields are fixed at registration; contact fields change through
/// [`Patient::update_contact`]. Patients are deactivated, never deleted, so
/// appointments and records always resolve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: PatientId,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Date,
    pub gender: Gender,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub registered_at: OffsetDateTime,
}

impl Patient {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        date_of_birth: Date,
        gender: Gender,
        email: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            id: PatientId::new(),
            first_name: validate_non_empty("first_name", &first_name.into())?,
            last_name: validate_non_empty("last_name", &last_name.into())?,
            date_of_birth,
            gender,
            email: validate_email(&email.into())?,
            phone: None,
            address: None,
            registered_at: now_utc(),
        })
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Applies a contact update. Fields left `None` are unchanged.
    pub fn update_contact(&mut self, update: ContactUpdate) -> Result<()> {
        if let Some(email) = update.email {
            self.email = validate_email(&email)?;
        }
        if let Some(phone) = update.phone {
            self.phone = Some(phone);
        }
        if let Some(address) = update.address {
            self.address = Some(address);
        }
        Ok(())
    }
}

/// Partial update for mutable patient contact fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// A doctor who can be booked for appointment types in their capability set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: DoctorId,
    pub first_name: String,
    pub last_name: String,
    pub specialization: String,
    pub license_number: String,
    pub email: String,
    pub active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub hired_at: OffsetDateTime,
}

impl Doctor {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        specialization: impl Into<String>,
        license_number: impl Into<String>,
        email: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            id: DoctorId::new(),
            first_name: validate_non_empty("first_name", &first_name.into())?,
            last_name: validate_non_empty("last_name", &last_name.into())?,
            specialization: validate_non_empty("specialization", &specialization.into())?,
            license_number: validate_non_empty("license_number", &license_number.into())?,
            email: validate_email(&email.into())?,
            active: true,
            hired_at: now_utc(),
        })
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

/// Front-desk or administrative staff; the audit author of bookings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Staff {
    pub id: StaffId,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub active: bool,
}

impl Staff {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        role: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            id: StaffId::new(),
            first_name: validate_non_empty("first_name", &first_name.into())?,
            last_name: validate_non_empty("last_name", &last_name.into())?,
            role: validate_non_empty("role", &role.into())?,
            email: None,
            phone: None,
            active: true,
        })
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Result<Self> {
        self.email = Some(validate_email(&email.into())?);
        Ok(self)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A clinic department with an optional head doctor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Department {
    pub id: DepartmentId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head_doctor: Option<DoctorId>,
}

impl Department {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        Ok(Self {
            id: DepartmentId::new(),
            name: validate_non_empty("name", &name.into())?,
            location: None,
            head_doctor: None,
        })
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}
